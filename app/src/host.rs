use std::path::PathBuf;

use log::{debug, info};
use qsys_core::{
    console::ConsoleOut,
    fs::{file_time, make_dir},
    time, ExecMode, FrameContext, Host, HostParms, SysError, SysResult,
};

/// Stand-in simulation host: counts tics and answers a handful of console commands.
pub struct DemoHost {
    mode: ExecMode,
    tick_rate: f64,
    parms: Option<HostParms>,
    tics: u64,
    sim_time: f64,
    status_every: u64,
}

impl DemoHost {
    pub fn new(mode: ExecMode, tick_rate: f64) -> Self {
        Self {
            mode,
            tick_rate,
            parms: None,
            tics: 0,
            sim_time: 0.0,
            status_every: 1200,
        }
    }

    pub fn init(&mut self, parms: HostParms, console: &mut ConsoleOut) -> SysResult<()> {
        make_dir(parms.basedir.join("logs"));
        console.emit_fmt(format_args!(
            "{:4.1} megabyte heap\n",
            parms.memsize() as f64 / (1024.0 * 1024.0)
        ));
        if self.mode == ExecMode::Dedicated {
            console.emit_fmt(format_args!(
                "dedicated server, ticrate {:.3}\n",
                self.tick_rate
            ));
        }
        self.parms = Some(parms);
        Ok(())
    }

    fn debug_log_path(&self) -> Option<PathBuf> {
        self.parms
            .as_ref()
            .map(|p| p.basedir.join("logs").join("qsys-debug.log"))
    }
}

impl Host for DemoHost {
    fn id(&self) -> &'static str {
        "demo"
    }

    fn mode(&self) -> ExecMode {
        self.mode
    }

    fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    fn command(&mut self, line: &str, ctx: &mut FrameContext<'_>) -> SysResult<()> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd {
            "" => {}
            "quit" | "exit" => ctx.request_quit(),
            "echo" => ctx.print(format_args!("{rest}\n")),
            "status" => ctx.print(format_args!(
                "tics {} time {:.2}s ticrate {:.3}\n",
                self.tics, self.sim_time, self.tick_rate
            )),
            "ticrate" => match rest.parse::<f64>() {
                Ok(v) if v > 0.0 => self.tick_rate = v,
                _ => ctx.print(format_args!("\"ticrate\" is \"{:.3}\"\n", self.tick_rate)),
            },
            "filetime" => match file_time(rest) {
                Some(t) => ctx.print(format_args!("{rest}: {t}\n")),
                None => ctx.print(format_args!("{rest}: not found\n")),
            },
            "log" => {
                if let Some(path) = self.debug_log_path() {
                    qsys_core::debug_log!(&path, "{:.3} {rest}\n", ctx.time.realtime);
                }
            }
            "error" => return Err(SysError::fatal(rest.to_string())),
            other => ctx.print(format_args!("Unknown command \"{other}\"\n")),
        }
        Ok(())
    }

    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> SysResult<()> {
        self.tics += 1;
        self.sim_time += ctx.elapsed();

        if self.tics % self.status_every == 0 {
            debug!("tic {} sim_time {:.2}", self.tics, self.sim_time);
        }

        // No renderer to block on vsync, so an interactive frame idles here instead.
        if self.mode == ExecMode::Interactive {
            time::sleep();
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        info!("demo host down after {} tics ({:.2}s)", self.tics, self.sim_time);
        self.parms = None;
    }
}
