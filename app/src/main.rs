mod host;

use std::process;

use anyhow::Context;
use log::{error, info, warn};

use qsys_core::{
    config::HostConfig, console::READ_CHUNK, lifecycle::Lifecycle, stdin::StdinDescriptor,
    CommandLine, ConsoleIn, ConsoleOut, ExecMode, ExitSignal, Host, HostParms, MainLoop,
    SysConfig, SysContext, SystemClock, Termination,
};
use qsys_modules_logging::{ConsoleLogger, ConsoleLoggerConfig};

use crate::host::DemoHost;

/// Settings read once from the command line and the optional config file.
struct Startup {
    cfg: SysConfig,
    mode: ExecMode,
    tick_rate: f64,
}

fn read_startup(cmdline: &CommandLine) -> anyhow::Result<Startup> {
    let cfg = match cmdline.value_of("-config") {
        Some(path) => SysConfig::load_toml(path).with_context(|| format!("loading {path}"))?,
        None => SysConfig::default(),
    };

    let mode = if cfg.host.dedicated || cmdline.check_parm("-dedicated").is_some() {
        ExecMode::Dedicated
    } else {
        ExecMode::Interactive
    };
    let tick_rate = match cmdline.value_of("-ticrate") {
        Some(v) => v.parse::<f64>().with_context(|| format!("bad -ticrate '{v}'"))?,
        None => cfg.host.tick_rate,
    };

    Ok(Startup {
        cfg,
        mode,
        tick_rate,
    })
}

/// Sends a startup failure through the fatal path, with its whole context chain on one
/// line.
fn abort_startup(sys: &mut SysContext, host: &mut dyn Host, e: &anyhow::Error) -> Termination {
    error!("startup failed: {e:?}");
    sys.fatal(host, &format!("{e:#}"))
}

fn main() {
    if let Err(e) = ConsoleLogger::new(ConsoleLoggerConfig::default()).install() {
        eprintln!("{e}");
    }

    let cmdline = CommandLine::from_env();
    let flags = cmdline.io_flags();
    let startup = read_startup(&cmdline);

    // A failed startup still needs a host and a console to terminate through.
    let (mode, tick_rate, read_chunk) = match &startup {
        Ok(s) => (s.mode, s.tick_rate, s.cfg.console.read_chunk),
        Err(_) => (ExecMode::Interactive, HostConfig::default().tick_rate, READ_CHUNK),
    };

    let mut host = DemoHost::new(mode, tick_rate);
    let mut sys = SysContext::new(
        Lifecycle::new(Box::new(StdinDescriptor::default())),
        ConsoleOut::stdout(flags.nostdout),
        ConsoleIn::stdin(flags.noconinput, read_chunk),
    );

    let cfg = match startup {
        Ok(s) => s.cfg,
        Err(e) => process::exit(abort_startup(&mut sys, &mut host, &e).exit_code()),
    };

    let memsize = cfg.host.heap_mb.saturating_mul(1024 * 1024);
    let parms = match HostParms::allocate(&cfg.host.basedir, cmdline.argv(), memsize) {
        Ok(p) => p,
        Err(e) => process::exit(sys.fatal(&mut host, &e.to_string()).exit_code()),
    };

    if let Err(e) = sys.lifecycle.init(flags) {
        process::exit(sys.fatal(&mut host, &e.to_string()).exit_code());
    }

    if cfg.console.banner {
        sys.output.emit_fmt(format_args!(
            "qsys -- Version {}\n",
            env!("CARGO_PKG_VERSION")
        ));
    }

    if let Err(e) = host.init(parms, &mut sys.output) {
        process::exit(sys.fatal(&mut host, &e.to_string()).exit_code());
    }

    let exit = ExitSignal::new();
    if let Err(e) = exit.install_ctrlc_handler() {
        warn!("{e}");
    }

    info!("starting {mode:?} host, ticrate {tick_rate}");
    let term = MainLoop::new(SystemClock::new(), &cfg.frame)
        .with_exit_signal(exit)
        .run(&mut host, &mut sys);

    let code = term.exit_code();
    drop(sys);
    process::exit(code);
}
