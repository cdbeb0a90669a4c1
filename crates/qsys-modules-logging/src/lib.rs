use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use qsys_core::{SysError, SysResult};

use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static BOOT: OnceLock<Instant> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ConsoleLoggerConfig {
    pub level: LevelFilter,
    pub colors: bool,
    pub include_module: bool,
}

impl ConsoleLoggerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let level = get("QSYS_LOG")
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        let colors = get("QSYS_LOG_COLORS").map(|v| v != "0").unwrap_or(true);
        let include_module = get("QSYS_LOG_MODULE").map(|v| v != "0").unwrap_or(true);

        Self {
            level,
            colors,
            include_module,
        }
    }
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Installs the global `log` backend on stderr.
///
/// stdout is reserved for the sanitized game console, so records never go there.
pub struct ConsoleLogger {
    config: ConsoleLoggerConfig,
    installed: bool,
}

impl ConsoleLogger {
    #[inline]
    pub fn new(config: ConsoleLoggerConfig) -> Self {
        Self {
            config,
            installed: false,
        }
    }

    pub fn install(&mut self) -> SysResult<()> {
        if self.installed {
            return Ok(());
        }

        BOOT.get_or_init(Instant::now);

        let mut builder = Builder::new();
        builder
            .filter_level(self.config.level)
            .target(Target::Stderr)
            .write_style(if self.config.colors {
                WriteStyle::Auto
            } else {
                WriteStyle::Never
            });

        let include_module = self.config.include_module;
        builder.format(move |buf, record| {
            let stamp = fmt_uptime(BOOT.get().map(Instant::elapsed).unwrap_or_default());
            let style = buf.default_level_style(record.level());

            if include_module {
                writeln!(
                    buf,
                    "[{stamp}] [{style}{:<5}{style:#}] {:<25} {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "[{stamp}] [{style}{:<5}{style:#}] {}",
                    record.level(),
                    record.args()
                )
            }
        });

        builder
            .try_init()
            .map_err(|e| SysError::fatal(format!("logger init failed: {e}")))?;

        self.installed = true;
        Ok(())
    }
}

/// `+mm:ss.mmm`, or `+hh:mm:ss.mmm` after the first hour.
fn fmt_uptime(d: Duration) -> String {
    let total_ms = d.as_millis() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    if h > 0 {
        format!("+{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
    } else {
        format!("+{:02}:{:02}.{:03}", m, s, ms)
    }
}
