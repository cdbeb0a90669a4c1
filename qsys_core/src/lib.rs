//! qsys core
//!
//! Platform layer between the OS and a simulation host: process lifecycle, a rebased
//! wall-clock time source, a sanitizing console with non-blocking stdin polling,
//! best-effort filesystem shims, and the main loop that paces host frames against the
//! host's tick rate.

pub mod args;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod frame;
pub mod fs;
pub mod host;
pub mod lifecycle;
pub mod scheduler;
pub mod signals;
pub mod stdin;
pub mod time;

pub use args::{CommandLine, HostParms, IoFlags};
pub use config::SysConfig;
pub use console::{ConsoleIn, ConsoleOut};
pub use context::SysContext;
pub use error::{SysError, SysResult};
pub use frame::FrameContext;
pub use host::{ExecMode, Host};
pub use lifecycle::{Lifecycle, Termination};
pub use scheduler::MainLoop;
pub use signals::ExitSignal;
pub use time::{Clock, SystemClock};
