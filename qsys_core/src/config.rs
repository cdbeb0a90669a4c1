use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{SysError, SysResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysConfig {
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl SysConfig {
    pub fn load_toml(path: impl AsRef<Path>) -> SysResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SysError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SysResult<Self> {
        toml::from_str(text).map_err(|e| SysError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Subtracted from the first clock reading so the first frame is not zero-length.
    #[serde(default = "default_initial_bias_sec")]
    pub initial_bias_sec: f64,
    /// Sleep taken while a dedicated tic is not yet due. 0 yields the thread instead.
    #[serde(default = "default_idle_sleep_us")]
    pub idle_sleep_us: u64,
    /// Console lines handed to the host per iteration; the rest wait for later frames.
    #[serde(default = "default_max_console_lines")]
    pub max_console_lines: usize,
}

fn default_initial_bias_sec() -> f64 { 0.1 }
fn default_idle_sleep_us() -> u64 { 1000 }
fn default_max_console_lines() -> usize { 32 }

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            initial_bias_sec: default_initial_bias_sec(),
            idle_sleep_us: default_idle_sleep_us(),
            max_console_lines: default_max_console_lines(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
    #[serde(default = "default_banner")]
    pub banner: bool,
}

fn default_read_chunk() -> usize { crate::console::READ_CHUNK }
fn default_banner() -> bool { true }

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            read_chunk: default_read_chunk(),
            banner: default_banner(),
        }
    }
}

/// Startup values the host adopts; it owns them from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    #[serde(default)]
    pub dedicated: bool,
    #[serde(default = "default_heap_mb")]
    pub heap_mb: usize,
    #[serde(default = "default_basedir")]
    pub basedir: String,
}

fn default_tick_rate() -> f64 { 0.05 }
fn default_heap_mb() -> usize { 16 }
fn default_basedir() -> String { ".".to_string() }

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            dedicated: false,
            heap_mb: default_heap_mb(),
            basedir: default_basedir(),
        }
    }
}
