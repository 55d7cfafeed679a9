//! Runtime configuration
//!
//! Everything the registries need to know up front: which driver module to
//! force, which native platform to assume, how loud to log, and what argument
//! string to hand to driver entry points.
//!
//! # Environment Variables
//!
//! - `EGL_DRIVER` - load only the built-in driver module with this exact name
//! - `EGL_PLATFORM` - native platform name (`x11`, `wayland`, ...)
//! - `EGL_DISPLAY` - deprecated spelling of `EGL_PLATFORM`, used only when it is unset
//! - `EGL_LOG_LEVEL` - `fatal`, `warning`, `info` or `debug`
//!
//! ```
//! use eglhub_core::config::RuntimeConfig;
//! use eglhub_core::Platform;
//!
//! let config = RuntimeConfig::new()
//!     .with_driver("egl_dri2")
//!     .with_platform(Platform::Wayland);
//!
//! assert_eq!(config.native_platform(), Platform::Wayland);
//! ```

use crate::platform::Platform;
use std::sync::OnceLock;

pub const DRIVER_ENV: &str = "EGL_DRIVER";
pub const PLATFORM_ENV: &str = "EGL_PLATFORM";
pub const LEGACY_PLATFORM_ENV: &str = "EGL_DISPLAY";
pub const LOG_LEVEL_ENV: &str = "EGL_LOG_LEVEL";

/// Snapshot of the process environment, read once
static PROCESS_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// How much diagnostic output the runtime should produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Unrecoverable errors only
    Fatal,
    /// Recoverable problems (the default)
    #[default]
    Warning,
    /// Useful information
    Info,
    /// Everything, including driver selection details
    Debug,
}

impl LogLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fatal" => Some(LogLevel::Fatal),
            "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Map onto the `log` crate's filter levels
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Fatal => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Settings shared by the display and module registries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Name of the only built-in driver module to register
    pub driver: Option<String>,
    /// Native platform to assume for displays requested without one
    pub platform: Option<Platform>,
    /// Requested log verbosity
    pub log_level: Option<LogLevel>,
    /// Argument string passed to every driver entry point
    pub driver_args: Option<String>,
}

impl RuntimeConfig {
    /// Empty configuration: all built-ins, build-time default platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a fresh configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The process environment, read on first call and cached afterwards
    pub fn process() -> &'static RuntimeConfig {
        PROCESS_CONFIG.get_or_init(Self::from_env)
    }

    /// Build a configuration from any key/value source
    ///
    /// Empty values count as unset. Unknown platform or log level names are
    /// logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let platform = get(PLATFORM_ENV)
            .or_else(|| get(LEGACY_PLATFORM_ENV))
            .and_then(|name| {
                let platform = Platform::from_name(&name);
                if platform.is_none() {
                    log::warn!("Ignoring unknown native platform '{}'", name);
                }
                platform
            });

        let log_level = get(LOG_LEVEL_ENV).and_then(|name| {
            let level = LogLevel::from_name(&name);
            if level.is_none() {
                log::warn!("Ignoring unknown log level '{}'", name);
            }
            level
        });

        Self {
            driver: get(DRIVER_ENV),
            platform,
            log_level,
            driver_args: None,
        }
    }

    pub fn with_driver(mut self, name: impl Into<String>) -> Self {
        self.driver = Some(name.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_driver_args(mut self, args: impl Into<String>) -> Self {
        self.driver_args = Some(args.into());
        self
    }

    /// The platform displays belong to when the caller does not say
    ///
    /// The configured platform wins; otherwise the build-time default.
    pub fn native_platform(&self) -> Platform {
        let (platform, method) = match self.platform {
            Some(platform) => (platform, "environment overwrite"),
            None => (Platform::BUILD_DEFAULT, "build-time configuration"),
        };
        log::debug!("Native platform type: {} ({})", platform, method);
        platform
    }

    /// Effective log verbosity
    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }
}
