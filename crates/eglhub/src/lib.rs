//! eglhub - display registry and driver matching for EGL-style runtimes
//!
//! This crate ties the core registries to the drivers compiled into the
//! build. Most users want [`runtime_from_env`]:
//!
//! ```no_run
//! use eglhub::prelude::*;
//!
//! let runtime = eglhub::runtime_from_env();
//! let display = runtime.get_display(NativeHandle::DEFAULT)?;
//! let driver = runtime.initialize(&display)?;
//! println!("{} drives {}", driver.name(), display.platform());
//! # Ok::<(), eglhub::Error>(())
//! ```
//!
//! # Feature Flags
//!
//! - `dri2` (default): the DRI2 driver, `egl_dri2`
//! - `haiku`: the Haiku driver, `egl_haiku`
//! - `full`: every built-in driver

pub use eglhub_core::*;

#[cfg(feature = "dri2")]
pub use eglhub_dri2 as dri2;

#[cfg(feature = "haiku")]
pub use eglhub_haiku as haiku;

/// Compiled-in drivers, highest priority first
pub fn builtin_drivers() -> Vec<BuiltinDriver> {
    #[allow(unused_mut)]
    let mut drivers = Vec::new();
    #[cfg(feature = "dri2")]
    drivers.push(eglhub_dri2::builtin());
    #[cfg(feature = "haiku")]
    drivers.push(eglhub_haiku::builtin());
    log::debug!(
        "Built-in drivers: {}",
        drivers.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    drivers
}

/// A runtime over the compiled-in drivers
pub fn runtime(config: RuntimeConfig) -> Runtime {
    Runtime::new(config, builtin_drivers())
}

/// A runtime configured from `EGL_DRIVER`, `EGL_PLATFORM` and friends
pub fn runtime_from_env() -> Runtime {
    runtime(RuntimeConfig::process().clone())
}

/// Common imports for typical usage
pub mod prelude {
    pub use eglhub_core::{
        ClientApi, Context, ContextAttribs, Display, Driver, Error, NativeHandle, Platform, Result, Runtime,
        RuntimeConfig, Surface, SurfaceAttribs, SyncKind,
    };
}
