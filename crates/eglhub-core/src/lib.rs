//! eglhub Core: displays, resources and the drivers that own them
//!
//! An application hands the runtime an opaque native display handle. The
//! runtime turns it into exactly one [`Display`], picks a backend [`Driver`]
//! for it by trial initialization, and from then on tracks every context,
//! surface, image and sync object that driver creates on the display.
//!
//! ## The Pieces
//!
//! 1. **Display Registry** - [`DisplayRegistry`] maps `(platform, native handle)` to a display
//! 2. **Resource Base** - [`ResourceBase`] counts references and tracks list membership
//! 3. **Module Registry** - [`ModuleRegistry`] holds candidate drivers in priority order
//! 4. **Driver Matching** - [`matching`] binds the first driver that accepts a display
//!
//! [`Runtime`] owns one of each registry and is what embedders use.
//!
//! ## Bring Your Own Driver
//!
//! ```rust
//! use eglhub_core::{BuiltinDriver, Display, Driver, NativeHandle, Runtime, RuntimeConfig};
//! use std::sync::Arc;
//!
//! struct Null;
//!
//! impl Driver for Null {
//!     fn name(&self) -> &str { "null" }
//!     fn initialize(&self, _display: &Display) -> eglhub_core::Result<()> { Ok(()) }
//!     fn terminate(&self, _display: &Display) {}
//! }
//!
//! let runtime = Runtime::new(
//!     RuntimeConfig::new(),
//!     vec![BuiltinDriver::new("egl_null", |_| Some(Arc::new(Null) as Arc<dyn Driver>))],
//! );
//!
//! let display = runtime.get_display(NativeHandle::DEFAULT)?;
//! let driver = runtime.initialize(&display)?;
//! assert_eq!(driver.name(), "null");
//! # Ok::<(), eglhub_core::Error>(())
//! ```

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod matching;
pub mod module;
pub mod platform;
pub mod registry;
pub mod resource;
pub mod runtime;

#[cfg(test)]
mod proptests;

pub use config::{LogLevel, RuntimeConfig};
pub use display::{Display, DisplayGuard, DisplayHandle, DriverOptions};
pub use driver::{BuiltinDriver, Driver, DriverEntryPoint, ProcAddress, ProcTable};
pub use error::{Error, Result};
pub use module::{Module, ModuleRegistry};
pub use platform::{DisplayAttrib, NativeHandle, Platform, PLATFORM_X11_SCREEN};
pub use registry::{DisplayList, DisplayRegistry, TeardownReport};
pub use resource::{
    ClientApi, Context, ContextAttribs, Image, ImageAttribs, Resource, ResourceBase, ResourceHandle,
    ResourceLists, ResourceType, Surface, SurfaceAttribs, SurfaceKind, SyncKind, SyncObject,
};
pub use runtime::Runtime;
