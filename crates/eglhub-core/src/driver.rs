//! The contract between the runtime and a backend driver
//!
//! A driver is trial-initialized against a display during matching. The one
//! that succeeds is pinned to the display and from then on builds and
//! destroys every resource on it.
//!
//! Only `name`, `initialize` and `terminate` are required. Everything else
//! falls back to reporting [`Error::Unsupported`], or `None` for lookups.

use crate::display::{Display, DisplayGuard};
use crate::error::{Error, Result};
use crate::platform::NativeHandle;
use crate::resource::{
    Context, ContextAttribs, Image, ImageAttribs, Surface, SurfaceAttribs, SyncKind, SyncObject,
};
use std::fmt;
use std::sync::Arc;

/// Address of an exported client-API function
pub type ProcAddress = extern "C" fn();

/// Builds a driver from the optional argument string
///
/// Returning `None` means the module has no usable driver.
pub type DriverEntryPoint = Arc<dyn Fn(Option<&str>) -> Option<Arc<dyn Driver>> + Send + Sync>;

/// Backend implementation of the graphics runtime
pub trait Driver: Send + Sync {
    /// Human-readable driver name, never empty
    fn name(&self) -> &str;

    /// Try to drive `display`
    ///
    /// Read [`Display::options`] for the test-only and fallback flags. In
    /// test-only mode a driver must not leave state behind on the display.
    fn initialize(&self, display: &Display) -> Result<()>;

    /// Undo `initialize`; resources are already released
    fn terminate(&self, display: &Display);

    fn create_context(&self, _display: &Arc<Display>, _attribs: &ContextAttribs) -> Result<Context> {
        Err(Error::Unsupported("create_context"))
    }

    /// Destroy an unlinked context, releasing the caller's reference
    fn destroy_context(&self, _guard: &DisplayGuard<'_>, _context: Arc<Context>) -> Result<()> {
        Err(Error::Unsupported("destroy_context"))
    }

    fn create_window_surface(
        &self,
        _display: &Arc<Display>,
        _window: NativeHandle,
        _attribs: &SurfaceAttribs,
    ) -> Result<Surface> {
        Err(Error::Unsupported("create_window_surface"))
    }

    fn create_pbuffer_surface(&self, _display: &Arc<Display>, _attribs: &SurfaceAttribs) -> Result<Surface> {
        Err(Error::Unsupported("create_pbuffer_surface"))
    }

    fn destroy_surface(&self, _guard: &DisplayGuard<'_>, _surface: Arc<Surface>) -> Result<()> {
        Err(Error::Unsupported("destroy_surface"))
    }

    fn create_image(&self, _display: &Arc<Display>, _attribs: &ImageAttribs) -> Result<Image> {
        Err(Error::Unsupported("create_image"))
    }

    fn destroy_image(&self, _guard: &DisplayGuard<'_>, _image: Arc<Image>) -> Result<()> {
        Err(Error::Unsupported("destroy_image"))
    }

    fn create_sync(&self, _display: &Arc<Display>, _kind: SyncKind) -> Result<SyncObject> {
        Err(Error::Unsupported("create_sync"))
    }

    fn destroy_sync(&self, _guard: &DisplayGuard<'_>, _sync: Arc<SyncObject>) -> Result<()> {
        Err(Error::Unsupported("destroy_sync"))
    }

    /// Look up an exported function by name
    fn get_proc_address(&self, _name: &str) -> Option<ProcAddress> {
        None
    }

    /// Called once when the module registry is torn down
    fn unload(&self) {}
}

/// A driver compiled into the binary, with its entry point
#[derive(Clone)]
pub struct BuiltinDriver {
    pub name: String,
    pub entry: DriverEntryPoint,
}

impl BuiltinDriver {
    pub fn new<F>(name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<Arc<dyn Driver>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            entry: Arc::new(entry),
        }
    }
}

impl fmt::Debug for BuiltinDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDriver")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Static name-to-function table for `get_proc_address`
#[derive(Debug, Clone, Copy)]
pub struct ProcTable(pub &'static [(&'static str, ProcAddress)]);

impl ProcTable {
    pub fn lookup(&self, name: &str) -> Option<ProcAddress> {
        self.0
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, address)| address)
    }
}
