//! DRI2 driver - DRM device nodes, with a software fallback
//!
//! The first matching pass only accepts a display when a DRM device node is
//! present. On the fallback pass the driver settles for software rendering
//! (`swrast`) if no device is found. Haiku displays are never accepted.
//!
//! The device directory defaults to `/dev/dri`; a `device-dir=<path>` entry
//! argument or `EGLHUB_DRI_DEVICE_DIR` points it elsewhere.

pub mod device;

pub use device::{probe_devices, DeviceKind, DeviceNode, DEFAULT_DEVICE_DIR, DEVICE_DIR_ENV};

use eglhub_core::{
    BuiltinDriver, ClientApi, Context, ContextAttribs, Display, DisplayGuard, Driver, Error, Image, ImageAttribs,
    NativeHandle, Platform, ProcAddress, ProcTable, Resource, Result, Surface, SurfaceAttribs, SurfaceKind,
    SyncKind, SyncObject,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Module name used for `EGL_DRIVER`
pub const MODULE_NAME: &str = "egl_dri2";

pub const DRIVER_NAME: &str = "DRI2";

/// The compiled-in module for this driver
pub fn builtin() -> BuiltinDriver {
    BuiltinDriver::new(MODULE_NAME, |args| {
        Some(Arc::new(Dri2Driver::new(device::device_dir_from_args(args))) as Arc<dyn Driver>)
    })
}

/// How a display is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Hardware(DeviceNode),
    Software,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Hardware(node) => write!(f, "{}", node),
            Backend::Software => f.write_str("swrast"),
        }
    }
}

/// Per-display state, attached on a real (not test-only) initialize
#[derive(Debug, Clone)]
pub struct Dri2Display {
    pub backend: Backend,
    /// Balanced `initialize` calls; the state goes away at zero
    pub init_count: usize,
}

extern "C" fn dri2_flush() {}

extern "C" fn dri2_finish() {}

extern "C" fn dri2_swap_interval() {}

static PROCS: ProcTable = ProcTable(&[
    ("glFlush", dri2_flush),
    ("glFinish", dri2_finish),
    ("eglSwapInterval", dri2_swap_interval),
]);

pub struct Dri2Driver {
    device_dir: PathBuf,
}

impl Dri2Driver {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    fn choose_backend(&self, display: &Display) -> Result<Backend> {
        if display.platform() == Platform::Haiku {
            return Err(Error::Driver("DRI2 cannot drive haiku displays".into()));
        }

        let fallback = display.options().use_fallback;
        match probe_devices(&self.device_dir).into_iter().next() {
            Some(node) => Ok(Backend::Hardware(node)),
            None if fallback => Ok(Backend::Software),
            None => Err(Error::Driver(format!(
                "no DRI device in {}",
                self.device_dir.display()
            ))),
        }
    }

    fn backend(display: &Display) -> Result<Backend> {
        display
            .with_driver_data(|state: &mut Dri2Display| state.backend.clone())
            .ok_or(Error::NotInitialized)
    }

    fn free<T: Resource + fmt::Debug>(guard: &DisplayGuard<'_>, resource: Arc<T>) -> Result<()> {
        if guard.release(resource.as_ref()) {
            log::debug!("DRI2: freed {:?}", resource);
        }
        Ok(())
    }
}

impl fmt::Debug for Dri2Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dri2Driver")
            .field("device_dir", &self.device_dir)
            .finish()
    }
}

impl Driver for Dri2Driver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn initialize(&self, display: &Display) -> Result<()> {
        let options = display.options();
        let attached = if options.test_only {
            display.with_driver_data(|_: &mut Dri2Display| ()).is_some()
        } else {
            display
                .with_driver_data(|state: &mut Dri2Display| state.init_count += 1)
                .is_some()
        };
        if attached {
            return Ok(());
        }

        let backend = self.choose_backend(display)?;
        log::info!(
            "DRI2: {} display {} using {}{}",
            display.platform(),
            display.native_handle(),
            backend,
            if options.test_only { " (test only)" } else { "" }
        );

        if !options.test_only {
            display.set_driver_data(Dri2Display {
                backend,
                init_count: 1,
            });
        }
        Ok(())
    }

    fn terminate(&self, display: &Display) {
        let remaining = display.with_driver_data(|state: &mut Dri2Display| {
            state.init_count = state.init_count.saturating_sub(1);
            state.init_count
        });
        if remaining == Some(0) {
            display.take_driver_data();
        }
    }

    fn create_context(&self, display: &Arc<Display>, attribs: &ContextAttribs) -> Result<Context> {
        if attribs.api == ClientApi::OpenVg {
            return Err(Error::Unsupported("OpenVG contexts"));
        }
        let backend = Self::backend(display)?;
        Ok(Context::new(display, *attribs).with_driver_data(backend))
    }

    fn destroy_context(&self, guard: &DisplayGuard<'_>, context: Arc<Context>) -> Result<()> {
        Self::free(guard, context)
    }

    fn create_window_surface(
        &self,
        display: &Arc<Display>,
        window: NativeHandle,
        attribs: &SurfaceAttribs,
    ) -> Result<Surface> {
        if display.platform() == Platform::Surfaceless {
            return Err(Error::Unsupported("window surfaces on surfaceless displays"));
        }
        if window.is_default() {
            return Err(Error::BadParameter("window surface needs a native window"));
        }
        let backend = Self::backend(display)?;
        Ok(Surface::new(display, SurfaceKind::Window, window, *attribs).with_driver_data(backend))
    }

    fn create_pbuffer_surface(&self, display: &Arc<Display>, attribs: &SurfaceAttribs) -> Result<Surface> {
        let backend = Self::backend(display)?;
        Ok(Surface::new(display, SurfaceKind::Pbuffer, NativeHandle::DEFAULT, *attribs).with_driver_data(backend))
    }

    fn destroy_surface(&self, guard: &DisplayGuard<'_>, surface: Arc<Surface>) -> Result<()> {
        Self::free(guard, surface)
    }

    fn create_image(&self, display: &Arc<Display>, attribs: &ImageAttribs) -> Result<Image> {
        if attribs.width == 0 || attribs.height == 0 {
            return Err(Error::BadParameter("image has no pixels"));
        }
        Self::backend(display)?;
        Ok(Image::new(display, *attribs))
    }

    fn destroy_image(&self, guard: &DisplayGuard<'_>, image: Arc<Image>) -> Result<()> {
        Self::free(guard, image)
    }

    fn create_sync(&self, display: &Arc<Display>, kind: SyncKind) -> Result<SyncObject> {
        Self::backend(display)?;
        Ok(SyncObject::new(display, kind))
    }

    fn destroy_sync(&self, guard: &DisplayGuard<'_>, sync: Arc<SyncObject>) -> Result<()> {
        Self::free(guard, sync)
    }

    fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        PROCS.lookup(name)
    }

    fn unload(&self) {
        log::debug!("DRI2: unloaded");
    }
}
