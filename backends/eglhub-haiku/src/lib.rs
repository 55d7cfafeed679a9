//! Haiku driver - software rendering for Haiku displays
//!
//! Accepts Haiku displays only and exports no extra functions.

use eglhub_core::{
    BuiltinDriver, ClientApi, Context, ContextAttribs, Display, DisplayGuard, Driver, Error, NativeHandle,
    Platform, Resource, Result, Surface, SurfaceAttribs, SurfaceKind,
};
use std::fmt;
use std::sync::Arc;

pub const MODULE_NAME: &str = "egl_haiku";

pub const DRIVER_NAME: &str = "Haiku";

pub fn builtin() -> BuiltinDriver {
    BuiltinDriver::new(MODULE_NAME, |_| Some(Arc::new(HaikuDriver::new()) as Arc<dyn Driver>))
}

#[derive(Debug, Default)]
pub struct HaikuDriver;

impl HaikuDriver {
    pub fn new() -> Self {
        Self
    }

    fn free<T: Resource + fmt::Debug>(guard: &DisplayGuard<'_>, resource: Arc<T>) -> Result<()> {
        if guard.release(resource.as_ref()) {
            log::debug!("Haiku: freed {:?}", resource);
        }
        Ok(())
    }
}

impl Driver for HaikuDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn initialize(&self, display: &Display) -> Result<()> {
        if display.platform() != Platform::Haiku {
            return Err(Error::Driver(format!("Haiku cannot drive {} displays", display.platform())));
        }
        log::info!("Haiku: software rendering on display {}", display.native_handle());
        Ok(())
    }

    fn terminate(&self, _display: &Display) {}

    fn create_context(&self, display: &Arc<Display>, attribs: &ContextAttribs) -> Result<Context> {
        match attribs.api {
            ClientApi::OpenGl => Ok(Context::new(display, *attribs)),
            ClientApi::OpenGlEs | ClientApi::OpenVg => Err(Error::Unsupported("non-desktop GL contexts")),
        }
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
        if window.is_default() {
            return Err(Error::BadParameter("window surface needs a native window"));
        }
        Ok(Surface::new(display, SurfaceKind::Window, window, *attribs))
    }

    fn create_pbuffer_surface(&self, display: &Arc<Display>, attribs: &SurfaceAttribs) -> Result<Surface> {
        Ok(Surface::new(display, SurfaceKind::Pbuffer, NativeHandle::DEFAULT, *attribs))
    }

    fn destroy_surface(&self, guard: &DisplayGuard<'_>, surface: Arc<Surface>) -> Result<()> {
        Self::free(guard, surface)
    }
}
