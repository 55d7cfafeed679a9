//! The runtime: both registries plus the configuration they were built from
//!
//! Embedders create one [`Runtime`] and share it. Display lifecycle and the
//! resource create/destroy helpers live here because they need both the
//! display registry and the module registry.

use crate::config::RuntimeConfig;
use crate::display::{Display, DisplayGuard, DisplayHandle};
use crate::driver::{BuiltinDriver, Driver, ProcAddress};
use crate::error::{Error, Result};
use crate::matching;
use crate::module::ModuleRegistry;
use crate::platform::{DisplayAttrib, NativeHandle, Platform};
use crate::registry::{DisplayRegistry, TeardownReport};
use crate::resource::{
    Context, ContextAttribs, Image, ImageAttribs, Resource, ResourceHandle, Surface, SurfaceAttribs, SyncKind,
    SyncObject,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner of the display and module registries
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    native_platform: Platform,
    displays: DisplayRegistry,
    modules: ModuleRegistry,
    shut_down: AtomicBool,
}

impl Runtime {
    /// `builtins` are the compiled-in drivers, highest priority first
    pub fn new(config: RuntimeConfig, builtins: Vec<BuiltinDriver>) -> Self {
        let modules = ModuleRegistry::new(builtins, config.driver.clone(), config.driver_args.clone());
        Self {
            native_platform: config.native_platform(),
            config,
            displays: DisplayRegistry::new(),
            modules,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Platform of displays opened with [`Runtime::get_display`], fixed at construction
    pub fn native_platform(&self) -> Platform {
        self.native_platform
    }

    pub fn displays(&self) -> &DisplayRegistry {
        &self.displays
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            Err(Error::ShutDown)
        } else {
            Ok(())
        }
    }

    /// The display for `native` on the configured native platform
    pub fn get_display(&self, native: NativeHandle) -> Result<Arc<Display>> {
        self.ensure_running()?;
        self.displays.find_or_create(self.native_platform, native)
    }

    /// The display for `native` on an explicit platform
    pub fn get_platform_display(
        &self,
        platform: Platform,
        native: NativeHandle,
        attribs: &[DisplayAttrib],
    ) -> Result<Arc<Display>> {
        self.ensure_running()?;
        platform.validate_display_request(native, attribs)?;
        self.displays.find_or_create(platform, native)
    }

    pub fn lookup_display(&self, handle: DisplayHandle) -> Result<Arc<Display>> {
        self.ensure_running()?;
        self.displays.lookup(handle).ok_or(Error::InvalidHandle)
    }

    /// Match and pin a driver; an initialized display keeps its driver
    pub fn initialize(&self, display: &Display) -> Result<Arc<dyn Driver>> {
        self.ensure_running()?;
        matching::ensure_matched(&self.modules, display, false)
    }

    /// Find the driver that would be chosen, without initializing
    pub fn probe(&self, display: &Display) -> Result<Arc<dyn Driver>> {
        self.ensure_running()?;
        matching::ensure_matched(&self.modules, display, true)
    }

    /// Release every resource and return the display to uninitialized
    ///
    /// The pinned driver is kept; a later `initialize` goes straight back to
    /// it. Terminating an uninitialized display does nothing.
    pub fn terminate(&self, display: &Display) -> Result<()> {
        self.ensure_running()?;
        let _matching = display.lock_matching();
        if !display.is_initialized() {
            return Ok(());
        }

        if let Some(driver) = display.driver() {
            display.release_resources(driver.as_ref());
            driver.terminate(display);
        }
        display.take_driver_data();
        display.mark_terminated();
        log::debug!("Terminated display {}", display.handle());
        Ok(())
    }

    fn pinned_driver(&self, display: &Display) -> Result<Arc<dyn Driver>> {
        self.ensure_running()?;
        if !display.is_initialized() {
            return Err(Error::NotInitialized);
        }
        display.driver().ok_or(Error::NotInitialized)
    }

    /// Build a resource with the pinned driver and link it
    ///
    /// Holds the match lock throughout, so a concurrent `terminate` either
    /// runs first (and this fails with `NotInitialized`) or drains the
    /// freshly linked resource.
    fn create_with<T: Resource>(
        &self,
        display: &Display,
        create: impl FnOnce(&dyn Driver) -> Result<T>,
    ) -> Result<Arc<T>> {
        let _matching = display.lock_matching();
        let driver = self.pinned_driver(display)?;
        let resource = create(driver.as_ref())?;
        Ok(link(display, resource))
    }

    pub fn create_context(&self, display: &Arc<Display>, attribs: &ContextAttribs) -> Result<Arc<Context>> {
        self.create_with(display, |driver| driver.create_context(display, attribs))
    }

    pub fn create_window_surface(
        &self,
        display: &Arc<Display>,
        window: NativeHandle,
        attribs: &SurfaceAttribs,
    ) -> Result<Arc<Surface>> {
        self.create_with(display, |driver| driver.create_window_surface(display, window, attribs))
    }

    pub fn create_pbuffer_surface(&self, display: &Arc<Display>, attribs: &SurfaceAttribs) -> Result<Arc<Surface>> {
        self.create_with(display, |driver| driver.create_pbuffer_surface(display, attribs))
    }

    pub fn create_image(&self, display: &Arc<Display>, attribs: &ImageAttribs) -> Result<Arc<Image>> {
        self.create_with(display, |driver| driver.create_image(display, attribs))
    }

    pub fn create_sync(&self, display: &Arc<Display>, kind: SyncKind) -> Result<Arc<SyncObject>> {
        self.create_with(display, |driver| driver.create_sync(display, kind))
    }

    pub fn destroy_context(&self, display: &Display, context: Arc<Context>) -> Result<()> {
        let driver = self.pinned_driver(display)?;
        unlink_and(display, context, |guard, ctx| driver.destroy_context(guard, ctx))
    }

    pub fn destroy_surface(&self, display: &Display, surface: Arc<Surface>) -> Result<()> {
        let driver = self.pinned_driver(display)?;
        unlink_and(display, surface, |guard, surface| driver.destroy_surface(guard, surface))
    }

    pub fn destroy_image(&self, display: &Display, image: Arc<Image>) -> Result<()> {
        let driver = self.pinned_driver(display)?;
        unlink_and(display, image, |guard, image| driver.destroy_image(guard, image))
    }

    pub fn destroy_sync(&self, display: &Display, sync: Arc<SyncObject>) -> Result<()> {
        let driver = self.pinned_driver(display)?;
        unlink_and(display, sync, |guard, sync| driver.destroy_sync(guard, sync))
    }

    /// Look up an exported function in the loaded drivers
    ///
    /// When nothing has been loaded yet, the default display is probed first
    /// so the highest-priority usable driver gets loaded.
    pub fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        if self.is_shut_down() {
            return None;
        }

        if !self.modules.any_loaded() {
            let display = self.get_display(NativeHandle::DEFAULT).ok()?;
            if let Err(err) = self.probe(&display) {
                log::debug!("No driver for the default display: {}", err);
                return None;
            }
        }

        matching::driver_proc(&self.modules, name)
    }

    /// Free every display, then unload every driver
    ///
    /// Runs once; later calls return `None`. Also run on drop.
    pub fn shutdown(&self) -> Option<TeardownReport> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return None;
        }

        let report = self.displays.teardown_all();
        let unloaded = self.modules.teardown_all();
        log::debug!(
            "Runtime shut down: {} displays freed ({} with resources), {} modules unloaded",
            report.displays_freed,
            report.displays_with_resources,
            unloaded
        );
        Some(report)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn link<T: Resource>(display: &Display, resource: T) -> Arc<T> {
    let resource = Arc::new(resource);
    display.lock().link(&resource);
    resource
}

fn unlink_and<T: Resource>(
    display: &Display,
    resource: Arc<T>,
    destroy: impl FnOnce(&DisplayGuard<'_>, Arc<T>) -> Result<()>,
) -> Result<()> {
    let mut guard = display.lock();
    if !resource.base().belongs_to(display) || !guard.check_resource(ResourceHandle::of(&resource), T::TYPE) {
        return Err(Error::BadResource);
    }
    guard.unlink(&resource);
    destroy(&guard, resource)
}
