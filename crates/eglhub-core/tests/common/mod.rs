#![allow(dead_code)]

use eglhub_core::{
    BuiltinDriver, Context, ContextAttribs, Display, DisplayGuard, Driver, Error, Image, ImageAttribs,
    NativeHandle, ProcAddress, Result, Surface, SurfaceAttribs, SurfaceKind, SyncKind, SyncObject,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// When a scripted driver accepts a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Always,
    Never,
    FallbackOnly,
}

/// Shared record of what the scripted drivers were asked to do
#[derive(Debug, Default)]
pub struct Journal {
    pub entries: Mutex<Vec<String>>,
    pub destroyed: AtomicUsize,
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }
}

pub struct ScriptedDriver {
    name: String,
    accept: Accept,
    journal: Arc<Journal>,
}

extern "C" fn scripted_flush() {}

impl ScriptedDriver {
    fn finish<T: eglhub_core::Resource>(&self, guard: &DisplayGuard<'_>, resource: Arc<T>) -> Result<()> {
        self.journal.destroyed.fetch_add(1, Ordering::SeqCst);
        if guard.release(resource.as_ref()) {
            drop(resource);
        }
        Ok(())
    }
}

impl Driver for ScriptedDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self, display: &Display) -> Result<()> {
        let fallback = display.options().use_fallback;
        self.journal.record(format!(
            "{}:init{}",
            self.name,
            if fallback { ":fallback" } else { "" }
        ));
        let accepted = match self.accept {
            Accept::Always => true,
            Accept::Never => false,
            Accept::FallbackOnly => fallback,
        };
        if accepted {
            Ok(())
        } else {
            Err(Error::Driver(format!("{} declined", self.name)))
        }
    }

    fn terminate(&self, _display: &Display) {
        self.journal.record(format!("{}:terminate", self.name));
    }

    fn create_context(&self, display: &Arc<Display>, attribs: &ContextAttribs) -> Result<Context> {
        Ok(Context::new(display, *attribs))
    }

    fn destroy_context(&self, guard: &DisplayGuard<'_>, context: Arc<Context>) -> Result<()> {
        self.finish(guard, context)
    }

    fn create_window_surface(
        &self,
        display: &Arc<Display>,
        window: NativeHandle,
        attribs: &SurfaceAttribs,
    ) -> Result<Surface> {
        Ok(Surface::new(display, SurfaceKind::Window, window, *attribs))
    }

    fn create_pbuffer_surface(&self, display: &Arc<Display>, attribs: &SurfaceAttribs) -> Result<Surface> {
        Ok(Surface::new(display, SurfaceKind::Pbuffer, NativeHandle::DEFAULT, *attribs))
    }

    fn destroy_surface(&self, guard: &DisplayGuard<'_>, surface: Arc<Surface>) -> Result<()> {
        self.finish(guard, surface)
    }

    fn create_image(&self, display: &Arc<Display>, attribs: &ImageAttribs) -> Result<Image> {
        Ok(Image::new(display, *attribs))
    }

    fn destroy_image(&self, guard: &DisplayGuard<'_>, image: Arc<Image>) -> Result<()> {
        self.finish(guard, image)
    }

    fn create_sync(&self, display: &Arc<Display>, kind: SyncKind) -> Result<SyncObject> {
        Ok(SyncObject::new(display, kind))
    }

    fn destroy_sync(&self, guard: &DisplayGuard<'_>, sync: Arc<SyncObject>) -> Result<()> {
        self.finish(guard, sync)
    }

    fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        let wanted = format!("{}Flush", self.name);
        (name == wanted).then_some(scripted_flush as ProcAddress)
    }

    fn unload(&self) {
        self.journal.unloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// A built-in module whose driver follows `accept`
pub fn scripted(module: &str, accept: Accept, journal: &Arc<Journal>) -> BuiltinDriver {
    let name = module.trim_start_matches("egl_").to_string();
    let journal = Arc::clone(journal);
    BuiltinDriver::new(module, move |_| {
        journal.loads.fetch_add(1, Ordering::SeqCst);
        Some(Arc::new(ScriptedDriver {
            name: name.clone(),
            accept,
            journal: Arc::clone(&journal),
        }) as Arc<dyn Driver>)
    })
}

/// A built-in module that never produces a driver
pub fn broken(module: &str, journal: &Arc<Journal>) -> BuiltinDriver {
    let journal = Arc::clone(journal);
    let name = module.to_string();
    BuiltinDriver::new(module, move |_| {
        journal.record(format!("{}:load-failed", name));
        None
    })
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
