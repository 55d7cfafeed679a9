//! The display registry: one [`Display`] per `(platform, native handle)`
//!
//! Displays are never removed individually. They stay alive, and their
//! handles stay valid, until [`DisplayRegistry::teardown_all`] at shutdown.

use crate::display::{Display, DisplayHandle};
use crate::error::{Error, Result};
use crate::platform::{NativeHandle, Platform};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// What registry teardown found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub displays_freed: usize,
    /// Displays that still had linked resources when they were freed
    pub displays_with_resources: usize,
}

/// Process-wide set of displays
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    displays: Mutex<Vec<Arc<Display>>>,
}

impl DisplayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry for several operations in a row
    pub fn lock(&self) -> DisplayList<'_> {
        DisplayList {
            displays: self.displays.lock(),
        }
    }

    /// Return the display for this key, creating it on first request
    pub fn find_or_create(&self, platform: Platform, native: NativeHandle) -> Result<Arc<Display>> {
        self.lock().find_or_create(platform, native)
    }

    /// Whether `handle` names a live display; the handle is never dereferenced
    pub fn is_valid_handle(&self, handle: DisplayHandle) -> bool {
        self.lock().find(handle).is_some()
    }

    pub fn lookup(&self, handle: DisplayHandle) -> Option<Arc<Display>> {
        self.lock().find(handle)
    }

    pub fn len(&self) -> usize {
        self.displays.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.lock().is_empty()
    }

    /// Free every display; see [`DisplayList::teardown`]
    pub fn teardown_all(&self) -> TeardownReport {
        self.lock().teardown()
    }
}

/// The registry with its lock held
#[derive(Debug)]
pub struct DisplayList<'a> {
    displays: MutexGuard<'a, Vec<Arc<Display>>>,
}

impl DisplayList<'_> {
    pub fn find_or_create(&mut self, platform: Platform, native: NativeHandle) -> Result<Arc<Display>> {
        if let Some(display) = self
            .displays
            .iter()
            .rev()
            .find(|d| d.platform() == platform && d.native_handle() == native)
        {
            return Ok(Arc::clone(display));
        }

        if self.displays.try_reserve(1).is_err() {
            log::error!("Failed to allocate {} display for {}", platform, native);
            return Err(Error::OutOfMemory);
        }

        let display = Arc::new(Display::new(platform, native));
        log::debug!("Created {} display {} for native {}", platform, display.handle(), native);
        self.displays.push(Arc::clone(&display));
        Ok(display)
    }

    pub fn find(&self, handle: DisplayHandle) -> Option<Arc<Display>> {
        self.displays
            .iter()
            .find(|d| d.handle() == handle)
            .cloned()
    }

    /// Live displays, most recently created first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Display>> {
        self.displays.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    /// Free every display, most recently created first
    ///
    /// Resources still linked at this point are leaks on the caller's side.
    /// They are reported and freed along with their display.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        while let Some(display) = self.displays.pop() {
            if !display.lock().is_empty() {
                log::warn!("Display {} is destroyed with resources", display.handle());
                report.displays_with_resources += 1;
            }
            report.displays_freed += 1;
        }
        report
    }
}
