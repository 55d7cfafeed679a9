//! Driver matching: pick the first module whose driver can initialize a display
//!
//! Matching runs in up to two passes. The first pass asks each driver for its
//! preferred path (usually hardware); if nobody accepts the display, a second
//! pass sets `use_fallback` so drivers may offer software paths instead.
//!
//! Lock order is the display's match lock, then the module-matching lock. The
//! display's resource lock is never held across a driver `initialize`.

use crate::display::{Display, DriverOptions};
use crate::driver::{Driver, ProcAddress};
use crate::error::{Error, Result};
use crate::module::{ModuleList, ModuleRegistry};
use std::sync::Arc;

/// Bind a driver to `display`
///
/// With `test_only` the winner is returned but not pinned, and the display
/// stays uninitialized. The display must not already be initialized.
pub fn match_display(modules: &ModuleRegistry, display: &Display, test_only: bool) -> Result<Arc<dyn Driver>> {
    assert!(
        !display.is_initialized(),
        "display {} is already initialized",
        display.handle()
    );

    let _matching = display.lock_matching();
    pinned_or_match(modules, display, test_only)
}

/// Like [`match_display`], but an initialized display just returns its
/// pinned driver
pub fn ensure_matched(modules: &ModuleRegistry, display: &Display, test_only: bool) -> Result<Arc<dyn Driver>> {
    let _matching = display.lock_matching();
    pinned_or_match(modules, display, test_only)
}

/// Caller holds the display's match lock
fn pinned_or_match(modules: &ModuleRegistry, display: &Display, test_only: bool) -> Result<Arc<dyn Driver>> {
    // another thread finished matching while we waited for the lock
    if let Some(driver) = display.driver().filter(|_| display.is_initialized()) {
        return Ok(driver);
    }

    let best = {
        let mut list = modules.lock();

        display.set_options(DriverOptions {
            test_only,
            use_fallback: false,
        });
        match match_and_initialize(&mut list, display)? {
            Some(driver) => Some(driver),
            None => {
                display.set_options(DriverOptions {
                    test_only,
                    use_fallback: true,
                });
                match_and_initialize(&mut list, display)?
            },
        }
    };

    let Some(driver) = best else {
        log::info!("No compatible driver for {} display {}", display.platform(), display.handle());
        return Err(Error::NoCompatibleDriver {
            platform: display.platform(),
        });
    };

    log::debug!(
        "the best driver is {}{}",
        driver.name(),
        if test_only { " (test only)" } else { "" }
    );
    if !test_only {
        display.pin_driver(Arc::clone(&driver));
    }
    Ok(driver)
}

/// One matching pass over the modules with the current display options
fn match_and_initialize(list: &mut ModuleList<'_>, display: &Display) -> Result<Option<Arc<dyn Driver>>> {
    if !list.populate()? {
        log::warn!("failed to find any driver");
        return Err(Error::NoDriverModules);
    }

    // a display that was terminated keeps its driver; no re-matching
    if let Some(pinned) = display.driver() {
        return Ok(match pinned.initialize(display) {
            Ok(()) => Some(pinned),
            Err(err) => {
                log::debug!("Driver {} rejected display {}: {}", pinned.name(), display.handle(), err);
                None
            },
        });
    }

    let mut index = 0;
    while index < list.len() {
        let driver = match list.load(index) {
            Ok(driver) => driver,
            Err(_) => {
                list.evict(index);
                continue;
            },
        };

        match driver.initialize(display) {
            Ok(()) => return Ok(Some(driver)),
            Err(err) => {
                log::debug!("Driver {} rejected display {}: {}", driver.name(), display.handle(), err);
                index += 1;
            },
        }
    }

    Ok(None)
}

/// Ask the loaded drivers, in priority order, for an exported function
///
/// The walk ends at the first module that has no loaded driver.
pub fn driver_proc(modules: &ModuleRegistry, name: &str) -> Option<ProcAddress> {
    modules
        .loaded_drivers()
        .iter()
        .find_map(|driver| driver.get_proc_address(name))
}
