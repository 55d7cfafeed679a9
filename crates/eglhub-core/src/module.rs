//! The module registry: candidate drivers in priority order
//!
//! Modules are registered lazily on the first match. Each one is a name plus
//! an optional built-in entry point; its driver is only built the first time
//! matching reaches it, and is then cached until teardown.

use crate::driver::{BuiltinDriver, Driver, DriverEntryPoint};
use crate::error::{Error, Result};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Initial capacity of the module array
const INITIAL_MODULES: usize = 8;

/// One candidate driver
pub struct Module {
    name: String,
    builtin: Option<DriverEntryPoint>,
    driver: Option<Arc<dyn Driver>>,
}

impl Module {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            builtin: None,
            driver: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }

    /// The driver, once loaded
    pub fn driver(&self) -> Option<&Arc<dyn Driver>> {
        self.driver.as_ref()
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            log::debug!("Unloading driver {} from module {}", driver.name(), self.name);
            driver.unload();
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("builtin", &self.is_builtin())
            .field("driver", &self.driver.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}

/// The set of driver modules known to the process
pub struct ModuleRegistry {
    builtins: Vec<BuiltinDriver>,
    driver_override: Option<String>,
    driver_args: Option<String>,
    /// `None` until the first registration
    modules: Mutex<Option<Vec<Module>>>,
}

impl ModuleRegistry {
    /// `builtins` are in priority order; `driver_override` restricts
    /// population to the built-in with exactly that name
    pub fn new(
        builtins: Vec<BuiltinDriver>,
        driver_override: Option<String>,
        driver_args: Option<String>,
    ) -> Self {
        Self {
            builtins,
            driver_override,
            driver_args,
            modules: Mutex::new(None),
        }
    }

    /// Take the module-matching lock
    pub fn lock(&self) -> ModuleList<'_> {
        ModuleList {
            registry: self,
            modules: self.modules.lock(),
        }
    }

    pub fn builtins(&self) -> &[BuiltinDriver] {
        &self.builtins
    }

    /// Names of the registered modules, in priority order
    pub fn module_names(&self) -> Vec<String> {
        self.lock().modules().map(|m| m.name().to_string()).collect()
    }

    /// Loaded drivers in priority order, stopping at the first module that
    /// has not been loaded
    pub fn loaded_drivers(&self) -> Vec<Arc<dyn Driver>> {
        self.lock()
            .modules()
            .map_while(|m| m.driver().cloned())
            .collect()
    }

    /// Whether any module has a loaded driver
    pub fn any_loaded(&self) -> bool {
        self.lock().modules().any(|m| m.driver().is_some())
    }

    /// Unload every driver and forget every module
    pub fn teardown_all(&self) -> usize {
        let modules = self.modules.lock().take().unwrap_or_default();
        let count = modules.len();
        // Module::drop unloads the driver
        drop(modules);
        count
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("builtins", &self.builtins)
            .field("driver_override", &self.driver_override)
            .field("modules", &*self.modules.lock())
            .finish()
    }
}

/// The module registry with the matching lock held
pub struct ModuleList<'a> {
    registry: &'a ModuleRegistry,
    modules: MutexGuard<'a, Option<Vec<Module>>>,
}

impl ModuleList<'_> {
    /// Registered modules, in priority order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.modules.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether population has registered anything yet
    pub fn is_populated(&self) -> bool {
        self.modules.is_some()
    }

    /// Add a module by name, or return the index of the existing one
    pub fn register(&mut self, name: &str) -> Result<usize> {
        if self.modules.is_none() {
            let mut modules = Vec::new();
            modules.try_reserve(INITIAL_MODULES).map_err(|_| {
                log::error!("Failed to allocate the module array");
                Error::OutOfMemory
            })?;
            *self.modules = Some(modules);
        }

        let modules = self.modules.get_or_insert_with(Vec::new);
        if let Some(index) = modules.iter().position(|m| m.name == name) {
            return Ok(index);
        }

        modules.try_reserve(1).map_err(|_| {
            log::error!("Failed to allocate module {}", name);
            Error::OutOfMemory
        })?;
        modules.push(Module::new(name));
        log::debug!("Registered driver module {}", name);
        Ok(modules.len() - 1)
    }

    /// Register a built-in and bind its entry point
    pub fn register_builtin(&mut self, builtin: &BuiltinDriver) -> Result<usize> {
        let index = self.register(&builtin.name)?;
        if let Some(module) = self.modules.as_mut().and_then(|m| m.get_mut(index)) {
            module.builtin = Some(Arc::clone(&builtin.entry));
        }
        Ok(index)
    }

    /// Register the default module set, once
    ///
    /// A driver override that names a built-in registers just that one;
    /// otherwise every built-in is registered in priority order. Returns
    /// whether any module array exists afterwards.
    pub fn populate(&mut self) -> Result<bool> {
        if self.is_populated() {
            return Ok(true);
        }

        let registry = self.registry;
        let chosen = registry.driver_override.as_deref().and_then(|name| {
            let found = registry.builtins.iter().find(|b| b.name == name);
            if found.is_none() {
                log::info!("Driver override {} is not a built-in, using all built-ins", name);
            }
            found
        });

        match chosen {
            Some(builtin) => {
                self.register_builtin(builtin)?;
            },
            None => {
                for builtin in &registry.builtins {
                    self.register_builtin(builtin)?;
                }
            },
        }

        Ok(self.is_populated())
    }

    /// Build the driver of the module at `index`, or return the cached one
    pub fn load(&mut self, index: usize) -> Result<Arc<dyn Driver>> {
        let args = self.registry.driver_args.as_deref();
        let module = self
            .modules
            .as_mut()
            .and_then(|m| m.get_mut(index))
            .ok_or(Error::InvalidHandle)?;

        if let Some(driver) = &module.driver {
            return Ok(Arc::clone(driver));
        }

        let Some(entry) = module.builtin.as_ref() else {
            log::warn!("No entry point for driver module {}", module.name);
            return Err(Error::ModuleLoad {
                name: module.name.clone(),
            });
        };

        match entry(args) {
            Some(driver) if !driver.name().is_empty() => {
                log::debug!("Loaded driver {} from module {}", driver.name(), module.name);
                module.driver = Some(Arc::clone(&driver));
                Ok(driver)
            },
            Some(_) => {
                log::warn!("Driver loaded from {} has no name", module.name);
                Err(Error::ModuleLoad {
                    name: module.name.clone(),
                })
            },
            None => {
                log::warn!("Driver module {} has no usable driver", module.name);
                Err(Error::ModuleLoad {
                    name: module.name.clone(),
                })
            },
        }
    }

    /// Drop the module at `index`; later modules shift down
    pub fn evict(&mut self, index: usize) {
        if let Some(modules) = self.modules.as_mut() {
            if index < modules.len() {
                let module = modules.remove(index);
                log::debug!("Evicted driver module {}", module.name);
            }
        }
    }
}

impl fmt::Debug for ModuleList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.modules()).finish()
    }
}
