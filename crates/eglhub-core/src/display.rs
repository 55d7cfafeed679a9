//! Displays and the locked handle that guards their resource lists
//!
//! A [`Display`] is created once per `(platform, native handle)` key by the
//! [`DisplayRegistry`](crate::registry::DisplayRegistry) and lives until
//! registry teardown. Its resource lists sit behind a per-display mutex;
//! locking it yields a [`DisplayGuard`], which is the only place reference
//! counts and list membership can change.

use crate::driver::Driver;
use crate::error::Result;
use crate::platform::{NativeHandle, Platform};
use crate::resource::{Context, Image, Resource, ResourceHandle, ResourceLists, ResourceType, Surface, SyncObject};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opaque token naming a display across the API boundary
///
/// Validated by identity scan against the registry, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHandle(usize);

impl DisplayHandle {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Driver selection flags a driver reads during `initialize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    /// Probe only: do not keep any per-display state
    pub test_only: bool,
    /// Second pass: accept software fallbacks
    pub use_fallback: bool,
}

/// One native display known to the runtime
pub struct Display {
    platform: Platform,
    native: NativeHandle,
    resources: Mutex<ResourceLists>,
    matching: Mutex<()>,
    initialized: AtomicBool,
    driver: RwLock<Option<Arc<dyn Driver>>>,
    test_only: AtomicBool,
    use_fallback: AtomicBool,
    driver_data: Mutex<Option<Box<dyn Any + Send + Sync>>>,
}

impl Display {
    pub(crate) fn new(platform: Platform, native: NativeHandle) -> Self {
        Self {
            platform,
            native,
            resources: Mutex::new(ResourceLists::default()),
            matching: Mutex::new(()),
            initialized: AtomicBool::new(false),
            driver: RwLock::new(None),
            test_only: AtomicBool::new(false),
            use_fallback: AtomicBool::new(false),
            driver_data: Mutex::new(None),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.native
    }

    pub fn handle(&self) -> DisplayHandle {
        DisplayHandle(self as *const Self as usize)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The pinned driver, if matching has ever succeeded on this display
    pub fn driver(&self) -> Option<Arc<dyn Driver>> {
        self.driver.read().clone()
    }

    pub fn options(&self) -> DriverOptions {
        DriverOptions {
            test_only: self.test_only.load(Ordering::Acquire),
            use_fallback: self.use_fallback.load(Ordering::Acquire),
        }
    }

    pub(crate) fn set_options(&self, options: DriverOptions) {
        self.test_only.store(options.test_only, Ordering::Release);
        self.use_fallback.store(options.use_fallback, Ordering::Release);
    }

    /// Pin `driver` and mark the display initialized
    ///
    /// A display never switches drivers once one is pinned.
    pub(crate) fn pin_driver(&self, driver: Arc<dyn Driver>) {
        let mut pinned = self.driver.write();
        if let Some(existing) = pinned.as_ref() {
            assert!(
                Arc::ptr_eq(existing, &driver),
                "display {} is already bound to driver {}",
                self.handle(),
                existing.name()
            );
        }
        *pinned = Some(driver);
        self.initialized.store(true, Ordering::Release);
    }

    pub(crate) fn mark_terminated(&self) {
        self.initialized.store(false, Ordering::Release);
    }

    /// Serializes first-time driver matching on this display
    pub(crate) fn lock_matching(&self) -> MutexGuard<'_, ()> {
        self.matching.lock()
    }

    /// Lock the resource lists
    pub fn lock(&self) -> DisplayGuard<'_> {
        DisplayGuard {
            display: self,
            lists: self.resources.lock(),
        }
    }

    /// Attach driver-private state, replacing any previous value
    pub fn set_driver_data<T: Any + Send + Sync>(&self, data: T) {
        *self.driver_data.lock() = Some(Box::new(data));
    }

    /// Run `f` on the driver-private state if it has type `T`
    pub fn with_driver_data<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut data = self.driver_data.lock();
        data.as_mut()
            .and_then(|data| data.downcast_mut::<T>())
            .map(f)
    }

    pub fn has_driver_data(&self) -> bool {
        self.driver_data.lock().is_some()
    }

    pub fn take_driver_data(&self) -> Option<Box<dyn Any + Send + Sync>> {
        self.driver_data.lock().take()
    }

    /// Destroy every resource still linked to this display
    ///
    /// Each list is drained head first: the resource is unlinked, then handed
    /// to the matching destroy operation of `driver`. A destroy failure is
    /// logged and the drain continues.
    pub fn release_resources(&self, driver: &dyn Driver) {
        let mut guard = self.lock();
        guard.drain::<Context>(|guard, ctx| driver.destroy_context(guard, ctx));
        guard.drain::<Surface>(|guard, surface| driver.destroy_surface(guard, surface));
        guard.drain::<Image>(|guard, image| driver.destroy_image(guard, image));
        guard.drain::<SyncObject>(|guard, sync| driver.destroy_sync(guard, sync));
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("platform", &self.platform)
            .field("native", &self.native)
            .field("initialized", &self.is_initialized())
            .field("driver", &self.driver.read().as_ref().map(|d| d.name().to_string()))
            .field("options", &self.options())
            .finish_non_exhaustive()
    }
}

/// A display with its resource lists locked
///
/// Every reference-count and list mutation goes through here. Each operation
/// asserts that the resource belongs to this display.
pub struct DisplayGuard<'a> {
    display: &'a Display,
    lists: MutexGuard<'a, ResourceLists>,
}

impl<'a> DisplayGuard<'a> {
    pub fn display(&self) -> &'a Display {
        self.display
    }

    fn assert_owned<T: Resource>(&self, resource: &T) {
        assert!(
            resource.base().belongs_to(self.display),
            "{} does not belong to display {}",
            T::TYPE,
            self.display.handle()
        );
    }

    /// Take an extra reference
    pub fn acquire<T: Resource>(&self, resource: &T) {
        self.assert_owned(resource);
        resource.base().get();
    }

    /// Drop a reference; true when the count reached zero
    ///
    /// Never frees. The caller drops its `Arc` when this returns true.
    pub fn release<T: Resource>(&self, resource: &T) -> bool {
        self.assert_owned(resource);
        resource.base().put()
    }

    /// Insert at the head of its type's list; the list holds a reference
    pub fn link<T: Resource>(&mut self, resource: &Arc<T>) {
        self.assert_owned(resource.as_ref());
        let base = resource.base();
        assert!(!base.is_linked(), "{} is already linked", T::TYPE);

        base.set_linked(true);
        self.lists.push_front(Arc::clone(resource));
        base.get();
    }

    /// Remove from its type's list and drop the list's reference
    pub fn unlink<T: Resource>(&mut self, resource: &Arc<T>) {
        self.assert_owned(resource.as_ref());
        assert!(
            self.lists.remove(resource),
            "{} is not linked to display {}",
            T::TYPE,
            self.display.handle()
        );

        let base = resource.base();
        base.set_linked(false);
        let freed = base.put();
        assert!(!freed, "unlinked {} had no other owner", T::TYPE);
    }

    /// Whether the list for `ty` holds a resource with this identity
    pub fn check_resource(&self, handle: ResourceHandle, ty: ResourceType) -> bool {
        self.lists.contains(handle, ty)
    }

    /// Resolve a handle to a linked resource of type `T`
    pub fn lookup<T: Resource>(&self, handle: ResourceHandle) -> Option<Arc<T>> {
        self.lists
            .iter::<T>()
            .find(|entry| ResourceHandle::of(entry) == handle)
            .cloned()
    }

    /// Linked resources of type `T`, most recently linked first
    pub fn resources<T: Resource>(&self) -> impl Iterator<Item = &Arc<T>> {
        self.lists.iter::<T>()
    }

    pub fn len(&self, ty: ResourceType) -> usize {
        self.lists.len(ty)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn drain<T: Resource>(&mut self, mut destroy: impl FnMut(&Self, Arc<T>) -> Result<()>) {
        while let Some(head) = self.lists.head::<T>().cloned() {
            self.unlink(&head);
            if let Err(err) = destroy(self, head) {
                log::warn!("Failed to destroy {} on display {}: {}", T::TYPE, self.display.handle(), err);
            }
        }
        assert_eq!(self.lists.len(T::TYPE), 0, "{} list not empty after release", T::TYPE);
    }
}

impl fmt::Debug for DisplayGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayGuard")
            .field("display", &self.display.handle())
            .field("lists", &*self.lists)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::resource::{ContextAttribs, ImageAttribs, SurfaceAttribs, SurfaceKind, SyncKind};
    use std::sync::atomic::AtomicUsize;

    fn display(native: usize) -> Arc<Display> {
        Arc::new(Display::new(Platform::X11, NativeHandle(native)))
    }

    /// Counts destroys and releases the caller's reference like a real driver
    #[derive(Default)]
    struct CountingDriver {
        destroyed: AtomicUsize,
    }

    impl CountingDriver {
        fn finish<T: Resource>(&self, guard: &DisplayGuard<'_>, resource: Arc<T>) -> Result<()> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            assert!(!resource.base().is_linked());
            assert!(guard.release(resource.as_ref()));
            Ok(())
        }
    }

    impl Driver for CountingDriver {
        fn name(&self) -> &str {
            "counting"
        }

        fn initialize(&self, _display: &Display) -> Result<()> {
            Ok(())
        }

        fn terminate(&self, _display: &Display) {}

        fn destroy_context(&self, guard: &DisplayGuard<'_>, context: Arc<Context>) -> Result<()> {
            self.finish(guard, context)
        }

        fn destroy_surface(&self, guard: &DisplayGuard<'_>, surface: Arc<Surface>) -> Result<()> {
            self.finish(guard, surface)
        }

        fn destroy_image(&self, guard: &DisplayGuard<'_>, image: Arc<Image>) -> Result<()> {
            self.finish(guard, image)
        }

        fn destroy_sync(&self, guard: &DisplayGuard<'_>, sync: Arc<SyncObject>) -> Result<()> {
            self.finish(guard, sync)
        }
    }

    #[test]
    fn test_link_unlink_round_trip() {
        let dpy = display(1);
        let ctx = Arc::new(Context::new(&dpy, ContextAttribs::default()));
        let mut guard = dpy.lock();

        guard.link(&ctx);
        assert_eq!(ctx.base().ref_count(), 2);
        assert!(ctx.base().is_linked());
        assert!(guard.check_resource(ResourceHandle::of(&ctx), ResourceType::Context));

        guard.unlink(&ctx);
        assert_eq!(ctx.base().ref_count(), 1);
        assert!(!ctx.base().is_linked());
        assert!(!guard.check_resource(ResourceHandle::of(&ctx), ResourceType::Context));
        assert!(guard.is_empty());
    }

    #[test]
    fn test_lookup_and_order() {
        let dpy = display(1);
        let first = Arc::new(Image::new(&dpy, ImageAttribs { width: 1, height: 1 }));
        let second = Arc::new(Image::new(&dpy, ImageAttribs { width: 2, height: 2 }));
        let mut guard = dpy.lock();
        guard.link(&first);
        guard.link(&second);

        let widths: Vec<u32> = guard.resources::<Image>().map(|i| i.attribs().width).collect();
        assert_eq!(widths, vec![2, 1]);

        let found = guard.lookup::<Image>(ResourceHandle::of(&first)).unwrap();
        assert!(Arc::ptr_eq(&found, &first));
        assert!(guard.lookup::<Context>(ResourceHandle::of(&first)).is_none());
        assert_eq!(guard.len(ResourceType::Image), 2);
    }

    #[test]
    #[should_panic(expected = "already linked")]
    fn test_double_link_panics() {
        let dpy = display(1);
        let sync = Arc::new(SyncObject::new(&dpy, SyncKind::Fence));
        let mut guard = dpy.lock();
        guard.link(&sync);
        guard.link(&sync);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_foreign_resource_panics() {
        let owner = display(1);
        let other = display(2);
        let ctx = Arc::new(Context::new(&owner, ContextAttribs::default()));
        other.lock().link(&ctx);
    }

    #[test]
    #[should_panic(expected = "not linked")]
    fn test_unlink_unlinked_panics() {
        let dpy = display(1);
        let ctx = Arc::new(Context::new(&dpy, ContextAttribs::default()));
        dpy.lock().unlink(&ctx);
    }

    #[test]
    fn test_release_resources_empty() {
        let dpy = display(1);
        let driver = CountingDriver::default();
        dpy.release_resources(&driver);
        assert_eq!(driver.destroyed.load(Ordering::SeqCst), 0);
        assert!(dpy.lock().is_empty());
    }

    #[test]
    fn test_release_resources_single_and_many() {
        let dpy = display(1);
        let driver = CountingDriver::default();
        let mut held = Vec::new();
        {
            let mut guard = dpy.lock();
            let ctx = Arc::new(Context::new(&dpy, ContextAttribs::default()));
            guard.link(&ctx);
            for _ in 0..3 {
                let surface = Arc::new(Surface::new(
                    &dpy,
                    SurfaceKind::Pbuffer,
                    NativeHandle::DEFAULT,
                    SurfaceAttribs::default(),
                ));
                guard.link(&surface);
                held.push(surface);
            }
            // the context's creator reference is handed over to the list
            drop(ctx);
        }

        dpy.release_resources(&driver);
        assert_eq!(driver.destroyed.load(Ordering::SeqCst), 4);
        assert!(dpy.lock().is_empty());
        for surface in &held {
            assert_eq!(surface.base().ref_count(), 0);
            assert!(!surface.base().is_linked());
        }
    }

    #[test]
    fn test_release_resources_continues_after_destroy_error() {
        struct FailingDriver;

        impl Driver for FailingDriver {
            fn name(&self) -> &str {
                "failing"
            }

            fn initialize(&self, _display: &Display) -> Result<()> {
                Ok(())
            }

            fn terminate(&self, _display: &Display) {}
        }

        let dpy = display(1);
        let a = Arc::new(SyncObject::new(&dpy, SyncKind::Fence));
        let b = Arc::new(SyncObject::new(&dpy, SyncKind::Fence));
        {
            let mut guard = dpy.lock();
            guard.link(&a);
            guard.link(&b);
        }

        // default destroy_sync reports Unsupported; the drain still empties the list
        dpy.release_resources(&FailingDriver);
        assert!(dpy.lock().is_empty());
        assert_eq!(a.base().ref_count(), 1);
        assert!(matches!(
            FailingDriver.destroy_sync(&dpy.lock(), b),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_driver_data() {
        let dpy = display(1);
        assert!(!dpy.has_driver_data());
        dpy.set_driver_data(5u32);
        assert_eq!(dpy.with_driver_data(|n: &mut u32| { *n += 1; *n }), Some(6));
        assert_eq!(dpy.with_driver_data(|n: &mut u64| *n), None);
        assert!(dpy.take_driver_data().is_some());
        assert!(!dpy.has_driver_data());
    }

    #[test]
    fn test_pin_driver_marks_initialized() {
        let dpy = display(1);
        let driver: Arc<dyn Driver> = Arc::new(CountingDriver::default());
        dpy.pin_driver(Arc::clone(&driver));
        assert!(dpy.is_initialized());
        dpy.mark_terminated();
        assert!(!dpy.is_initialized());
        assert!(Arc::ptr_eq(&dpy.driver().unwrap(), &driver));
        dpy.pin_driver(driver);
        assert!(dpy.is_initialized());
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_pin_other_driver_panics() {
        let dpy = display(1);
        dpy.pin_driver(Arc::new(CountingDriver::default()));
        dpy.pin_driver(Arc::new(CountingDriver::default()));
    }
}
