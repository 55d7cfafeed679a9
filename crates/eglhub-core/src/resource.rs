//! Resource Base: the bookkeeping every display-owned object shares
//!
//! Contexts, surfaces, images and sync objects all embed a [`ResourceBase`].
//! It carries a back-reference to the owning display (never ownership), a
//! reference count that starts at one for the creator, and a linked flag.
//!
//! The count and the flag can be read by anyone, but only changed through a
//! [`DisplayGuard`](crate::display::DisplayGuard), so every mutation happens
//! with the owning display locked.
//!
//! ## Lifetime of a resource
//!
//! 1. A driver builds it with `Context::new` and friends (count = 1)
//! 2. The runtime links it into the display's list (count = 2: caller + registry)
//! 3. Destroying it unlinks it (count = 1) and hands it to the driver
//! 4. The driver releases the caller's reference and frees it at zero

use crate::display::Display;
use crate::platform::NativeHandle;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Backend-private payload attached to a resource at creation
pub type DriverData = Box<dyn Any + Send + Sync>;

/// The kinds of objects a display keeps lists of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Context,
    Surface,
    Image,
    Sync,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Context,
        ResourceType::Surface,
        ResourceType::Image,
        ResourceType::Sync,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Context => "context",
            ResourceType::Surface => "surface",
            ResourceType::Image => "image",
            ResourceType::Sync => "sync",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ownership and reference-count state embedded in every resource
pub struct ResourceBase {
    display: Weak<Display>,
    ref_count: AtomicUsize,
    linked: AtomicBool,
}

impl ResourceBase {
    /// Fresh state owned by `display`: one reference, not linked
    pub fn new(display: &Arc<Display>) -> Self {
        Self {
            display: Arc::downgrade(display),
            ref_count: AtomicUsize::new(1),
            linked: AtomicBool::new(false),
        }
    }

    /// The owning display, if it is still alive
    pub fn display(&self) -> Option<Arc<Display>> {
        self.display.upgrade()
    }

    /// Whether `display` is the owner (identity, not equality)
    pub fn belongs_to(&self, display: &Display) -> bool {
        std::ptr::eq(self.display.as_ptr(), display)
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }

    pub(crate) fn get(&self) {
        let previous = self.ref_count.fetch_add(1, Ordering::AcqRel);
        assert!(previous > 0, "acquired a resource with no references");
    }

    /// Returns true when the last reference went away
    pub(crate) fn put(&self) -> bool {
        let previous = self.ref_count.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "released a resource with no references");
        previous == 1
    }

    pub(crate) fn set_linked(&self, linked: bool) {
        self.linked.store(linked, Ordering::Release);
    }
}

impl fmt::Debug for ResourceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBase")
            .field("ref_count", &self.ref_count())
            .field("linked", &self.is_linked())
            .finish()
    }
}

/// Opaque token naming a resource across the API boundary
///
/// Derived from the resource's address. It is only compared against live
/// list entries and is never turned back into a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(usize);

impl ResourceHandle {
    pub fn of<T: Resource>(resource: &Arc<T>) -> Self {
        Self(Arc::as_ptr(resource) as usize)
    }

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A display-owned object: one of [`Context`], [`Surface`], [`Image`] or
/// [`SyncObject`]
pub trait Resource: sealed::Sealed + Send + Sync + Sized + 'static {
    /// Which of the display's lists this kind lives in
    const TYPE: ResourceType;

    fn base(&self) -> &ResourceBase;

    #[doc(hidden)]
    fn list(lists: &ResourceLists) -> &Vec<Arc<Self>>;

    #[doc(hidden)]
    fn list_mut(lists: &mut ResourceLists) -> &mut Vec<Arc<Self>>;
}

macro_rules! impl_resource {
    ($ty:ident, $kind:ident, $field:ident) => {
        impl sealed::Sealed for $ty {}

        impl Resource for $ty {
            const TYPE: ResourceType = ResourceType::$kind;

            fn base(&self) -> &ResourceBase {
                &self.base
            }

            fn list(lists: &ResourceLists) -> &Vec<Arc<Self>> {
                &lists.$field
            }

            fn list_mut(lists: &mut ResourceLists) -> &mut Vec<Arc<Self>> {
                &mut lists.$field
            }
        }
    };
}

impl_resource!(Context, Context, contexts);
impl_resource!(Surface, Surface, surfaces);
impl_resource!(Image, Image, images);
impl_resource!(SyncObject, Sync, syncs);

/// The per-type resource lists of one display
///
/// Each list is kept most-recently-linked first. Internally the head is the
/// end of the vector, so pushing and popping the head are O(1) and removing
/// an arbitrary entry is a linear scan.
#[derive(Default)]
pub struct ResourceLists {
    contexts: Vec<Arc<Context>>,
    surfaces: Vec<Arc<Surface>>,
    images: Vec<Arc<Image>>,
    syncs: Vec<Arc<SyncObject>>,
}

impl ResourceLists {
    pub(crate) fn head<T: Resource>(&self) -> Option<&Arc<T>> {
        T::list(self).last()
    }

    pub(crate) fn push_front<T: Resource>(&mut self, resource: Arc<T>) {
        T::list_mut(self).push(resource);
    }

    /// Remove by identity; false if the resource is not in the list
    pub(crate) fn remove<T: Resource>(&mut self, resource: &Arc<T>) -> bool {
        let list = T::list_mut(self);
        match list.iter().rposition(|entry| Arc::ptr_eq(entry, resource)) {
            Some(index) => {
                list.remove(index);
                true
            },
            None => false,
        }
    }

    /// Head first, i.e. reverse link order
    pub(crate) fn iter<T: Resource>(&self) -> impl Iterator<Item = &Arc<T>> {
        T::list(self).iter().rev()
    }

    pub(crate) fn contains(&self, handle: ResourceHandle, ty: ResourceType) -> bool {
        fn scan<T: Resource>(list: &[Arc<T>], handle: ResourceHandle) -> bool {
            list.iter().any(|entry| ResourceHandle::of(entry) == handle)
        }

        match ty {
            ResourceType::Context => scan(&self.contexts, handle),
            ResourceType::Surface => scan(&self.surfaces, handle),
            ResourceType::Image => scan(&self.images, handle),
            ResourceType::Sync => scan(&self.syncs, handle),
        }
    }

    pub fn len(&self, ty: ResourceType) -> usize {
        match ty {
            ResourceType::Context => self.contexts.len(),
            ResourceType::Surface => self.surfaces.len(),
            ResourceType::Image => self.images.len(),
            ResourceType::Sync => self.syncs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceType::ALL.into_iter().all(|ty| self.len(ty) == 0)
    }
}

impl fmt::Debug for ResourceLists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLists")
            .field("contexts", &self.contexts.len())
            .field("surfaces", &self.surfaces.len())
            .field("images", &self.images.len())
            .field("syncs", &self.syncs.len())
            .finish()
    }
}

fn downcast<T: Any>(data: &Option<DriverData>) -> Option<&T> {
    data.as_ref().and_then(|data| data.downcast_ref::<T>())
}

/// Client rendering APIs a context can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientApi {
    OpenGl,
    OpenGlEs,
    OpenVg,
}

/// What the caller asked for when creating a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttribs {
    pub api: ClientApi,
    pub major_version: u32,
    pub minor_version: u32,
}

impl Default for ContextAttribs {
    fn default() -> Self {
        Self {
            api: ClientApi::OpenGlEs,
            major_version: 1,
            minor_version: 0,
        }
    }
}

/// A rendering context
pub struct Context {
    base: ResourceBase,
    attribs: ContextAttribs,
    driver_data: Option<DriverData>,
}

impl Context {
    pub fn new(display: &Arc<Display>, attribs: ContextAttribs) -> Self {
        Self {
            base: ResourceBase::new(display),
            attribs,
            driver_data: None,
        }
    }

    pub fn with_driver_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.driver_data = Some(Box::new(data));
        self
    }

    pub fn attribs(&self) -> &ContextAttribs {
        &self.attribs
    }

    pub fn driver_data<T: Any>(&self) -> Option<&T> {
        downcast(&self.driver_data)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("base", &self.base)
            .field("attribs", &self.attribs)
            .finish_non_exhaustive()
    }
}

/// Where a surface's pixels live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Window,
    Pixmap,
    Pbuffer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceAttribs {
    pub width: u32,
    pub height: u32,
}

/// A drawing surface
pub struct Surface {
    base: ResourceBase,
    kind: SurfaceKind,
    native: NativeHandle,
    attribs: SurfaceAttribs,
    driver_data: Option<DriverData>,
}

impl Surface {
    /// `native` is the window or pixmap handle; pbuffers use the default handle
    pub fn new(
        display: &Arc<Display>,
        kind: SurfaceKind,
        native: NativeHandle,
        attribs: SurfaceAttribs,
    ) -> Self {
        Self {
            base: ResourceBase::new(display),
            kind,
            native,
            attribs,
            driver_data: None,
        }
    }

    pub fn with_driver_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.driver_data = Some(Box::new(data));
        self
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.native
    }

    pub fn attribs(&self) -> &SurfaceAttribs {
        &self.attribs
    }

    pub fn driver_data<T: Any>(&self) -> Option<&T> {
        downcast(&self.driver_data)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("base", &self.base)
            .field("kind", &self.kind)
            .field("native", &self.native)
            .field("attribs", &self.attribs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageAttribs {
    pub width: u32,
    pub height: u32,
}

/// An image shared between client APIs
pub struct Image {
    base: ResourceBase,
    attribs: ImageAttribs,
    driver_data: Option<DriverData>,
}

impl Image {
    pub fn new(display: &Arc<Display>, attribs: ImageAttribs) -> Self {
        Self {
            base: ResourceBase::new(display),
            attribs,
            driver_data: None,
        }
    }

    pub fn with_driver_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.driver_data = Some(Box::new(data));
        self
    }

    pub fn attribs(&self) -> &ImageAttribs {
        &self.attribs
    }

    pub fn driver_data<T: Any>(&self) -> Option<&T> {
        downcast(&self.driver_data)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("base", &self.base)
            .field("attribs", &self.attribs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
    Fence,
    Reusable,
}

/// A synchronization object
///
/// Named `SyncObject` so it does not shadow the `Sync` marker trait.
pub struct SyncObject {
    base: ResourceBase,
    kind: SyncKind,
    driver_data: Option<DriverData>,
}

impl SyncObject {
    pub fn new(display: &Arc<Display>, kind: SyncKind) -> Self {
        Self {
            base: ResourceBase::new(display),
            kind,
            driver_data: None,
        }
    }

    pub fn with_driver_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.driver_data = Some(Box::new(data));
        self
    }

    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    pub fn driver_data<T: Any>(&self) -> Option<&T> {
        downcast(&self.driver_data)
    }
}

impl fmt::Debug for SyncObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncObject")
            .field("base", &self.base)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
