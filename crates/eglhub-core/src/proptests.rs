use super::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn platform() -> impl Strategy<Value = Platform> {
    (0..Platform::ALL.len()).prop_map(|i| Platform::ALL[i])
}

// Property: release reports zero exactly once, after as many releases as references
proptest! {
    #[test]
    fn prop_acquire_release_accounting(extra in 0usize..32) {
        let registry = DisplayRegistry::new();
        let display = registry.find_or_create(Platform::X11, NativeHandle(1)).unwrap();
        let ctx = Context::new(&display, ContextAttribs::default());
        let guard = display.lock();

        for _ in 0..extra {
            guard.acquire(&ctx);
        }
        prop_assert_eq!(ctx.base().ref_count(), extra + 1);

        for _ in 0..extra {
            prop_assert!(!guard.release(&ctx));
        }
        prop_assert!(guard.release(&ctx));
        prop_assert_eq!(ctx.base().ref_count(), 0);
    }
}

// Property: equal keys share one display, distinct keys never do
proptest! {
    #[test]
    fn prop_find_or_create_identity(keys in prop::collection::vec((platform(), 0usize..6), 1..40)) {
        let registry = DisplayRegistry::new();
        let mut seen: Vec<((Platform, usize), Arc<Display>)> = Vec::new();

        for (platform, native) in keys {
            let display = registry.find_or_create(platform, NativeHandle(native)).unwrap();
            match seen.iter().find(|(key, _)| *key == (platform, native)) {
                Some((_, first)) => prop_assert!(Arc::ptr_eq(first, &display)),
                None => {
                    for (_, other) in &seen {
                        prop_assert!(!Arc::ptr_eq(other, &display));
                    }
                    seen.push(((platform, native), display));
                },
            }
        }

        prop_assert_eq!(registry.len(), seen.len());
        let handles: HashSet<DisplayHandle> = seen.iter().map(|(_, d)| d.handle()).collect();
        prop_assert_eq!(handles.len(), seen.len());
    }
}

// Property: after any mix of unlinks, linked resources hold two references and unlinked ones one
proptest! {
    #[test]
    fn prop_link_unlink_counts(unlink in prop::collection::vec(any::<bool>(), 0..16)) {
        let registry = DisplayRegistry::new();
        let display = registry.find_or_create(Platform::Drm, NativeHandle(2)).unwrap();
        let syncs: Vec<Arc<SyncObject>> = unlink
            .iter()
            .map(|_| Arc::new(SyncObject::new(&display, SyncKind::Fence)))
            .collect();

        let mut guard = display.lock();
        for sync in &syncs {
            guard.link(sync);
        }
        for (sync, &drop_it) in syncs.iter().zip(&unlink) {
            if drop_it {
                guard.unlink(sync);
            }
        }

        let still_linked = unlink.iter().filter(|&&u| !u).count();
        prop_assert_eq!(guard.len(ResourceType::Sync), still_linked);
        for (sync, &dropped) in syncs.iter().zip(&unlink) {
            let expected = if dropped { 1 } else { 2 };
            prop_assert_eq!(sync.base().ref_count(), expected);
            prop_assert_eq!(sync.base().is_linked(), !dropped);
            prop_assert_eq!(
                guard.check_resource(ResourceHandle::of(sync), ResourceType::Sync),
                !dropped
            );
        }
    }
}
