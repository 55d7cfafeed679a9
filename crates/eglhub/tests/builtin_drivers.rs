use eglhub::{NativeHandle, Platform, RuntimeConfig};

fn names() -> Vec<String> {
    eglhub::builtin_drivers().into_iter().map(|d| d.name).collect()
}

#[test]
fn test_builtins_follow_priority_order() {
    let mut expected = Vec::new();
    if cfg!(feature = "dri2") {
        expected.push("egl_dri2");
    }
    if cfg!(feature = "haiku") {
        expected.push("egl_haiku");
    }
    assert_eq!(names(), expected);
}

#[cfg(feature = "dri2")]
#[test]
fn test_dri2_drives_x11_with_fake_devices() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dri = tempfile::tempdir().unwrap();
    std::fs::File::create(dri.path().join("renderD128")).unwrap();

    let config = RuntimeConfig::new().with_driver_args(format!("device-dir={}", dri.path().display()));
    let runtime = eglhub::runtime(config);
    let display = runtime.get_display(NativeHandle(0x10)).unwrap();
    let driver = runtime.initialize(&display).unwrap();
    assert_eq!(driver.name(), eglhub::dri2::DRIVER_NAME);
    assert!(!display.options().use_fallback);
}

#[cfg(all(feature = "dri2", feature = "haiku"))]
#[test]
fn test_haiku_display_falls_through_to_haiku() {
    let runtime = eglhub::runtime(RuntimeConfig::new());
    let display = runtime
        .get_platform_display(Platform::Haiku, NativeHandle(0x1), &[])
        .unwrap();
    assert_eq!(runtime.initialize(&display).unwrap().name(), eglhub::haiku::DRIVER_NAME);
    assert_eq!(runtime.modules().module_names(), vec!["egl_dri2", "egl_haiku"]);
}

#[cfg(all(feature = "dri2", feature = "haiku"))]
#[test]
fn test_driver_override_restricts_modules() {
    let runtime = eglhub::runtime(RuntimeConfig::new().with_driver("egl_haiku"));
    let display = runtime
        .get_platform_display(Platform::X11, NativeHandle(0x1), &[])
        .unwrap();
    assert!(runtime.initialize(&display).is_err());
    assert_eq!(runtime.modules().module_names(), vec!["egl_haiku"]);
}

#[test]
fn test_unknown_platform_name() {
    assert!("gdi".parse::<Platform>().is_err());
    assert_eq!("wayland".parse::<Platform>().unwrap(), Platform::Wayland);
}
