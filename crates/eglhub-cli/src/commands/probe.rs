//! Probe command implementation
//!
//! Resolves a display, matches a driver against it and reports the result.
//! With `--resources` it also exercises the create/destroy path and
//! terminates the display again.

use crate::cli::ProbeArgs;
use anyhow::{Context as _, Result};
use eglhub::{ContextAttribs, Display, ImageAttribs, ResourceType, Runtime, SurfaceAttribs, SyncKind};
use std::sync::Arc;

pub fn run(runtime: &Runtime, args: &ProbeArgs) -> Result<()> {
    let display = match args.platform {
        Some(platform) => runtime.get_platform_display(platform, args.native, &[]),
        None => runtime.get_display(args.native),
    }
    .context("failed to get display")?;

    println!("Display {} ({} {})", display.handle(), display.platform(), display.native_handle());

    let driver = if args.test_only {
        runtime.probe(&display)
    } else {
        runtime.initialize(&display)
    }
    .with_context(|| format!("no driver for {} display", display.platform()))?;

    let options = display.options();
    println!("  driver            {}", driver.name());
    println!("  pass              {}", if options.use_fallback { "fallback" } else { "preferred" });
    println!("  initialized       {}", display.is_initialized());

    if args.resources {
        exercise_resources(runtime, &display)?;
    }
    Ok(())
}

fn exercise_resources(runtime: &Runtime, display: &Arc<Display>) -> Result<()> {
    let size = SurfaceAttribs { width: 64, height: 64 };

    // unsupported kinds are reported, not fatal
    let created = [
        ("context", runtime.create_context(display, &ContextAttribs::default()).map(|_| ())),
        ("pbuffer", runtime.create_pbuffer_surface(display, &size).map(|_| ())),
        (
            "image",
            runtime
                .create_image(display, &ImageAttribs { width: 64, height: 64 })
                .map(|_| ()),
        ),
        ("sync", runtime.create_sync(display, SyncKind::Fence).map(|_| ())),
    ];
    for (kind, result) in &created {
        match result {
            Ok(()) => println!("  create {:<10} ok", kind),
            Err(err) => println!("  create {:<10} {}", kind, err),
        }
    }

    {
        let guard = display.lock();
        let counts: Vec<String> = ResourceType::ALL
            .iter()
            .map(|&ty| format!("{}={}", ty, guard.len(ty)))
            .collect();
        println!("  linked            {}", counts.join(" "));
    }

    runtime.terminate(display).context("failed to terminate display")?;
    println!("  terminated        resources left: {}", !display.lock().is_empty());
    Ok(())
}
