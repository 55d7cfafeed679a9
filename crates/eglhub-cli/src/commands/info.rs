//! Info command implementation
//!
//! Shows the effective configuration and the driver modules in priority order.

use crate::cli::InfoArgs;
use anyhow::Result;
use eglhub::Runtime;

pub fn run(runtime: &Runtime, args: &InfoArgs) -> Result<()> {
    if !args.drivers {
        let config = runtime.config();
        println!("eglhub v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Configuration:");
        println!("  native platform   {}", runtime.native_platform());
        println!("  driver override   {}", config.driver.as_deref().unwrap_or("(none)"));
        println!("  driver arguments  {}", config.driver_args.as_deref().unwrap_or("(none)"));
        println!("  log level         {:?}", config.log_level());
        println!();
    }

    println!("Driver modules (priority order):");
    let builtins = runtime.modules().builtins();
    if builtins.is_empty() {
        println!("  (none - build with --features dri2 or haiku)");
    }
    for builtin in builtins {
        let selected = match runtime.config().driver.as_deref() {
            Some(name) if name == builtin.name => "  [EGL_DRIVER]",
            _ => "",
        };
        println!("  {}{}", builtin.name, selected);
    }

    Ok(())
}
