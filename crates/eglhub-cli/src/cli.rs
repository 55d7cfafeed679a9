//! CLI argument definitions using Clap v4

use clap::{Parser, Subcommand};
use eglhub::{NativeHandle, Platform};

/// eglhub - inspect displays and driver matching
#[derive(Parser, Debug)]
#[command(name = "eglhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only load this built-in driver module (overrides EGL_DRIVER)
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Argument string handed to driver entry points, e.g. device-dir=/dev/dri
    #[arg(long = "driver-args", global = true)]
    pub driver_args: Option<String>,

    /// Log more (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the configuration and the compiled-in drivers
    #[command(alias = "i")]
    Info(InfoArgs),

    /// Match a driver against a display
    #[command(alias = "p")]
    Probe(ProbeArgs),

    /// Look up an exported function in the loaded drivers
    Proc(ProcArgs),
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// List driver modules only
    #[arg(long)]
    pub drivers: bool,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Platform of the display (defaults to the native platform)
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// Native display handle, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0", value_parser = parse_native)]
    pub native: NativeHandle,

    /// Pick a driver without initializing the display
    #[arg(long)]
    pub test_only: bool,

    /// After initializing, create one resource of each kind and terminate
    #[arg(long, conflicts_with = "test_only")]
    pub resources: bool,
}

#[derive(Parser, Debug)]
pub struct ProcArgs {
    /// Function name, e.g. glFlush
    pub name: String,
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse::<Platform>().map_err(|_| {
        let names: Vec<&str> = Platform::ALL.iter().map(|p| p.name()).collect();
        format!("unknown platform '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn parse_native(s: &str) -> Result<NativeHandle, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse::<usize>(),
    };
    parsed
        .map(NativeHandle)
        .map_err(|e| format!("invalid native handle '{}': {}", s, e))
}
