//! Proc command implementation: exported function lookup

use crate::cli::ProcArgs;
use anyhow::{bail, Result};
use eglhub::Runtime;

pub fn run(runtime: &Runtime, args: &ProcArgs) -> Result<()> {
    match runtime.get_proc_address(&args.name) {
        Some(address) => {
            println!("{} = {:p}", args.name, address as *const ());
            Ok(())
        },
        None => bail!("no loaded driver exports {}", args.name),
    }
}
