//! Error types for eglhub

use crate::platform::Platform;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for eglhub
///
/// Contract violations (releasing a resource below zero, linking a linked
/// resource, re-matching an initialized display) are not represented here.
/// They are caller bugs and fail an assertion instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("No compatible driver for {platform} display")]
    NoCompatibleDriver { platform: Platform },

    #[error("Failed to find any driver")]
    NoDriverModules,

    #[error("Invalid display handle")]
    InvalidHandle,

    #[error("Failed to load driver module: {name}")]
    ModuleLoad { name: String },

    #[error("Display is not initialized")]
    NotInitialized,

    #[error("Resource is not linked to this display")]
    BadResource,

    #[error("Bad display attribute: {0:#06x}")]
    BadAttribute(i32),

    #[error("Bad parameter: {0}")]
    BadParameter(&'static str),

    #[error("Operation not supported by driver: {0}")]
    Unsupported(&'static str),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Unknown platform: {0}")]
    InvalidPlatform(String),

    #[error("Runtime has been shut down")]
    ShutDown,
}
