//! Native platforms and the handles that identify displays on them
//!
//! A display is keyed by the windowing backend it belongs to and the opaque
//! native handle the application passed in. Guessing the platform from the
//! handle itself is left to the embedder; this module only knows the closed
//! set of platforms, their names, and the attribute rules each one applies
//! when a display is requested explicitly.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// `EGL_PLATFORM_X11_SCREEN_EXT`, the only display attribute X11 accepts
pub const PLATFORM_X11_SCREEN: i32 = 0x31D6;

/// One attribute of a platform display request, as a `(name, value)` pair
pub type DisplayAttrib = (i32, i32);

/// The windowing backends a display can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    X11,
    Wayland,
    Drm,
    Android,
    Haiku,
    Surfaceless,
}

impl Platform {
    /// Every platform, in the order names are matched
    pub const ALL: [Platform; 6] = [
        Platform::X11,
        Platform::Wayland,
        Platform::Drm,
        Platform::Android,
        Platform::Haiku,
        Platform::Surfaceless,
    ];

    /// Used when neither the environment nor the caller names a platform
    pub const BUILD_DEFAULT: Platform = Platform::X11;

    /// Canonical lowercase name, as accepted by `EGL_PLATFORM`
    pub fn name(self) -> &'static str {
        match self {
            Platform::X11 => "x11",
            Platform::Wayland => "wayland",
            Platform::Drm => "drm",
            Platform::Android => "android",
            Platform::Haiku => "haiku",
            Platform::Surfaceless => "surfaceless",
        }
    }

    /// Exact, case-sensitive name lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Check the attributes of an explicit platform display request
    ///
    /// X11 accepts a single screen attribute, and only screen 0. Surfaceless
    /// has no native display at all, so it also rejects any non-default
    /// handle. Every other platform accepts no attributes.
    pub fn validate_display_request(
        self,
        native: NativeHandle,
        attribs: &[DisplayAttrib],
    ) -> Result<()> {
        match self {
            Platform::X11 => {
                for &(name, value) in attribs {
                    if name != PLATFORM_X11_SCREEN || value != 0 {
                        return Err(Error::BadAttribute(name));
                    }
                }
                Ok(())
            },
            Platform::Surfaceless => {
                if !native.is_default() {
                    return Err(Error::BadParameter("surfaceless displays take no native display"));
                }
                reject_attribs(attribs)
            },
            Platform::Wayland | Platform::Drm | Platform::Android | Platform::Haiku => {
                reject_attribs(attribs)
            },
        }
    }
}

fn reject_attribs(attribs: &[DisplayAttrib]) -> Result<()> {
    match attribs.first() {
        Some(&(name, _)) => Err(Error::BadAttribute(name)),
        None => Ok(()),
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::InvalidPlatform(s.to_string()))
    }
}

/// Opaque native display handle supplied by the application
///
/// Only ever compared, never dereferenced. Zero is the default-display
/// sentinel (`EGL_DEFAULT_DISPLAY`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub usize);

impl NativeHandle {
    pub const DEFAULT: NativeHandle = NativeHandle(0);

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl From<usize> for NativeHandle {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_name(platform.name()), Some(platform));
            assert_eq!(platform.name().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_name_match_is_exact() {
        assert_eq!(Platform::from_name("X11"), None);
        assert_eq!(Platform::from_name(" wayland"), None);
        assert!(matches!("gdi".parse::<Platform>(), Err(Error::InvalidPlatform(_))));
    }

    #[test]
    fn test_x11_accepts_default_screen_only() {
        let native = NativeHandle(0x1000);
        assert!(Platform::X11.validate_display_request(native, &[]).is_ok());
        assert!(Platform::X11
            .validate_display_request(native, &[(PLATFORM_X11_SCREEN, 0)])
            .is_ok());
        assert!(matches!(
            Platform::X11.validate_display_request(native, &[(PLATFORM_X11_SCREEN, 1)]),
            Err(Error::BadAttribute(PLATFORM_X11_SCREEN))
        ));
        assert!(matches!(
            Platform::X11.validate_display_request(native, &[(0x3000, 0)]),
            Err(Error::BadAttribute(0x3000))
        ));
    }

    #[test]
    fn test_attribute_free_platforms() {
        for platform in [Platform::Wayland, Platform::Drm, Platform::Android, Platform::Haiku] {
            assert!(platform.validate_display_request(NativeHandle(8), &[]).is_ok());
            assert!(matches!(
                platform.validate_display_request(NativeHandle(8), &[(0x3038, 0)]),
                Err(Error::BadAttribute(0x3038))
            ));
        }
    }

    #[test]
    fn test_surfaceless_rejects_native_display() {
        assert!(Platform::Surfaceless
            .validate_display_request(NativeHandle::DEFAULT, &[])
            .is_ok());
        assert!(matches!(
            Platform::Surfaceless.validate_display_request(NativeHandle(4), &[]),
            Err(Error::BadParameter(_))
        ));
    }

    #[test]
    fn test_native_handle_display() {
        assert_eq!(NativeHandle(255).to_string(), "0xff");
        assert!(NativeHandle::default().is_default());
    }
}
