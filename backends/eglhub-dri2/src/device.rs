//! DRM device node discovery

use std::fmt;
use std::path::{Path, PathBuf};

/// Where DRM device nodes live unless configured otherwise
pub const DEFAULT_DEVICE_DIR: &str = "/dev/dri";

/// Overrides the device directory when no driver argument sets it
pub const DEVICE_DIR_ENV: &str = "EGLHUB_DRI_DEVICE_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    /// `renderD*`: rendering without modesetting rights
    Render,
    /// `card*`: the primary node
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub path: PathBuf,
    pub kind: DeviceKind,
}

impl DeviceNode {
    fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let kind = if name.starts_with("renderD") {
            DeviceKind::Render
        } else if name.starts_with("card") {
            DeviceKind::Primary
        } else {
            return None;
        };
        Some(Self { path, kind })
    }
}

impl fmt::Display for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// List the DRM nodes in `dir`, render nodes first
///
/// A missing or unreadable directory simply has no devices.
pub fn probe_devices(dir: &Path) -> Vec<DeviceNode> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("Cannot read DRI device directory {}: {}", dir.display(), err);
            return Vec::new();
        },
    };

    let mut nodes: Vec<DeviceNode> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| DeviceNode::from_path(entry.path()))
        .collect();
    nodes.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.path.cmp(&b.path)));
    nodes
}

/// Pick the device directory: `device-dir=` argument, then the environment,
/// then [`DEFAULT_DEVICE_DIR`]
///
/// Arguments are `key=value` pairs separated by commas or whitespace.
pub fn device_dir_from_args(args: Option<&str>) -> PathBuf {
    let from_args = args.and_then(|args| {
        args.split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "device-dir")
            .map(|(_, value)| PathBuf::from(value))
    });

    from_args
        .or_else(|| {
            std::env::var_os(DEVICE_DIR_ENV)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kinds() {
        let render = DeviceNode::from_path(PathBuf::from("/dev/dri/renderD128")).unwrap();
        assert_eq!(render.kind, DeviceKind::Render);
        let card = DeviceNode::from_path(PathBuf::from("/dev/dri/card0")).unwrap();
        assert_eq!(card.kind, DeviceKind::Primary);
        assert!(DeviceNode::from_path(PathBuf::from("/dev/dri/by-path")).is_none());
    }

    #[test]
    fn test_missing_directory_has_no_devices() {
        assert!(probe_devices(Path::new("/nonexistent/eglhub/dri")).is_empty());
    }

    #[test]
    fn test_device_dir_argument() {
        assert_eq!(
            device_dir_from_args(Some("debug=1, device-dir=/tmp/fake-dri")),
            PathBuf::from("/tmp/fake-dri")
        );
        assert_eq!(
            device_dir_from_args(Some("device-dir=/a,other=b")),
            PathBuf::from("/a")
        );
    }
}
