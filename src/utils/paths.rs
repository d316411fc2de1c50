//! Path utility functions

use crate::config::schema::General;
use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Absolute form of the working directory
pub fn absolute_workdir(workdir: &Path) -> Result<PathBuf> {
    std::path::absolute(workdir)
        .with_context(|| format!("cannot resolve working directory {}", workdir.display()))
}

/// Where virt-builder writes the image for this definition
pub fn image_path(workdir: &Path, general: &General) -> PathBuf {
    workdir.join(general.image_file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DiskFormat;

    #[test]
    fn test_image_path() {
        let general = General {
            uri: "qemu:///system".into(),
            pool: "default".into(),
            name: "kmaster".into(),
            format: DiskFormat::Raw,
            os_name: "ubuntu".into(),
            os_version: "18.04".into(),
            os_variant: None,
            verbose: false,
        };
        assert_eq!(
            image_path(Path::new("/var/lib/images"), &general),
            PathBuf::from("/var/lib/images/kmaster.raw")
        );
    }

    #[test]
    fn test_absolute_workdir() {
        let abs = absolute_workdir(Path::new(".")).unwrap();
        assert!(abs.is_absolute());
    }
}
