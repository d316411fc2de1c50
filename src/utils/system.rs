//! System utility functions

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Locate an external tool on PATH
pub fn find_tool(program: &str) -> Result<PathBuf> {
    if program.contains('/') {
        let p = PathBuf::from(program);
        if p.is_file() {
            return Ok(p);
        }
        return Err(anyhow!("'{}' not found", program));
    }
    which::which(program).map_err(|_| {
        anyhow!(
            "'{}' not found on PATH (is {} installed?)",
            program,
            package_hint(program)
        )
    })
}

fn package_hint(program: &str) -> &'static str {
    match program {
        "virt-builder" => "libguestfs-tools",
        "virsh" => "libvirt-clients",
        "virt-install" => "virt-install",
        _ => "it",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tool_on_path() {
        // `sh` exists on every unix test host
        assert!(find_tool("sh").unwrap().is_file());
    }

    #[test]
    fn test_find_tool_missing() {
        let err = find_tool("virtbuilder-no-such-tool-12345").unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));

        let err = find_tool("/nonexistent/bin/virsh").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_package_hint() {
        assert_eq!(package_hint("virt-builder"), "libguestfs-tools");
        assert_eq!(package_hint("rm"), "it");
    }
}
