//! Definition file loading

use crate::config::schema::Definition;
use crate::config::validator::validate;
use crate::Result;
use anyhow::Context;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a YAML (or `.json`) definition into an untyped document
pub fn load_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read definition {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let doc: Value = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))?
    };
    debug!("loaded definition from {}", path.display());
    Ok(doc)
}

/// Load and validate a definition file
pub fn load_definition(path: &Path) -> Result<Definition> {
    let doc = load_document(path)?;
    let definition = validate(&doc)?;
    debug!(name = %definition.general.name, "definition is valid");
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validator::ValidationError;
    use tempfile::TempDir;

    const MINIMAL_YAML: &str = r#"
general:
  uri: qemu:///system
  pool: default
  name: node1
  format: raw
  os-name: debian
  os-version: "12"
image:
  size: 8G
vm:
  ram: 1024
  vcpus: 1
"#;

    #[test]
    fn loads_yaml_definition() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node1.yml");
        fs::write(&path, MINIMAL_YAML).unwrap();

        let def = load_definition(&path).unwrap();
        assert_eq!(def.general.name, "node1");
        assert_eq!(def.image.size, "8G");
        assert_eq!(def.image.smp, None);
    }

    #[test]
    fn loads_json_definition_preserving_key_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node1.json");
        let json = r#"{
            "general": {"uri": "qemu:///system", "pool": "default", "name": "node1",
                        "format": "qcow2", "os-name": "fedora", "os-version": "40"},
            "image": {"size": "10G"},
            "vm": {"ram": 2048, "vcpus": 2, "network": "bridge=br0", "graphics": "none"}
        }"#;
        fs::write(&path, json).unwrap();

        let def = load_definition(&path).unwrap();
        let keys: Vec<&str> = def.vm.passthrough.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["network", "graphics"]);
    }

    #[test]
    fn invalid_definition_surfaces_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, "general: {}\nimage: {}\n").unwrap();

        let err = load_definition(&path).unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert!(validation.violations.len() >= 8);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_document(Path::new("/nonexistent/definition.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/definition.yml"));
    }
}
