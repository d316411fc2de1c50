//! Definition validation
//!
//! Walks the raw document section by section, collecting every violation
//! instead of stopping at the first one, and builds the typed [`Definition`]
//! when nothing was found.

use crate::config::schema::*;
use crate::utils::env::expand_vars;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

const ROOT_KEYS: &[&str] = &["general", "image", "vm"];

const GENERAL_KEYS: &[&str] = &[
    "uri",
    "pool",
    "name",
    "format",
    "os-name",
    "os-version",
    "os-variant",
    "verbose",
];
const GENERAL_REQUIRED: &[&str] = &["uri", "pool", "name", "format", "os-name", "os-version"];

const IMAGE_KEYS: &[&str] = &["size", "arch", "no-sync", "memsize", "smp", "config"];
const IMAGE_REQUIRED: &[&str] = &["size"];

const CONFIG_KEYS: &[&str] = &[
    "update",
    "selinux-relabel",
    "hostname",
    "timezone",
    "password-crypto",
    "root-password",
    "provision",
];

const VM_REQUIRED: &[&str] = &["ram", "vcpus"];

static URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S+$").expect("uri pattern"));
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+$").expect("token pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    UnknownKey,
    MissingKey,
    WrongType,
    Constraint,
}

/// A single problem found in a definition
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Dotted location, e.g. `image.config.provision[2]`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "definition" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Every violation found in one definition
#[derive(Error, Debug)]
#[error("invalid definition ({} problem(s)):\n{}", .violations.len(), bullet_list(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

fn bullet_list(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate a parsed document into a [`Definition`]
pub fn validate(doc: &Value) -> Result<Definition, ValidationError> {
    let mut validator = Validator::default();
    let definition = validator.definition(doc);
    match definition {
        Some(definition) if validator.violations.is_empty() => Ok(definition),
        _ => {
            debug!("validation found {} problem(s)", validator.violations.len());
            Err(ValidationError {
                violations: validator.violations,
            })
        }
    }
}

fn at(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn push(&mut self, kind: ViolationKind, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    fn wrong_type(&mut self, path: &str, expected: &str, found: &Value) {
        self.push(
            ViolationKind::WrongType,
            path,
            format!("expected {}, found {}", expected, describe(found)),
        );
    }

    fn mapping<'v>(&mut self, path: &str, value: &'v Value) -> Option<&'v Mapping> {
        match value {
            Value::Mapping(map) => Some(map),
            other => {
                self.wrong_type(path, "a mapping", other);
                None
            }
        }
    }

    fn check_keys(&mut self, path: &str, map: &Mapping, allowed: &[&str], required: &[&str]) {
        for key in map.keys() {
            match key.as_str() {
                Some(k) if allowed.contains(&k) => {}
                Some(k) => self.push(ViolationKind::UnknownKey, path, format!("unknown key '{k}'")),
                None => self.wrong_type(path, "string keys", key),
            }
        }
        for key in required {
            if !map.contains_key(*key) {
                self.push(
                    ViolationKind::MissingKey,
                    path,
                    format!("missing mandatory key '{key}'"),
                );
            }
        }
    }

    fn text(&mut self, path: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) if s.trim().is_empty() => {
                self.push(ViolationKind::Constraint, path, "must not be empty");
                None
            }
            Value::String(s) => Some(s.clone()),
            other => {
                self.wrong_type(path, "a string", other);
                None
            }
        }
    }

    fn string(&mut self, path: &str, map: &Mapping, key: &str) -> Option<String> {
        let value = map.get(key)?;
        self.text(&at(path, key), value)
    }

    fn token(&mut self, path: &str, map: &Mapping, key: &str, shape: &Regex, what: &str) -> Option<String> {
        let token = self.string(path, map, key)?;
        if shape.is_match(&token) {
            Some(token)
        } else {
            self.push(
                ViolationKind::Constraint,
                at(path, key),
                format!("'{token}' is not {what}"),
            );
            None
        }
    }

    fn flag(&mut self, path: &str, map: &Mapping, key: &str) -> Option<bool> {
        match map.get(key)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.wrong_type(&at(path, key), "a boolean", other);
                None
            }
        }
    }

    /// Integer strictly greater than `floor`; numeric strings are coerced
    fn integer(&mut self, path: &str, map: &Mapping, key: &str, floor: u64) -> Option<u64> {
        let value = map.get(key)?;
        let field = at(path, key);
        let parsed: Option<i128> = match value {
            Value::Number(n) => n
                .as_u64()
                .map(i128::from)
                .or_else(|| n.as_i64().map(i128::from)),
            Value::String(s) => s.trim().parse::<i128>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            match value {
                Value::String(s) => self.push(
                    ViolationKind::WrongType,
                    field,
                    format!("expected an integer, found '{s}'"),
                ),
                other => self.wrong_type(&field, "an integer", other),
            }
            return None;
        };
        if n <= i128::from(floor) {
            self.push(
                ViolationKind::Constraint,
                field,
                format!("must be greater than {floor}, found {n}"),
            );
            return None;
        }
        match u64::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.push(
                    ViolationKind::Constraint,
                    field,
                    format!("{n} is out of range (at most {})", u64::MAX),
                );
                None
            }
        }
    }

    fn choice<T: Copy>(
        &mut self,
        path: &str,
        map: &Mapping,
        key: &str,
        options: &[T],
        name: fn(&T) -> &'static str,
    ) -> Option<T> {
        let picked = self.string(path, map, key)?;
        if let Some(option) = options.iter().find(|o| name(o) == picked) {
            return Some(*option);
        }
        let names: Vec<&str> = options.iter().map(name).collect();
        self.push(
            ViolationKind::Constraint,
            at(path, key),
            format!("'{}' is not one of: {}", picked, names.join(", ")),
        );
        None
    }

    fn definition(&mut self, doc: &Value) -> Option<Definition> {
        let root = self.mapping("", doc)?;
        self.check_keys("", root, ROOT_KEYS, ROOT_KEYS);
        let general = root.get("general").and_then(|v| self.general(v));
        let image = root.get("image").and_then(|v| self.image(v));
        let vm = root.get("vm").and_then(|v| self.vm(v));
        Some(Definition {
            general: general?,
            image: image?,
            vm: vm?,
        })
    }

    fn general(&mut self, value: &Value) -> Option<General> {
        let path = "general";
        let map = self.mapping(path, value)?;
        self.check_keys(path, map, GENERAL_KEYS, GENERAL_REQUIRED);

        let uri = self.token(path, map, "uri", &URI_RE, "a scheme:path URI");
        let pool = self.token(path, map, "pool", &TOKEN_RE, "a word-like name");
        let name = self.token(path, map, "name", &TOKEN_RE, "a word-like name");
        let format = self.choice(path, map, "format", DiskFormat::ALL, DiskFormat::as_str);
        let os_name = self.string(path, map, "os-name");
        let os_version = self.string(path, map, "os-version");
        let os_variant = self.string(path, map, "os-variant");
        let verbose = self.flag(path, map, "verbose");

        Some(General {
            uri: uri?,
            pool: pool?,
            name: name?,
            format: format?,
            os_name: os_name?,
            os_version: os_version?,
            os_variant,
            verbose: verbose.unwrap_or(false),
        })
    }

    fn image(&mut self, value: &Value) -> Option<Image> {
        let path = "image";
        let map = self.mapping(path, value)?;
        self.check_keys(path, map, IMAGE_KEYS, IMAGE_REQUIRED);

        let size = self.string(path, map, "size");
        let arch = self.string(path, map, "arch");
        let no_sync = self.flag(path, map, "no-sync");
        let memsize = self.integer(path, map, "memsize", 1000);
        let smp = self.integer(path, map, "smp", 1);
        let config = map.get("config").and_then(|v| self.build_config(v));

        Some(Image {
            size: size?,
            arch,
            no_sync,
            memsize,
            smp,
            config,
        })
    }

    fn build_config(&mut self, value: &Value) -> Option<BuildConfig> {
        let path = "image.config";
        let map = self.mapping(path, value)?;
        self.check_keys(path, map, CONFIG_KEYS, &[]);

        let provision = match map.get("provision") {
            Some(list) => self.provision(&at(path, "provision"), list),
            None => Vec::new(),
        };
        Some(BuildConfig {
            update: self.flag(path, map, "update"),
            selinux_relabel: self.flag(path, map, "selinux-relabel"),
            hostname: self.string(path, map, "hostname"),
            timezone: self.string(path, map, "timezone"),
            password_crypto: self.choice(
                path,
                map,
                "password-crypto",
                PasswordCrypto::ALL,
                PasswordCrypto::as_str,
            ),
            root_password: self.string(path, map, "root-password"),
            provision,
        })
    }

    /// Ordered list of single-key entries; repeated actions are kept
    fn provision(&mut self, path: &str, value: &Value) -> Vec<Provision> {
        let Value::Sequence(items) = value else {
            self.wrong_type(path, "a list", value);
            return Vec::new();
        };

        let mut steps = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            let Some(entry) = self.mapping(&item_path, item) else {
                continue;
            };
            let mut entries = entry.iter();
            let (Some((key, value)), None) = (entries.next(), entries.next()) else {
                self.push(
                    ViolationKind::Constraint,
                    item_path,
                    format!("expected exactly one action, found {}", entry.len()),
                );
                continue;
            };
            let Some(key) = key.as_str() else {
                self.wrong_type(&item_path, "string keys", key);
                continue;
            };
            let Some(action) = ProvisionAction::from_key(key) else {
                self.push(
                    ViolationKind::UnknownKey,
                    item_path,
                    format!("unknown key '{key}'"),
                );
                continue;
            };

            let value_path = at(&item_path, key);
            let value = if action.takes_list() {
                self.text_list(&value_path, value).map(ProvisionValue::List)
            } else {
                self.text(&value_path, value).map(ProvisionValue::Text)
            };
            if action == ProvisionAction::Run {
                if let Some(ProvisionValue::Text(script)) = &value {
                    let script = expand_vars(script);
                    if !Path::new(script.as_ref()).exists() {
                        self.push(
                            ViolationKind::Constraint,
                            value_path,
                            format!("script '{script}' does not exist"),
                        );
                        continue;
                    }
                }
            }
            if let Some(value) = value {
                steps.push(Provision { action, value });
            }
        }
        steps
    }

    fn text_list(&mut self, path: &str, value: &Value) -> Option<Vec<String>> {
        let Value::Sequence(items) = value else {
            self.wrong_type(path, "a list of strings", value);
            return None;
        };
        let before = self.violations.len();
        let texts: Vec<String> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.text(&format!("{path}[{i}]"), item))
            .collect();
        (self.violations.len() == before).then_some(texts)
    }

    fn vm(&mut self, value: &Value) -> Option<Vm> {
        let path = "vm";
        let map = self.mapping(path, value)?;
        let allowed: Vec<&str> = VM_REQUIRED
            .iter()
            .chain(VM_PASSTHROUGH_KEYS)
            .copied()
            .collect();
        self.check_keys(path, map, &allowed, VM_REQUIRED);

        let ram = self.integer(path, map, "ram", 0);
        let vcpus = self.integer(path, map, "vcpus", 0);

        let mut passthrough = Vec::new();
        for (key, value) in map {
            let Some(key) = key.as_str().filter(|k| VM_PASSTHROUGH_KEYS.contains(k)) else {
                continue;
            };
            let field = at(path, key);
            let text = match value {
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                other => self.text(&field, other),
            };
            if let Some(text) = text {
                passthrough.push((key.to_string(), text));
            }
        }

        Some(Vm {
            ram: ram?,
            vcpus: vcpus?,
            passthrough,
        })
    }
}
