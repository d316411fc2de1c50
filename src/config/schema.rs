//! VM definition schema

use serde::Serialize;
use std::fmt;

/// Build sandbox vCPUs when `image.smp` is absent
pub const DEFAULT_SMP: u64 = 4;

/// Password hashing when `config.password-crypto` is absent
pub const DEFAULT_PASSWORD_CRYPTO: PasswordCrypto = PasswordCrypto::Sha512;

/// Validated VM definition
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Definition {
    pub general: General,
    pub image: Image,
    pub vm: Vm,
}

/// Connection and identity facts
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct General {
    pub uri: String,
    pub pool: String,
    pub name: String,
    pub format: DiskFormat,
    pub os_name: String,
    pub os_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_variant: Option<String>,
    pub verbose: bool,
}

impl General {
    /// Explicit os-variant, or os-name and os-version glued together
    pub fn os_variant(&self) -> String {
        match &self.os_variant {
            Some(variant) => variant.clone(),
            None => format!("{}{}", self.os_name, self.os_version),
        }
    }

    /// File name of the built image, relative to the working directory
    pub fn image_file_name(&self) -> String {
        format!("{}.{}", self.name, self.format)
    }
}

/// Build-time parameters
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Image {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memsize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BuildConfig>,
}

impl Image {
    /// Effective build sandbox vCPUs
    pub fn smp(&self) -> u64 {
        self.smp.unwrap_or(DEFAULT_SMP)
    }

    /// Copy with declared defaults filled in
    pub fn with_defaults(&self) -> Self {
        let mut image = self.clone();
        image.smp = Some(self.smp());
        image.config = Some(self.config.clone().unwrap_or_default().with_defaults());
        image
    }
}

/// Customizations applied to the built image
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selinux_relabel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_crypto: Option<PasswordCrypto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_password: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provision: Vec<Provision>,
}

impl BuildConfig {
    pub fn password_crypto(&self) -> PasswordCrypto {
        self.password_crypto.unwrap_or(DEFAULT_PASSWORD_CRYPTO)
    }

    pub fn with_defaults(mut self) -> Self {
        self.password_crypto = Some(self.password_crypto());
        self
    }
}

/// Runtime parameters for virt-install
#[derive(Debug, Clone, PartialEq)]
pub struct Vm {
    pub ram: u64,
    pub vcpus: u64,
    /// Extra flags forwarded verbatim, in document order
    pub passthrough: Vec<(String, String)>,
}

impl Serialize for Vm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(2 + self.passthrough.len()))?;
        map.serialize_entry("ram", &self.ram)?;
        map.serialize_entry("vcpus", &self.vcpus)?;
        for (key, value) in &self.passthrough {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Keys accepted in `vm` besides ram and vcpus
pub const VM_PASSTHROUGH_KEYS: &[&str] = &["graphics", "console", "extra-args", "disk", "network"];

/// On-disk image format
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Qcow2,
    Raw,
}

impl DiskFormat {
    pub const ALL: &'static [DiskFormat] = &[DiskFormat::Qcow2, DiskFormat::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiskFormat::Qcow2 => "qcow2",
            DiskFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for DiskFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root password hashing algorithm
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordCrypto {
    Md5,
    Sha256,
    Sha512,
}

impl PasswordCrypto {
    pub const ALL: &'static [PasswordCrypto] =
        &[PasswordCrypto::Md5, PasswordCrypto::Sha256, PasswordCrypto::Sha512];

    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordCrypto::Md5 => "md5",
            PasswordCrypto::Sha256 => "sha256",
            PasswordCrypto::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for PasswordCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One post-build customization step
#[derive(Debug, Clone, PartialEq)]
pub struct Provision {
    pub action: ProvisionAction,
    pub value: ProvisionValue,
}

impl Serialize for Provision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.value {
            ProvisionValue::Text(text) => map.serialize_entry(self.action.as_str(), text)?,
            ProvisionValue::List(items) => map.serialize_entry(self.action.as_str(), items)?,
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionValue {
    Text(String),
    List(Vec<String>),
}

/// virt-builder customization actions accepted under `provision`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    AppendLine,
    Chmod,
    Copy,
    CopyIn,
    Delete,
    Edit,
    Firstboot,
    FirstbootCommand,
    FirstbootInstall,
    Install,
    Link,
    Mkdir,
    Move,
    Password,
    Run,
    RunCommand,
    Scrub,
    SshInject,
    Touch,
    TruncateRecursive,
    Uninstall,
    Upload,
    Write,
}

impl ProvisionAction {
    pub const ALL: &'static [ProvisionAction] = &[
        ProvisionAction::AppendLine,
        ProvisionAction::Chmod,
        ProvisionAction::Copy,
        ProvisionAction::CopyIn,
        ProvisionAction::Delete,
        ProvisionAction::Edit,
        ProvisionAction::Firstboot,
        ProvisionAction::FirstbootCommand,
        ProvisionAction::FirstbootInstall,
        ProvisionAction::Install,
        ProvisionAction::Link,
        ProvisionAction::Mkdir,
        ProvisionAction::Move,
        ProvisionAction::Password,
        ProvisionAction::Run,
        ProvisionAction::RunCommand,
        ProvisionAction::Scrub,
        ProvisionAction::SshInject,
        ProvisionAction::Touch,
        ProvisionAction::TruncateRecursive,
        ProvisionAction::Uninstall,
        ProvisionAction::Upload,
        ProvisionAction::Write,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionAction::AppendLine => "append-line",
            ProvisionAction::Chmod => "chmod",
            ProvisionAction::Copy => "copy",
            ProvisionAction::CopyIn => "copy-in",
            ProvisionAction::Delete => "delete",
            ProvisionAction::Edit => "edit",
            ProvisionAction::Firstboot => "firstboot",
            ProvisionAction::FirstbootCommand => "firstboot-command",
            ProvisionAction::FirstbootInstall => "firstboot-install",
            ProvisionAction::Install => "install",
            ProvisionAction::Link => "link",
            ProvisionAction::Mkdir => "mkdir",
            ProvisionAction::Move => "move",
            ProvisionAction::Password => "password",
            ProvisionAction::Run => "run",
            ProvisionAction::RunCommand => "run-command",
            ProvisionAction::Scrub => "scrub",
            ProvisionAction::SshInject => "ssh-inject",
            ProvisionAction::Touch => "touch",
            ProvisionAction::TruncateRecursive => "truncate-recursive",
            ProvisionAction::Uninstall => "uninstall",
            ProvisionAction::Upload => "upload",
            ProvisionAction::Write => "write",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == key)
    }

    /// Package actions take a list, joined with commas on the command line
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            ProvisionAction::Install | ProvisionAction::Uninstall | ProvisionAction::FirstbootInstall
        )
    }
}

impl Definition {
    /// Copy with every declared default injected, for display
    pub fn with_defaults(&self) -> Self {
        Definition {
            general: self.general.clone(),
            image: self.image.with_defaults(),
            vm: self.vm.clone(),
        }
    }
}
