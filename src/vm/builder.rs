//! Command generation for the create and remove pipelines

use crate::config::schema::{Definition, ProvisionValue};
use crate::utils::env::expand_vars;
use crate::utils::paths::image_path;
use crate::vm::command::{Arg, ShellCommand};
use crate::Result;
use anyhow::Context;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const VIRT_BUILDER: &str = "virt-builder";
pub const VIRSH: &str = "virsh";
pub const VIRT_INSTALL: &str = "virt-install";

/// One step of the create pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Stage {
    /// Build the disk image with virt-builder
    Image,
    /// Allocate a volume in the storage pool
    Volume,
    /// Copy the built image into the volume
    Upload,
    /// Delete the local image file
    Cleanup,
    /// Define and start the VM with virt-install
    Vm,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Image,
        Stage::Volume,
        Stage::Upload,
        Stage::Cleanup,
        Stage::Vm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Image => "image",
            Stage::Volume => "volume",
            Stage::Upload => "upload",
            Stage::Cleanup => "cleanup",
            Stage::Vm => "vm",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds commands from a validated definition
pub struct CommandBuilder<'a> {
    definition: &'a Definition,
    workdir: PathBuf,
}

impl<'a> CommandBuilder<'a> {
    /// `workdir` is where the image file is written; pass an absolute path
    pub fn new(definition: &'a Definition, workdir: impl Into<PathBuf>) -> Self {
        Self {
            definition,
            workdir: workdir.into(),
        }
    }

    pub fn image_path(&self) -> PathBuf {
        image_path(&self.workdir, &self.definition.general)
    }

    /// `virt-builder` invocation
    pub fn image(&self) -> ShellCommand {
        let general = &self.definition.general;
        let image = &self.definition.image;

        let mut cmd = ShellCommand::new(VIRT_BUILDER)
            .arg(Arg::word(format!("{}-{}", general.os_name, general.os_version)));
        if general.verbose {
            cmd.push(Arg::flag("verbose"));
        }
        cmd.push(Arg::opt("format", general.format));
        cmd.push(Arg::opt("output", general.image_file_name()));
        cmd.push(Arg::opt("hostname", &general.name));

        cmd.push(expanded("size", &image.size));
        if let Some(arch) = &image.arch {
            cmd.push(expanded("arch", arch));
        }
        if image.no_sync == Some(true) {
            cmd.push(Arg::flag("no-sync"));
        }
        if let Some(memsize) = image.memsize {
            cmd.push(Arg::quoted("memsize", memsize));
        }
        if let Some(smp) = image.smp {
            cmd.push(Arg::quoted("smp", smp));
        }

        let Some(config) = &image.config else {
            return cmd;
        };
        if config.update == Some(true) {
            cmd.push(Arg::flag("update"));
        }
        if config.selinux_relabel == Some(true) {
            cmd.push(Arg::flag("selinux-relabel"));
        }
        if let Some(hostname) = &config.hostname {
            cmd.push(expanded("hostname", hostname));
        }
        if let Some(timezone) = &config.timezone {
            cmd.push(expanded("timezone", timezone));
        }
        if let Some(crypto) = config.password_crypto {
            cmd.push(Arg::quoted("password-crypto", crypto));
        }
        if let Some(password) = &config.root_password {
            cmd.push(expanded("root-password", password));
        }

        for step in &config.provision {
            let name = step.action.as_str();
            match &step.value {
                ProvisionValue::Text(text) => cmd.push(expanded(name, text)),
                ProvisionValue::List(items) => {
                    let joined = items
                        .iter()
                        .map(|item| expand_vars(item))
                        .collect::<Vec<_>>()
                        .join(",");
                    cmd.push(Arg::quoted(name, joined));
                }
            }
        }
        cmd
    }

    /// `virsh vol-create-as`, sized to the built image on disk
    pub fn volume(&self) -> Result<ShellCommand> {
        let general = &self.definition.general;
        let path = self.image_path();
        let capacity = fs::metadata(&path)
            .with_context(|| format!("cannot stat image {}", path.display()))?
            .len();

        Ok(ShellCommand::new(VIRSH)
            .arg(Arg::opt("connect", &general.uri))
            .arg(Arg::word("vol-create-as"))
            .arg(Arg::opt("pool", &general.pool))
            .arg(Arg::opt("name", &general.name))
            .arg(Arg::opt("format", general.format))
            .arg(Arg::opt("capacity", capacity)))
    }

    /// `virsh vol-upload` of the built image
    pub fn upload(&self) -> ShellCommand {
        let general = &self.definition.general;
        ShellCommand::new(VIRSH)
            .arg(Arg::opt("connect", &general.uri))
            .arg(Arg::word("vol-upload"))
            .arg(Arg::opt("pool", &general.pool))
            .arg(Arg::opt("vol", &general.name))
            .arg(Arg::opt("file", self.image_path().display()))
    }

    /// Removes the local image once it lives in the pool
    pub fn cleanup(&self) -> ShellCommand {
        ShellCommand::new("rm").arg(Arg::word(self.image_path().display().to_string()))
    }

    /// `virt-install --import` of the uploaded volume
    pub fn vm(&self) -> ShellCommand {
        let general = &self.definition.general;
        let vm = &self.definition.vm;

        let mut cmd = ShellCommand::new(VIRT_INSTALL)
            .arg(Arg::opt("connect", &general.uri))
            .arg(Arg::flag("import"))
            .arg(Arg::opt("name", &general.name))
            .arg(Arg::opt("os-variant", general.os_variant()))
            .arg(Arg::opt("ram", vm.ram))
            .arg(Arg::opt("vcpus", vm.vcpus));
        for (key, value) in &vm.passthrough {
            cmd.push(Arg::opt(key, expand_vars(value)));
        }
        cmd
    }

    pub fn stage(&self, stage: Stage) -> Result<ShellCommand> {
        let cmd = match stage {
            Stage::Image => self.image(),
            Stage::Volume => self.volume()?,
            Stage::Upload => self.upload(),
            Stage::Cleanup => self.cleanup(),
            Stage::Vm => self.vm(),
        };
        debug!(%stage, program = cmd.program(), "generated command");
        Ok(cmd)
    }

    /// Every create stage in order, or just the selected one.
    /// All commands are built before any runs, so the volume stage
    /// needs the image file to exist already.
    pub fn create_commands(&self, stage: Option<Stage>) -> Result<Vec<ShellCommand>> {
        match stage {
            Some(stage) => Ok(vec![self.stage(stage)?]),
            None => Stage::ALL.iter().map(|s| self.stage(*s)).collect(),
        }
    }

    /// Stop the domain, then undefine it along with its storage
    pub fn remove_commands(&self) -> Vec<ShellCommand> {
        let general = &self.definition.general;
        vec![
            ShellCommand::new(VIRSH)
                .arg(Arg::opt("connect", &general.uri))
                .arg(Arg::word("destroy"))
                .arg(Arg::opt("domain", &general.name)),
            ShellCommand::new(VIRSH)
                .arg(Arg::opt("connect", &general.uri))
                .arg(Arg::word("undefine"))
                .arg(Arg::opt("domain", &general.name))
                .arg(Arg::flag("remove-all-storage")),
        ]
    }
}

fn expanded(name: &str, value: &str) -> Arg {
    Arg::quoted(name, expand_vars(value))
}
