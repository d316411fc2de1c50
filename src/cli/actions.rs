//! Subcommand implementations

use crate::config::load_definition;
use crate::utils::paths::absolute_workdir;
use crate::vm::builder::{CommandBuilder, Stage};
use crate::vm::command::ShellCommand;
use crate::vm::executor::{run_sequence, Outcome, RunOptions, SystemRunner};
use crate::Result;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// Generate the create pipeline (or one stage of it) and run it
pub fn create_vm(
    definition: &Path,
    workdir: &Path,
    stage: Option<Stage>,
    options: RunOptions,
) -> Result<Outcome> {
    let def = load_definition(definition)?;
    let workdir = absolute_workdir(workdir)?;
    let cmds = CommandBuilder::new(&def, &workdir).create_commands(stage)?;
    match stage {
        Some(stage) => info!("creating '{}': stage {}", def.general.name, stage),
        None => info!("creating '{}': {} stages", def.general.name, cmds.len()),
    }
    run(&cmds, &workdir, options)
}

/// Destroy and undefine the VM named in the definition
pub fn remove_vm(definition: &Path, workdir: &Path, options: RunOptions) -> Result<Outcome> {
    let def = load_definition(definition)?;
    let workdir = absolute_workdir(workdir)?;
    let cmds = CommandBuilder::new(&def, &workdir).remove_commands();
    info!("removing '{}'", def.general.name);
    run(&cmds, &workdir, options)
}

/// Validate a definition, optionally dumping it with defaults applied
pub fn validate_definition<W: Write>(definition: &Path, dump: bool, out: &mut W) -> Result<()> {
    let def = load_definition(definition)?;
    if dump {
        write!(out, "{}", serde_yaml::to_string(&def.with_defaults())?)?;
    }
    writeln!(out, "OK!")?;
    Ok(())
}

fn run(cmds: &[ShellCommand], workdir: &Path, options: RunOptions) -> Result<Outcome> {
    let mut runner = SystemRunner::new(workdir);
    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();
    run_sequence(cmds, &mut runner, options, &mut input, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn validate_prints_ok() {
        let mut out = Vec::new();
        validate_definition(&fixture("minimum.yml"), false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "OK!\n");
    }

    #[test]
    fn dump_shows_injected_defaults() {
        let mut out = Vec::new();
        validate_definition(&fixture("minimum.yml"), true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("smp: 4"));
        assert!(text.contains("password-crypto: sha512"));
        assert!(text.ends_with("OK!\n"));
    }
}
