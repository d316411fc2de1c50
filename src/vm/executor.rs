//! Sequential execution of generated commands

use crate::utils::system::find_tool;
use crate::vm::command::{JoinMode, ShellCommand};
use crate::Result;
use anyhow::{anyhow, Context};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};

/// Runs a single command to completion
pub trait CommandRunner {
    fn run(&mut self, cmd: &ShellCommand) -> Result<()>;
}

/// Spawns the real tool, inheriting stdio
pub struct SystemRunner {
    workdir: PathBuf,
}

impl SystemRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &ShellCommand) -> Result<()> {
        let program = find_tool(cmd.program())?;
        debug!(program = %program.display(), args = ?cmd.argv(), "spawning");

        let status = Command::new(&program)
            .args(cmd.argv())
            .current_dir(&self.workdir)
            .status()
            .with_context(|| format!("failed to start {}", cmd.program()))?;
        if !status.success() {
            return Err(anyhow!("{} failed ({})", cmd.program(), status));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Print commands without running them
    pub preview: bool,
    /// Ask before each command
    pub interactive: bool,
    pub join: JoinMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            preview: false,
            interactive: true,
            join: JoinMode::MultiLine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every command was printed; nothing ran
    Previewed(usize),
    Completed(usize),
    /// The user stopped the sequence after `ran` commands
    Aborted { ran: usize },
}

/// Print each command and, unless previewing, run it.
/// The first failing command stops the sequence and its error is returned.
pub fn run_sequence<R: BufRead, W: Write>(
    cmds: &[ShellCommand],
    runner: &mut dyn CommandRunner,
    options: RunOptions,
    input: &mut R,
    out: &mut W,
) -> Result<Outcome> {
    for (ran, cmd) in cmds.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}", cmd.render(options.join))?;
        writeln!(out)?;
        if options.preview {
            continue;
        }
        if options.interactive && !confirm(input, out)? {
            warn!("aborted by user after {} command(s)", ran);
            return Ok(Outcome::Aborted { ran });
        }
        info!(program = cmd.program(), "running command {}/{}", ran + 1, cmds.len());
        runner.run(cmd)?;
    }

    if options.preview {
        Ok(Outcome::Previewed(cmds.len()))
    } else {
        Ok(Outcome::Completed(cmds.len()))
    }
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Press Enter to continue (q to abort): ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(!matches!(
        answer.trim().to_lowercase().as_str(),
        "q" | "quit" | "n" | "no"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::command::Arg;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        ran: Vec<String>,
        fail_on: Option<usize>,
    }

    impl CommandRunner for Recorder {
        fn run(&mut self, cmd: &ShellCommand) -> Result<()> {
            if self.fail_on == Some(self.ran.len()) {
                return Err(anyhow!("{} failed (exit status: 1)", cmd.program()));
            }
            self.ran.push(cmd.to_string());
            Ok(())
        }
    }

    fn commands() -> Vec<ShellCommand> {
        vec![
            ShellCommand::new("virt-builder").arg(Arg::word("fedora-40")),
            ShellCommand::new("virsh").arg(Arg::word("vol-create-as")),
            ShellCommand::new("virt-install").arg(Arg::flag("import")),
        ]
    }

    fn batch() -> RunOptions {
        RunOptions {
            interactive: false,
            ..RunOptions::default()
        }
    }

    #[test]
    fn preview_prints_without_running() {
        let mut runner = Recorder::default();
        let mut out = Vec::new();
        let options = RunOptions {
            preview: true,
            ..RunOptions::default()
        };
        let outcome =
            run_sequence(&commands(), &mut runner, options, &mut Cursor::new(""), &mut out).unwrap();

        assert_eq!(outcome, Outcome::Previewed(3));
        assert!(runner.ran.is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("virt-builder \\\n  fedora-40"));
        assert!(!printed.contains("Press Enter"));
    }

    #[test]
    fn runs_all_commands_in_order() {
        let mut runner = Recorder::default();
        let outcome =
            run_sequence(&commands(), &mut runner, batch(), &mut Cursor::new(""), &mut std::io::sink())
                .unwrap();
        assert_eq!(outcome, Outcome::Completed(3));
        assert_eq!(
            runner.ran,
            ["virt-builder fedora-40", "virsh vol-create-as", "virt-install --import"]
        );
    }

    #[test]
    fn stops_at_first_failure() {
        let mut runner = Recorder {
            fail_on: Some(1),
            ..Recorder::default()
        };
        let err =
            run_sequence(&commands(), &mut runner, batch(), &mut Cursor::new(""), &mut std::io::sink())
                .unwrap_err();
        assert!(err.to_string().contains("virsh failed"));
        assert_eq!(runner.ran, ["virt-builder fedora-40"]);
    }

    #[test]
    fn interactive_prompt_can_abort() {
        let mut runner = Recorder::default();
        let mut out = Vec::new();
        let outcome = run_sequence(
            &commands(),
            &mut runner,
            RunOptions::default(),
            &mut Cursor::new("\nq\n"),
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Aborted { ran: 1 });
        assert_eq!(runner.ran, ["virt-builder fedora-40"]);
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("Press Enter to continue").count(), 2);
    }

    #[test]
    fn closed_stdin_aborts_interactive_run() {
        let mut runner = Recorder::default();
        let outcome = run_sequence(
            &commands(),
            &mut runner,
            RunOptions::default(),
            &mut Cursor::new(""),
            &mut std::io::sink(),
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Aborted { ran: 0 });
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn system_runner_reports_exit_status() {
        let mut runner = SystemRunner::new(std::env::temp_dir());
        runner.run(&ShellCommand::new("true")).unwrap();
        let err = runner.run(&ShellCommand::new("false")).unwrap_err();
        assert!(err.to_string().contains("false failed"));
    }
}
