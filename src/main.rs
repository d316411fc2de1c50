use anyhow::Result;
use clap::Parser;
use std::io;
use virtbuilder::cli::actions::{create_vm, remove_vm, validate_definition};
use virtbuilder::cli::completions::{generate_man_page, write_completions};
use virtbuilder::cli::{Cli, Cmd};
use virtbuilder::utils::logging::init_logger;
use virtbuilder::vm::executor::{Outcome, RunOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet)?;

    let outcome = match cli.cmd {
        Cmd::Create {
            definition,
            stage,
            preview,
            no_interactive,
        } => create_vm(&definition, &cli.workdir, stage, run_options(preview, no_interactive))?,

        Cmd::Remove {
            definition,
            preview,
            no_interactive,
        } => remove_vm(&definition, &cli.workdir, run_options(preview, no_interactive))?,

        Cmd::Validate { definition, dump } => {
            validate_definition(&definition, dump, &mut io::stdout().lock())?;
            return Ok(());
        }

        Cmd::Completions { shell } => {
            write_completions(shell, &mut io::stdout());
            return Ok(());
        }

        Cmd::ManPage => {
            generate_man_page(&mut io::stdout().lock())?;
            return Ok(());
        }
    };

    if let Outcome::Aborted { ran } = outcome {
        println!("Aborted after {ran} command(s).");
    }
    Ok(())
}

fn run_options(preview: bool, no_interactive: bool) -> RunOptions {
    RunOptions {
        preview,
        interactive: !no_interactive,
        ..RunOptions::default()
    }
}
