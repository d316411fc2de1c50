//! Shell completion and man page generation

use crate::cli::commands::Cli;
use crate::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::Write;

/// Write completions for `shell` to `out`
pub fn write_completions<W: Write>(shell: Shell, out: &mut W) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

/// Render the roff man page
pub fn generate_man_page<W: Write>(out: &mut W) -> Result<()> {
    let man = clap_mangen::Man::new(Cli::command());
    man.render(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bash_completions_mention_subcommands() {
        let mut buffer = Vec::new();
        write_completions(Shell::Bash, &mut buffer);
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("_virtbuilder"));
        assert!(script.contains("validate"));
    }

    #[test]
    fn man_page_renders() {
        let mut buffer = Vec::new();
        generate_man_page(&mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains(".TH"));
    }
}
