//! Generated command representation
//!
//! A command is a program plus ordered argument tokens. The same value renders
//! to preview text and to the argv handed to the process, so what is printed
//! is what runs.

use std::fmt;

/// How rendered tokens are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// One token per line, shell continuation between them
    #[default]
    MultiLine,
    SingleLine,
}

impl JoinMode {
    pub fn separator(&self) -> &'static str {
        match self {
            JoinMode::MultiLine => " \\\n  ",
            JoinMode::SingleLine => " ",
        }
    }
}

/// Whether an option value is wrapped in double quotes when rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Quoted,
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Positional word, e.g. `vol-upload` or `ubuntu-18.04`
    Word(String),
    /// Bare `--name`
    Flag(String),
    /// `--name value`
    Opt {
        name: String,
        value: String,
        quoting: Quoting,
    },
}

impl Arg {
    pub fn word(value: impl Into<String>) -> Self {
        Arg::Word(value.into())
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Arg::Flag(name.into())
    }

    pub fn opt(name: impl Into<String>, value: impl ToString) -> Self {
        Arg::Opt {
            name: name.into(),
            value: value.to_string(),
            quoting: Quoting::Bare,
        }
    }

    pub fn quoted(name: impl Into<String>, value: impl ToString) -> Self {
        Arg::Opt {
            name: name.into(),
            value: value.to_string(),
            quoting: Quoting::Quoted,
        }
    }

    fn render(&self) -> String {
        match self {
            Arg::Word(word) => word.clone(),
            Arg::Flag(name) if name.is_empty() => String::new(),
            Arg::Flag(name) => format!("--{name}"),
            Arg::Opt {
                name,
                value,
                quoting: Quoting::Quoted,
            } => format!("--{name} \"{value}\""),
            Arg::Opt { name, value, .. } => format!("--{name} {value}"),
        }
    }

    fn push_argv(&self, argv: &mut Vec<String>) {
        match self {
            Arg::Word(word) if word.is_empty() => {}
            Arg::Word(word) => argv.push(word.clone()),
            Arg::Flag(name) if name.is_empty() => {}
            Arg::Flag(name) => argv.push(format!("--{name}")),
            Arg::Opt { name, value, .. } => {
                argv.push(format!("--{name}"));
                argv.push(value.clone());
            }
        }
    }
}

/// One external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<Arg>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn push(&mut self, arg: Arg) {
        self.args.push(arg);
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Text form; empty tokens are dropped before joining
    pub fn render(&self, mode: JoinMode) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(Arg::render))
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
            .join(mode.separator())
    }

    /// Arguments as passed to the process, without shell quoting
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() * 2);
        for arg in &self.args {
            arg.push_argv(&mut argv);
        }
        argv
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(JoinMode::SingleLine))
    }
}
