//! Command schemas and argument parsing.
//!
//! Each command declares its flags once. The dispatcher parses `argv`
//! against the schema before the handler runs, so handlers only see
//! [`CommandArgs`].

use std::collections::HashMap;
use std::fmt;

/// One flag a command accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSchema {
    /// Canonical name, also accepted as `--name`.
    pub name: &'static str,
    pub short: Option<char>,
    /// Whether the flag consumes a value (`-n 5`, `-n5`, `--lines=5`).
    pub takes_value: bool,
    pub description: &'static str,
}

impl FlagSchema {
    /// A boolean flag.
    pub fn switch(short: char, name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            short: Some(short),
            takes_value: false,
            description,
        }
    }

    /// A flag that takes a value.
    pub fn value(short: char, name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            short: Some(short),
            takes_value: true,
            description,
        }
    }
}

/// Schema for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub flags: Vec<FlagSchema>,
    /// Unknown dash-arguments are positional instead of an error.
    pub lenient: bool,
}

impl CommandSchema {
    /// Create a new command schema.
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            flags: Vec::new(),
            lenient: false,
        }
    }

    /// Add a flag.
    pub fn flag(mut self, flag: FlagSchema) -> Self {
        self.flags.push(flag);
        self
    }

    /// Treat unknown options as operands.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    fn by_short(&self, c: char) -> Option<&FlagSchema> {
        self.flags.iter().find(|f| f.short == Some(c))
    }

    fn by_long(&self, name: &str) -> Option<&FlagSchema> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// Parse arguments (without the command name).
    pub fn parse(&self, argv: &[String]) -> Result<CommandArgs, ArgsError> {
        let mut args = CommandArgs::default();
        let mut iter = argv.iter();
        let mut flags_done = false;

        while let Some(arg) = iter.next() {
            if flags_done || arg == "-" || !arg.starts_with('-') {
                args.positional.push(arg.clone());
                continue;
            }
            if arg == "--" {
                flags_done = true;
                continue;
            }

            if let Some(long) = arg.strip_prefix("--") {
                let (name, inline) = match long.split_once('=') {
                    Some((n, v)) => (n, Some(v.to_string())),
                    None => (long, None),
                };
                let Some(flag) = self.by_long(name) else {
                    if self.lenient {
                        args.positional.push(arg.clone());
                        continue;
                    }
                    return Err(self.error(ArgsErrorKind::UnknownLong(name.to_string())));
                };
                let value = if flag.takes_value {
                    match inline.or_else(|| iter.next().cloned()) {
                        Some(v) => Some(v),
                        None => return Err(self.error(ArgsErrorKind::MissingValue(name.to_string()))),
                    }
                } else {
                    None
                };
                args.flags.insert(flag.name.to_string(), value);
                continue;
            }

            let cluster = &arg[1..];
            if self.lenient && cluster.chars().any(|c| self.by_short(c).is_none()) {
                args.positional.push(arg.clone());
                continue;
            }
            for (idx, c) in cluster.char_indices() {
                let Some(flag) = self.by_short(c) else {
                    return Err(self.error(ArgsErrorKind::UnknownShort(c)));
                };
                if flag.takes_value {
                    let rest = &cluster[idx + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        iter.next().cloned()
                    } else {
                        Some(rest.to_string())
                    };
                    match value {
                        Some(v) => {
                            args.flags.insert(flag.name.to_string(), Some(v));
                        }
                        None => return Err(self.error(ArgsErrorKind::MissingValue(c.to_string()))),
                    }
                    break;
                }
                args.flags.insert(flag.name.to_string(), None);
            }
        }
        Ok(args)
    }

    fn error(&self, kind: ArgsErrorKind) -> ArgsError {
        ArgsError {
            command: self.name.to_string(),
            kind,
        }
    }
}

/// Parsed flags and operands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    pub positional: Vec<String>,
    flags: HashMap<String, Option<String>>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for tests: set a flag by canonical name.
    pub fn with_flag(mut self, name: &str) -> Self {
        self.flags.insert(name.to_string(), None);
        self
    }

    /// Builder for tests: set a valued flag.
    pub fn with_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.flags.insert(name.to_string(), Some(value.into()));
        self
    }

    /// Builder for tests: append an operand.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// True if the flag was given.
    pub fn has(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Value of a valued flag.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|v| v.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsErrorKind {
    UnknownShort(char),
    UnknownLong(String),
    MissingValue(String),
}

/// Rejected command line. Exit status 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgsError {
    pub command: String,
    pub kind: ArgsErrorKind,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ArgsErrorKind::UnknownShort(c) => write!(f, "{}: invalid option -- '{c}'", self.command),
            ArgsErrorKind::UnknownLong(name) => {
                write!(f, "{}: unrecognized option '--{name}'", self.command)
            }
            ArgsErrorKind::MissingValue(name) => {
                write!(f, "{}: option requires an argument -- '{name}'", self.command)
            }
        }
    }
}

impl std::error::Error for ArgsError {}
