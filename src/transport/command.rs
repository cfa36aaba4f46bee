//! Engine commands as argument vectors

use std::fmt;

use serde::Serialize;

/// One engine command: a name and its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    /// Start a command
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append one argument in place
    pub fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// Append several arguments in place
    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    /// Command name, e.g. `FT.AGGREGATE`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in order
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// First argument; the index name for every FT.* command
    pub fn index(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// True if `token` appears as a whole argument
    pub fn has_arg(&self, token: &str) -> bool {
        self.args.iter().any(|a| a == token)
    }

    /// Arguments following the first occurrence of `token`
    pub fn args_after(&self, token: &str) -> Option<&[String]> {
        self.args
            .iter()
            .position(|a| a == token)
            .map(|i| &self.args[i + 1..])
    }
}

impl fmt::Display for Command {
    /// Arguments containing whitespace or quotes, and empty arguments, are
    /// written double-quoted with `"` and `\` escaped
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
                write!(f, " \"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
