use std::fmt;
use std::process::Command;

/// A program plus the leading arguments every invocation starts with,
/// e.g. `uvt-kvm ip` or `sh /path/to/stub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Splits on whitespace; the first token is the program.
    pub fn parse(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
        }
    }

    #[cfg(test)]
    pub fn from_parts<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_from_args() {
        let line = CommandLine::parse("uvt-kvm  ip");
        assert_eq!(line, CommandLine::from_parts("uvt-kvm", ["ip"]));
        assert_eq!(line.to_string(), "uvt-kvm ip");
    }

    #[test]
    fn empty_line_has_empty_program() {
        let line = CommandLine::parse("   ");
        assert_eq!(line, CommandLine::from_parts("", Vec::<String>::new()));
        assert_eq!(line.to_string(), "");
    }
}
