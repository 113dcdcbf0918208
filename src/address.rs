use crate::command::CommandLine;

pub trait AddressResolver {
    /// Returns whatever the lookup produced, trimmed. Never fails; an empty
    /// string is a valid answer.
    fn resolve(&self, name: &str) -> String;
}

/// Runs an external helper (`uvt-kvm ip` by default) with the VM name appended.
pub struct HelperCommand {
    command: CommandLine,
}

impl HelperCommand {
    /// `command_line` is split on whitespace; the first token is the program.
    pub fn new(command_line: &str) -> Self {
        Self {
            command: CommandLine::parse(command_line),
        }
    }
}

impl AddressResolver for HelperCommand {
    fn resolve(&self, name: &str) -> String {
        match self.command.command().arg(name).output() {
            Ok(output) => {
                if !output.status.success() {
                    tracing::debug!(vm = name, status = %output.status, "address lookup exited with failure");
                }
                String::from_utf8_lossy(&output.stdout).trim().to_owned()
            }
            Err(e) => {
                tracing::debug!(vm = name, command = %self.command, error = %e, "could not run address lookup");
                String::new()
            }
        }
    }
}

pub fn resolve_all<R: AddressResolver + ?Sized>(resolver: &R, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let address = resolver.resolve(name);
            tracing::debug!(vm = %name, %address, "resolved address");
            address
        })
        .collect()
}
