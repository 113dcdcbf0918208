use std::process::Stdio;

use tokio::process::Command;

use crate::command::CommandLine;
use crate::load_tier::LoadTier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchJob {
    pub vm: String,
    pub address: String,
    pub tier: LoadTier,
}

/// Starts a load generator somewhere and forgets about it.
///
/// Implementations must not block on the launched work and must not report
/// its outcome.
pub trait Launcher {
    fn launch(&self, job: LaunchJob);
}

/// Runs the load generator on the VM over `ssh`.
pub struct Ssh {
    command: CommandLine,
    user: String,
    load_binary: String,
}

impl Ssh {
    pub fn new(command: CommandLine, user: impl Into<String>, load_binary: impl Into<String>) -> Self {
        Self {
            command,
            user: user.into(),
            load_binary: load_binary.into(),
        }
    }

    /// Arguments passed to `ssh`: the destination, then the remote command.
    pub fn ssh_args(&self, job: &LaunchJob) -> [String; 2] {
        [
            format!("{}@{}", self.user, job.address),
            format!("{} {}", self.load_binary, job.tier.argument),
        ]
    }
}

impl Launcher for Ssh {
    /// Must be called from within a tokio runtime.
    fn launch(&self, job: LaunchJob) {
        let mut cmd = self.command.command();
        cmd.args(self.ssh_args(&job))
            // Every session runs in the background; none of them may read the
            // operator's terminal.
            .stdin(Stdio::null())
            .stdout(Stdio::null());

        let spawned = Command::from(cmd).kill_on_drop(false).spawn();

        // The child keeps running after its handle is dropped.
        if let Err(e) = spawned {
            tracing::debug!(vm = %job.vm, command = %self.command, error = %e, "ssh spawn failed");
        }
    }
}

/// Prints what would be run instead of running it.
pub struct DryRun {
    ssh: Ssh,
}

impl DryRun {
    pub fn new(ssh: Ssh) -> Self {
        Self { ssh }
    }
}

impl Launcher for DryRun {
    fn launch(&self, job: LaunchJob) {
        let [destination, remote] = self.ssh.ssh_args(&job);
        println!("  {} {} '{}'", self.ssh.command, destination, remote);
    }
}

/// Submits one job per VM, tier chosen by list position.
///
/// `addresses` lines up with `names`; an empty address is passed on as is.
pub fn launch_all<L: Launcher + ?Sized>(launcher: &L, names: &[String], addresses: &[String]) {
    for (position, (name, address)) in names.iter().zip(addresses).enumerate() {
        let tier = LoadTier::for_position(position);
        println!("{} start running {}.", name, tier.label);
        tracing::debug!(vm = %name, %address, argument = tier.argument, "launching load");

        launcher.launch(LaunchJob {
            vm: name.clone(),
            address: address.clone(),
            tier,
        });
    }
}
