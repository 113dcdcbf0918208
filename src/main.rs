use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod address;
mod command;
mod config;
mod error;
mod hypervisor;
mod launcher;
mod load_tier;
mod pinner;
mod pipeline;

use address::HelperCommand;
use command::CommandLine;
use hypervisor::{Hypervisor, LocalHost, Virsh};
use launcher::{DryRun, Launcher, Ssh};

/// Pin each VM's vCPU 0 to every host CPU, then start a CPU load generator
/// on each VM at 100/80/60/40/20/10% by list position.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opts {
    /// Whitespace-separated list of VM names.
    #[arg(long, default_value = "../vmlist.conf")]
    config: PathBuf,

    /// libvirt connection URI.
    #[arg(long, default_value = "qemu:///system")]
    uri: String,

    /// Command that prints a VM's address; the VM name is appended.
    #[arg(long, default_value = "uvt-kvm ip")]
    ip_helper: String,

    /// virsh client to run, split on whitespace.
    #[arg(long, default_value = "virsh")]
    virsh: String,

    /// Remote shell to run, split on whitespace.
    #[arg(long, default_value = "ssh")]
    ssh: String,

    #[arg(long, default_value = "ubuntu")]
    ssh_user: String,

    /// Load generator path on the VM.
    #[arg(long, default_value = "~/cpu/testcases/5/iambusy")]
    load_binary: String,

    /// Read the local CPU count and print the ssh commands instead of
    /// pinning and launching.
    #[arg(long)]
    dry_run: bool,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|e| {
            eprintln!("invalid log level {:?}, using info: {}", level, e);
            EnvFilter::new("info")
        });

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to init logger: {}", e);
    }
}

fn run(opts: &Opts) -> anyhow::Result<()> {
    let ssh = Ssh::new(
        CommandLine::parse(&opts.ssh),
        &opts.ssh_user,
        &opts.load_binary,
    );
    let (hv, launcher): (Box<dyn Hypervisor>, Box<dyn Launcher>) = if opts.dry_run {
        (Box::new(LocalHost), Box::new(DryRun::new(ssh)))
    } else {
        (
            Box::new(Virsh::new(CommandLine::parse(&opts.virsh), &opts.uri)),
            Box::new(ssh),
        )
    };
    let resolver = HelperCommand::new(&opts.ip_helper);

    pipeline::run(&opts.config, hv.as_ref(), &resolver, launcher.as_ref())
        .with_context(|| format!("load test for VMs in {} failed", opts.config.display()))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(&opts.log_level);
    run(&opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_lab_setup() {
        let opts = Opts::try_parse_from(["vcpu-loadtest"]).unwrap();

        assert_eq!(opts.config, PathBuf::from("../vmlist.conf"));
        assert_eq!(opts.uri, "qemu:///system");
        assert_eq!(opts.ip_helper, "uvt-kvm ip");
        assert_eq!(opts.virsh, "virsh");
        assert_eq!(opts.ssh, "ssh");
        assert_eq!(opts.ssh_user, "ubuntu");
        assert_eq!(opts.load_binary, "~/cpu/testcases/5/iambusy");
        assert!(!opts.dry_run);
    }

    #[test]
    fn missing_config_error_names_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("vmlist.conf").display().to_string();
        let opts =
            Opts::try_parse_from(["vcpu-loadtest", "--dry-run", "--config", config.as_str()]).unwrap();

        let err = run(&opts).unwrap_err();
        let message = format!("{:#}", err);

        assert!(message.contains(&config));
        assert!(!message.contains("qemu"));
    }
}
