use std::cell::OnceCell;
use std::fmt;
use std::process::Output;

use crate::command::CommandLine;
use crate::error::{HarnessError, Result};

/// Host CPU layout as reported by the hypervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTopology {
    pub nodes: u32,
    pub sockets: u32,
    pub cores: u32,
    pub threads: u32,
}

impl HostTopology {
    pub fn logical_cpus(&self) -> usize {
        self.nodes as usize * self.sockets as usize * self.cores as usize * self.threads as usize
    }

    /// Parses the output of `virsh nodeinfo`.
    pub fn parse_nodeinfo(output: &str) -> Result<Self> {
        let field = |key: &'static str| -> Result<u32> {
            output
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim() == key)
                .and_then(|(_, value)| value.trim().parse().ok())
                .ok_or(HarnessError::NodeInfoParse { field: key })
        };

        Ok(Self {
            nodes: field("NUMA cell(s)")?,
            sockets: field("CPU socket(s)")?,
            cores: field("Core(s) per socket")?,
            threads: field("Thread(s) per core")?,
        })
    }
}

/// Which host CPUs a vCPU may run on, indexed by host CPU number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityMask(Vec<bool>);

impl AffinityMask {
    pub fn allow_all(topology: &HostTopology) -> Self {
        Self(vec![true; topology.logical_cpus()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Renders the allowed CPUs in the Linux cpulist format, e.g. `0-3,6`.
    pub fn to_cpulist(&self) -> String {
        let mut ranges = Vec::new();
        let mut start = None;

        for (cpu, allowed) in self.iter().chain([false]).enumerate() {
            match (allowed, start) {
                (true, None) => start = Some(cpu),
                (false, Some(first)) => {
                    let last = cpu - 1;
                    if first == last {
                        ranges.push(first.to_string());
                    } else {
                        ranges.push(format!("{first}-{last}"));
                    }
                    start = None;
                }
                _ => {}
            }
        }

        ranges.join(",")
    }
}

impl fmt::Display for AffinityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cpulist())
    }
}

/// A VM known to the hypervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    /// What the hypervisor is handed to address this VM. For libvirt this is
    /// the UUID, which `virsh` cannot confuse with a domain ID or name.
    pub handle: String,
}

pub trait Hypervisor {
    fn host_topology(&self) -> Result<HostTopology>;

    /// `None` when no VM has exactly this name.
    fn lookup_domain(&self, name: &str) -> Option<Domain>;

    fn pin_vcpu(&self, domain: &Domain, vcpu: u32, mask: &AffinityMask) -> Result<()>;
}

/// Talks to libvirt through the `virsh` command line client.
///
/// `virsh` resolves a domain argument as an ID, then a UUID, then a name, so
/// names are matched against the domain inventory here and only UUIDs are
/// passed back to it.
pub struct Virsh {
    command: CommandLine,
    uri: String,
    inventory: OnceCell<Vec<Domain>>,
}

impl Virsh {
    pub fn new(command: CommandLine, uri: impl Into<String>) -> Self {
        Self {
            command,
            uri: uri.into(),
            inventory: OnceCell::new(),
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} -c {} {}", self.command, self.uri, args.join(" "))
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        self.command
            .command()
            .arg("-c")
            .arg(&self.uri)
            .args(args)
            .output()
            .map_err(|source| HarnessError::CommandSpawn {
                command: self.describe(args),
                source,
            })
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(HarnessError::HypervisorCommand {
                command: self.describe(args),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn list_domains(&self) -> Result<Vec<Domain>> {
        let uuids = self.run_checked(&["list", "--all", "--uuid"])?;

        uuids
            .lines()
            .map(str::trim)
            .filter(|uuid| !uuid.is_empty())
            .map(|uuid| {
                let name = self.run_checked(&["domname", uuid])?;
                Ok(Domain {
                    name: name.trim().to_owned(),
                    handle: uuid.to_owned(),
                })
            })
            .collect()
    }

    /// Fetched on first use, then reused for every lookup.
    fn inventory(&self) -> Result<&[Domain]> {
        if let Some(domains) = self.inventory.get() {
            return Ok(domains.as_slice());
        }

        let domains = self.list_domains()?;
        tracing::debug!(count = domains.len(), "fetched domain inventory");
        Ok(self.inventory.get_or_init(|| domains).as_slice())
    }
}

impl Hypervisor for Virsh {
    fn host_topology(&self) -> Result<HostTopology> {
        let output = self.run_checked(&["nodeinfo"])?;
        HostTopology::parse_nodeinfo(&output)
    }

    fn lookup_domain(&self, name: &str) -> Option<Domain> {
        match self.inventory() {
            Ok(domains) => domains.iter().find(|domain| domain.name == name).cloned(),
            Err(e) => {
                tracing::warn!(vm = name, error = %e, "could not list domains");
                None
            }
        }
    }

    fn pin_vcpu(&self, domain: &Domain, vcpu: u32, mask: &AffinityMask) -> Result<()> {
        let vcpu = vcpu.to_string();
        let cpulist = mask.to_cpulist();
        self.run_checked(&[
            "vcpupin",
            "--domain",
            &domain.handle,
            "--vcpu",
            &vcpu,
            "--cpulist",
            &cpulist,
        ])?;
        Ok(())
    }
}

/// Stands in for the hypervisor on a dry run: reports the local machine's
/// CPUs, resolves every name and changes nothing.
pub struct LocalHost;

impl Hypervisor for LocalHost {
    fn host_topology(&self) -> Result<HostTopology> {
        let logical = num_cpus::get() as u32;
        let physical = num_cpus::get_physical() as u32;

        let (cores, threads) = if physical > 0 && logical % physical == 0 {
            (physical, logical / physical)
        } else {
            (logical, 1)
        };

        Ok(HostTopology {
            nodes: 1,
            sockets: 1,
            cores,
            threads,
        })
    }

    fn lookup_domain(&self, name: &str) -> Option<Domain> {
        Some(Domain {
            name: name.to_owned(),
            handle: name.to_owned(),
        })
    }

    fn pin_vcpu(&self, domain: &Domain, vcpu: u32, mask: &AffinityMask) -> Result<()> {
        tracing::info!(
            vm = %domain.name,
            vcpu,
            cpulist = %mask.to_cpulist(),
            "dry run, skipping vcpupin"
        );
        Ok(())
    }
}
