use crate::error::Result;
use crate::hypervisor::{AffinityMask, Hypervisor};

/// vCPU that gets pinned on every VM.
pub const PINNED_VCPU: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    Pinned,
    NotFound,
}

#[derive(Debug, Default)]
pub struct PinReport {
    pub outcomes: Vec<(String, PinOutcome)>,
    pub diagnostics: Vec<String>,
}

impl PinReport {
    pub fn pinned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == PinOutcome::Pinned)
            .count()
    }
}

/// Progress line for a pin, e.g. `Pin vmA to 0-15.`
fn pin_line(name: &str, mask: &AffinityMask) -> String {
    format!("Pin {} to {}.", name, mask.to_cpulist())
}

/// Pins vCPU 0 of every named VM to all host CPUs.
///
/// Names the hypervisor does not know are reported and skipped. A failed
/// topology query or pin call aborts the run.
pub fn pin_all<H: Hypervisor + ?Sized>(hv: &H, names: &[String]) -> Result<PinReport> {
    let topology = hv.host_topology()?;
    let mask = AffinityMask::allow_all(&topology);
    tracing::debug!(?topology, cpus = mask.len(), "built affinity mask");

    let mut report = PinReport::default();

    for name in names {
        match hv.lookup_domain(name) {
            Some(domain) => {
                println!("{}", pin_line(name, &mask));
                hv.pin_vcpu(&domain, PINNED_VCPU, &mask)?;
                report.outcomes.push((name.clone(), PinOutcome::Pinned));
            }
            None => {
                let line = format!("Unable to locate {}.", name);
                println!("{}", line);
                tracing::warn!(vm = %name, "VM not found, skipping pin");
                report.diagnostics.push(line);
                report.outcomes.push((name.clone(), PinOutcome::NotFound));
            }
        }
    }

    Ok(report)
}
