use std::path::Path;

use crate::address::{self, AddressResolver};
use crate::config;
use crate::error::Result;
use crate::hypervisor::Hypervisor;
use crate::launcher::{self, Launcher};
use crate::pinner::{self, PinReport};

/// Config, pin, resolve, launch. Returns the pin report.
pub fn run<H, R, L>(config_path: &Path, hv: &H, resolver: &R, launcher: &L) -> Result<PinReport>
where
    H: Hypervisor + ?Sized,
    R: AddressResolver + ?Sized,
    L: Launcher + ?Sized,
{
    let names = config::load_vm_list(config_path)?;
    tracing::info!(vms = names.len(), "starting load test");

    let report = pinner::pin_all(hv, &names)?;
    tracing::info!(
        pinned = report.pinned(),
        skipped = report.diagnostics.len(),
        "pinning done"
    );

    let addresses = address::resolve_all(resolver, &names);
    launcher::launch_all(launcher, &names, &addresses);

    tracing::info!("all load generators submitted");
    Ok(report)
}
