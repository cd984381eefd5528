use crate::env_var::config;
use crate::world::World;

use anyhow::{bail, Result};
use std::fmt::Write;
use std::process::Command;
use tracing::*;

/// A single accelerator visible to this host, addressed by an opaque
/// identifier (a PCI bus address or a device name rendered as text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    index: usize,
    id: String,
}

impl Accelerator {
    /// The accelerator's index within the local catalog
    pub fn index(&self) -> usize {
        self.index
    }
    /// The accelerator's opaque identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The set of accelerators visible to a single host process.
///
/// A catalog is produced once at startup by [discover][AcceleratorCatalog::discover]
/// and passed to whatever component needs it; it is read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorCatalog {
    accels: Vec<Accelerator>,
}

impl AcceleratorCatalog {
    /// Enumerate the accelerators visible on the local host.
    ///
    /// The VECADD_VISIBLE_DEVICES environment variable, when set, overrides
    /// discovery with an explicit comma separated identifier list (an empty
    /// value means no accelerators are visible). Otherwise OpenCL platforms
    /// are enumerated when compiled with the 'enable-ocl' feature, falling
    /// back to an nvidia-smi query.
    ///
    /// An unavailable accelerator runtime yields an empty catalog; the zero
    /// accelerator case surfaces as an error at [assign][Self::assign] time,
    /// not here.
    #[tracing::instrument(skip_all)]
    pub fn discover() -> AcceleratorCatalog {
        if let Some(devices) = &config().visible_devices {
            let ids = devices
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
            return AcceleratorCatalog::from_ids(ids);
        }
        #[cfg(feature = "enable-ocl")]
        {
            let ids = ocl_devices();
            if !ids.is_empty() {
                return AcceleratorCatalog::from_ids(ids);
            }
        }
        AcceleratorCatalog::from_ids(smi_devices())
    }

    /// Build a catalog from explicit identifiers, indexed in order
    pub fn from_ids(ids: Vec<String>) -> AcceleratorCatalog {
        AcceleratorCatalog {
            accels: ids
                .into_iter()
                .enumerate()
                .map(|(index, id)| Accelerator { index, id })
                .collect(),
        }
    }

    /// Number of accelerators in the catalog
    pub fn len(&self) -> usize {
        self.accels.len()
    }

    /// True if no accelerators are visible
    pub fn is_empty(&self) -> bool {
        self.accels.is_empty()
    }

    /// The accelerator at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Accelerator> {
        self.accels.get(index)
    }

    /// Iterate over the catalog in index order
    pub fn iter(&self) -> impl Iterator<Item = &Accelerator> {
        self.accels.iter()
    }

    /// Assign exactly one accelerator to the given pe by the modulo rule.
    ///
    /// Requires a non empty catalog: the zero accelerator case is a checked,
    /// descriptive error rather than a modulo by zero.
    pub fn assign(&self, pe: usize) -> Result<&Accelerator> {
        if self.accels.is_empty() {
            bail!(
                "no accelerators are visible on this host, every pe requires at least one accelerator to be assigned (set VECADD_VISIBLE_DEVICES to override discovery)"
            );
        }
        Ok(&self.accels[pe % self.accels.len()])
    }
}

/// Render the per-pe assignment report: this pe's rank, job size, hostname,
/// accelerator count and assigned accelerator, followed by one line per
/// other accelerator of the catalog. Purely observational.
pub fn assignment_report(world: &World, catalog: &AcceleratorCatalog) -> Result<String> {
    let assigned = catalog.assign(world.my_pe())?;
    let mut report = String::new();
    writeln!(
        report,
        "Rank {}/{} from {} sees {} GPUs, assigned GPU is {}",
        world.my_pe(),
        world.num_pes(),
        world.hostname(),
        catalog.len(),
        assigned.id()
    )?;
    writeln!(report, "Other {} GPUs are:", catalog.len() - 1)?;
    for accel in catalog.iter().filter(|a| a.index() != assigned.index()) {
        writeln!(report, "** gpu {}: {} **", accel.index(), accel.id())?;
    }
    Ok(report)
}

fn smi_devices() -> Vec<String> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=pci.bus_id", "--format=csv,noheader"])
        .output();
    if let Ok(out) = output {
        if out.status.success() {
            if let Ok(text) = String::from_utf8(out.stdout) {
                return text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();
            }
        }
    }
    trace!("nvidia-smi query found no accelerators");
    Vec::new()
}

#[cfg(feature = "enable-ocl")]
fn ocl_devices() -> Vec<String> {
    let mut ids = Vec::new();
    for platform in ocl::Platform::list() {
        match ocl::Device::list_all(platform) {
            Ok(devices) => {
                for device in devices {
                    match device.name() {
                        Ok(name) => ids.push(name),
                        Err(e) => warn!("unable to resolve an OpenCL device name: {}", e),
                    }
                }
            }
            Err(e) => warn!("unable to list devices for an OpenCL platform: {}", e),
        }
    }
    ids
}
