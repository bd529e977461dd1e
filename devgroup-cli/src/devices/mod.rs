//! # Devices
//!
//! Device types exposed by the command line.

pub mod generic;
pub mod plug;
pub mod simulator;

use devgroup_core::{DeviceCatalog, WiringError};

pub use generic::{DeviceInfo, GenericDevice};
pub use plug::{Plug, PlugStatus};

/// Catalog of every device group the CLI knows
pub fn catalog() -> Result<DeviceCatalog, WiringError> {
    let mut catalog = DeviceCatalog::new();
    catalog.register::<GenericDevice>()?.register::<Plug>()?;
    Ok(catalog)
}
