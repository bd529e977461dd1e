//! # Device Catalog
//!
//! All device groups known to one CLI, keyed by group name.

use clap::ArgMatches;

use crate::context::{Echo, GlobalContext};
use crate::device::Device;
use crate::error::{Result, WiringError};
use crate::group::CommandGroup;
use crate::layer::Outcome;

/// Type-erased view of a [`CommandGroup`]
pub trait DeviceGroup: Send + Sync {
    fn name(&self) -> &str;

    fn list_commands(&self) -> Vec<&'static str>;

    fn supported_models(&self) -> Vec<&'static str>;

    fn clap_command(&self) -> clap::Command;

    fn dispatch(&self, ctx: &GlobalContext, matches: &ArgMatches, echo: Echo) -> Result<Outcome>;
}

impl<D: Device> DeviceGroup for CommandGroup<D> {
    fn name(&self) -> &str {
        CommandGroup::name(self)
    }

    fn list_commands(&self) -> Vec<&'static str> {
        CommandGroup::list_commands(self)
    }

    fn supported_models(&self) -> Vec<&'static str> {
        D::supported_models()
    }

    fn clap_command(&self) -> clap::Command {
        CommandGroup::clap_command(self)
    }

    fn dispatch(&self, ctx: &GlobalContext, matches: &ArgMatches, echo: Echo) -> Result<Outcome> {
        CommandGroup::dispatch(self, ctx, matches, echo)
    }
}

/// Registered device groups
#[derive(Default)]
pub struct DeviceCatalog {
    groups: Vec<Box<dyn DeviceGroup>>,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register device type `D`. Fails on unregistered types and duplicate names.
    pub fn register<D: Device>(&mut self) -> std::result::Result<&mut Self, WiringError> {
        let group = CommandGroup::<D>::new()?;
        if self.get(group.name()).is_some() {
            return Err(WiringError::DuplicateGroup(group.name().to_string()));
        }
        tracing::debug!(
            "Registered device group '{}' with {} commands",
            group.name(),
            group.list_commands().len()
        );
        self.groups.push(Box::new(group));
        Ok(self)
    }

    /// Group names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.iter().map(|g| g.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, name: &str) -> Option<&dyn DeviceGroup> {
        self.groups
            .iter()
            .find(|g| g.name() == name)
            .map(|g| g.as_ref())
    }

    /// clap commands of all groups, sorted by name
    pub fn clap_commands(&self) -> Vec<clap::Command> {
        self.names()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(|g| g.clap_command())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
