//! # Command Registry
//!
//! Per-device-type table of command descriptors. A registry is built once,
//! usually inside the type's [`Device::command_registry`] static, by first
//! inheriting the registries of the types it embeds and then registering its
//! own commands. Later entries replace earlier ones with the same name, so the
//! most derived declaration wins.
//!
//! ```ignore
//! fn command_registry() -> Option<&'static CommandRegistry<Self>> {
//!     static REGISTRY: OnceLock<CommandRegistry<Plug>> = OnceLock::new();
//!     let base = GenericDevice::command_registry()?;
//!     Some(REGISTRY.get_or_init(|| {
//!         let mut registry = CommandRegistry::new();
//!         registry.inherit(base).register(status_command());
//!         registry
//!     }))
//! }
//! ```
//!
//! [`Device::command_registry`]: crate::device::Device::command_registry

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::CommandDescriptor;
use crate::device::Device;
use crate::error::WiringError;

/// Command registry of one device type
pub struct CommandRegistry<D> {
    commands: HashMap<String, CommandDescriptor<D>>,
}

impl<D: 'static> CommandRegistry<D> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Take over every command of the embedded type `B`
    pub fn inherit<B>(&mut self, base: &CommandRegistry<B>) -> &mut Self
    where
        B: 'static,
        D: AsMut<B>,
    {
        for (name, descriptor) in &base.commands {
            self.commands.insert(name.clone(), descriptor.lift::<D>());
        }
        self
    }

    /// Take over the commands of device type `B`, which must itself be registered
    pub fn inherit_from<B>(&mut self) -> Result<&mut Self, WiringError>
    where
        B: Device,
        D: AsMut<B>,
    {
        let base = B::command_registry().ok_or(WiringError::Unregistered {
            type_name: std::any::type_name::<B>(),
        })?;
        Ok(self.inherit(base))
    }

    /// Register a command, replacing any inherited command of the same name
    pub fn register(&mut self, descriptor: CommandDescriptor<D>) -> &mut Self {
        if self.commands.contains_key(&descriptor.name) {
            tracing::trace!("Overriding command '{}'", descriptor.name);
        }
        self.commands.insert(descriptor.name.clone(), descriptor);
        self
    }
}

impl<D> CommandRegistry<D> {
    /// Get a command by name
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor<D>> {
        self.commands.get(name)
    }

    /// Check if a command exists
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// All command names, sorted
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<D: 'static> Default for CommandRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for CommandRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}
