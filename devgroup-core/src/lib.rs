//! # devgroup-core
//!
//! Declarative command registration and dispatch for device types.
//!
//! A device type registers its commands once in a [`CommandRegistry`],
//! inheriting the commands of the types it embeds. A [`CommandGroup`] binds
//! the type to its registry, resolves subcommand names to composed calls
//! (decorators, output strategy, autodetect guard, method) and owns the
//! single device instance of an invocation.

pub mod catalog;
pub mod context;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod group;
pub mod layer;
pub mod output;
pub mod registry;
pub mod validate;

pub use catalog::{DeviceCatalog, DeviceGroup};
pub use context::{Captured, Echo, GlobalContext, Invocation, Kwargs};
pub use descriptor::{CommandDescriptor, DescriptorBuilder, Param, ParamKind, HIDDEN_OPTION};
pub use device::{ConnectionParams, Device};
pub use error::{DeviceError, DispatchError, Result, UsageError, WiringError};
pub use group::{CommandGroup, ComposedCommand, Session};
pub use layer::{Decorator, Layer, Next, Outcome};
pub use output::{
    CommandOutput, CommandResult, Displayable, JsonOutput, MessageArgs, MessageSpec,
    OutputStrategy, StructuredView, TextOutput,
};
pub use registry::CommandRegistry;
