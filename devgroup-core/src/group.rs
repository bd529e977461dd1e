//! # Command Group
//!
//! Binds a device type to its registry. Resolving a command composes its
//! call stack:
//!
//! ```text
//! last-declared decorator → … → first-declared decorator
//!     → output strategy → autodetect guard → device method
//! ```
//!
//! Decorators closest to the method see the rawest arguments; the output
//! strategy always sees the decorated arguments and the final result.

use std::any::type_name;
use std::sync::Arc;

use clap::{Arg, ArgMatches};
use tracing::{debug, info, trace};

use crate::context::{Echo, GlobalContext, Invocation};
use crate::descriptor::{CommandDescriptor, Method};
use crate::device::{ConnectionParams, Device};
use crate::error::{Result, UsageError, WiringError};
use crate::layer::{Layer, Outcome};
use crate::output::OutputStrategy;
use crate::registry::CommandRegistry;
use crate::validate::{parse_address, parse_token};

/// Stage name of the autodetect guard
pub const AUTODETECT_STAGE: &str = "autodetect";
/// Stage name of the device method
pub const METHOD_STAGE: &str = "method";

/// Command group of device type `D`
pub struct CommandGroup<D: Device> {
    name: String,
    registry: &'static CommandRegistry<D>,
}

impl<D: Device> CommandGroup<D> {
    /// Create the group. Fails if `D` never built its command registry.
    pub fn new() -> std::result::Result<Self, WiringError> {
        let registry = D::command_registry().ok_or(WiringError::Unregistered {
            type_name: type_name::<D>(),
        })?;
        Ok(Self {
            name: D::group_name(),
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &'static CommandRegistry<D> {
        self.registry
    }

    /// All command names, sorted
    pub fn list_commands(&self) -> Vec<&'static str> {
        self.registry.list_commands()
    }

    /// Resolve a command name to its composed call stack
    pub fn resolve(&self, name: &str, ctx: &GlobalContext) -> Result<ComposedCommand<D>> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| UsageError::UnknownCommand(name.to_string()))?;
        Ok(ComposedCommand::compose(descriptor, ctx))
    }

    /// Validate connection parameters and materialize the device
    pub fn connect(&self, ctx: &GlobalContext, params: ConnectionParams) -> Result<Session<'_, D>> {
        params.validate()?;
        let params = ConnectionParams {
            debug: ctx.debug,
            ..params
        };
        debug!(group = %self.name, address = %params.address, "Creating device");
        Ok(Session {
            group: self,
            ctx: ctx.clone(),
            device: D::connect(params),
        })
    }

    /// Resolve `command`, connect, and run it once
    pub fn invoke(
        &self,
        ctx: &GlobalContext,
        params: ConnectionParams,
        command: &str,
        inv: &mut Invocation,
    ) -> Result<Outcome> {
        let composed = self.resolve(command, ctx)?;
        let mut session = self.connect(ctx, params)?;
        composed.call(&mut session.device, inv)
    }

    /// Build the clap command for this group
    pub fn clap_command(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone())
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new("ip")
                    .long("ip")
                    .required(true)
                    .value_parser(parse_address)
                    .help("Device IP address"),
            )
            .arg(
                Arg::new("token")
                    .long("token")
                    .required(true)
                    .value_parser(parse_token)
                    .help("Device token (32 characters)"),
            )
            .arg(
                Arg::new("model")
                    .long("model")
                    .help("Device model, skips autodetection"),
            );
        if let Some(about) = D::about() {
            cmd = cmd.about(about);
        }

        let models = D::supported_models();
        if !models.is_empty() {
            cmd = cmd.after_help(format!("Supported models: {}", models.join(", ")));
        }

        for name in self.list_commands() {
            if let Some(descriptor) = self.registry.get(name) {
                cmd = cmd.subcommand(descriptor.to_clap());
            }
        }
        cmd
    }

    /// Run the subcommand selected in `matches`, which came from [`Self::clap_command`]
    pub fn dispatch(&self, ctx: &GlobalContext, matches: &ArgMatches, echo: Echo) -> Result<Outcome> {
        let (command, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| UsageError::MissingArgument("command".to_string()))?;
        let descriptor = self
            .registry
            .get(command)
            .ok_or_else(|| UsageError::UnknownCommand(command.to_string()))?;

        let required = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .ok_or_else(|| UsageError::MissingArgument(id.to_string()))
        };
        let mut params = ConnectionParams::new(required("ip")?, required("token")?);
        params.model = matches.get_one::<String>("model").cloned();

        let mut inv = Invocation::new(descriptor.extract_args(sub_matches), echo);
        self.invoke(ctx, params, command, &mut inv)
    }
}

/// One device bound to one invocation
pub struct Session<'g, D: Device> {
    group: &'g CommandGroup<D>,
    ctx: GlobalContext,
    device: D,
}

impl<D: Device> Session<'_, D> {
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Run a command against this session's device
    pub fn run(&mut self, command: &str, inv: &mut Invocation) -> Result<Outcome> {
        let composed = self.group.resolve(command, &self.ctx)?;
        composed.call(&mut self.device, inv)
    }
}

/// A command with its layers composed, ready to call
pub struct ComposedCommand<D> {
    name: String,
    /// Outermost first
    layers: Vec<Arc<dyn Layer>>,
    autodetect: bool,
    method: Method<D>,
}

impl<D: Device> ComposedCommand<D> {
    /// Compose `descriptor` with the output strategy selected by `ctx`
    pub fn compose(descriptor: &CommandDescriptor<D>, ctx: &GlobalContext) -> Self {
        let output = ctx
            .output
            .clone()
            .or_else(|| descriptor.default_output.clone())
            .unwrap_or_else(|| OutputStrategy::announce(&descriptor.name));

        let mut layers: Vec<Arc<dyn Layer>> = descriptor.decorators.iter().rev().cloned().collect();
        layers.push(Arc::new(output));

        Self {
            name: descriptor.name.clone(),
            layers,
            autodetect: !descriptor.skip_autodetect,
            method: Arc::clone(&descriptor.method),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in call order, outermost first
    pub fn stages(&self) -> Vec<&str> {
        let mut stages: Vec<&str> = self.layers.iter().map(|l| l.name()).collect();
        if self.autodetect {
            stages.push(AUTODETECT_STAGE);
        }
        stages.push(METHOD_STAGE);
        stages
    }

    /// Call the command on `device`
    pub fn call(&self, device: &mut D, inv: &mut Invocation) -> Result<Outcome> {
        info!("Running command {}", self.name);
        self.call_from(0, device, inv)
    }

    fn call_from(&self, depth: usize, device: &mut D, inv: &mut Invocation) -> Result<Outcome> {
        match self.layers.get(depth) {
            Some(layer) => {
                trace!(command = %self.name, stage = layer.name(), "Entering stage");
                layer.around(inv, &mut |inv: &mut Invocation| {
                    self.call_from(depth + 1, device, inv)
                })
            }
            None => {
                if self.autodetect {
                    autodetect(device)?;
                }
                (self.method)(device, inv)
            }
        }
    }
}

/// Fetch device info unless the model or info is already known
fn autodetect<D: Device>(device: &mut D) -> Result<()> {
    if device.model().is_none() && device.info().is_none() {
        debug!("Unknown model, trying autodetection");
        device.fetch_info()?;
    }
    Ok(())
}
