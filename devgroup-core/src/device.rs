//! # Device Contract
//!
//! What the dispatch machinery needs from a device type. Talking to the
//! actual hardware is left to the implementor.

use std::fmt;

use crate::error::{DeviceError, UsageError};
use crate::registry::CommandRegistry;
use crate::validate::{parse_address, parse_token};

/// Parameters identifying one device, supplied once per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub address: String,
    pub token: String,
    /// Model hint; skips autodetection when set
    pub model: Option<String>,
    pub debug: u8,
}

impl ConnectionParams {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            model: None,
            debug: 0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_debug(mut self, debug: u8) -> Self {
        self.debug = debug;
        self
    }

    /// Check address syntax and token length
    pub fn validate(&self) -> Result<(), UsageError> {
        parse_address(&self.address)?;
        parse_token(&self.token)?;
        Ok(())
    }
}

/// A device type that can be exposed as a command group.
///
/// `connect` must not do any I/O; identity is fetched lazily through
/// [`Device::fetch_info`] by the autodetect guard or by commands themselves.
pub trait Device: Sized + Send + 'static {
    /// Device information populated by [`Device::fetch_info`]
    type Info: fmt::Debug;

    /// Materialize a device from its connection parameters
    fn connect(params: ConnectionParams) -> Self;

    /// Cached model identifier
    fn model(&self) -> Option<&str>;

    /// Cached device information
    fn info(&self) -> Option<&Self::Info>;

    /// Query the device and populate the model and info caches
    fn fetch_info(&mut self) -> Result<(), DeviceError>;

    /// Commands of this type. `None` means the type was never registered.
    fn command_registry() -> Option<&'static CommandRegistry<Self>> {
        None
    }

    /// Name of the command group, the lower-cased type name by default
    fn group_name() -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_lowercase()
    }

    /// Help text of the command group
    fn about() -> Option<&'static str> {
        None
    }

    /// Models known to work with this type
    fn supported_models() -> Vec<&'static str> {
        Vec::new()
    }
}
