//! # Dispatch Error Types
//!
//! Error taxonomy for command registration and dispatch:
//! usage errors, wiring errors, device errors and everything else.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors caused by what the user typed. Reported before any device is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    #[error("Invalid IP address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Token must be exactly {expected} characters, got {actual}")]
    InvalidToken { expected: usize, actual: usize },

    #[error("Unknown command ({0})")]
    UnknownCommand(String),

    #[error("Missing value for template field '{0}'")]
    MissingTemplateField(String),

    #[error("Malformed message template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("{0} is not a valid literal")]
    MalformedLiteral(String),

    #[error("'{value}' is not one of: {}", choices.join(", "))]
    InvalidChoice { value: String, choices: Vec<String> },

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),
}

/// Programming defects in how device types are wired into the framework
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WiringError {
    #[error("Device type {type_name} has no command registry and can't be used as a command group")]
    Unregistered { type_name: &'static str },

    #[error("Device group '{0}' is registered twice")]
    DuplicateGroup(String),
}

/// Failures reported by a device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The device answered with a structured error payload
    #[error("Device returned an error: {message}")]
    Response { message: String, payload: Value },

    /// Anything else going wrong while talking to the device
    #[error("Device communication failed: {0}")]
    Communication(String),
}

impl DeviceError {
    /// Create a structured response error
    pub fn response(message: impl Into<String>, payload: Value) -> Self {
        Self::Response {
            message: message.into(),
            payload,
        }
    }

    /// Create a communication error
    pub fn communication(msg: impl Into<String>) -> Self {
        Self::Communication(msg.into())
    }

    /// Machine-readable payload, if the device sent one
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Response { payload, .. } => Some(payload),
            Self::Communication(_) => None,
        }
    }
}

/// Top-level error for everything that can go wrong while dispatching a command
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DispatchError {
    /// Create a usage error
    pub fn usage(err: UsageError) -> Self {
        Self::Usage(err)
    }

    /// Create an unknown command error
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::Usage(UsageError::UnknownCommand(name.into()))
    }

    /// Create an error from any message
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(msg.into()))
    }

    /// Whether this is a user input problem
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() {
            2
        } else {
            1
        }
    }

    /// Structured device payload, if this is a device response error
    pub fn device_payload(&self) -> Option<&Value> {
        match self {
            Self::Device(err) => err.payload(),
            _ => None,
        }
    }
}
