//! # Simulated Transport
//!
//! In-process stand-in for a device's request/response protocol. Requests
//! are a method name plus JSON parameters, responses are JSON values. Errors
//! carry the device's error payload the way a real device reports them.

use devgroup_core::DeviceError;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

/// Error code for methods the device doesn't know
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Error code for malformed parameters
pub const INVALID_PARAMS: i64 = -32602;

/// A simulated device endpoint
#[derive(Debug, Clone)]
pub struct Simulator {
    model: &'static str,
    firmware: &'static str,
    properties: Map<String, Value>,
    next_id: u64,
}

impl Simulator {
    pub fn new(model: &'static str, firmware: &'static str) -> Self {
        Self {
            model,
            firmware,
            properties: Map::new(),
            next_id: 1,
        }
    }

    /// Add a readable and writable property
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Send a request and wait for the response
    ///
    /// Supported methods:
    /// - `info`: identity of the device
    /// - `get_prop`: values of the named properties, `null` for unknown ones
    /// - `set_<property>`: replace a property with the first parameter
    pub fn send(&mut self, method: &str, params: &Value) -> Result<Value, DeviceError> {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, method, %params, "Sending request");

        let response = match method {
            "info" => Ok(json!({
                "model": self.model,
                "fw_ver": self.firmware,
                "hw_ver": "simulated",
            })),
            "get_prop" => {
                let names = params
                    .as_array()
                    .ok_or_else(|| invalid_params(method, params))?;
                let values = names
                    .iter()
                    .map(|name| {
                        name.as_str()
                            .and_then(|n| self.properties.get(n))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Ok(Value::Array(values))
            }
            _ => match method.strip_prefix("set_") {
                Some(property) if self.properties.contains_key(property) => {
                    let value = match params {
                        Value::Array(values) => values.first().cloned(),
                        Value::Null => None,
                        other => Some(other.clone()),
                    }
                    .ok_or_else(|| invalid_params(method, params))?;
                    self.properties.insert(property.to_string(), value);
                    Ok(json!(["ok"]))
                }
                _ => Err(DeviceError::response(
                    format!("unknown method '{}'", method),
                    json!({"code": METHOD_NOT_FOUND, "message": "Method not found"}),
                )),
            },
        };

        trace!(id, ?response, "Received response");
        response
    }

    /// Read a single property
    pub fn get_property(&mut self, name: &str) -> Result<Value, DeviceError> {
        let values = self.send("get_prop", &json!([name]))?;
        values
            .as_array()
            .and_then(|v| v.first())
            .cloned()
            .ok_or_else(|| DeviceError::communication(format!("empty response for '{}'", name)))
    }
}

fn invalid_params(method: &str, params: &Value) -> DeviceError {
    DeviceError::response(
        format!("invalid parameters for '{}': {}", method, params),
        json!({"code": INVALID_PARAMS, "message": "Invalid params"}),
    )
}
