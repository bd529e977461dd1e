//! # Generic Device
//!
//! Base device type. Every device embeds one and inherits its `info` and
//! `raw-command` commands.

use std::sync::OnceLock;
use std::time::Instant;

use devgroup_core::{
    CommandDescriptor, CommandRegistry, CommandResult, ConnectionParams, Decorator, Device,
    DeviceError, Displayable, OutputStrategy, Param, ParamKind, StructuredView,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::simulator::Simulator;

/// Identity reported by the device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub model: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub address: String,
}

impl DeviceInfo {
    fn from_response(response: &Value, address: &str) -> Result<Self, DeviceError> {
        let field = |name: &str| {
            response
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    DeviceError::communication(format!("info response is missing '{}'", name))
                })
        };
        Ok(Self {
            model: field("model")?,
            firmware_version: field("fw_ver")?,
            hardware_version: field("hw_ver")?,
            address: address.to_string(),
        })
    }

    pub(crate) fn rows(&self) -> Vec<Vec<String>> {
        vec![
            vec!["Model:".to_string(), self.model.clone()],
            vec!["Hardware version:".to_string(), self.hardware_version.clone()],
            vec!["Firmware version:".to_string(), self.firmware_version.clone()],
            vec!["Address:".to_string(), self.address.clone()],
        ]
    }
}

impl CommandResult for DeviceInfo {
    fn render(&self) -> String {
        format!("{} at {}", self.model, self.address)
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn as_displayable(&self) -> Option<&dyn Displayable> {
        Some(self)
    }

    fn as_structured(&self) -> Option<&dyn StructuredView> {
        Some(self)
    }
}

impl Displayable for DeviceInfo {
    fn cli_output(&self) -> String {
        devgroup_core::CommandOutput::Table(self.rows()).format_table()
    }
}

impl StructuredView for DeviceInfo {
    fn structured(&self) -> Value {
        self.to_json()
    }
}

/// A device reachable over the request/response protocol
#[derive(Debug)]
pub struct GenericDevice {
    params: ConnectionParams,
    transport: Simulator,
    model: Option<String>,
    info: Option<DeviceInfo>,
}

impl GenericDevice {
    /// Create a device that talks to `transport`
    pub fn with_transport(params: ConnectionParams, transport: Simulator) -> Self {
        Self {
            model: params.model.clone(),
            params,
            transport,
            info: None,
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Send a request to the device
    pub fn send(&mut self, method: &str, params: &Value) -> Result<Value, DeviceError> {
        self.transport.send(method, params)
    }

    /// Fetch and return the device's identity
    pub fn query_info(&mut self) -> Result<DeviceInfo, DeviceError> {
        self.fetch_info()?;
        self.info
            .clone()
            .ok_or_else(|| DeviceError::communication("device returned no info"))
    }
}

impl Device for GenericDevice {
    type Info = DeviceInfo;

    fn connect(params: ConnectionParams) -> Self {
        Self::with_transport(params, Simulator::new("generic.device.v1", "1.0.0"))
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    fn fetch_info(&mut self) -> Result<(), DeviceError> {
        let response = self.send("info", &Value::Null)?;
        let info = DeviceInfo::from_response(&response, &self.params.address)?;
        debug!(model = %info.model, "Fetched device info");
        if self.model.is_none() {
            self.model = Some(info.model.clone());
        }
        self.info = Some(info);
        Ok(())
    }

    fn command_registry() -> Option<&'static CommandRegistry<Self>> {
        static REGISTRY: OnceLock<CommandRegistry<GenericDevice>> = OnceLock::new();
        Some(REGISTRY.get_or_init(|| {
            let mut registry = CommandRegistry::new();
            registry.register(info_command()).register(raw_command());
            registry
        }))
    }

    fn group_name() -> String {
        "device".to_string()
    }

    fn about() -> Option<&'static str> {
        Some("Any device speaking the request/response protocol")
    }
}

fn info_command() -> CommandDescriptor<GenericDevice> {
    CommandDescriptor::build("info", |device: &mut GenericDevice, _inv| {
        Ok(device.query_info()?)
    })
        .about("Get device information")
        .default_output(OutputStrategy::text("", "{result}"))
        .skip_autodetect()
        .finish()
}

fn raw_command() -> CommandDescriptor<GenericDevice> {
    CommandDescriptor::build("raw-command", |device: &mut GenericDevice, inv| {
        let method = inv.require_str("command")?.to_string();
        let params = inv.arg("parameters").cloned().unwrap_or_else(|| json!([]));
        Ok(device.send(&method, &params)?)
    })
    .about("Send a raw command to the device")
    .param(Param::argument("command", ParamKind::Text).help("Method name"))
    .param(
        Param::argument("parameters", ParamKind::Literal)
            .required(false)
            .default_value("[]")
            .help("Parameters, as a literal such as \"['power']\""),
    )
    .decorator(Decorator::new("timing", |inv, next| {
        let started = Instant::now();
        let result = next(inv);
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Raw command finished");
        result
    }))
    .default_output(OutputStrategy::text(
        "Sending cmd {command} with params {parameters}",
        "{result}",
    ))
    .skip_autodetect()
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgroup_core::{CommandGroup, Echo, GlobalContext, Invocation, Kwargs};

    const TOKEN: &str = "ffffffffffffffffffffffffffffffff";

    fn params() -> ConnectionParams {
        ConnectionParams::new("192.168.1.20", TOKEN)
    }

    #[test]
    fn test_commands() {
        let group = CommandGroup::<GenericDevice>::new().unwrap();
        assert_eq!(group.name(), "device");
        assert_eq!(group.list_commands(), vec!["info", "raw-command"]);
    }

    #[test]
    fn test_fetch_info_keeps_model_hint() {
        let mut device = GenericDevice::connect(params().with_model("acme.custom"));
        device.fetch_info().unwrap();
        assert_eq!(device.model(), Some("acme.custom"));
        assert_eq!(device.info().unwrap().model, "generic.device.v1");
    }

    #[test]
    fn test_info_command_output() {
        let group = CommandGroup::<GenericDevice>::new().unwrap();
        let (echo, captured) = Echo::capture();
        let mut inv = Invocation::new(Kwargs::new(), echo);
        let outcome = group
            .invoke(&GlobalContext::default(), params(), "info", &mut inv)
            .unwrap();

        let output = captured.contents();
        assert!(output.starts_with("Model:"));
        assert!(output.contains("generic.device.v1"));
        assert!(output.contains("192.168.1.20"));
        assert_eq!(outcome.to_json()["firmware_version"], "1.0.0");
    }

    #[test]
    fn test_raw_command() {
        let group = CommandGroup::<GenericDevice>::new().unwrap();
        let (echo, captured) = Echo::capture();
        let mut inv = Invocation::new(Kwargs::new(), echo)
            .with_arg("command", "info")
            .with_arg("parameters", json!([]));
        group
            .invoke(&GlobalContext::default(), params(), "raw-command", &mut inv)
            .unwrap();

        let output = captured.contents();
        assert!(output.starts_with("Sending cmd info with params []\n"));
        assert!(output.contains("generic.device.v1"));
    }
}
