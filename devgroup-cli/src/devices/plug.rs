//! # Smart Plug
//!
//! Power plug with an indicator LED and a temperature sensor. Embeds a
//! [`GenericDevice`] and inherits its commands, replacing `info` with a
//! variant that also reports the power state.

use std::fmt;
use std::sync::OnceLock;

use devgroup_core::{
    CommandDescriptor, CommandOutput, CommandRegistry, CommandResult, ConnectionParams, Device,
    DeviceError, Displayable, MessageSpec, OutputStrategy, Param, ParamKind, StructuredView,
    HIDDEN_OPTION,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::generic::{DeviceInfo, GenericDevice};
use super::simulator::Simulator;

const STATUS_PROPERTIES: [&str; 3] = ["power", "led", "temperature"];

/// Current plug state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlugStatus {
    pub is_on: bool,
    pub led: bool,
    pub temperature: f64,
}

impl PlugStatus {
    fn from_values(values: &Value) -> Result<Self, DeviceError> {
        let value = |index: usize| {
            values
                .get(index)
                .ok_or_else(|| DeviceError::communication("incomplete status response"))
        };
        Ok(Self {
            is_on: value(0)? == "on",
            led: value(1)? == "on",
            temperature: value(2)?.as_f64().unwrap_or_default(),
        })
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for PlugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Power: {}", on_off(self.is_on))?;
        writeln!(f, "LED: {}", on_off(self.led))?;
        write!(f, "Temperature: {} °C", self.temperature)
    }
}

impl CommandResult for PlugStatus {
    fn render(&self) -> String {
        self.to_string()
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

impl Displayable for PlugStatus {
    fn cli_output(&self) -> String {
        self.to_string()
    }
}

impl StructuredView for PlugStatus {
    fn structured(&self) -> Value {
        self.to_json()
    }
}

/// Smart power plug
#[derive(Debug)]
pub struct Plug {
    base: GenericDevice,
}

impl AsMut<GenericDevice> for Plug {
    fn as_mut(&mut self) -> &mut GenericDevice {
        &mut self.base
    }
}

impl Plug {
    pub fn status(&mut self) -> Result<PlugStatus, DeviceError> {
        let values = self.base.send("get_prop", &json!(STATUS_PROPERTIES))?;
        PlugStatus::from_values(&values)
    }

    fn set_power(&mut self, on: bool) -> Result<Value, DeviceError> {
        self.base.send("set_power", &json!([on_off(on)]))
    }

    /// Set the LED, or read it back when `state` is `None`
    fn led(&mut self, state: Option<&str>) -> Result<String, DeviceError> {
        if let Some(state) = state {
            self.base.send("set_led", &json!([state]))?;
        }
        let status = self.status()?;
        Ok(on_off(status.led).to_string())
    }

    /// Raw property values keyed by name
    fn properties(&mut self) -> Result<serde_json::Map<String, Value>, DeviceError> {
        let values = self.base.send("get_prop", &json!(STATUS_PROPERTIES))?;
        let values = values
            .as_array()
            .ok_or_else(|| DeviceError::communication("malformed property response"))?;
        Ok(STATUS_PROPERTIES
            .iter()
            .map(|name| name.to_string())
            .zip(values.iter().cloned())
            .collect())
    }
}

impl Device for Plug {
    type Info = DeviceInfo;

    fn connect(params: ConnectionParams) -> Self {
        let transport = Simulator::new("acme.plug.v1", "2.1.0")
            .with_property("power", "off")
            .with_property("led", "on")
            .with_property("temperature", 31.5);
        Self {
            base: GenericDevice::with_transport(params, transport),
        }
    }

    fn model(&self) -> Option<&str> {
        self.base.model()
    }

    fn info(&self) -> Option<&DeviceInfo> {
        self.base.info()
    }

    fn fetch_info(&mut self) -> Result<(), DeviceError> {
        self.base.fetch_info()
    }

    fn command_registry() -> Option<&'static CommandRegistry<Self>> {
        static REGISTRY: OnceLock<CommandRegistry<Plug>> = OnceLock::new();
        let base = GenericDevice::command_registry()?;
        Some(REGISTRY.get_or_init(|| {
            let mut registry = CommandRegistry::new();
            registry
                .inherit(base)
                .register(info_command())
                .register(status_command())
                .register(power_command("on", true, "Powering on"))
                .register(power_command("off", false, "Powering off"))
                .register(led_command())
                .register(properties_command());
            registry
        }))
    }

    fn about() -> Option<&'static str> {
        Some("Smart power plug")
    }

    fn supported_models() -> Vec<&'static str> {
        vec!["acme.plug.v1", "acme.plug.v2"]
    }
}

fn info_command() -> CommandDescriptor<Plug> {
    CommandDescriptor::build("info", |plug: &mut Plug, _inv| {
        let info = plug.base.query_info()?;
        let status = plug.status()?;
        let mut rows = info.rows();
        rows.push(vec!["Power:".to_string(), on_off(status.is_on).to_string()]);
        Ok(CommandOutput::Table(rows))
    })
    .about("Get device information and power state")
    .default_output(OutputStrategy::text("", "{result}"))
    .skip_autodetect()
    .finish()
}

fn status_command() -> CommandDescriptor<Plug> {
    CommandDescriptor::build("status", |plug: &mut Plug, _inv| Ok(plug.status()?))
        .about("Return the plug's power, LED and temperature")
        .finish()
}

fn power_command(name: &str, on: bool, message: &'static str) -> CommandDescriptor<Plug> {
    CommandDescriptor::build(name, move |plug: &mut Plug, _inv| Ok(plug.set_power(on)?))
        .about(format!("Power {}", name))
        .default_output(OutputStrategy::text(message, "{result}"))
        .finish()
}

fn led_command() -> CommandDescriptor<Plug> {
    let announce = MessageSpec::render_with(|args| {
        args.kwargs
            .get("state")
            .and_then(Value::as_str)
            .map(|state| format!("Turning LED {}", state))
            .unwrap_or_default()
    });

    CommandDescriptor::build("led", |plug: &mut Plug, inv| {
        let state = inv.arg("state").and_then(Value::as_str).map(str::to_string);
        Ok(plug.led(state.as_deref())?)
    })
    .about("Set the LED, or show its state when no state is given")
    .param(
        Param::argument("state", ParamKind::Choice(vec!["on", "off"]))
            .required(false)
            .help("New LED state"),
    )
    .default_output(OutputStrategy::text(announce, "LED is {result}"))
    .finish()
}

fn properties_command() -> CommandDescriptor<Plug> {
    CommandDescriptor::build("properties", |plug: &mut Plug, _inv| {
        Ok(CommandOutput::Data(Value::Object(plug.properties()?)))
    })
    .about("Dump raw property values")
    .option(HIDDEN_OPTION, true)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgroup_core::{CommandGroup, Echo, GlobalContext, Invocation, Kwargs};

    const TOKEN: &str = "00112233445566778899aabbccddeeff";

    fn run(command: &str, mut inv: Invocation) -> devgroup_core::Result<Value> {
        let group = CommandGroup::<Plug>::new().unwrap();
        let params = ConnectionParams::new("10.0.0.8", TOKEN);
        group
            .invoke(&GlobalContext::default(), params, command, &mut inv)
            .map(|outcome| outcome.to_json())
    }

    fn capture() -> (Invocation, devgroup_core::Captured) {
        let (echo, captured) = Echo::capture();
        (Invocation::new(Kwargs::new(), echo), captured)
    }

    #[test]
    fn test_commands_include_inherited() {
        let group = CommandGroup::<Plug>::new().unwrap();
        assert_eq!(group.name(), "plug");
        assert_eq!(
            group.list_commands(),
            vec!["info", "led", "off", "on", "properties", "raw-command", "status"]
        );
    }

    #[test]
    fn test_properties_hidden_from_help() {
        let group = CommandGroup::<Plug>::new().unwrap();
        let properties = group
            .registry()
            .get("properties")
            .map(|descriptor| descriptor.to_clap())
            .unwrap();
        assert!(properties.is_hide_set());

        let (inv, captured) = capture();
        let result = run("properties", inv);
        assert_eq!(
            result.unwrap(),
            json!({"power": "off", "led": "on", "temperature": 31.5})
        );
        assert!(captured
            .contents()
            .starts_with("Running command properties\n{\n  \"led\": \"on\","));
    }

    #[test]
    fn test_status() {
        let (inv, captured) = capture();
        let result = run("status", inv);
        assert_eq!(
            result.unwrap(),
            json!({"is_on": false, "led": true, "temperature": 31.5})
        );
        assert_eq!(
            captured.contents(),
            "Running command status\nPower: off\nLED: on\nTemperature: 31.5 °C\n"
        );
    }

    #[test]
    fn test_power_on() {
        let (inv, captured) = capture();
        let result = run("on", inv);
        assert_eq!(result.unwrap(), json!(["ok"]));
        assert_eq!(captured.contents(), "Powering on\n[\"ok\"]\n");
    }

    #[test]
    fn test_led() {
        let (inv, captured) = capture();
        let result = run("led", inv.with_arg("state", "off"));
        assert_eq!(result.unwrap(), json!("off"));
        assert_eq!(captured.contents(), "Turning LED off\nLED is off\n");

        let (inv, captured) = capture();
        let result = run("led", inv.with_arg("state", Value::Null));
        assert_eq!(result.unwrap(), json!("on"));
        assert_eq!(captured.contents(), "LED is on\n");
    }

    #[test]
    fn test_info_override_reports_power() {
        let (inv, captured) = capture();
        let result = run("info", inv);
        let rows = result.unwrap()["rows"].clone();
        assert_eq!(rows[0], json!(["Model:", "acme.plug.v1"]));
        assert!(captured.contents().contains("Power:"));
        assert!(!captured.contents().contains("Running command"));
    }

    #[test]
    fn test_inherited_raw_command_reaches_plug_transport() {
        let (inv, captured) = capture();
        let inv = inv
            .with_arg("command", "get_prop")
            .with_arg("parameters", json!(["temperature"]));
        let result = run("raw-command", inv);
        assert_eq!(result.unwrap(), json!([31.5]));
        assert!(captured.contents().ends_with("[31.5]\n"));
    }

    #[test]
    fn test_autodetect_uses_plug_identity() {
        let mut plug = Plug::connect(ConnectionParams::new("10.0.0.8", TOKEN));
        assert_eq!(plug.model(), None);
        plug.fetch_info().unwrap();
        assert_eq!(plug.model(), Some("acme.plug.v1"));
    }
}
