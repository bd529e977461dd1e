//! # Command Descriptors
//!
//! A descriptor records how one device method is exposed as a subcommand:
//! its name, declared parameters, decorators, default output and
//! registration options.

use std::fmt;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches};
use serde_json::{json, Value};

use crate::context::Invocation;
use crate::error::Result;
use crate::layer::{Layer, Outcome};
use crate::output::{CommandResult, OutputStrategy};
use crate::validate::{parse_choice, parse_literal};

/// Registration options: help text, flags and anything else
pub type Options = serde_json::Map<String, Value>;

/// Option holding the help text
pub const HELP_OPTION: &str = "help";
/// Option hiding the command from help listings
pub const HIDDEN_OPTION: &str = "hidden";
/// Option disabling the autodetect guard. Never reaches the CLI registration.
pub const SKIP_AUTODETECT_OPTION: &str = "skip_autodetect";

/// The device method behind a command
pub type Method<D> = Arc<dyn Fn(&mut D, &mut Invocation) -> Result<Outcome> + Send + Sync>;

/// Type of a command parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Text,
    Integer,
    Float,
    Bool,
    /// Literal value such as `[1, 'a']` or `True`
    Literal,
    /// Case-insensitive choice, stored in its canonical spelling
    Choice(Vec<&'static str>),
}

/// Parameter declared by a command
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Keyword under which the value reaches the method
    pub name: String,
    pub kind: ParamKind,
    pub help: Option<String>,
    pub required: bool,
    pub positional: bool,
    pub default: Option<String>,
}

impl Param {
    /// Positional, required argument
    pub fn argument(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            help: None,
            required: true,
            positional: true,
            default: None,
        }
    }

    /// Optional `--name value` option
    pub fn option(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            help: None,
            required: false,
            positional: false,
            default: None,
        }
    }

    /// Boolean `--name` flag
    pub fn flag(name: impl Into<String>) -> Self {
        Self::option(name, ParamKind::Bool)
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }

    /// Build the clap argument
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).required(self.required);
        if !self.positional {
            arg = arg.long(self.name.replace('_', "-"));
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        if let Some(default) = &self.default {
            arg = arg.default_value(default.clone());
        }

        match &self.kind {
            ParamKind::Text => arg.value_parser(clap::value_parser!(String)),
            ParamKind::Integer => arg.value_parser(clap::value_parser!(i64)),
            ParamKind::Float => arg.value_parser(clap::value_parser!(f64)),
            ParamKind::Bool if self.positional => arg.value_parser(clap::value_parser!(bool)),
            ParamKind::Bool => arg.action(ArgAction::SetTrue),
            ParamKind::Literal => arg.value_parser(parse_literal),
            ParamKind::Choice(choices) => {
                let choices = choices.clone();
                arg.value_parser(move |s: &str| parse_choice(s, &choices))
            }
        }
    }

    /// Read this parameter's value from parsed arguments. Absent values become `null`.
    pub fn extract(&self, matches: &ArgMatches) -> Value {
        let id = self.name.as_str();
        let value = match &self.kind {
            ParamKind::Text | ParamKind::Choice(_) => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|v| json!(v)),
            ParamKind::Integer => matches
                .try_get_one::<i64>(id)
                .ok()
                .flatten()
                .map(|v| json!(v)),
            ParamKind::Float => matches
                .try_get_one::<f64>(id)
                .ok()
                .flatten()
                .map(|v| json!(v)),
            ParamKind::Bool => matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .map(|v| json!(v)),
            ParamKind::Literal => matches.try_get_one::<Value>(id).ok().flatten().cloned(),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Registration record for one command
pub struct CommandDescriptor<D> {
    pub(crate) name: String,
    pub(crate) method: Method<D>,
    pub(crate) decorators: Vec<Arc<dyn Layer>>,
    pub(crate) default_output: Option<OutputStrategy>,
    pub(crate) options: Options,
    pub(crate) params: Vec<Param>,
    pub(crate) skip_autodetect: bool,
}

impl<D: 'static> CommandDescriptor<D> {
    /// Start describing a command backed by `method`
    pub fn build<F, R>(name: impl Into<String>, method: F) -> DescriptorBuilder<D>
    where
        F: Fn(&mut D, &mut Invocation) -> Result<R> + Send + Sync + 'static,
        R: CommandResult + 'static,
    {
        let method: Method<D> = Arc::new(move |device: &mut D, inv: &mut Invocation| {
            method(device, inv).map(|result| Box::new(result) as Outcome)
        });
        DescriptorBuilder {
            descriptor: CommandDescriptor {
                name: name.into().to_lowercase(),
                method,
                decorators: Vec::new(),
                default_output: None,
                options: Options::new(),
                params: Vec::new(),
                skip_autodetect: false,
            },
        }
    }

    /// Re-target this descriptor to a type embedding `D`
    pub(crate) fn lift<P>(&self) -> CommandDescriptor<P>
    where
        P: AsMut<D> + 'static,
    {
        let method = Arc::clone(&self.method);
        CommandDescriptor {
            name: self.name.clone(),
            method: Arc::new(move |device: &mut P, inv: &mut Invocation| {
                method(device.as_mut(), inv)
            }),
            decorators: self.decorators.clone(),
            default_output: self.default_output.clone(),
            options: self.options.clone(),
            params: self.params.clone(),
            skip_autodetect: self.skip_autodetect,
        }
    }
}

impl<D> CommandDescriptor<D> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.options.get(HELP_OPTION).and_then(Value::as_str)
    }

    pub fn is_hidden(&self) -> bool {
        self.options
            .get(HIDDEN_OPTION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Registration options as handed to the CLI
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn decorator_names(&self) -> Vec<&str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    pub fn default_output(&self) -> Option<&OutputStrategy> {
        self.default_output.as_ref()
    }

    pub fn skips_autodetect(&self) -> bool {
        self.skip_autodetect
    }

    /// Build the clap subcommand
    pub fn to_clap(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone()).hide(self.is_hidden());
        if let Some(help) = self.help() {
            cmd = cmd.about(help.to_string());
        }
        cmd.args(self.params.iter().map(Param::to_arg))
    }

    /// Collect the declared parameters into the call's keyword arguments
    pub fn extract_args(&self, matches: &ArgMatches) -> crate::context::Kwargs {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.extract(matches)))
            .collect()
    }
}

impl<D> Clone for CommandDescriptor<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            method: Arc::clone(&self.method),
            decorators: self.decorators.clone(),
            default_output: self.default_output.clone(),
            options: self.options.clone(),
            params: self.params.clone(),
            skip_autodetect: self.skip_autodetect,
        }
    }
}

impl<D> fmt::Debug for CommandDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("decorators", &self.decorator_names())
            .field("default_output", &self.default_output)
            .field("options", &self.options)
            .field("params", &self.params)
            .field("skip_autodetect", &self.skip_autodetect)
            .finish()
    }
}

/// Builder for [`CommandDescriptor`]
pub struct DescriptorBuilder<D> {
    descriptor: CommandDescriptor<D>,
}

impl<D> DescriptorBuilder<D> {
    /// Help text, unless an explicit `help` option was given
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.descriptor
            .options
            .entry(HELP_OPTION)
            .or_insert_with(|| Value::String(about.into()));
        self
    }

    /// Declare a parameter
    pub fn param(mut self, param: Param) -> Self {
        self.descriptor.params.push(param);
        self
    }

    /// Add a decorator. Decorators declared later wrap the earlier ones.
    pub fn decorator(mut self, decorator: impl Layer + 'static) -> Self {
        self.descriptor.decorators.push(Arc::new(decorator));
        self
    }

    pub fn default_output(mut self, output: OutputStrategy) -> Self {
        self.descriptor.default_output = Some(output);
        self
    }

    /// Set a registration option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.descriptor.options.insert(key.into(), value.into());
        self
    }

    /// Don't fetch device info before running this command
    pub fn skip_autodetect(self) -> Self {
        self.option(SKIP_AUTODETECT_OPTION, true)
    }

    /// Finish the descriptor
    pub fn finish(mut self) -> CommandDescriptor<D> {
        if let Some(skip) = self.descriptor.options.remove(SKIP_AUTODETECT_OPTION) {
            self.descriptor.skip_autodetect = skip.as_bool().unwrap_or(false);
        }
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Decorator;

    struct Lamp {
        on: bool,
    }

    fn toggle() -> CommandDescriptor<Lamp> {
        CommandDescriptor::build("Toggle", |lamp: &mut Lamp, _inv| {
            lamp.on = !lamp.on;
            Ok(lamp.on)
        })
        .about("Toggle the lamp")
        .param(Param::option("brightness", ParamKind::Integer).help("Brightness in percent"))
        .decorator(Decorator::new("first", |inv, next| next(inv)))
        .decorator(Decorator::new("second", |inv, next| next(inv)))
        .skip_autodetect()
        .finish()
    }

    #[test]
    fn test_name_is_lowercased() {
        assert_eq!(toggle().name(), "toggle");
    }

    #[test]
    fn test_skip_autodetect_is_consumed() {
        let descriptor = toggle();
        assert!(descriptor.skips_autodetect());
        assert!(!descriptor.options().contains_key(SKIP_AUTODETECT_OPTION));
        assert_eq!(descriptor.help(), Some("Toggle the lamp"));
    }

    #[test]
    fn test_explicit_help_wins_over_about() {
        let descriptor = CommandDescriptor::build("x", |_: &mut Lamp, _inv| Ok(()))
            .option(HELP_OPTION, "explicit")
            .about("from about")
            .finish();
        assert_eq!(descriptor.help(), Some("explicit"));
        assert!(!descriptor.skips_autodetect());
    }

    #[test]
    fn test_decorators_keep_declaration_order() {
        assert_eq!(toggle().decorator_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_to_clap_and_extract() {
        let descriptor = toggle();
        let cmd = descriptor.to_clap();
        assert_eq!(cmd.get_name(), "toggle");

        let matches = cmd.try_get_matches_from(["toggle", "--brightness", "40"]).unwrap();
        let args = descriptor.extract_args(&matches);
        assert_eq!(args.get("brightness"), Some(&json!(40)));
    }

    #[test]
    fn test_param_kinds() {
        let cmd = clap::Command::new("set")
            .arg(Param::argument("mode", ParamKind::Choice(vec!["Auto", "Silent"])).to_arg())
            .arg(Param::option("payload", ParamKind::Literal).to_arg())
            .arg(Param::flag("dry_run").to_arg())
            .arg(Param::option("speed", ParamKind::Float).default_value("1.5").to_arg());

        let matches = cmd
            .try_get_matches_from(["set", "silent", "--payload", "['on', 1]", "--dry-run"])
            .unwrap();

        let mode = Param::argument("mode", ParamKind::Choice(vec!["Auto", "Silent"]));
        assert_eq!(mode.extract(&matches), json!("Silent"));
        assert_eq!(
            Param::option("payload", ParamKind::Literal).extract(&matches),
            json!(["on", 1])
        );
        assert_eq!(Param::flag("dry_run").extract(&matches), json!(true));
        assert_eq!(
            Param::option("speed", ParamKind::Float).extract(&matches),
            json!(1.5)
        );
        assert_eq!(
            Param::option("missing", ParamKind::Text).extract(&matches),
            Value::Null
        );
    }

    #[test]
    fn test_invalid_literal_rejected_by_clap() {
        let cmd = clap::Command::new("raw").arg(Param::argument("params", ParamKind::Literal).to_arg());
        assert!(cmd.try_get_matches_from(["raw", "not a literal"]).is_err());
    }
}
