//! # Output Pipeline
//!
//! Output strategies render a command's result for humans (text templates)
//! or machines (JSON). Each strategy is a [`Layer`] sitting between the user
//! decorators and the device method.

pub mod json;
pub mod result;
pub mod template;
pub mod text;

pub use json::JsonOutput;
pub use result::{CommandOutput, CommandResult, Displayable, StructuredView};
pub use template::{MessageArgs, MessageSpec};
pub use text::TextOutput;

use crate::context::Invocation;
use crate::error::Result;
use crate::layer::{Layer, Next, Outcome};

/// How a command's result is rendered
#[derive(Debug, Clone)]
pub enum OutputStrategy {
    Text(TextOutput),
    Json(JsonOutput),
}

impl OutputStrategy {
    /// Text output from pre- and post-message specs
    pub fn text(pre: impl Into<MessageSpec>, post: impl Into<MessageSpec>) -> Self {
        Self::Text(TextOutput::new(pre, post))
    }

    /// JSON output
    pub fn json(pretty: bool) -> Self {
        Self::Json(JsonOutput::new(pretty))
    }

    /// Fallback for commands without a default output: announce the command, print the result
    pub fn announce(command_name: &str) -> Self {
        Self::text(format!("Running command {}", command_name), "{result}")
    }
}

impl Layer for OutputStrategy {
    fn name(&self) -> &str {
        match self {
            Self::Text(_) => "text-output",
            Self::Json(_) => "json-output",
        }
    }

    fn around(&self, inv: &mut Invocation, next: Next<'_>) -> Result<Outcome> {
        match self {
            Self::Text(text) => text.around(inv, next),
            Self::Json(json) => json.around(inv, next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Echo, Kwargs};

    #[test]
    fn test_announce() {
        let output = OutputStrategy::announce("status");
        assert_eq!(output.name(), "text-output");

        let (echo, captured) = Echo::capture();
        let mut inv = Invocation::new(Kwargs::new(), echo);
        output
            .around(&mut inv, &mut |_inv| Ok(Box::new("on".to_string()) as Outcome))
            .unwrap();
        assert_eq!(captured.contents(), "Running command status\non\n");
    }

    #[test]
    fn test_json_name() {
        assert_eq!(OutputStrategy::json(true).name(), "json-output");
    }
}
