//! # Text Output
//!
//! Emits a message before the call and a message built from the result after it.

use crate::context::Invocation;
use crate::error::Result;
use crate::layer::{Next, Outcome};
use crate::output::template::{MessageArgs, MessageSpec};

/// Human-readable output around a command call
#[derive(Debug, Clone, Default)]
pub struct TextOutput {
    pub pre: MessageSpec,
    pub post: MessageSpec,
}

impl TextOutput {
    /// Create a text output from pre- and post-message specs
    pub fn new(pre: impl Into<MessageSpec>, post: impl Into<MessageSpec>) -> Self {
        Self {
            pre: pre.into(),
            post: post.into(),
        }
    }

    pub(crate) fn around(&self, inv: &mut Invocation, next: Next<'_>) -> Result<Outcome> {
        let msg = self.pre.render(&MessageArgs::before(&inv.args))?;
        let msg = msg.trim();
        if !msg.is_empty() {
            inv.echo.line(msg);
        }

        let result = next(inv)?;

        // A result's own display string wins over a post template, not over a closure
        if !self.post.is_callable() {
            if let Some(display) = result.as_displayable() {
                inv.echo.line(&display.cli_output());
                return Ok(result);
            }
        }

        if !self.post.is_empty() {
            let msg = self
                .post
                .render(&MessageArgs::after(&inv.args, &*result))?;
            let msg = msg.trim();
            if !msg.is_empty() {
                inv.echo.line(msg);
            }
        }

        Ok(result)
    }
}
