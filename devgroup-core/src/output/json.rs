//! # JSON Output
//!
//! Serializes command results. Device errors that carry a structured payload
//! are rendered as that payload instead of failing the command.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

use crate::context::Invocation;
use crate::error::{DispatchError, Result};
use crate::layer::{Next, Outcome};

/// Machine-readable output around a command call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOutput {
    pub pretty: bool,
}

impl JsonOutput {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Encode a value. Compact output uses `", "` and `": "` separators.
    pub fn encode(&self, value: &Value) -> Result<String> {
        if self.pretty {
            return serde_json::to_string_pretty(value).map_err(|e| DispatchError::Other(e.into()));
        }

        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
        value
            .serialize(&mut ser)
            .map_err(|e| DispatchError::Other(e.into()))?;
        String::from_utf8(buf).map_err(|e| DispatchError::Other(e.into()))
    }

    pub(crate) fn around(&self, inv: &mut Invocation, next: Next<'_>) -> Result<Outcome> {
        let result = match next(inv) {
            Ok(result) => result,
            Err(DispatchError::Device(err)) if err.payload().is_some() => {
                tracing::debug!("Rendering device error as JSON: {}", err);
                let payload = err.payload().cloned().unwrap_or(Value::Null);
                inv.echo.line(&self.encode(&payload)?);
                return Ok(Box::new(payload));
            }
            Err(err) => return Err(err),
        };

        let data = match result.as_structured() {
            Some(view) => view.structured(),
            None => result.to_json(),
        };
        inv.echo.line(&self.encode(&data)?);

        Ok(result)
    }
}

/// Single-line JSON with a space after `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
