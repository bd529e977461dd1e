//! # Invocation Context
//!
//! Per-invocation state passed explicitly down the dispatch path.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{DispatchError, Result, UsageError};
use crate::output::OutputStrategy;

/// Keyword arguments of a command call
pub type Kwargs = serde_json::Map<String, Value>;

/// Settings shared by every command of one CLI invocation
#[derive(Clone, Default)]
pub struct GlobalContext {
    /// Debug verbosity, forwarded to the device
    pub debug: u8,

    /// Output strategy overriding every command's default
    pub output: Option<OutputStrategy>,
}

impl GlobalContext {
    /// Create a context with the given debug level and no output override
    pub fn new(debug: u8) -> Self {
        Self {
            debug,
            output: None,
        }
    }

    /// Override the output strategy for all commands
    pub fn with_output(mut self, output: OutputStrategy) -> Self {
        self.output = Some(output);
        self
    }
}

/// Output sink for command messages. Emitting never fails.
pub struct Echo {
    writer: Box<dyn Write + Send>,
}

impl Echo {
    /// Create an echo writing to `writer`
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Echo to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Echo into an in-memory buffer
    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        (Self::new(captured.clone()), captured)
    }

    /// Emit one line
    pub fn line(&mut self, msg: &str) {
        if let Err(e) = writeln!(self.writer, "{}", msg).and_then(|_| self.writer.flush()) {
            tracing::warn!("Failed to write output: {}", e);
        }
    }
}

/// Shared in-memory buffer filled by [`Echo::capture`]
#[derive(Clone, Default)]
pub struct Captured {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Captured {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One command call: its keyword arguments and where to emit output
pub struct Invocation {
    pub args: Kwargs,
    pub echo: Echo,
}

impl Invocation {
    /// Create an invocation
    pub fn new(args: Kwargs, echo: Echo) -> Self {
        Self { args, echo }
    }

    /// Set a keyword argument
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Look up a keyword argument
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|v| !v.is_null())
    }

    /// Look up a required keyword argument
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.arg(name)
            .ok_or_else(|| DispatchError::usage(UsageError::MissingArgument(name.to_string())))
    }

    /// Look up a required string argument
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| DispatchError::usage(UsageError::MissingArgument(name.to_string())))
    }
}
