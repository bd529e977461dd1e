//! # Error Handling
//!
//! Turns errors escaping a command into a colored report with suggestions
//! and a process exit code.

use colored::*;
use devgroup_core::{DeviceError, DispatchError, UsageError};

use super::config::ConfigError;

/// Exit code for errors that aren't usage errors
pub const FAILURE: i32 = 1;

/// An error prepared for display
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub message: String,
    pub suggestions: Vec<String>,
    pub details: Vec<String>,
    pub exit_code: i32,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            details: Vec::new(),
            exit_code: FAILURE,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Build a report for `error`. `commands` are the commands valid where the
    /// error happened, listed when the command name was wrong.
    pub fn from_error(error: &anyhow::Error, commands: &[&str]) -> Self {
        let mut report = Self::new(error.to_string());
        report.details = error.chain().skip(1).map(|e| e.to_string()).collect();

        if let Some(err) = error.downcast_ref::<DispatchError>() {
            report.exit_code = err.exit_code();
            report.suggestions = dispatch_suggestions(err, commands);
        } else if let Some(err) = error.downcast_ref::<ConfigError>() {
            if let ConfigError::InvalidEnv { var, .. } = err {
                report = report.with_suggestion(format!("Unset {} or fix its value", var));
            } else {
                report = report.with_suggestion("Check the configuration file syntax");
            }
        }
        report
    }
}

fn dispatch_suggestions(error: &DispatchError, commands: &[&str]) -> Vec<String> {
    match error {
        DispatchError::Usage(UsageError::UnknownCommand(_)) if !commands.is_empty() => {
            vec![format!("Available commands: {}", commands.join(", "))]
        }
        DispatchError::Usage(UsageError::InvalidAddress { .. }) => {
            vec!["Pass an IPv4 or IPv6 address, e.g. --ip 192.168.1.20".to_string()]
        }
        DispatchError::Usage(UsageError::InvalidToken { expected, .. }) => {
            vec![format!("Tokens are {} hexadecimal characters", expected)]
        }
        DispatchError::Device(DeviceError::Response { .. }) => {
            vec!["Use --output json to see the device's error payload".to_string()]
        }
        DispatchError::Device(DeviceError::Communication(_)) => vec![
            "Check that the device is powered and reachable".to_string(),
            "Run with -d to see the exchanged messages".to_string(),
        ],
        DispatchError::Wiring(_) => {
            vec!["This is a bug in the device registration, please report it".to_string()]
        }
        _ => Vec::new(),
    }
}

/// Format an error for display
pub fn format_error(report: &ErrorReport) -> String {
    let mut output = format!("{} {}\n", "Error:".red().bold(), report.message);

    if !report.suggestions.is_empty() {
        output.push_str(&format!("\n{}", "Suggestions:".cyan().bold()));
        for (i, suggestion) in report.suggestions.iter().enumerate() {
            output.push_str(&format!("\n  {}. {}", i + 1, suggestion));
        }
        output.push('\n');
    }

    for detail in &report.details {
        output.push_str(&format!("\n{}\n  {}\n", "Details:".yellow(), detail));
    }

    output
}

/// Print an error to stderr
pub fn print_error(report: &ErrorReport) {
    eprintln!("{}", format_error(report));
}
