//! # Command Results
//!
//! Results returned by device methods, and the optional capabilities the
//! output strategies look for.

use std::fmt;

use serde_json::{json, Value};

/// Result that comes with its own ready-made display string
pub trait Displayable {
    fn cli_output(&self) -> String;
}

/// Result that comes with its own ready-made structured view
pub trait StructuredView {
    fn structured(&self) -> Value;
}

/// Anything a command method may return
pub trait CommandResult: fmt::Debug {
    /// Text used for `{result}` in message templates
    fn render(&self) -> String;

    /// Plain JSON encoding of the result
    fn to_json(&self) -> Value;

    fn as_displayable(&self) -> Option<&dyn Displayable> {
        None
    }

    fn as_structured(&self) -> Option<&dyn StructuredView> {
        None
    }
}

/// Render a JSON value for humans: strings without quotes
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl CommandResult for () {
    fn render(&self) -> String {
        String::new()
    }

    fn to_json(&self) -> Value {
        Value::Null
    }
}

impl CommandResult for Value {
    fn render(&self) -> String {
        value_to_text(self)
    }

    fn to_json(&self) -> Value {
        self.clone()
    }
}

macro_rules! impl_scalar_result {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CommandResult for $ty {
                fn render(&self) -> String {
                    self.to_string()
                }

                fn to_json(&self) -> Value {
                    json!(self)
                }
            }
        )*
    };
}

impl_scalar_result!(String, &'static str, bool, i32, i64, u8, u16, u32, u64, f64);

/// General-purpose command output
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Structured data, printed as JSON
    Data(Value),
    /// Rows rendered as aligned columns
    Table(Vec<Vec<String>>),
}

impl CommandOutput {
    /// Format as aligned columns. Falls back to plain text for non-table output.
    pub fn format_table(&self) -> String {
        match self {
            CommandOutput::Table(rows) => {
                if rows.is_empty() {
                    return String::new();
                }

                let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
                let mut widths = vec![0usize; num_cols];
                for row in rows {
                    for (i, cell) in row.iter().enumerate() {
                        widths[i] = widths[i].max(cell.chars().count());
                    }
                }

                rows.iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                            .collect::<Vec<_>>()
                            .join("  ")
                            .trim_end()
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            other => other.format_plain(),
        }
    }

    /// Format as plain text
    pub fn format_plain(&self) -> String {
        match self {
            CommandOutput::Data(data) => {
                serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
            }
            CommandOutput::Table(rows) => rows
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl CommandResult for CommandOutput {
    fn render(&self) -> String {
        self.format_plain()
    }

    fn to_json(&self) -> Value {
        match self {
            CommandOutput::Data(data) => data.clone(),
            CommandOutput::Table(rows) => json!({"rows": rows}),
        }
    }

    fn as_displayable(&self) -> Option<&dyn Displayable> {
        match self {
            CommandOutput::Table(_) => Some(self),
            _ => None,
        }
    }

    fn as_structured(&self) -> Option<&dyn StructuredView> {
        match self {
            CommandOutput::Data(_) => Some(self),
            _ => None,
        }
    }
}

impl Displayable for CommandOutput {
    fn cli_output(&self) -> String {
        self.format_table()
    }
}

impl StructuredView for CommandOutput {
    fn structured(&self) -> Value {
        self.to_json()
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_plain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_results() {
        assert_eq!(42u32.render(), "42");
        assert_eq!(42u32.to_json(), json!(42));
        assert_eq!(true.to_json(), json!(true));
        assert_eq!(().render(), "");
        assert_eq!(().to_json(), Value::Null);
        assert!(().as_displayable().is_none());
    }

    #[test]
    fn test_value_render_drops_quotes() {
        assert_eq!(json!("on").render(), "on");
        assert_eq!(json!({"a": 1}).render(), "{\"a\":1}");
    }

    #[test]
    fn test_format_table() {
        let output = CommandOutput::Table(vec![
            vec!["Name".to_string(), "Value".to_string()],
            vec!["A".to_string(), "1".to_string()],
            vec!["B".to_string(), "2".to_string()],
        ]);
        let table = output.format_table();
        assert!(table.contains("Name  Value"));
        assert!(table.contains("A     1"));
        assert!(output.as_displayable().is_some());
        assert!(output.as_structured().is_none());
    }

    #[test]
    fn test_data_is_structured() {
        let output = CommandOutput::Data(json!({"power": "on"}));
        let view = output.as_structured().unwrap();
        assert_eq!(view.structured(), json!({"power": "on"}));
        assert!(output.as_displayable().is_none());
    }

    #[test]
    fn test_table_json_and_plain() {
        let output = CommandOutput::Table(vec![vec!["LED".to_string(), "on".to_string()]]);
        assert_eq!(output.to_json(), json!({"rows": [["LED", "on"]]}));
        assert_eq!(output.render(), "LED\ton");
    }
}
