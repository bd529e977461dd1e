//! # Message Templates
//!
//! `{field}` substitution from a command call's keyword arguments.
//! `{{` and `}}` produce literal braces. A format spec or conversion after
//! the field name (`{level:>3}`, `{name!r}`) is accepted and ignored.

use std::fmt;
use std::sync::Arc;

use crate::context::Kwargs;
use crate::error::{DispatchError, Result, UsageError};
use crate::output::result::{value_to_text, CommandResult};

/// Name under which a command's result is available to post-messages
pub const RESULT_FIELD: &str = "result";

/// Arguments a message is rendered from
pub struct MessageArgs<'a> {
    pub kwargs: &'a Kwargs,
    pub result: Option<&'a dyn CommandResult>,
}

impl<'a> MessageArgs<'a> {
    /// Arguments before the command ran
    pub fn before(kwargs: &'a Kwargs) -> Self {
        Self {
            kwargs,
            result: None,
        }
    }

    /// Arguments after the command ran
    pub fn after(kwargs: &'a Kwargs, result: &'a dyn CommandResult) -> Self {
        Self {
            kwargs,
            result: Some(result),
        }
    }

    /// Text for a field, if it exists
    pub fn get(&self, field: &str) -> Option<String> {
        if field == RESULT_FIELD {
            if let Some(result) = self.result {
                return Some(result.render());
            }
        }
        self.kwargs.get(field).map(value_to_text)
    }
}

type RenderFn = dyn Fn(&MessageArgs<'_>) -> String + Send + Sync;

/// How a message is produced: nothing, a template, or a closure
#[derive(Clone, Default)]
pub enum MessageSpec {
    #[default]
    Empty,
    Template(String),
    Render(Arc<RenderFn>),
}

impl MessageSpec {
    /// Message produced by a closure
    pub fn render_with<F>(f: F) -> Self
    where
        F: Fn(&MessageArgs<'_>) -> String + Send + Sync + 'static,
    {
        Self::Render(Arc::new(f))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Template(t) => t.is_empty(),
            Self::Render(_) => false,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    /// Produce the message
    pub fn render(&self, args: &MessageArgs<'_>) -> Result<String> {
        match self {
            Self::Empty => Ok(String::new()),
            Self::Template(template) => render_template(template, |field| args.get(field)),
            Self::Render(f) => Ok(f(args)),
        }
    }
}

impl From<&str> for MessageSpec {
    fn from(template: &str) -> Self {
        if template.is_empty() {
            Self::Empty
        } else {
            Self::Template(template.to_string())
        }
    }
}

impl From<String> for MessageSpec {
    fn from(template: String) -> Self {
        if template.is_empty() {
            Self::Empty
        } else {
            Self::Template(template)
        }
    }
}

impl fmt::Debug for MessageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Render(_) => write!(f, "Render(..)"),
        }
    }
}

/// Substitute `{field}` placeholders using `lookup`
pub fn render_template<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    field.push(ch);
                }
                if !closed {
                    return Err(malformed(template, "unclosed '{'"));
                }

                let name = field
                    .split(|c: char| c == ':' || c == '!')
                    .next()
                    .unwrap_or_default()
                    .trim();
                let value =
                    lookup(name).ok_or_else(|| UsageError::MissingTemplateField(name.to_string()))?;
                out.push_str(&value);
            }
            '}' => return Err(malformed(template, "single '}' encountered")),
            c => out.push(c),
        }
    }

    Ok(out)
}

fn malformed(template: &str, reason: &str) -> DispatchError {
    UsageError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs() -> Kwargs {
        let mut kwargs = Kwargs::new();
        kwargs.insert("level".to_string(), json!(40));
        kwargs.insert("mode".to_string(), json!("night"));
        kwargs
    }

    #[test]
    fn test_render_fields() {
        let kwargs = kwargs();
        let args = MessageArgs::before(&kwargs);
        let spec = MessageSpec::from("Setting {mode} mode at {level}%");
        assert_eq!(spec.render(&args).unwrap(), "Setting night mode at 40%");
    }

    #[test]
    fn test_render_escapes_and_spec() {
        let kwargs = kwargs();
        let args = MessageArgs::before(&kwargs);
        let spec = MessageSpec::from("{{literal}} {level:>3}");
        assert_eq!(spec.render(&args).unwrap(), "{literal} 40");
    }

    #[test]
    fn test_missing_field_is_usage_error() {
        let kwargs = kwargs();
        let args = MessageArgs::before(&kwargs);
        let err = MessageSpec::from("Brightness {brightness}")
            .render(&args)
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("brightness"));
    }

    #[test]
    fn test_malformed_template_is_usage_error() {
        let lookup = |_: &str| Some("x".to_string());

        let err = render_template("value } here", lookup).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("single '}'"));

        let err = render_template("Setting {oops", lookup).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Usage(UsageError::MalformedTemplate { .. })
        ));
        assert!(err.to_string().contains("unclosed '{'"));

        assert_eq!(render_template("{{}} {a}", lookup).unwrap(), "{} x");
    }

    #[test]
    fn test_result_field() {
        let kwargs = kwargs();
        let result = "done".to_string();
        let args = MessageArgs::after(&kwargs, &result);
        assert_eq!(
            MessageSpec::from("{mode}: {result}").render(&args).unwrap(),
            "night: done"
        );

        // Before the call there is no result yet
        let args = MessageArgs::before(&kwargs);
        assert!(MessageSpec::from("{result}").render(&args).is_err());
    }

    #[test]
    fn test_render_with_closure() {
        let kwargs = kwargs();
        let args = MessageArgs::before(&kwargs);
        let spec = MessageSpec::render_with(|args| {
            format!("level={}", args.get("level").unwrap_or_default())
        });
        assert!(spec.is_callable());
        assert_eq!(spec.render(&args).unwrap(), "level=40");
    }

    #[test]
    fn test_empty_spec() {
        assert!(MessageSpec::from("").is_empty());
        assert!(MessageSpec::default().is_empty());
        assert!(!MessageSpec::from("x").is_empty());
    }
}
