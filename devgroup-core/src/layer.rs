//! # Call Layers
//!
//! A layer wraps the rest of a command call. Output strategies and user
//! decorators are both layers, so a composed command is just a stack of them
//! around the device method.

use std::fmt;
use std::sync::Arc;

use crate::context::Invocation;
use crate::error::Result;
use crate::output::CommandResult;

/// Value produced by a command call
pub type Outcome = Box<dyn CommandResult>;

/// The remainder of the call below a layer
pub type Next<'a> = &'a mut dyn FnMut(&mut Invocation) -> Result<Outcome>;

/// Something that runs around the rest of a command call
pub trait Layer: Send + Sync {
    /// Stage name, used in logs and for inspecting composed commands
    fn name(&self) -> &str;

    /// Run this layer. Call `next` to continue towards the device method.
    fn around(&self, inv: &mut Invocation, next: Next<'_>) -> Result<Outcome>;
}

type AroundFn = dyn for<'a> Fn(&mut Invocation, Next<'a>) -> Result<Outcome> + Send + Sync;

/// A named layer built from a closure
#[derive(Clone)]
pub struct Decorator {
    name: String,
    around: Arc<AroundFn>,
}

impl Decorator {
    /// Create a decorator
    pub fn new<F>(name: impl Into<String>, around: F) -> Self
    where
        F: for<'a> Fn(&mut Invocation, Next<'a>) -> Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            around: Arc::new(around),
        }
    }

    /// Decorator that only rewrites the call's arguments before passing them on
    pub fn map_args<F>(name: impl Into<String>, map: F) -> Self
    where
        F: Fn(&mut Invocation) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, move |inv, next| {
            map(inv)?;
            next(inv)
        })
    }
}

impl Layer for Decorator {
    fn name(&self) -> &str {
        &self.name
    }

    fn around(&self, inv: &mut Invocation, next: Next<'_>) -> Result<Outcome> {
        (self.around)(inv, next)
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Echo;
    use serde_json::json;

    #[test]
    fn test_map_args() {
        let upper = Decorator::map_args("upper", |inv| {
            let name = inv.require_str("name")?.to_uppercase();
            inv.args.insert("name".to_string(), json!(name));
            Ok(())
        });
        assert_eq!(upper.name(), "upper");

        let (echo, _) = Echo::capture();
        let mut inv = Invocation::new(Default::default(), echo).with_arg("name", "lamp");
        let outcome = upper
            .around(&mut inv, &mut |inv| {
                Ok(Box::new(inv.require_str("name")?.to_string()) as Outcome)
            })
            .unwrap();
        assert_eq!(outcome.render(), "LAMP");
    }

    #[test]
    fn test_decorator_can_short_circuit() {
        let deny = Decorator::new("deny", |_inv, _next| Err(crate::error::DispatchError::other("denied")));

        let (echo, _) = Echo::capture();
        let mut inv = Invocation::new(Default::default(), echo);
        let mut reached = false;
        let result = deny.around(&mut inv, &mut |_inv| {
            reached = true;
            Ok(Box::new(()) as Outcome)
        });
        assert!(result.is_err());
        assert!(!reached);
    }
}
