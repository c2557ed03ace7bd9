use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use super::FormModel;
use crate::values::truthy;

pub const CHANGE: &str = "change";

/// Notification delivered to listeners and subscribers of a control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
  pub event: String,
  pub control: usize,
  pub name: String,
  pub value: Value,
}

pub type HandlerFn = Arc<dyn Fn(&mut FormModel, &ControlEvent, &[String]) + Send + Sync>;

/// A registry handler bound to the arguments of one `events` entry.
#[derive(Clone)]
pub struct BoundHandler {
  pub name: String,
  pub args: Vec<String>,
  handler: HandlerFn,
}

impl BoundHandler {
  pub fn call(&self, form: &mut FormModel, event: &ControlEvent) {
    (self.handler)(form, event, &self.args)
  }
}

impl fmt::Debug for BoundHandler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundHandler").field("name", &self.name).field("args", &self.args).finish()
  }
}

/// Named callables that page definitions refer to from their `events`.
///
/// A reference reads `name` or `name:arg1,arg2`.
#[derive(Clone)]
pub struct Handlers {
  registry: HashMap<String, HandlerFn>,
}

impl Default for Handlers {
  fn default() -> Self {
    Self::builtin()
  }
}

impl fmt::Debug for Handlers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names = self.registry.keys().collect::<Vec<_>>();
    names.sort();
    f.debug_struct("Handlers").field("registry", &names).finish()
  }
}

impl Handlers {
  pub fn empty() -> Self {
    Self { registry: HashMap::new() }
  }

  pub fn builtin() -> Self {
    let mut handlers = Self::empty();
    handlers.register("enable", |form, event, targets| {
      form.set_enabled(targets, truthy(&event.value));
    });
    handlers.register("disable", |form, event, targets| {
      form.set_enabled(targets, !truthy(&event.value));
    });
    handlers.register("log", |_, event, _| {
      log::info!("{} on '{}': {}", event.event, event.name, event.value);
    });
    handlers
  }

  pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
  where
    F: Fn(&mut FormModel, &ControlEvent, &[String]) + Send + Sync + 'static,
  {
    self.registry.insert(name.into(), Arc::new(handler));
  }

  pub fn bind(&self, reference: &str) -> Option<BoundHandler> {
    let (name, args): (&str, Vec<String>) = match reference.split_once(':') {
      Some((name, args)) => {
        (name.trim(), args.split(',').map(str::trim).filter(|arg| !arg.is_empty()).map(String::from).collect())
      },
      None => (reference.trim(), vec![]),
    };
    let handler = self.registry.get(name)?.clone();
    Some(BoundHandler { name: name.to_string(), args, handler })
  }
}
