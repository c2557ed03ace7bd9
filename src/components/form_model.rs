//! The control tree a form page is built from.
//!
//! Rendering a form definition produces one [`FormRow`] per field, in
//! declaration order, and one [`Control`] per value-bearing field. Controls
//! carry a dotted `name` mirroring the section nesting, which is the key used
//! to load and save values.

mod control;
mod handlers;
mod validation;

use std::sync::Arc;

use serde_json::{Map, Value};

pub use self::{
  control::{Control, ControlKind, ControlState, SelectOption, NUMBER_PATTERN},
  handlers::{BoundHandler, ControlEvent, HandlerFn, Handlers, CHANGE},
  validation::{validate, ValidationError},
};
use crate::{
  page_def::{resolve_pattern, FieldDef, FieldKind, Fields, FormDef, InputHints},
  values::{insert_dotted, scalar_text, truthy, walk, DottedPath, Node},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRow {
  pub label: String,
  pub depth: usize,
  pub control: Option<usize>,
}

#[derive(Debug)]
struct Listener {
  control: usize,
  event: String,
  handler: BoundHandler,
}

pub type Subscriber = Arc<dyn Fn(&mut FormModel, &ControlEvent) + Send + Sync>;

#[derive(Default)]
pub struct FormModel {
  pub rows: Vec<FormRow>,
  pub controls: Vec<Control>,
  listeners: Vec<Listener>,
  subscribers: Vec<(String, Subscriber)>,
}

impl FormModel {
  pub fn render(def: &FormDef, handlers: &Handlers) -> Self {
    let mut form = Self::default();
    form.render_fields(handlers, &def.name, "", 0, &def.fields);
    form
  }

  fn render_fields(&mut self, handlers: &Handlers, id_prefix: &str, name_prefix: &str, depth: usize, fields: &Fields) {
    for (name, def) in fields.iter() {
      let id = format!("{id_prefix}{name}");
      let full_name = format!("{name_prefix}{name}");

      let row = self.rows.len();
      self.rows.push(FormRow { label: name.to_string(), depth, control: None });
      self.rows[row].control = self.render_value(handlers, &id, &full_name, depth, def);
    }
  }

  fn render_value(&mut self, handlers: &Handlers, id: &str, name: &str, depth: usize, def: &FieldDef) -> Option<usize> {
    log::trace!("rendering {} '{name}' as {id}", def.kind.type_name());
    let control = match &def.kind {
      FieldKind::Text(hints) => {
        let mut control = self.input(id, name, def, ControlKind::Text, hints);
        if let Some(defval) = &hints.defval {
          control.set_text(scalar_text(defval));
        }
        Some(self.push(control))
      },
      FieldKind::Password(hints) => Some(self.input_control(id, name, def, ControlKind::Password, hints)),
      FieldKind::Number(hints) => {
        let mut control = self.input(id, name, def, ControlKind::Number, hints);
        control.pattern.get_or_insert_with(|| NUMBER_PATTERN.to_string());
        Some(self.push(control))
      },
      FieldKind::Checkbox { defval } => {
        let mut control = Control::new(id.into(), name.into(), def.desc.clone(), ControlKind::Checkbox);
        control.required = def.required;
        control.state = ControlState::Checked(defval.as_ref().is_some_and(truthy));
        Some(self.push(control))
      },
      FieldKind::Select { options, defval } => {
        let options = options
          .iter()
          .map(|(value, label)| SelectOption { value: value.to_string(), label: label.clone() })
          .collect::<Vec<_>>();
        let mut control = Control::new(id.into(), name.into(), def.desc.clone(), ControlKind::Select(options));
        control.required = def.required;
        if let Some(defval) = defval {
          control.preselect(defval);
        }
        Some(self.push(control))
      },
      FieldKind::Section { fields, value } => {
        let inline = match value.as_deref() {
          Some(inline) if !matches!(inline.kind, FieldKind::Section { .. }) => {
            self.render_value(handlers, id, name, depth, inline)
          },
          Some(_) => {
            log::debug!("section '{name}' cannot carry an inline section value");
            None
          },
          None => None,
        };
        if let Some(fields) = fields {
          self.render_fields(handlers, id, &format!("{name}."), depth + 1, fields);
        }
        inline
      },
    };

    if let Some(control) = control {
      for (event, reference) in def.events.iter() {
        match handlers.bind(reference) {
          Some(handler) => self.listeners.push(Listener { control, event: event.to_string(), handler }),
          None => log::warn!("no handler '{reference}' for '{event}' on '{name}'"),
        }
      }
    }
    control
  }

  fn input(&self, id: &str, name: &str, def: &FieldDef, kind: ControlKind, hints: &InputHints) -> Control {
    let mut control = Control::new(id.into(), name.into(), def.desc.clone(), kind);
    control.required = def.required;
    control.pattern = hints.pattern.as_deref().map(resolve_pattern);
    control.min = hints.min;
    control.max = hints.max;
    control.size = hints.size;
    control
  }

  fn input_control(&mut self, id: &str, name: &str, def: &FieldDef, kind: ControlKind, hints: &InputHints) -> usize {
    let control = self.input(id, name, def, kind, hints);
    self.push(control)
  }

  fn push(&mut self, control: Control) -> usize {
    self.controls.push(control);
    self.controls.len() - 1
  }

  pub fn control_named(&self, name: &str) -> Option<&Control> {
    self.controls.iter().find(|control| control.name == name)
  }

  fn indices_named(&self, name: &str) -> Vec<usize> {
    self.controls.iter().enumerate().filter(|(_, control)| control.name == name).map(|(index, _)| index).collect()
  }

  /// Registers `callback` to run whenever the control named `name` changes.
  pub fn subscribe<F>(&mut self, name: impl Into<String>, callback: F)
  where
    F: Fn(&mut FormModel, &ControlEvent) + Send + Sync + 'static,
  {
    self.subscribers.push((name.into(), Arc::new(callback)));
  }

  pub fn notify(&mut self, control: usize, event: &str) {
    let Some(source) = self.controls.get(control) else { return };
    let notification =
      ControlEvent { event: event.to_string(), control, name: source.name.clone(), value: source.typed_value() };

    let handlers = self
      .listeners
      .iter()
      .filter(|listener| listener.control == control && listener.event == event)
      .map(|listener| listener.handler.clone())
      .collect::<Vec<_>>();
    for handler in handlers {
      handler.call(self, &notification);
    }

    if event == CHANGE {
      let subscribers = self
        .subscribers
        .iter()
        .filter(|(name, _)| *name == notification.name)
        .map(|(_, subscriber)| subscriber.clone())
        .collect::<Vec<_>>();
      for subscriber in subscribers {
        subscriber(self, &notification);
      }
    }
  }

  pub fn set_enabled(&mut self, names: &[String], enabled: bool) {
    for control in self.controls.iter_mut().filter(|control| names.contains(&control.name)) {
      control.disabled = !enabled;
    }
  }

  /// Patches controls with the values the configuration service returned.
  ///
  /// A scalar sets every control of the same dotted name and notifies its
  /// `change` listeners; a nested object marks the same-named controls as
  /// overridden before its members are applied.
  pub fn apply_values(&mut self, values: &Value) {
    let mut changes = vec![];
    walk(values, &DottedPath::root(), &mut |path, node| {
      let name = path.to_string();
      for index in self.indices_named(&name) {
        match node {
          Node::Scalar(value) => {
            self.controls[index].set_scalar(value);
            changes.push(index);
          },
          Node::Branch => self.controls[index].set_overridden(),
        }
      }
    });
    for index in changes {
      self.notify(index, CHANGE);
    }
  }

  /// Folds every control into a nested value object, in render order.
  pub fn collect_values(&self) -> Value {
    let mut values = Map::new();
    for control in self.controls.iter().filter(|control| !control.name.is_empty()) {
      insert_dotted(&mut values, &control.name, control.typed_value());
    }
    Value::Object(values)
  }

  pub fn validate(&self) -> Vec<ValidationError> {
    validate(&self.controls)
  }

  /// Row index showing `control`.
  pub fn row_of(&self, control: usize) -> Option<usize> {
    self.rows.iter().position(|row| row.control == Some(control))
  }
}
