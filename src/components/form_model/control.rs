use serde_json::Value;

use crate::values::{parse_leading_int, scalar_text, truthy, SENTINEL};

pub const NUMBER_PATTERN: &str = "[0-9]+";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
  pub value: String,
  pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
  Text,
  Password,
  Number,
  Checkbox,
  Select(Vec<SelectOption>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
  Text(String),
  Checked(bool),
  Selected(Option<usize>),
  /// Superseded by the nested section of the same name.
  Overridden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
  pub id: String,
  pub name: String,
  pub title: String,
  pub kind: ControlKind,
  pub state: ControlState,
  pub disabled: bool,
  pub required: bool,
  pub pattern: Option<String>,
  pub min: Option<f64>,
  pub max: Option<f64>,
  pub size: Option<u16>,
}

impl Control {
  pub fn new(id: String, name: String, title: String, kind: ControlKind) -> Self {
    let state = match &kind {
      ControlKind::Checkbox => ControlState::Checked(false),
      ControlKind::Select(options) => ControlState::Selected((!options.is_empty()).then_some(0)),
      _ => ControlState::Text(String::new()),
    };
    Self {
      id,
      name,
      title,
      kind,
      state,
      disabled: false,
      required: false,
      pattern: None,
      min: None,
      max: None,
      size: None,
    }
  }

  pub fn is_text_like(&self) -> bool {
    matches!(self.kind, ControlKind::Text | ControlKind::Password | ControlKind::Number)
  }

  fn option_index(&self, value: &str) -> Option<usize> {
    match &self.kind {
      ControlKind::Select(options) => options.iter().position(|option| option.value == value),
      _ => None,
    }
  }

  /// Applies a scalar received from the configuration service.
  pub fn set_scalar(&mut self, value: &Value) {
    self.state = match &self.kind {
      ControlKind::Checkbox => ControlState::Checked(truthy(value)),
      ControlKind::Select(_) => ControlState::Selected(self.option_index(&scalar_text(value))),
      _ => ControlState::Text(scalar_text(value)),
    };
  }

  /// Selects the option whose value is `value`, keeping the current choice
  /// when none matches.
  pub fn preselect(&mut self, value: &Value) {
    if let Some(index) = self.option_index(&scalar_text(value)) {
      self.state = ControlState::Selected(Some(index));
    }
  }

  pub fn set_overridden(&mut self) {
    self.state = ControlState::Overridden;
  }

  pub fn is_overridden(&self) -> bool {
    self.state == ControlState::Overridden
  }

  /// Replaces the value with what the user typed.
  pub fn set_text(&mut self, text: String) {
    self.state = match &self.kind {
      ControlKind::Checkbox => ControlState::Checked(truthy(&Value::String(text))),
      ControlKind::Select(_) => ControlState::Selected(self.option_index(&text)),
      _ => ControlState::Text(text),
    };
  }

  pub fn toggle(&mut self) {
    if let ControlKind::Checkbox = self.kind {
      let checked = matches!(self.state, ControlState::Checked(true));
      self.state = ControlState::Checked(!checked);
    }
  }

  pub fn cycle_option(&mut self, forward: bool) {
    let ControlKind::Select(options) = &self.kind else { return };
    if options.is_empty() {
      return;
    }
    let len = options.len();
    let next = match self.state {
      ControlState::Selected(Some(index)) if forward => (index + 1) % len,
      ControlState::Selected(Some(index)) => (index + len - 1) % len,
      _ => 0,
    };
    self.state = ControlState::Selected(Some(next));
  }

  /// Raw text of the control, as an input would report it.
  pub fn text(&self) -> String {
    match (&self.state, &self.kind) {
      (ControlState::Overridden, _) => SENTINEL.to_string(),
      (ControlState::Text(text), _) => text.clone(),
      (ControlState::Checked(checked), _) => checked.to_string(),
      (ControlState::Selected(Some(index)), ControlKind::Select(options)) => {
        options.get(*index).map(|option| option.value.clone()).unwrap_or_default()
      },
      (ControlState::Selected(_), _) => String::new(),
    }
  }

  /// Typed value sent to the configuration service.
  pub fn typed_value(&self) -> Value {
    if self.is_overridden() {
      return Value::String(SENTINEL.to_string());
    }
    match (&self.kind, &self.state) {
      (ControlKind::Checkbox, ControlState::Checked(checked)) => Value::Bool(*checked),
      (ControlKind::Number, ControlState::Text(text)) => {
        parse_leading_int(text).map(Value::from).unwrap_or(Value::Null)
      },
      _ => Value::String(self.text()),
    }
  }

  /// Characters of the value the form shows at once, if the field limits it.
  pub fn visible_width(&self) -> Option<usize> {
    self.size.filter(|size| *size > 0).map(usize::from)
  }

  /// [`Control::display`] cut to the field's `size`, marking the cut with `…`.
  pub fn clipped_display(&self) -> String {
    let display = self.display();
    match self.visible_width() {
      Some(width) if display.chars().count() > width => {
        let mut clipped = display.chars().take(width - 1).collect::<String>();
        clipped.push('…');
        clipped
      },
      _ => display,
    }
  }

  /// What the form shows in the value column.
  pub fn display(&self) -> String {
    match (&self.kind, &self.state) {
      (_, ControlState::Overridden) => SENTINEL.to_string(),
      (ControlKind::Checkbox, ControlState::Checked(true)) => "[x]".to_string(),
      (ControlKind::Checkbox, _) => "[ ]".to_string(),
      (ControlKind::Password, ControlState::Text(text)) => "•".repeat(text.chars().count()),
      (ControlKind::Select(options), ControlState::Selected(selected)) => {
        let label = selected.and_then(|index| options.get(index)).map(|option| option.label.as_str()).unwrap_or("");
        format!("‹ {label} ›")
      },
      _ => self.text(),
    }
  }
}
