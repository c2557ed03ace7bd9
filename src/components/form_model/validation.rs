use regex::Regex;

use super::control::{Control, ControlKind, ControlState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub control: usize,
  pub name: String,
  pub message: String,
}

/// Checks controls the way a browser checks a form before submitting it.
///
/// Disabled and overridden controls are skipped, and so is `pattern` on an
/// empty value.
pub fn validate(controls: &[Control]) -> Vec<ValidationError> {
  controls
    .iter()
    .enumerate()
    .filter(|(_, control)| !control.disabled && !control.is_overridden())
    .filter_map(|(index, control)| {
      check(control).map(|message| ValidationError { control: index, name: control.name.clone(), message })
    })
    .collect()
}

fn check(control: &Control) -> Option<String> {
  if control.kind == ControlKind::Checkbox {
    let unchecked = control.state == ControlState::Checked(false);
    return (control.required && unchecked).then(|| format!("{}: please check this box", control.name));
  }
  let text = control.text();
  if !control.is_text_like() && !matches!(control.kind, ControlKind::Select(_)) {
    return None;
  }
  if text.is_empty() {
    return control.required.then(|| format!("{}: please fill out this field", control.name));
  }

  if let Some(pattern) = control.pattern.as_deref().filter(|_| control.is_text_like()) {
    match Regex::new(&format!("^(?:{pattern})$")) {
      Ok(re) if !re.is_match(&text) => {
        return Some(format!("{}: please match the requested format", control.name));
      },
      Ok(_) => {},
      Err(err) => log::warn!("ignoring invalid pattern on '{}': {err}", control.name),
    }
  }

  if control.kind == ControlKind::Number {
    let Ok(number) = text.trim().parse::<f64>() else {
      return Some(format!("{}: please enter a number", control.name));
    };
    if let Some(min) = control.min.filter(|min| number < *min) {
      return Some(format!("{}: value must be greater than or equal to {min}", control.name));
    }
    if let Some(max) = control.max.filter(|max| number > *max) {
      return Some(format!("{}: value must be less than or equal to {max}", control.name));
    }
  }
  None
}
