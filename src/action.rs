use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Serialize, Display, Deserialize)]
pub enum Action {
  Tick,
  Render,
  Resize(u16, u16),
  Suspend,
  Resume,
  Quit,
  Error(String),
  FocusNext,
  FocusPrev,
  Up,
  Down,
  Left,
  Right,
  Submit,
  Update,
  Noop,
  Back,
  Navigate(String),
  Apply,
  Reload,
  Reset,
  Loaded { page: String, values: Value },
  LoadFailed { page: String, reason: String },
  Saved { page: String, message: String },
  Popdown,
  StatusLine(String),
  TimedStatusLine(String, u64),
}
