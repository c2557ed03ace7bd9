/// What the header and footer need to know about the active page.
#[derive(Debug, Default)]
pub struct State {
  pub origin: String,
  pub page_title: String,
  pub resource: String,
  pub input_mode: InputMode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
  #[default]
  Normal,
  Insert,
}

impl State {
  pub fn new(origin: &str) -> Self {
    Self { origin: origin.trim_end_matches('/').to_string(), ..Self::default() }
  }

  /// URL of the root directory page.
  pub fn root_url(&self) -> String {
    format!("{}/confs", self.origin)
  }
}
