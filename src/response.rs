pub const SAVE_SUCCEEDED: &str = "values successfully sent";
pub const SAVE_FAILED: &str = "failed to send values";

#[derive(Debug, Clone)]
pub struct Response {
  pub status: reqwest::StatusCode,
  pub version: reqwest::Version,
  pub content_length: Option<u64>,
  pub body: String,
}

impl Response {
  pub fn is_ok(&self) -> bool {
    self.status == reqwest::StatusCode::OK
  }

  /// Why a request failed: the body, else the status text, else a generic message.
  pub fn failure_reason(&self) -> String {
    if !self.body.is_empty() {
      return self.body.clone();
    }
    self.status.canonical_reason().map(String::from).unwrap_or_else(|| SAVE_FAILED.to_string())
  }

  pub fn save_message(&self) -> String {
    if self.is_ok() {
      SAVE_SUCCEEDED.to_string()
    } else {
      self.failure_reason()
    }
  }
}
