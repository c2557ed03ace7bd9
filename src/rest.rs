//! Client for the REST configuration service.
//!
//! Every resource is served under `<scheme>://<host>:<rest_port>/confs`.

use reqwest::{
  header::{ACCEPT, CONTENT_TYPE},
  Url,
};
use serde_json::Value;
use thiserror::Error;

use crate::{action::Action, response::Response};

pub const DEFAULT_REST_PORT: u16 = 4984;

#[derive(Debug, Error)]
pub enum RestError {
  #[error("invalid origin '{0}'")]
  InvalidOrigin(String),
  #[error("{0}")]
  Transport(#[from] reqwest::Error),
  #[error("{}", .0.failure_reason())]
  Status(Response),
  #[error("malformed values: {0}")]
  Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestMethod {
  Load,
  Save(Value),
}

/// A call queued by a page; `page` correlates the outcome with its form.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
  pub page: String,
  pub resource: String,
  pub method: RestMethod,
}

impl RestRequest {
  pub fn load(page: &str, resource: &str) -> Self {
    Self { page: page.to_string(), resource: resource.to_string(), method: RestMethod::Load }
  }

  pub fn save(page: &str, resource: &str, values: Value) -> Self {
    Self { page: page.to_string(), resource: resource.to_string(), method: RestMethod::Save(values) }
  }
}

#[derive(Debug, Clone)]
pub struct RestClient {
  client: reqwest::Client,
  base: String,
}

impl RestClient {
  pub fn new(origin: &str, port: u16) -> Result<Self, RestError> {
    let url = Url::parse(origin).map_err(|_| RestError::InvalidOrigin(origin.to_string()))?;
    let host = url.host_str().ok_or_else(|| RestError::InvalidOrigin(origin.to_string()))?;
    Ok(Self { client: reqwest::Client::new(), base: format!("{}://{}:{}/confs", url.scheme(), host, port) })
  }

  pub fn url(&self, resource: &str) -> String {
    format!("{}{}", self.base, resource)
  }

  async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, RestError> {
    let response = request.send().await?;
    Ok(Response {
      status: response.status(),
      version: response.version(),
      content_length: response.content_length(),
      body: response.text().await?,
    })
  }

  pub async fn load(&self, resource: &str) -> Result<Value, RestError> {
    let response = self.send(self.client.get(self.url(resource))).await?;
    if !response.is_ok() {
      return Err(RestError::Status(response));
    }
    Ok(serde_json::from_str(&response.body)?)
  }

  pub async fn save(&self, resource: &str, values: &Value) -> Result<Response, RestError> {
    let body = serde_json::to_string(values)?;
    log::debug!("PUT {resource}: {body}");
    self
      .send(
        self
          .client
          .put(self.url(resource))
          .header(CONTENT_TYPE, "application/json")
          .header(ACCEPT, "application/json; charset=utf-8")
          .body(body),
      )
      .await
  }

  /// Runs `request` and turns its outcome into the action its page expects.
  pub async fn execute(&self, request: RestRequest) -> Action {
    let RestRequest { page, resource, method } = request;
    match method {
      RestMethod::Load => match self.load(&resource).await {
        Ok(values) => Action::Loaded { page, values },
        Err(err) => {
          log::warn!("failed to load {resource}: {err}");
          Action::LoadFailed { page, reason: err.to_string() }
        },
      },
      RestMethod::Save(values) => {
        let message = match self.save(&resource, &values).await {
          Ok(response) => {
            log::info!(
              "PUT {resource}: {} {:?}, {} byte(s)",
              response.status,
              response.version,
              response.content_length.unwrap_or_default()
            );
            response.save_message()
          },
          Err(err) => {
            log::warn!("failed to save {resource}: {err}");
            err.to_string()
          },
        };
        Action::Saved { page, message }
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
  };
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;
  use crate::response::SAVE_SUCCEEDED;

  #[derive(Clone, Default)]
  struct Backend {
    stored: Arc<Mutex<Option<(String, Value)>>>,
  }

  async fn serve(router: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    port
  }

  fn backend_router(backend: Backend) -> Router {
    Router::new()
      .route("/confs/x/y/net", get(|| async { Json(json!({ "ip": "10.0.0.1", "dns": { "server": "1.1.1.1" } })) }).put(
        |State(backend): State<Backend>, headers: HeaderMap, Json(values): Json<Value>| async move {
          let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
          *backend.stored.lock().unwrap() = Some((content_type, values));
          StatusCode::OK
        },
      ))
      .route("/confs/x/y/broken", get(|| async { StatusCode::NOT_FOUND }).put(|| async { (StatusCode::BAD_REQUEST, "bad ip") }))
      .with_state(backend)
  }

  #[test]
  fn base_url_swaps_the_port() {
    let client = RestClient::new("http://device.local:8080", DEFAULT_REST_PORT).unwrap();
    assert_eq!(client.url("/x/y/net"), "http://device.local:4984/confs/x/y/net");
    assert!(RestClient::new("not a url", DEFAULT_REST_PORT).is_err());
  }

  #[tokio::test]
  async fn load_returns_the_value_object() {
    let port = serve(backend_router(Backend::default())).await;
    let client = RestClient::new("http://127.0.0.1", port).unwrap();

    let action = client.execute(RestRequest::load("net", "/x/y/net")).await;
    assert_eq!(action, Action::Loaded {
      page: "net".into(),
      values: json!({ "ip": "10.0.0.1", "dns": { "server": "1.1.1.1" } })
    });
  }

  #[tokio::test]
  async fn load_failure_is_reported_with_its_page() {
    let port = serve(backend_router(Backend::default())).await;
    let client = RestClient::new("http://127.0.0.1", port).unwrap();

    let action = client.execute(RestRequest::load("broken", "/x/y/broken")).await;
    assert_eq!(action, Action::LoadFailed { page: "broken".into(), reason: "Not Found".into() });
  }

  #[tokio::test]
  async fn save_puts_json_and_reports_success() {
    let backend = Backend::default();
    let port = serve(backend_router(backend.clone())).await;
    let client = RestClient::new("http://127.0.0.1", port).unwrap();

    let values = json!({ "ip": "10.0.0.2" });
    let action = client.execute(RestRequest::save("net", "/x/y/net", values.clone())).await;

    assert_eq!(action, Action::Saved { page: "net".into(), message: SAVE_SUCCEEDED.into() });
    assert_eq!(*backend.stored.lock().unwrap(), Some(("application/json".to_string(), values)));
  }

  #[tokio::test]
  async fn save_failure_surfaces_the_response_body() {
    let port = serve(backend_router(Backend::default())).await;
    let client = RestClient::new("http://127.0.0.1", port).unwrap();

    let action = client.execute(RestRequest::save("broken", "/x/y/broken", json!({}))).await;
    assert_eq!(action, Action::Saved { page: "broken".into(), message: "bad ip".into() });
  }
}
