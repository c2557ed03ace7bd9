//! Resolves page URLs to page definition files.
//!
//! `<origin>/confs/<rel>` is read from `<pages_dir>/<rel>.json5` (or `.json`,
//! `.yaml`, `.yml`). A directory at `<pages_dir>/<rel>` makes the page a
//! directory page; an empty `<rel>` is the `root` directory page.

use std::{
  ffi::OsString,
  path::{Path, PathBuf},
};

use serde_json::Value;
use thiserror::Error;

use crate::page_def::{PageDefinition, PageKind, SchemaError};

const CONFS: &str = "/confs";
const ROOT_PAGE: &str = "root";
const EXTENSIONS: [&str; 4] = ["json5", "json", "yaml", "yml"];

#[derive(Debug, Error)]
pub enum PageStoreError {
  #[error("'{0}' is not a configuration page")]
  ForeignUrl(String),
  #[error("can't find page {0}")]
  NotFound(String),
  #[error("can't read {}: {source}", .path.display())]
  Io { path: PathBuf, source: std::io::Error },
  #[error("can't parse {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },
  #[error(transparent)]
  Schema(#[from] SchemaError),
}

#[derive(Debug, Clone)]
pub struct PageStore {
  pages_dir: PathBuf,
  origin: String,
}

impl PageStore {
  pub fn new(pages_dir: impl Into<PathBuf>, origin: &str) -> Self {
    Self { pages_dir: pages_dir.into(), origin: origin.trim_end_matches('/').to_string() }
  }

  pub fn pages_dir(&self) -> &Path {
    &self.pages_dir
  }

  /// Page path below `/confs`, without empty segments: `""` for the root.
  ///
  /// Accepts full URLs under the origin as well as bare `/confs/...` paths.
  pub fn relative_path(&self, url: &str) -> Result<String, PageStoreError> {
    let path = url.strip_prefix(self.origin.as_str()).unwrap_or(url);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix(CONFS).ok_or_else(|| PageStoreError::ForeignUrl(url.to_string()))?;
    if !rest.is_empty() && !rest.starts_with('/') {
      return Err(PageStoreError::ForeignUrl(url.to_string()));
    }
    let segments = rest.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();
    if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
      return Err(PageStoreError::ForeignUrl(url.to_string()));
    }
    Ok(segments.into_iter().map(|segment| format!("/{segment}")).collect())
  }

  pub fn load(&self, url: &str) -> Result<PageDefinition, PageStoreError> {
    let rel = self.relative_path(url)?;
    let (kind, base) = if rel.is_empty() {
      (PageKind::Directory, self.pages_dir.join(ROOT_PAGE))
    } else {
      let base = self.pages_dir.join(rel.trim_start_matches('/'));
      let kind = if base.is_dir() { PageKind::Directory } else { PageKind::Form };
      (kind, base)
    };
    log::debug!("{url} resolves to {kind:?} page {}", base.display());

    let path = EXTENSIONS
      .iter()
      .map(|extension| with_extension(&base, extension))
      .find(|candidate| candidate.is_file())
      .ok_or_else(|| PageStoreError::NotFound(if rel.is_empty() { format!("/{ROOT_PAGE}") } else { rel.clone() }))?;

    let source = std::fs::read_to_string(&path).map_err(|source| PageStoreError::Io { path: path.clone(), source })?;
    let value = parse(&path, &source)?;
    Ok(PageDefinition::from_value(kind, value)?)
  }
}

fn with_extension(base: &Path, extension: &str) -> PathBuf {
  let mut path = OsString::from(base.as_os_str());
  path.push(".");
  path.push(extension);
  PathBuf::from(path)
}

fn parse(path: &Path, source: &str) -> Result<Value, PageStoreError> {
  let yaml = path.extension().is_some_and(|extension| extension == "yaml" || extension == "yml");
  let parsed = if yaml {
    serde_yaml::from_str::<Value>(source).map_err(|err| err.to_string())
  } else {
    json5::from_str::<Value>(source).map_err(|err| err.to_string())
  };
  parsed.map_err(|message| PageStoreError::Parse { path: path.to_path_buf(), message })
}

#[cfg(test)]
mod tests {
  use std::fs;

  use pretty_assertions::assert_eq;
  use tempfile::TempDir;

  use super::*;

  const ORIGIN: &str = "http://localhost:8080";

  fn store() -> (TempDir, PageStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = PageStore::new(dir.path(), ORIGIN);
    (dir, store)
  }

  #[test]
  fn relative_path_collapses_empty_segments() {
    let (_dir, store) = store();
    assert_eq!(store.relative_path("http://localhost:8080/confs").unwrap(), "");
    assert_eq!(store.relative_path("http://localhost:8080/confs/").unwrap(), "");
    assert_eq!(store.relative_path("http://localhost:8080/confs//net///wifi/").unwrap(), "/net/wifi");
    assert_eq!(store.relative_path("/confs/net?x=1").unwrap(), "/net");
    assert!(store.relative_path("http://localhost:8080/static/app.js").is_err());
    assert!(store.relative_path("http://localhost:8080/confsx").is_err());
  }

  #[test]
  fn dot_segments_cannot_leave_the_pages_dir() {
    let outer = tempfile::tempdir().unwrap();
    let pages = outer.path().join("pages");
    fs::create_dir(&pages).unwrap();
    fs::write(outer.path().join("secret.json5"), "{ name: 's', resource: '/x/s', title: 'outside', fields: {} }")
      .unwrap();
    let store = PageStore::new(&pages, ORIGIN);

    assert!(matches!(store.load("/confs/../secret").unwrap_err(), PageStoreError::ForeignUrl(_)));
    assert!(matches!(
      store.load("http://localhost:8080/confs/net/../../secret").unwrap_err(),
      PageStoreError::ForeignUrl(_)
    ));
    assert!(store.relative_path("/confs/./net").is_err());
  }

  #[test]
  fn root_is_a_directory_page() {
    let (dir, store) = store();
    fs::write(
      dir.path().join("root.json5"),
      "{ resource: '/x', title: 'Config', entries: [{ name: 'net', desc: 'Network' }] }",
    )
    .unwrap();

    let page = store.load("http://localhost:8080/confs/").unwrap();
    assert_eq!(page.kind(), PageKind::Directory);
    assert_eq!(page.title(), "Config");
  }

  #[test]
  fn directory_on_disk_selects_directory_renderer() {
    let (dir, store) = store();
    fs::create_dir(dir.path().join("net")).unwrap();
    fs::write(dir.path().join("net.json"), r#"{ "resource": "/x/net", "title": "Net", "entries": [] }"#).unwrap();
    fs::write(
      dir.path().join("net").join("wifi.yaml"),
      "name: wifi\nresource: /x/net/wifi\ntitle: Wifi\nfields:\n  ssid:\n    type: text\n",
    )
    .unwrap();

    assert_eq!(store.load("http://localhost:8080/confs/net").unwrap().kind(), PageKind::Directory);
    let wifi = store.load("http://localhost:8080/confs/net/wifi").unwrap();
    assert_eq!(wifi.kind(), PageKind::Form);
    assert_eq!(wifi.resource(), "/x/net/wifi");
  }

  #[test]
  fn json5_wins_over_json() {
    let (dir, store) = store();
    fs::write(dir.path().join("a.json5"), "{ name: 'a', resource: '/x/a', title: 'five', fields: {} }").unwrap();
    fs::write(dir.path().join("a.json"), r#"{ "name": "a", "resource": "/x/a", "title": "json", "fields": {} }"#)
      .unwrap();
    assert_eq!(store.load("/confs/a").unwrap().title(), "five");
  }

  #[test]
  fn missing_and_incomplete_pages_are_errors() {
    let (dir, store) = store();
    let err = store.load("http://localhost:8080/confs/nope").unwrap_err();
    assert_eq!(err.to_string(), "can't find page /nope");

    fs::write(dir.path().join("bad.json5"), "{ name: 'bad', resource: '/x/bad', title: 'Bad' }").unwrap();
    assert!(matches!(
      store.load("/confs/bad").unwrap_err(),
      PageStoreError::Schema(SchemaError::MissingKeys(keys)) if keys == vec!["fields".to_string()]
    ));

    fs::write(dir.path().join("broken.json5"), "{ name: ").unwrap();
    assert!(matches!(store.load("/confs/broken").unwrap_err(), PageStoreError::Parse { .. }));
  }
}
