use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, style::Style};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
  action::Action,
  components::form_model::Handlers,
  page_def::PageDefinition,
  page_store::PageStoreError,
  rest::RestRequest,
  state::State,
  tui::{Event, EventResponse, Frame},
};

pub mod directory;
pub mod fallback;
pub mod form;

pub trait Page {
  fn init(&mut self, _state: &mut State) -> Result<()> {
    Ok(())
  }

  /// Pages react to keys only; everything else reaches them as actions.
  fn handle_events(&mut self, event: Event, state: &mut State) -> Result<Option<EventResponse<Action>>> {
    match event {
      Event::Key(key) => self.handle_key_events(key, state),
      _ => Ok(None),
    }
  }

  #[allow(unused_variables)]
  fn handle_key_events(&mut self, key: KeyEvent, state: &mut State) -> Result<Option<EventResponse<Action>>> {
    Ok(None)
  }

  #[allow(unused_variables)]
  fn update(&mut self, action: Action, state: &mut State) -> Result<Option<Action>> {
    Ok(None)
  }

  fn draw(&mut self, f: &mut Frame<'_>, area: Rect, state: &State) -> Result<()>;
}

/// Everything a page needs from the application besides its definition.
#[derive(Debug, Clone)]
pub struct PageContext {
  pub origin: String,
  pub handlers: Handlers,
  pub request_tx: UnboundedSender<RestRequest>,
  pub focused_style: Style,
}

/// Builds the page a resolved definition describes.
///
/// Lookup and schema errors become a text-only page that issues no requests.
pub fn build_page(definition: Result<PageDefinition, PageStoreError>, ctx: &PageContext) -> Box<dyn Page> {
  match definition {
    Ok(PageDefinition::Directory(def)) => Box::new(directory::DirectoryPage::new(&def, ctx)),
    Ok(PageDefinition::Form(def)) => Box::new(form::FormPage::new(&def, ctx)),
    Err(err) => {
      log::warn!("{err}");
      Box::new(fallback::FallbackPage::new(err.to_string()))
    },
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;
  use tokio::sync::mpsc::{self, UnboundedReceiver};

  use super::*;
  use crate::page_def::{PageKind, INCOMPLETE_PAGE_DEF};

  fn context() -> (PageContext, UnboundedReceiver<RestRequest>) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let ctx = PageContext {
      origin: "http://localhost:8080".into(),
      handlers: Handlers::builtin(),
      request_tx,
      focused_style: Style::default(),
    };
    (ctx, request_rx)
  }

  #[test]
  fn directory_without_entries_falls_back_without_requests() {
    let (ctx, mut request_rx) = context();
    let definition = PageDefinition::from_value(PageKind::Directory, json!({ "resource": "/x/net", "title": "Net" }));
    let error = definition.as_ref().map(|_| ()).unwrap_err().to_string();
    assert!(error.starts_with(INCOMPLETE_PAGE_DEF));

    let mut state = State::new("http://localhost:8080");
    let mut page = build_page(definition.map_err(PageStoreError::from), &ctx);
    page.init(&mut state).unwrap();

    assert!(request_rx.try_recv().is_err());
    assert_eq!(state.page_title, "");
  }

  #[test]
  fn form_page_loads_its_values_on_init() {
    let (ctx, mut request_rx) = context();
    let definition = PageDefinition::from_value(
      PageKind::Form,
      json!({ "name": "net", "resource": "/x/y/net", "title": "Network", "fields": { "ip": { "type": "text" } } }),
    );

    let mut state = State::new("http://localhost:8080");
    let mut page = build_page(definition.map_err(PageStoreError::from), &ctx);
    page.init(&mut state).unwrap();

    assert_eq!(request_rx.try_recv().unwrap(), RestRequest::load("net", "/x/y/net"));
    assert!(request_rx.try_recv().is_err());
    assert_eq!((state.page_title.as_str(), state.resource.as_str()), ("Network", "/x/y/net"));
  }
}
