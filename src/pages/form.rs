use color_eyre::eyre::Result;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::{
  action::Action,
  components::{
    form_model::{ControlKind, FormModel, CHANGE},
    navigator::Navigator,
  },
  page_def::FormDef,
  pages::{Page, PageContext},
  panes::{status_dialog::StatusDialog, Pane},
  rest::RestRequest,
  state::{InputMode, State},
  tui::{EventResponse, Frame},
};

const STATUS_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  Navigator,
  Fields,
  Buttons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
enum Button {
  Apply,
  Reload,
  Reset,
}

impl Button {
  fn action(self) -> Action {
    match self {
      Button::Apply => Action::Apply,
      Button::Reload => Action::Reload,
      Button::Reset => Action::Reset,
    }
  }
}

/// Editable form over one REST resource, with a button bar and a status dialog.
pub struct FormPage {
  name: String,
  title: String,
  resource: String,
  model: FormModel,
  navigator: Navigator,
  dialog: StatusDialog,
  table_state: TableState,
  focus: Focus,
  button: usize,
  input: Input,
  editing: Option<usize>,
  request_tx: UnboundedSender<RestRequest>,
  focused_style: Style,
}

impl FormPage {
  pub fn new(def: &FormDef, ctx: &PageContext) -> Self {
    let model = FormModel::render(def, &ctx.handlers);
    let table_state = TableState::default().with_selected((!model.rows.is_empty()).then_some(0));
    Self {
      name: def.name.clone(),
      title: def.title.clone(),
      resource: def.resource.clone(),
      model,
      navigator: Navigator::new(&ctx.origin, &def.resource),
      dialog: StatusDialog::new(ctx.focused_style),
      table_state,
      focus: Focus::Fields,
      button: 0,
      input: Input::default(),
      editing: None,
      request_tx: ctx.request_tx.clone(),
      focused_style: ctx.focused_style,
    }
  }

  fn load(&self) -> Result<()> {
    self.request_tx.send(RestRequest::load(&self.name, &self.resource))?;
    Ok(())
  }

  fn apply(&mut self) -> Result<Option<Action>> {
    let errors = self.model.validate();
    if let Some(first) = errors.first() {
      log::info!("not saving {}: {} invalid field(s)", self.resource, errors.len());
      self.focus_fields();
      self.table_state.select(self.model.row_of(first.control));
      return Ok(Some(Action::TimedStatusLine(first.message.clone(), STATUS_SECONDS)));
    }
    self.request_tx.send(RestRequest::save(&self.name, &self.resource, self.model.collect_values()))?;
    Ok(None)
  }

  fn selected_control(&self) -> Option<usize> {
    self.table_state.selected().and_then(|row| self.model.rows.get(row)).and_then(|row| row.control)
  }

  fn focus_fields(&mut self) {
    self.navigator.unfocus();
    self.focus = Focus::Fields;
  }

  fn move_focus(&mut self, forward: bool) {
    let order = [Focus::Navigator, Focus::Fields, Focus::Buttons];
    let current = order.iter().position(|focus| *focus == self.focus).unwrap_or(1);
    let next = if forward { (current + 1) % order.len() } else { (current + order.len() - 1) % order.len() };
    self.focus = order[next];
    if self.focus == Focus::Navigator {
      self.navigator.focus();
    } else {
      self.navigator.unfocus();
    }
  }

  fn move_selection(&mut self, forward: bool) {
    let len = self.model.rows.len();
    if len == 0 {
      return;
    }
    let next = match self.table_state.selected() {
      Some(i) if forward => (i + 1) % len,
      Some(i) => (i + len - 1) % len,
      None => 0,
    };
    self.table_state.select(Some(next));
  }

  fn activate_control(&mut self, state: &mut State) {
    let Some(index) = self.selected_control() else { return };
    let control = &mut self.model.controls[index];
    if control.disabled {
      return;
    }
    match control.kind {
      ControlKind::Checkbox => control.toggle(),
      ControlKind::Select(_) => control.cycle_option(true),
      _ => {
        self.input = Input::new(control.text());
        self.editing = Some(index);
        state.input_mode = InputMode::Insert;
        return;
      },
    }
    self.model.notify(index, CHANGE);
  }

  fn cycle_selected(&mut self, forward: bool) {
    let Some(index) = self.selected_control() else { return };
    let control = &mut self.model.controls[index];
    if control.disabled || !matches!(control.kind, ControlKind::Select(_)) {
      return;
    }
    control.cycle_option(forward);
    self.model.notify(index, CHANGE);
  }

  fn finish_editing(&mut self, state: &mut State, commit: bool) {
    if let Some(index) = self.editing.take() {
      if commit {
        self.model.controls[index].set_text(self.input.value().to_string());
        self.model.notify(index, CHANGE);
      }
    }
    self.input.reset();
    state.input_mode = InputMode::Normal;
  }

  /// Width the value of control `index` gets inside a column `column_width` wide.
  fn input_width(&self, index: usize, column_width: u16) -> usize {
    let column = usize::from(column_width.max(1));
    self.model.controls[index].visible_width().map_or(column, |width| width.min(column))
  }

  fn value_span(&self, index: usize, column_width: u16) -> Span<'static> {
    if self.editing == Some(index) {
      let width = self.input_width(index, column_width);
      let scroll = self.input.visual_scroll(width);
      let visible = self.input.value().chars().skip(scroll).take(width).collect::<String>();
      return Span::styled(visible, Style::default().add_modifier(Modifier::UNDERLINED));
    }
    let control = &self.model.controls[index];
    let style = if control.disabled { Style::default().dim() } else { Style::default().fg(Color::LightCyan) };
    Span::styled(control.clipped_display(), style)
  }
}

impl Page for FormPage {
  fn init(&mut self, state: &mut State) -> Result<()> {
    state.page_title = self.title.clone();
    state.resource = self.resource.clone();
    state.input_mode = InputMode::Normal;
    self.load()
  }

  fn handle_key_events(&mut self, key: KeyEvent, state: &mut State) -> Result<Option<EventResponse<Action>>> {
    if self.dialog.is_open() {
      return self.dialog.handle_key_events(key, state);
    }
    if state.input_mode == InputMode::Insert {
      let response = match key.code {
        KeyCode::Enter => {
          self.finish_editing(state, true);
          EventResponse::Stop(Action::Update)
        },
        KeyCode::Esc => {
          self.finish_editing(state, false);
          EventResponse::Stop(Action::Update)
        },
        _ => {
          self.input.handle_event(&CrosstermEvent::Key(key));
          EventResponse::Stop(Action::Noop)
        },
      };
      return Ok(Some(response));
    }

    let response = match key.code {
      KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => EventResponse::Stop(Action::Down),
      KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => EventResponse::Stop(Action::Up),
      KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => EventResponse::Stop(Action::Left),
      KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => EventResponse::Stop(Action::Right),
      KeyCode::Enter | KeyCode::Char(' ') => EventResponse::Stop(Action::Submit),
      KeyCode::Esc => EventResponse::Stop(Action::Back),
      _ => return Ok(None),
    };
    Ok(Some(response))
  }

  fn update(&mut self, action: Action, state: &mut State) -> Result<Option<Action>> {
    match action {
      Action::FocusNext => self.move_focus(true),
      Action::FocusPrev => self.move_focus(false),
      Action::Down if self.focus == Focus::Fields => self.move_selection(true),
      Action::Up if self.focus == Focus::Fields => self.move_selection(false),
      Action::Left | Action::Right => {
        let forward = action == Action::Right;
        match self.focus {
          Focus::Navigator if forward => self.navigator.right(),
          Focus::Navigator => self.navigator.left(),
          Focus::Fields => self.cycle_selected(forward),
          Focus::Buttons => {
            let len = Button::iter().count();
            self.button = if forward { (self.button + 1) % len } else { (self.button + len - 1) % len };
          },
        }
      },
      Action::Submit => match self.focus {
        Focus::Navigator => return Ok(self.navigator.activate()),
        Focus::Fields => self.activate_control(state),
        Focus::Buttons => return Ok(Button::iter().nth(self.button).map(Button::action)),
      },
      Action::Apply => return self.apply(),
      Action::Reload => self.load()?,
      Action::Reset => log::info!("reset requested on {}; defaults are not restored", self.resource),
      Action::Back => return Ok(Some(self.navigator.back())),
      Action::Loaded { page, values } if page == self.name => {
        log::debug!("loaded {}: {values}", self.resource);
        self.model.apply_values(&values);
      },
      Action::LoadFailed { page, reason } if page == self.name => {
        return Ok(Some(Action::TimedStatusLine(
          format!("failed to load {}: {reason}", self.resource),
          STATUS_SECONDS,
        )));
      },
      Action::Saved { page, message } if page == self.name => self.dialog.popup(message),
      Action::Popdown => self.dialog.popdown(),
      _ => {},
    }
    Ok(None)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, state: &State) -> Result<()> {
    let [nav_area, table_area, button_area] =
      Layout::vertical([Constraint::Length(2), Constraint::Fill(1), Constraint::Length(1)]).areas(area);
    self.navigator.draw(frame, nav_area, self.focused_style);

    let border_style = if self.focus == Focus::Fields { self.focused_style } else { Style::default() };
    let block = Block::default().borders(Borders::ALL).border_style(border_style).title(format!(" {} ", self.title));
    let inner = block.inner(table_area);
    let columns = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(2), Constraint::Fill(1)])
      .spacing(1)
      .split(Rect { x: inner.x + 1, width: inner.width.saturating_sub(1), ..inner });

    let rows = self
      .model
      .rows
      .iter()
      .map(|row| {
        let control = row.control.map(|index| &self.model.controls[index]);
        let required = match control.is_some_and(|control| control.required) {
          true => "* ",
          false => "  ",
        };
        let label = Line::from(vec![
          Span::from("  ".repeat(row.depth)),
          Span::styled(required, Style::default().fg(Color::Red)),
          Span::from(row.label.clone()),
        ]);
        let value = row.control.map(|index| self.value_span(index, columns[1].width)).unwrap_or_default();
        let desc = control.map(|control| control.title.clone()).unwrap_or_default();
        Row::new(vec![Cell::from(label), Cell::from(value), Cell::from(Span::from(desc).dim())])
      })
      .collect::<Vec<_>>();

    let table = Table::new(rows, columns.iter().map(|column| column.width).collect::<Vec<_>>())
      .block(block)
      .highlight_symbol(symbols::scrollbar::HORIZONTAL.end)
      .highlight_spacing(HighlightSpacing::Always)
      .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(table, table_area, &mut self.table_state);

    if state.input_mode == InputMode::Insert {
      if let Some((index, row)) = self.editing.and_then(|index| self.model.row_of(index).map(|row| (index, row))) {
        let width = self.input_width(index, columns[1].width);
        let scroll = self.input.visual_scroll(width);
        let x = columns[1].x + (self.input.visual_cursor().max(scroll) - scroll) as u16;
        let y = inner.y + row.saturating_sub(self.table_state.offset()) as u16;
        frame.set_cursor_position((x, y));
      }
    }

    let buttons = Button::iter()
      .enumerate()
      .flat_map(|(index, button)| {
        let style = if self.focus == Focus::Buttons && index == self.button {
          self.focused_style.add_modifier(Modifier::REVERSED)
        } else {
          Style::default()
        };
        [Span::styled(format!("[ {button} ]"), style), Span::raw(" ")]
      })
      .collect::<Vec<_>>();
    frame.render_widget(Line::from(buttons).centered(), button_area);

    if self.dialog.is_open() {
      self.dialog.draw(frame, area, state)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyModifiers;
  use pretty_assertions::assert_eq;
  use serde_json::json;
  use tokio::sync::mpsc::{self, UnboundedReceiver};

  use super::*;
  use crate::{components::form_model::Handlers, rest::RestMethod};

  fn page(fields: serde_json::Value) -> (FormPage, UnboundedReceiver<RestRequest>, State) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let ctx = PageContext {
      origin: "http://localhost:8080".into(),
      handlers: Handlers::builtin(),
      request_tx,
      focused_style: Style::default(),
    };
    let def: FormDef =
      serde_json::from_value(json!({ "name": "wifi", "resource": "/x/y/wifi", "title": "Wifi", "fields": fields }))
        .unwrap();
    let mut page = FormPage::new(&def, &ctx);
    let mut state = State::new("http://localhost:8080");
    page.init(&mut state).unwrap();
    (page, request_rx, state)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn wifi_fields() -> serde_json::Value {
    json!({
      "enabled": { "type": "checkbox", "events": { "change": "enable:ssid" } },
      "ssid": { "type": "text", "required": true },
      "channel": { "type": "number", "min": 1, "max": 13 }
    })
  }

  #[test]
  fn loads_on_init_and_ignores_other_pages() {
    let (mut page, mut request_rx, mut state) = page(wifi_fields());
    assert_eq!(request_rx.try_recv().unwrap().method, RestMethod::Load);

    page.update(Action::Loaded { page: "other".into(), values: json!({ "ssid": "nope" }) }, &mut state).unwrap();
    assert_eq!(page.model.control_named("ssid").unwrap().text(), "");

    page
      .update(Action::Loaded { page: "wifi".into(), values: json!({ "enabled": true, "ssid": "home" }) }, &mut state)
      .unwrap();
    assert_eq!(page.model.control_named("ssid").unwrap().text(), "home");
  }

  #[test]
  fn invalid_form_is_not_sent() {
    let (mut page, mut request_rx, mut state) = page(wifi_fields());
    request_rx.try_recv().unwrap();
    page.update(Action::Loaded { page: "wifi".into(), values: json!({ "enabled": true }) }, &mut state).unwrap();

    let status = page.update(Action::Apply, &mut state).unwrap();
    assert_eq!(status, Some(Action::TimedStatusLine("ssid: please fill out this field".into(), STATUS_SECONDS)));
    assert_eq!(page.table_state.selected(), Some(1));
    assert!(request_rx.try_recv().is_err());
  }

  #[test]
  fn apply_sends_collected_values_and_shows_the_outcome() {
    let (mut page, mut request_rx, mut state) = page(wifi_fields());
    request_rx.try_recv().unwrap();
    page
      .update(
        Action::Loaded { page: "wifi".into(), values: json!({ "enabled": true, "ssid": "home", "channel": 6 }) },
        &mut state,
      )
      .unwrap();

    assert_eq!(page.update(Action::Apply, &mut state).unwrap(), None);
    assert_eq!(
      request_rx.try_recv().unwrap(),
      RestRequest::save("wifi", "/x/y/wifi", json!({ "enabled": true, "ssid": "home", "channel": 6 }))
    );

    page.update(Action::Saved { page: "wifi".into(), message: "values successfully sent".into() }, &mut state).unwrap();
    assert!(page.dialog.is_open());
    let response = page.handle_key_events(key(KeyCode::Char('j')), &mut state).unwrap();
    assert_eq!(response, Some(EventResponse::Stop(Action::Noop)));
    let response = page.handle_key_events(key(KeyCode::Enter), &mut state).unwrap();
    assert_eq!(response, Some(EventResponse::Stop(Action::Popdown)));
    page.update(Action::Popdown, &mut state).unwrap();
    assert!(!page.dialog.is_open());
  }

  #[test]
  fn editing_a_text_field_commits_on_enter() {
    let (mut page, _request_rx, mut state) = page(wifi_fields());
    page.update(Action::Down, &mut state).unwrap();
    page.update(Action::Submit, &mut state).unwrap();
    assert_eq!(state.input_mode, InputMode::Insert);

    for c in "cafe".chars() {
      page.handle_key_events(key(KeyCode::Char(c)), &mut state).unwrap();
    }
    page.handle_key_events(key(KeyCode::Enter), &mut state).unwrap();

    assert_eq!(state.input_mode, InputMode::Normal);
    assert_eq!(page.model.control_named("ssid").unwrap().text(), "cafe");
  }

  #[test]
  fn edits_scroll_within_the_field_size() {
    let (mut page, _request_rx, mut state) =
      page(json!({ "host": { "type": "text", "size": 4, "defval": "gateway.lan" } }));
    assert_eq!(page.value_span(0, 40).content, "gat…");

    page.update(Action::Submit, &mut state).unwrap();
    assert_eq!(page.value_span(0, 40).content, ".lan");
    assert_eq!(page.value_span(0, 2).content, "an");
  }

  #[test]
  fn escape_discards_the_edit() {
    let (mut page, _request_rx, mut state) = page(wifi_fields());
    page.update(Action::Down, &mut state).unwrap();
    page.update(Action::Submit, &mut state).unwrap();
    page.handle_key_events(key(KeyCode::Char('x')), &mut state).unwrap();
    page.handle_key_events(key(KeyCode::Esc), &mut state).unwrap();
    assert_eq!(page.model.control_named("ssid").unwrap().text(), "");
  }

  #[test]
  fn toggling_a_checkbox_fires_its_handler() {
    let (mut page, _request_rx, mut state) = page(wifi_fields());
    page.update(Action::Submit, &mut state).unwrap();
    assert!(!page.model.control_named("ssid").unwrap().disabled);
    page.update(Action::Submit, &mut state).unwrap();
    assert!(page.model.control_named("ssid").unwrap().disabled);

    page.update(Action::Down, &mut state).unwrap();
    page.update(Action::Submit, &mut state).unwrap();
    assert_eq!(state.input_mode, InputMode::Normal);
  }

  #[test]
  fn load_failure_becomes_a_status_line() {
    let (mut page, _request_rx, mut state) = page(wifi_fields());
    let action = page.update(Action::LoadFailed { page: "wifi".into(), reason: "Not Found".into() }, &mut state);
    assert_eq!(
      action.unwrap(),
      Some(Action::TimedStatusLine("failed to load /x/y/wifi: Not Found".into(), STATUS_SECONDS))
    );
  }

  #[test]
  fn buttons_map_to_form_actions() {
    let (mut page, mut request_rx, mut state) = page(wifi_fields());
    request_rx.try_recv().unwrap();
    page.update(Action::FocusNext, &mut state).unwrap();
    page.update(Action::Right, &mut state).unwrap();
    assert_eq!(page.update(Action::Submit, &mut state).unwrap(), Some(Action::Reload));

    page.update(Action::Reload, &mut state).unwrap();
    assert_eq!(request_rx.try_recv().unwrap(), RestRequest::load("wifi", "/x/y/wifi"));
  }
}
