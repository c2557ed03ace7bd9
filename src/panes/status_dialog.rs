use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};

use crate::{
  action::Action,
  panes::Pane,
  state::State,
  tui::{EventResponse, Frame},
};

/// Modal message box shown after a save; `OK` dismisses it.
#[derive(Debug, Default)]
pub struct StatusDialog {
  message: Option<String>,
  focused_style: Style,
}

impl StatusDialog {
  pub fn new(focused_style: Style) -> Self {
    Self { message: None, focused_style }
  }

  pub fn popup(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  pub fn popdown(&mut self) {
    self.message = None;
  }

  pub fn is_open(&self) -> bool {
    self.message.is_some()
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  /// Centered rectangle the dialog occupies inside `area`.
  pub fn area(&self, area: Rect) -> Rect {
    let [_, middle, _] =
      Layout::vertical([Constraint::Fill(1), self.height_constraint(), Constraint::Fill(1)]).areas(area);
    let [_, center, _] =
      Layout::horizontal([Constraint::Fill(1), Constraint::Fill(2), Constraint::Fill(1)]).areas(middle);
    center
  }
}

impl Pane for StatusDialog {
  fn height_constraint(&self) -> Constraint {
    Constraint::Length(5)
  }

  fn handle_key_events(&mut self, key: KeyEvent, _state: &mut State) -> Result<Option<EventResponse<Action>>> {
    if !self.is_open() {
      return Ok(None);
    }
    let response = match key.code {
      KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('o') | KeyCode::Char('O') => {
        EventResponse::Stop(Action::Popdown)
      },
      _ => EventResponse::Stop(Action::Noop),
    };
    Ok(Some(response))
  }

  fn update(&mut self, action: Action, _state: &mut State) -> Result<Option<Action>> {
    if action == Action::Popdown {
      self.popdown();
    }
    Ok(None)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, _state: &State) -> Result<()> {
    let Some(message) = self.message().map(str::to_string) else { return Ok(()) };
    let area = self.area(area);
    frame.render_widget(Clear, area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_type(BorderType::Rounded)
      .border_style(self.focused_style)
      .title(Line::from(" Status ").centered());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [text, button] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    frame.render_widget(Paragraph::new(message.as_str()).wrap(Wrap { trim: true }).centered(), text);
    frame.render_widget(
      Line::from(Span::styled("[ OK ]", self.focused_style.add_modifier(Modifier::REVERSED))).centered(),
      button,
    );
    Ok(())
  }
}
