use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Rect};

use crate::{
  action::Action,
  state::State,
  tui::{EventResponse, Frame},
};

pub mod footer;
pub mod header;
pub mod status_dialog;

/// Chrome drawn around or over a page: the header, the footer and dialogs.
///
/// Panes only see keys their owner forwards to them.
pub trait Pane {
  /// Height the pane wants from the layout it is placed in.
  fn height_constraint(&self) -> Constraint;

  fn handle_key_events(&mut self, _key: KeyEvent, _state: &mut State) -> Result<Option<EventResponse<Action>>> {
    Ok(None)
  }

  fn update(&mut self, _action: Action, _state: &mut State) -> Result<Option<Action>> {
    Ok(None)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, state: &State) -> Result<()>;
}
