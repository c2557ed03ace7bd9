use color_eyre::eyre::Result;
use ratatui::{prelude::*, widgets::*};

use crate::{
  pages::Page,
  state::{InputMode, State},
  tui::Frame,
};

/// Text-only page shown when a page cannot be resolved or is incomplete.
pub struct FallbackPage {
  message: String,
}

impl FallbackPage {
  pub fn new(message: String) -> Self {
    Self { message }
  }
}

impl Page for FallbackPage {
  fn init(&mut self, state: &mut State) -> Result<()> {
    state.page_title.clear();
    state.resource.clear();
    state.input_mode = InputMode::Normal;
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, _state: &State) -> Result<()> {
    frame.render_widget(
      Paragraph::new(self.message.as_str())
        .style(Style::default().fg(Color::LightRed))
        .wrap(Wrap { trim: false })
        .block(Block::new().borders(Borders::ALL)),
      area,
    );
    Ok(())
  }
}
