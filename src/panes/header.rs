use color_eyre::eyre::Result;
use ratatui::prelude::*;

use crate::{panes::Pane, state::State, tui::Frame};

#[derive(Default)]
pub struct HeaderPane {
  title_style: Style,
  resource_style: Style,
}

impl HeaderPane {
  pub fn new(title_style: Style, resource_style: Style) -> Self {
    Self { title_style, resource_style }
  }
}

impl Pane for HeaderPane {
  fn height_constraint(&self) -> Constraint {
    Constraint::Max(1)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, state: &State) -> Result<()> {
    frame.render_widget(
      Line::from(vec![Span::styled(format!(" {} ", env!("CARGO_PKG_NAME")), Style::default().bold())]),
      area,
    );
    if state.page_title.is_empty() {
      return Ok(());
    }
    frame.render_widget(
      Line::from(vec![
        Span::styled(format!("[ {} {} ", state.page_title, symbols::DOT), self.title_style),
        Span::styled(format!("{} ", state.resource), self.resource_style),
        Span::styled("]", self.title_style),
      ])
      .right_aligned(),
      area,
    );

    Ok(())
  }
}
