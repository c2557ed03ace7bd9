use std::time::Instant;

use color_eyre::eyre::Result;
use ratatui::prelude::*;

use crate::{
  action::Action,
  panes::Pane,
  state::{InputMode, State},
  tui::Frame,
};

struct TimedStatusLine {
  created: Instant,
  show_time: u64,
  status_line: String,
}

#[derive(Default)]
pub struct FooterPane {
  status_line: String,
  timed_status_line: Option<TimedStatusLine>,
}

impl FooterPane {
  pub fn new() -> Self {
    Self { status_line: String::default(), timed_status_line: None }
  }

  fn get_status_line(&mut self) -> &str {
    if self.timed_status_line.as_ref().is_some_and(|tsl| tsl.created.elapsed().as_secs() >= tsl.show_time) {
      self.timed_status_line = None;
    }
    self.timed_status_line.as_ref().map_or(&self.status_line, |tsl| &tsl.status_line)
  }
}

impl Pane for FooterPane {
  fn height_constraint(&self) -> Constraint {
    Constraint::Max(1)
  }

  fn update(&mut self, action: Action, _state: &mut State) -> Result<Option<Action>> {
    match action {
      Action::StatusLine(status_line) => {
        self.status_line = status_line;
      },
      Action::TimedStatusLine(status_line, show_time) => {
        self.timed_status_line = Some(TimedStatusLine { status_line, show_time, created: Instant::now() });
      },
      Action::Navigate(_) => {
        self.timed_status_line = None;
      },
      _ => {},
    }
    Ok(None)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, state: &State) -> Result<()> {
    frame.render_widget(
      Line::from(vec![Span::styled(self.get_status_line().to_string(), Style::default())])
        .style(Style::default().fg(Color::DarkGray)),
      area,
    );
    frame.render_widget(
      Line::from(vec![match state.input_mode {
        InputMode::Normal => Span::from("[N]"),
        InputMode::Insert => Span::from("[I]"),
      }])
      .right_aligned(),
      area,
    );

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn timed_status_line_shadows_until_it_expires() {
    let mut footer = FooterPane::new();
    let mut state = State::default();
    footer.update(Action::StatusLine("ready".into()), &mut state).unwrap();
    footer.update(Action::TimedStatusLine("saved".into(), 60), &mut state).unwrap();
    assert_eq!(footer.get_status_line(), "saved");

    footer.update(Action::TimedStatusLine("gone".into(), 0), &mut state).unwrap();
    assert_eq!(footer.get_status_line(), "ready");
  }

  #[test]
  fn navigation_clears_the_timed_status() {
    let mut footer = FooterPane::new();
    let mut state = State::default();
    footer.update(Action::TimedStatusLine("failed to load".into(), 60), &mut state).unwrap();
    footer.update(Action::Navigate("http://localhost:8080/confs".into()), &mut state).unwrap();
    assert_eq!(footer.get_status_line(), "");
  }
}
