use ratatui::{prelude::*, widgets::*};

use crate::{action::Action, tui::Frame};

const BACK: &str = "‹";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavButton {
  pub separator: &'static str,
  pub label: String,
  pub url: String,
  pub enabled: bool,
}

/// Breadcrumb bar for a resource path such as `/x/net/wifi`.
///
/// The first two segments of the path are not shown; the bar starts with a
/// `confs` root button and ends with the current, disabled, location.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
  buttons: Vec<NavButton>,
  back_url: String,
  selected: usize,
  focused: bool,
}

impl Navigator {
  pub fn new(origin: &str, resource: &str) -> Self {
    let url_base = format!("{}/confs", origin.trim_end_matches('/'));
    let segments = resource.split('/').collect::<Vec<_>>();

    let mut buttons =
      vec![NavButton { separator: "/ ", label: "confs".into(), url: url_base.clone(), enabled: segments.len() >= 3 }];
    for i in 2..segments.len() {
      buttons.push(NavButton {
        separator: " / ",
        label: segments[i].to_string(),
        url: format!("{url_base}/{}", segments[2..=i].join("/")),
        enabled: i != segments.len() - 1,
      });
    }

    let parent = if segments.len() > 3 { segments[2..segments.len() - 1].join("/") } else { String::new() };
    let back_url = format!("{url_base}/{parent}");
    let selected = buttons.len().saturating_sub(1);

    Self { buttons, back_url, selected, focused: false }
  }

  pub fn buttons(&self) -> &[NavButton] {
    &self.buttons
  }

  pub fn back_url(&self) -> &str {
    &self.back_url
  }

  pub fn focus(&mut self) {
    self.focused = true;
  }

  pub fn unfocus(&mut self) {
    self.focused = false;
  }

  pub fn left(&mut self) {
    self.selected = self.selected.saturating_sub(1);
  }

  pub fn right(&mut self) {
    self.selected = self.selected.saturating_add(1).min(self.buttons.len().saturating_sub(1));
  }

  pub fn activate(&self) -> Option<Action> {
    self.buttons.get(self.selected).filter(|button| button.enabled).map(|button| Action::Navigate(button.url.clone()))
  }

  pub fn back(&self) -> Action {
    Action::Navigate(self.back_url().to_string())
  }

  pub fn draw(&self, frame: &mut Frame<'_>, area: Rect, focused_style: Style) {
    let mut spans = vec![Span::styled(format!("{BACK} "), Style::default().fg(Color::LightCyan)), Span::raw(" ")];
    for (index, button) in self.buttons().iter().enumerate() {
      spans.push(Span::styled(button.separator, Style::default().dim()));
      let style = match (button.enabled, self.focused && index == self.selected) {
        (_, true) => focused_style.add_modifier(Modifier::BOLD | Modifier::REVERSED),
        (true, false) => Style::default().fg(Color::Cyan),
        (false, false) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
      };
      spans.push(Span::styled(button.label.clone(), style));
    }

    let border_style = if self.focused { focused_style } else { Style::default() };
    frame.render_widget(
      Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM).border_style(border_style)),
      area,
    );
  }
}
