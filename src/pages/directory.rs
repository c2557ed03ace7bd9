use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};

use crate::{
  action::Action,
  components::navigator::Navigator,
  page_def::DirectoryDef,
  pages::{Page, PageContext},
  state::{InputMode, State},
  tui::{EventResponse, Frame},
};

const LAUNCHER: &str = "›";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow {
  pub label: String,
  pub url: String,
}

/// One row per entry, sorted by name, each pointing below the current resource.
pub fn render_directory(origin: &str, def: &DirectoryDef) -> Vec<DirectoryRow> {
  let mut entries = def.entries.clone();
  entries.sort_by(|a, b| a.name.cmp(&b.name));

  let base = def.resource.split('/').skip(2).collect::<Vec<_>>().join("/");
  let origin = origin.trim_end_matches('/');
  entries
    .into_iter()
    .map(|entry| DirectoryRow { label: entry.desc, url: format!("{origin}/confs/{base}/{}", entry.name) })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  Navigator,
  Entries,
}

pub struct DirectoryPage {
  title: String,
  resource: String,
  navigator: Navigator,
  rows: Vec<DirectoryRow>,
  table_state: TableState,
  focus: Focus,
  focused_style: Style,
}

impl DirectoryPage {
  pub fn new(def: &DirectoryDef, ctx: &PageContext) -> Self {
    let rows = render_directory(&ctx.origin, def);
    let table_state = TableState::default().with_selected((!rows.is_empty()).then_some(0));
    Self {
      title: def.title.clone(),
      resource: def.resource.clone(),
      navigator: Navigator::new(&ctx.origin, &def.resource),
      rows,
      table_state,
      focus: Focus::Entries,
      focused_style: ctx.focused_style,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Focus::Navigator => {
        self.navigator.unfocus();
        Focus::Entries
      },
      Focus::Entries => {
        self.navigator.focus();
        Focus::Navigator
      },
    };
  }

  fn activate(&self) -> Option<Action> {
    match self.focus {
      Focus::Navigator => self.navigator.activate(),
      Focus::Entries => {
        self.table_state.selected().and_then(|i| self.rows.get(i)).map(|row| Action::Navigate(row.url.clone()))
      },
    }
  }
}

impl Page for DirectoryPage {
  fn init(&mut self, state: &mut State) -> Result<()> {
    state.page_title = self.title.clone();
    state.resource = self.resource.clone();
    state.input_mode = InputMode::Normal;
    Ok(())
  }

  fn handle_key_events(&mut self, key: KeyEvent, _state: &mut State) -> Result<Option<EventResponse<Action>>> {
    let response = match key.code {
      KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => EventResponse::Stop(Action::Down),
      KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => EventResponse::Stop(Action::Up),
      KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => EventResponse::Stop(Action::Left),
      KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => EventResponse::Stop(Action::Right),
      KeyCode::Enter => EventResponse::Stop(Action::Submit),
      KeyCode::Esc => EventResponse::Stop(Action::Back),
      _ => return Ok(None),
    };
    Ok(Some(response))
  }

  fn update(&mut self, action: Action, _state: &mut State) -> Result<Option<Action>> {
    match action {
      Action::FocusNext | Action::FocusPrev => self.toggle_focus(),
      Action::Down if self.focus == Focus::Entries && !self.rows.is_empty() => {
        let i = self.table_state.selected().map_or(0, |i| if i + 1 >= self.rows.len() { 0 } else { i + 1 });
        self.table_state.select(Some(i));
      },
      Action::Up if self.focus == Focus::Entries && !self.rows.is_empty() => {
        let i = self.table_state.selected().map_or(0, |i| if i == 0 { self.rows.len() - 1 } else { i - 1 });
        self.table_state.select(Some(i));
      },
      Action::Left if self.focus == Focus::Navigator => self.navigator.left(),
      Action::Right if self.focus == Focus::Navigator => self.navigator.right(),
      Action::Submit => return Ok(self.activate()),
      Action::Back => return Ok(Some(self.navigator.back())),
      _ => {},
    }
    Ok(None)
  }

  fn draw(&mut self, frame: &mut Frame<'_>, area: Rect, _state: &State) -> Result<()> {
    let [nav_area, table_area] = Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
    self.navigator.draw(frame, nav_area, self.focused_style);

    let rows = self.rows.iter().map(|row| {
      Row::new(vec![
        Cell::from(row.label.clone()),
        Cell::from(Span::styled(LAUNCHER, Style::default().fg(Color::LightCyan))),
      ])
    });
    let border_style = if self.focus == Focus::Entries { self.focused_style } else { Style::default() };
    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(2)])
      .block(Block::default().borders(Borders::ALL).border_style(border_style).title(format!(" {} ", self.title)))
      .highlight_symbol(symbols::scrollbar::HORIZONTAL.end)
      .highlight_spacing(HighlightSpacing::Always)
      .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(table, table_area, &mut self.table_state);
    Ok(())
  }
}
