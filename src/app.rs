use color_eyre::eyre::{eyre, Result};
use crossterm::event::KeyEvent;
use ratatui::{
  layout::{Constraint, Layout},
  prelude::Rect,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{
  action::Action,
  cli::Cli,
  components::form_model::Handlers,
  config::{key_event_to_string, Config},
  page_store::PageStore,
  pages::{build_page, Page, PageContext},
  panes::{footer::FooterPane, header::HeaderPane, Pane},
  rest::{RestClient, RestRequest},
  state::{InputMode, State},
  tui,
};

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
  #[default]
  Browse,
}

pub struct App {
  pub config: Config,
  pub page: Box<dyn Page>,
  pub footer: FooterPane,
  pub header: HeaderPane,
  pub store: PageStore,
  pub rest: RestClient,
  pub ctx: PageContext,
  pub should_quit: bool,
  pub should_suspend: bool,
  pub mode: Mode,
  pub last_tick_key_events: Vec<KeyEvent>,
  pub state: State,
  pub tick_rate: f64,
  pub frame_rate: f64,
  request_rx: Option<UnboundedReceiver<RestRequest>>,
}

impl App {
  pub fn new(args: Cli) -> Result<Self> {
    let config = Config::new()?;
    let mode = Mode::Browse;

    let origin = args.origin.unwrap_or_else(|| config.config.origin.clone());
    let pages_dir = args.pages_dir.unwrap_or_else(|| config.config.pages_dir.clone());
    let rest_port = args.rest_port.unwrap_or(config.config.rest_port);
    let rest = RestClient::new(&origin, rest_port)?;
    let store = PageStore::new(pages_dir, &origin);
    let state = State::new(&origin);
    log::info!("serving pages from {} against {}", store.pages_dir().display(), rest.url(""));

    let (request_tx, request_rx) = mpsc::unbounded_channel::<RestRequest>();
    let ctx = PageContext {
      origin: state.origin.clone(),
      handlers: Handlers::builtin(),
      request_tx,
      focused_style: config.style(mode, "focused"),
    };

    let url = args.page.unwrap_or_else(|| state.root_url());
    let page = build_page(store.load(&url), &ctx);

    Ok(Self {
      page,
      footer: FooterPane::new(),
      header: HeaderPane::new(config.style(mode, "title"), config.style(mode, "resource")),
      store,
      rest,
      ctx,
      should_quit: false,
      should_suspend: false,
      config,
      mode,
      last_tick_key_events: Vec::new(),
      state,
      tick_rate: args.tick_rate,
      frame_rate: args.frame_rate,
      request_rx: Some(request_rx),
    })
  }

  /// Replaces the active page with the one `url` resolves to.
  fn navigate(&mut self, url: &str) -> Result<()> {
    let definition = self.store.load(url);
    if let Ok(def) = &definition {
      log::info!("navigating to {url}: {:?} page '{}' over {}", def.kind(), def.title(), def.resource());
    }
    self.page = build_page(definition, &self.ctx);
    self.page.init(&mut self.state)
  }

  fn key_hints(&self) -> String {
    let Some(keymap) = self.config.keybindings.get(&self.mode) else { return String::new() };
    let hints = [
      (Action::FocusNext, "focus"),
      (Action::Apply, "apply"),
      (Action::Reload, "reload"),
      (Action::Back, "back"),
      (Action::Quit, "quit"),
    ];
    hints
      .iter()
      .filter_map(|(action, label)| {
        let mut keys = keymap
          .iter()
          .filter(|(_, bound)| *bound == action)
          .map(|(keys, _)| keys.iter().map(key_event_to_string).collect::<Vec<_>>().join(" "))
          .collect::<Vec<_>>();
        keys.sort();
        keys.first().map(|key| format!("{key} {label}"))
      })
      .collect::<Vec<_>>()
      .join(" · ")
  }

  pub async fn run(&mut self) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut request_rx = self.request_rx.take().ok_or_else(|| eyre!("application is already running"))?;

    let mut tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
    tui.enter()?;

    self.page.init(&mut self.state)?;
    action_tx.send(Action::StatusLine(self.key_hints()))?;

    loop {
      if let Some(e) = tui.next().await {
        let stop_event_propagation = match self.page.handle_events(e.clone(), &mut self.state) {
          Ok(Some(tui::EventResponse::Stop(action))) => {
            action_tx.send(action)?;
            true
          },
          Ok(Some(tui::EventResponse::Continue(action))) => {
            action_tx.send(action)?;
            false
          },
          Ok(None) => false,
          Err(err) => {
            action_tx.send(Action::Error(format!("{err:?}")))?;
            false
          },
        };

        if !stop_event_propagation {
          match e {
            tui::Event::Error => log::warn!("failed to read a terminal event"),
            tui::Event::Tick => action_tx.send(Action::Tick)?,
            tui::Event::Render => action_tx.send(Action::Render)?,
            tui::Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
            tui::Event::Key(key) => {
              if let Some(keymap) = self.config.keybindings.get(&self.mode) {
                if let Some(action) = keymap.get(&vec![key]) {
                  action_tx.send(action.clone())?;
                } else {
                  // If the key was not handled as a single key action,
                  // then consider it for multi-key combinations.
                  self.last_tick_key_events.push(key);

                  // Check for multi-key combinations
                  if let Some(action) = keymap.get(&self.last_tick_key_events) {
                    action_tx.send(action.clone())?;
                  }
                }
              };
            },
            _ => {},
          }
        }
      }

      while let Ok(action) = action_rx.try_recv() {
        if action != Action::Tick && action != Action::Render {
          log::debug!("{action:?}");
        }
        match action {
          Action::Tick => {
            self.last_tick_key_events.drain(..);
          },
          Action::Quit if self.state.input_mode == InputMode::Normal => self.should_quit = true,
          Action::Suspend => self.should_suspend = true,
          Action::Resume => self.should_suspend = false,
          Action::Resize(w, h) => {
            tui.resize(Rect::new(0, 0, w, h))?;
            tui.draw(|f| {
              self.draw(f).unwrap_or_else(|err| {
                action_tx.send(Action::Error(format!("Failed to draw: {:?}", err))).ok();
              })
            })?;
          },
          Action::Render => {
            tui.draw(|f| {
              self.draw(f).unwrap_or_else(|err| {
                action_tx.send(Action::Error(format!("Failed to draw: {:?}", err))).ok();
              })
            })?;
          },
          Action::Navigate(ref url) => self.navigate(url)?,
          Action::Error(ref message) => log::error!("{message}"),
          _ => {},
        }

        if let Some(action) = self.page.update(action.clone(), &mut self.state)? {
          action_tx.send(action)?
        };
        if let Some(action) = self.header.update(action.clone(), &mut self.state)? {
          action_tx.send(action)?
        };
        if let Some(action) = self.footer.update(action.clone(), &mut self.state)? {
          action_tx.send(action)?
        };
      }

      while let Ok(request) = request_rx.try_recv() {
        let rest = self.rest.clone();
        let action_tx = action_tx.clone();
        tokio::spawn(async move {
          action_tx.send(rest.execute(request).await).ok();
        });
      }

      if self.should_suspend {
        tui.suspend()?;
        action_tx.send(Action::Resume)?;
        tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
        tui.enter()?;
      } else if self.should_quit {
        tui.stop()?;
        break;
      }
    }
    tui.exit()?;
    Ok(())
  }

  fn draw(&mut self, frame: &mut tui::Frame<'_>) -> Result<()> {
    let [header, page, footer] = Layout::vertical([
      self.header.height_constraint(),
      Constraint::Fill(1),
      self.footer.height_constraint(),
    ])
    .areas(frame.area());

    self.header.draw(frame, header, &self.state)?;
    self.page.draw(frame, page, &self.state)?;
    self.footer.draw(frame, footer, &self.state)?;
    Ok(())
  }
}
