pub mod action;
pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod page_def;
pub mod page_store;
pub mod pages;
pub mod panes;
pub mod response;
pub mod rest;
pub mod state;
pub mod tui;
pub mod utils;
pub mod values;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::Result;

use crate::{
  app::App,
  utils::{initialize_logging, initialize_panic_handler},
};

async fn tokio_main() -> Result<()> {
  initialize_logging()?;

  initialize_panic_handler()?;

  let args = Cli::parse();
  let mut app = App::new(args)?;
  app.run().await?;

  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  if let Err(e) = tokio_main().await {
    eprintln!("{} error: Something went wrong", env!("CARGO_PKG_NAME"));
    Err(e)
  } else {
    Ok(())
  }
}
