use std::path::PathBuf;

use clap::Parser;

use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
  #[arg(short, long, value_name = "URL", help = "Page to open, as a full page URL or a /confs/... path")]
  pub page: Option<String>,

  #[arg(short, long, value_name = "URL", help = "Origin the page URLs are served from")]
  pub origin: Option<String>,

  #[arg(short = 'd', long, value_name = "DIR", help = "Directory holding the page definition files")]
  pub pages_dir: Option<PathBuf>,

  #[arg(short, long, value_name = "PORT", help = "Port of the REST configuration service")]
  pub rest_port: Option<u16>,

  #[arg(
    short,
    long,
    value_name = "FLOAT",
    help = "Tick rate, i.e. number of ticks per second",
    default_value_t = 4.0,
    value_parser = parse_rate
  )]
  pub tick_rate: f64,

  #[arg(
    short,
    long,
    value_name = "FLOAT",
    help = "Frame rate, i.e. number of frames per second",
    default_value_t = 30.0,
    value_parser = parse_rate
  )]
  pub frame_rate: f64,
}

/// Rates are per second and become timer periods, so they must be finite and positive.
fn parse_rate(raw: &str) -> Result<f64, String> {
  let rate = raw.parse::<f64>().map_err(|err| err.to_string())?;
  if rate.is_finite() && rate > 0.0 {
    Ok(rate)
  } else {
    Err(format!("{raw} is not a positive rate"))
  }
}
