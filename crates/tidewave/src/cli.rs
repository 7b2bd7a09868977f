use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::Size;

#[derive(Parser, Debug)]
#[command(
    name = "tidewave",
    author,
    version,
    about = "Animated wave background and site chat assistant",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Site configuration file (defaults to `site.toml` in the config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Treat the desktop as preferring reduced motion (shows the static fallback).
    #[arg(long)]
    pub reduced_motion: bool,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<Size>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Talk to the site assistant on the terminal.
    Chat(ChatArgs),
    /// Inspect the resolved configuration.
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// API key for the completion endpoint; overrides `api.api_key`.
    #[arg(long, env = "TIDEWAVE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config path and the effective settings.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("window size must be non-zero".into());
    }
    Ok(Size::new(width, height))
}
