mod chat;
mod cli;
mod paths;
mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use cli::{Command, ConfigAction};
use siteconfig::SiteConfig;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Chat(args)) => run::run_chat(cli.config, args),
        Some(Command::Config(config_cmd)) => match config_cmd.action {
            ConfigAction::Where => run_config_where(cli.config),
        },
        None => run::run(cli.config, cli.run),
    }
}

fn run_config_where(explicit: Option<PathBuf>) -> Result<()> {
    let path = run::resolve_config_path(explicit)?;
    let site = paths::load_site_config(&path)?;
    print_config(&path, &site.redacted());
    Ok(())
}

fn print_config(path: &Path, site: &SiteConfig) {
    let status = if path.exists() { "found" } else { "missing, defaults in use" };
    println!("Site config: {} ({status})", path.display());
    println!("API:");
    println!("  url:          {}", site.api.url);
    println!("  model:        {}", site.api.model);
    println!(
        "  api_key:      {}",
        site.api.api_key.as_deref().unwrap_or("(none)")
    );
    println!(
        "  mode:         {}",
        if site.api.usable_api_key().is_some() {
            "live"
        } else {
            "demo"
        }
    );
    println!("  max_tokens:   {}", site.api.max_tokens);
    println!("  temperature:  {}", site.api.temperature);
    println!("  timeout:      {:?}", site.api.timeout);
    println!("Chat:");
    println!(
        "  max_message_length: {}",
        site.chat.security.max_message_length
    );
    println!("Wave:");
    println!("  enabled:                {}", site.wave.enabled);
    println!("  fallback_gradient:      {}", site.wave.fallback_gradient);
    println!("  mouse_influence:        {}", site.wave.mouse_influence);
    println!("  enable_touch:           {}", site.wave.enable_touch);
    println!("  respect_reduced_motion: {}", site.wave.respect_reduced_motion);
}
