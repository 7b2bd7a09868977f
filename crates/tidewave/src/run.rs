use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chat::{ChatClient, ChatSettings, HttpTransport};
use renderer::{run_window, Size, WaveConfig, WindowOptions};
use siteconfig::{FallbackParseError, SiteConfig, WaveSection};
use tracing_subscriber::EnvFilter;

use crate::chat::{run_repl, ChatWidget};
use crate::cli::{ChatArgs, RunArgs};
use crate::paths::{load_site_config, AppPaths};

const DEFAULT_WINDOW_SIZE: Size = Size::new(1280, 720);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolves the config file from `--config` or the config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(AppPaths::discover()?.site_config_file()),
    }
}

pub fn run(config_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let site = load_site_config(&path)?;
    tracing::debug!(config = %path.display(), "resolved tidewave config");

    let options = WindowOptions {
        title: "Tidewave".to_string(),
        size: args.size.unwrap_or(DEFAULT_WINDOW_SIZE),
        reduced_motion: args.reduced_motion,
        wave: wave_config(&site.wave).context("invalid wave.fallback_gradient")?,
    };
    tracing::info!(
        width = options.size.width,
        height = options.size.height,
        reduced_motion = options.reduced_motion,
        "starting wave background"
    );
    run_window(options)
}

pub fn run_chat(config_path: Option<PathBuf>, args: ChatArgs) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let site = load_site_config(&path)?;
    if site.api.retries > 0 {
        tracing::debug!(
            retries = site.api.retries,
            "api.retries is configured but chat requests are never retried"
        );
    }

    let transport =
        HttpTransport::new(site.api.timeout).context("failed to build HTTP transport")?;
    let client = ChatClient::new(transport, chat_settings(&site, args.api_key.as_deref()));
    let mut widget = ChatWidget::new(
        client,
        site.chat.messages.clone(),
        site.chat.security.max_message_length,
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_repl(&mut widget, stdin.lock(), &mut stdout).context("chat session I/O failed")
}

pub fn wave_config(section: &WaveSection) -> Result<WaveConfig, FallbackParseError> {
    Ok(WaveConfig {
        enabled: section.enabled,
        fallback: section.fallback_style()?,
        mouse_influence: section.mouse_influence,
        enable_touch: section.enable_touch,
        respect_reduced_motion: section.respect_reduced_motion,
        ..WaveConfig::default()
    })
}

/// Live settings from the config file, with a CLI/env key taking precedence.
pub fn chat_settings(site: &SiteConfig, api_key: Option<&str>) -> ChatSettings {
    let credential = api_key
        .and_then(siteconfig::usable_key)
        .or_else(|| site.api.usable_api_key())
        .map(str::to_string);
    ChatSettings {
        endpoint: site.api.url.clone(),
        model: site.api.model.clone(),
        credential,
        max_tokens: site.api.max_tokens,
        temperature: site.api.temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_key_means_demo_mode() {
        let site = SiteConfig::default();
        let settings = chat_settings(&site, None);
        assert_eq!(settings.credential, None);
        assert!(!settings.is_live());
    }

    #[test]
    fn cli_key_overrides_file() {
        let mut site = SiteConfig::default();
        site.api.api_key = Some("sk-file".into());
        assert_eq!(
            chat_settings(&site, Some("sk-cli")).credential.as_deref(),
            Some("sk-cli")
        );
        assert_eq!(
            chat_settings(&site, Some("  ")).credential.as_deref(),
            Some("sk-file")
        );
    }

    #[test]
    fn wave_section_maps_onto_renderer_config() {
        let section = WaveSection {
            enabled: false,
            fallback_gradient: "linear-gradient(#000000, #ffffff)".into(),
            mouse_influence: 0.25,
            enable_touch: false,
            respect_reduced_motion: false,
        };
        let config = wave_config(&section).unwrap();
        assert!(!config.enabled);
        assert!(!config.enable_touch);
        assert_eq!(config.mouse_influence, 0.25);
        assert_eq!(config.fallback.stops.len(), 2);
        assert_eq!(config.fallback.angle_degrees, 180.0);
    }

    #[test]
    fn unparsable_gradient_is_a_config_error() {
        let section = WaveSection {
            fallback_gradient: "linear-gradient(nonsense)".into(),
            ..WaveSection::default()
        };
        assert!(matches!(
            wave_config(&section),
            Err(FallbackParseError::InvalidColor(_))
        ));

        let err = SiteConfig::from_toml_str(
            "[wave]\nfallback_gradient = \"linear-gradient(nonsense)\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("wave.fallback_gradient"));
    }
}
