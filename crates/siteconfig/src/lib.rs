mod gradient;

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub use gradient::{ColorStop, FallbackParseError, FallbackStyle, DEFAULT_FALLBACK_GRADIENT};

/// Placeholder shipped in the sample configuration; treated as "no key".
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Trims `raw` and returns it if it can authenticate a live request.
///
/// Blank keys and [`API_KEY_PLACEHOLDER`] are not usable.
pub fn usable_key(raw: &str) -> Option<&str> {
    let key = raw.trim();
    (!key.is_empty() && key != API_KEY_PLACEHOLDER).then_some(key)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub wave: WaveSection,
}

/// Remote completion endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4-turbo".into(),
            api_key: Some(API_KEY_PLACEHOLDER.into()),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: default_timeout(),
            retries: 2,
        }
    }
}

impl ApiConfig {
    /// Returns the key only when it is usable for a live request.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().and_then(usable_key)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    pub messages: ChatMessages,
    pub security: ChatSecurity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatMessages {
    pub welcome: String,
    pub placeholder: String,
    pub error: String,
    pub typing: String,
}

impl Default for ChatMessages {
    fn default() -> Self {
        Self {
            welcome: "Hallo! Ich bin Ihr KI-Assistent. Wie kann ich Ihnen heute helfen?".into(),
            placeholder: "Nachricht eingeben...".into(),
            error: "Entschuldigung, es ist ein Fehler aufgetreten. Bitte versuchen Sie es später erneut."
                .into(),
            typing: "KI tippt...".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatSecurity {
    pub max_message_length: usize,
}

impl Default for ChatSecurity {
    fn default() -> Self {
        Self {
            max_message_length: 1000,
        }
    }
}

/// Animated background settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WaveSection {
    pub enabled: bool,
    pub fallback_gradient: String,
    pub mouse_influence: f32,
    pub enable_touch: bool,
    pub respect_reduced_motion: bool,
}

impl Default for WaveSection {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_gradient: DEFAULT_FALLBACK_GRADIENT.into(),
            mouse_influence: 1.0,
            enable_touch: true,
            respect_reduced_motion: true,
        }
    }
}

impl WaveSection {
    pub fn fallback_style(&self) -> Result<FallbackStyle, FallbackParseError> {
        self.fallback_gradient.parse()
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            api: ApiConfig::default(),
            chat: ChatConfig::default(),
            wave: WaveSection::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl SiteConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SiteConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.api.url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.url must not be empty".into()));
        }

        if self.api.model.trim().is_empty() {
            return Err(ConfigError::Invalid("api.model must not be empty".into()));
        }

        if self.api.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "api.max_tokens must be greater than zero".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.api.temperature) {
            return Err(ConfigError::Invalid(format!(
                "api.temperature must be within 0.0-2.0 (got {})",
                self.api.temperature
            )));
        }

        if self.chat.security.max_message_length == 0 {
            return Err(ConfigError::Invalid(
                "chat.security.max_message_length must be greater than zero".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.wave.mouse_influence) {
            return Err(ConfigError::Invalid(format!(
                "wave.mouse_influence must be within 0.0-1.0 (got {})",
                self.wave.mouse_influence
            )));
        }

        if let Err(err) = self.wave.fallback_style() {
            return Err(ConfigError::Invalid(format!(
                "wave.fallback_gradient is not a usable gradient: {err}"
            )));
        }

        Ok(())
    }

    /// Copy of the configuration with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.api.api_key.as_mut() {
            if self.api.usable_api_key().is_some() {
                *key = "********".into();
            }
        }
        copy
    }
}
