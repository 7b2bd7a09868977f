//! Static visual used when animation is unavailable or unwanted.
//!
//! The site expresses the fallback as a CSS `linear-gradient(...)` value; we
//! parse the subset it uses (an optional `deg` angle plus hex colour stops with
//! optional percentages).

use std::str::FromStr;

pub const DEFAULT_FALLBACK_GRADIENT: &str =
    "linear-gradient(135deg, #0a0d2e 0%, #1a1f4e 50%, #2a2f5e 100%)";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FallbackParseError {
    #[error("expected linear-gradient(...), got '{0}'")]
    NotAGradient(String),
    #[error("gradient needs at least two colour stops")]
    TooFewStops,
    #[error("invalid colour '{0}'; expected #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("invalid stop position '{0}'")]
    InvalidPosition(String),
    #[error("invalid angle '{0}'")]
    InvalidAngle(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Linear 0.0-1.0 RGB as written (no gamma conversion).
    pub color: [f32; 3],
    /// Offset along the gradient line, 0.0-1.0.
    pub position: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackStyle {
    pub angle_degrees: f32,
    pub stops: Vec<ColorStop>,
}

impl Default for FallbackStyle {
    fn default() -> Self {
        DEFAULT_FALLBACK_GRADIENT
            .parse()
            .unwrap_or_else(|_| FallbackStyle {
                angle_degrees: 135.0,
                stops: vec![
                    ColorStop {
                        color: [0.04, 0.05, 0.18],
                        position: 0.0,
                    },
                    ColorStop {
                        color: [0.16, 0.18, 0.37],
                        position: 1.0,
                    },
                ],
            })
    }
}

impl FallbackStyle {
    /// Interpolated colour at `t` along the gradient line.
    pub fn color_at(&self, t: f32) -> [f32; 3] {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return [0.0; 3];
        };
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.position {
                let span = (b.position - a.position).max(f32::EPSILON);
                let k = (t - a.position) / span;
                return [
                    a.color[0] + (b.color[0] - a.color[0]) * k,
                    a.color[1] + (b.color[1] - a.color[1]) * k,
                    a.color[2] + (b.color[2] - a.color[2]) * k,
                ];
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Average colour over the whole gradient, used where only a flat fill is possible.
    pub fn mean_color(&self) -> [f32; 3] {
        const SAMPLES: usize = 32;
        let mut sum = [0.0_f32; 3];
        for index in 0..SAMPLES {
            let color = self.color_at((index as f32 + 0.5) / SAMPLES as f32);
            for channel in 0..3 {
                sum[channel] += color[channel];
            }
        }
        sum.map(|value| value / SAMPLES as f32)
    }
}

impl FromStr for FallbackStyle {
    type Err = FallbackParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix("linear-gradient(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| FallbackParseError::NotAGradient(trimmed.to_string()))?;

        let mut parts = inner.split(',').map(str::trim).peekable();
        let mut angle_degrees = 180.0;
        if let Some(first) = parts.peek() {
            if let Some(value) = first.strip_suffix("deg") {
                angle_degrees = value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| FallbackParseError::InvalidAngle(first.to_string()))?;
                parts.next();
            }
        }

        let mut raw_stops = Vec::new();
        for part in parts {
            let mut tokens = part.split_whitespace();
            let color = tokens
                .next()
                .ok_or_else(|| FallbackParseError::InvalidColor(part.to_string()))?;
            let color = parse_hex_color(color)?;
            let position = tokens
                .next()
                .map(|token| {
                    token
                        .strip_suffix('%')
                        .and_then(|value| value.parse::<f32>().ok())
                        .map(|value| (value / 100.0).clamp(0.0, 1.0))
                        .ok_or_else(|| FallbackParseError::InvalidPosition(token.to_string()))
                })
                .transpose()?;
            raw_stops.push((color, position));
        }

        if raw_stops.len() < 2 {
            return Err(FallbackParseError::TooFewStops);
        }

        let last = raw_stops.len() - 1;
        let stops = raw_stops
            .into_iter()
            .enumerate()
            .map(|(index, (color, position))| ColorStop {
                color,
                position: position.unwrap_or(index as f32 / last as f32),
            })
            .collect();

        Ok(FallbackStyle {
            angle_degrees,
            stops,
        })
    }
}

fn parse_hex_color(raw: &str) -> Result<[f32; 3], FallbackParseError> {
    let invalid = || FallbackParseError::InvalidColor(raw.to_string());
    let hex = raw.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|ch| [ch, ch]).collect(),
        6 => hex.to_string(),
        _ => return Err(invalid()),
    };
    let mut color = [0.0; 3];
    for (channel, slot) in color.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&expanded[channel * 2..channel * 2 + 2], 16)
            .map_err(|_| invalid())?;
        *slot = byte as f32 / 255.0;
    }
    Ok(color)
}
