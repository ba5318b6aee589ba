use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::chart::render::{ChartStyle, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::config::{ChartSettings, ThemeSettings};

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Relative luminance in `[0, 1]`, good enough to pick a contrasting label color
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Font families bundled with the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontChoice {
    #[default]
    SansSerif,
    Serif,
    Monospace,
}

impl FontChoice {
    /// Family name the renderer registers the bundled face under
    pub fn family(&self) -> &'static str {
        match self {
            FontChoice::SansSerif => "sans-serif",
            FontChoice::Serif => "serif",
            FontChoice::Monospace => "monospace",
        }
    }

    pub fn parse(s: &str) -> Option<FontChoice> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "sans serif" | "sans" | "sansserif" => Some(FontChoice::SansSerif),
            "serif" => Some(FontChoice::Serif),
            "monospace" | "mono" => Some(FontChoice::Monospace),
            _ => None,
        }
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontChoice::SansSerif => write!(f, "sans serif"),
            FontChoice::Serif => write!(f, "serif"),
            FontChoice::Monospace => write!(f, "monospace"),
        }
    }
}

/// Colors and font applied to every rendered chart
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgb,
    pub text: Rgb,
    pub primary: Rgb,
    pub font: FontChoice,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb(0xF1, 0xF8, 0xE9),
            text: Rgb(0x1B, 0x5E, 0x20),
            primary: Rgb(0x00, 0x89, 0x7B),
            font: FontChoice::SansSerif,
        }
    }
}

impl Theme {
    /// Apply configured values over the defaults. Values that do not parse
    /// are logged and skipped.
    pub fn from_settings(settings: &ThemeSettings) -> Self {
        let defaults = Theme::default();
        let color = |key: &str, value: &Option<String>, fallback: Rgb| match value {
            None => fallback,
            Some(raw) => parse_color(raw).unwrap_or_else(|| {
                warn!("Ignoring theme.{key} = '{raw}': not a recognised color, using {fallback}");
                fallback
            }),
        };
        let font = match &settings.font {
            None => defaults.font,
            Some(raw) => FontChoice::parse(raw).unwrap_or_else(|| {
                warn!("Unknown theme.font '{raw}', falling back to {}", defaults.font);
                defaults.font
            }),
        };
        Self {
            background: color("backgroundColor", &settings.background_color, defaults.background),
            text: color("textColor", &settings.text_color, defaults.text),
            primary: color("primaryColor", &settings.primary_color, defaults.primary),
            font,
        }
    }

    pub fn chart_style(&self, chart: &ChartSettings) -> ChartStyle {
        ChartStyle {
            width: chart.width.unwrap_or(DEFAULT_WIDTH),
            height: chart.height.unwrap_or(DEFAULT_HEIGHT),
            background: self.background,
            text: self.text,
            primary: self.primary,
            font: self.font,
        }
    }
}

/// Parse `#RRGGBB`, `#RGB` or a basic color name
pub fn parse_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Rgb(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => None,
        };
    }
    let rgb = match s.to_ascii_lowercase().as_str() {
        "black" => Rgb(0, 0, 0),
        "white" => Rgb(255, 255, 255),
        "red" => Rgb(255, 0, 0),
        "green" => Rgb(0, 128, 0),
        "blue" => Rgb(0, 0, 255),
        "yellow" => Rgb(255, 255, 0),
        "cyan" => Rgb(0, 255, 255),
        "magenta" => Rgb(255, 0, 255),
        "gray" | "grey" => Rgb(128, 128, 128),
        "orange" => Rgb(255, 165, 0),
        "purple" => Rgb(128, 0, 128),
        "teal" => Rgb(0, 128, 128),
        "navy" => Rgb(0, 0, 128),
        _ => return None,
    };
    Some(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#00897B"), Some(Rgb(0, 137, 123)));
        assert_eq!(parse_color(" #fff "), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("Teal"), Some(Rgb(0, 128, 128)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_from_settings_falls_back_per_key() {
        let settings = ThemeSettings {
            background_color: Some("#FFFFFF".into()),
            text_color: Some("not a color".into()),
            font: Some("serif".into()),
            primary_color: None,
        };
        let theme = Theme::from_settings(&settings);
        let defaults = Theme::default();
        assert_eq!(theme.background, Rgb(255, 255, 255));
        assert_eq!(theme.text, defaults.text);
        assert_eq!(theme.primary, defaults.primary);
        assert_eq!(theme.font, FontChoice::Serif);
    }

    #[test]
    fn test_unknown_font_is_sans_serif() {
        let settings = ThemeSettings {
            font: Some("Comic Neue".into()),
            ..Default::default()
        };
        assert_eq!(Theme::from_settings(&settings).font, FontChoice::SansSerif);
        assert_eq!(FontChoice::parse("sans serif"), Some(FontChoice::SansSerif));
        assert_eq!(FontChoice::parse("Sans-Serif"), Some(FontChoice::SansSerif));
    }

    #[test]
    fn test_chart_style_uses_chart_settings() {
        let chart = ChartSettings {
            width: Some(640),
            height: None,
            preview_rows: None,
        };
        let style = Theme::default().chart_style(&chart);
        assert_eq!((style.width, style.height), (640, DEFAULT_HEIGHT));
        assert_eq!(style.primary.to_string(), "#00897B");
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb(0xF7, 0xFC, 0xF5);
        let b = Rgb(0x00, 0x44, 0x1B);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert!(a.luminance() > b.luminance());
    }
}
