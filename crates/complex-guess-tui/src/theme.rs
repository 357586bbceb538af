use crossterm::style::Color;
use serde::{Deserialize, Serialize};

/// Persisted theme choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            ThemeName::Dark => Theme::dark(),
            ThemeName::Light => Theme::light(),
        }
    }
}

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    /// Background color
    pub bg: Color,
    /// Default text color
    pub fg: Color,
    /// Panel border color
    pub border: Color,
    /// Titles and the selected menu entry
    pub accent: Color,
    /// Focused input field background
    pub input_bg: Color,
    /// Input text while submit is disabled
    pub disabled: Color,
    /// "Too low" feedback
    pub low: Color,
    /// "Too high" feedback
    pub high: Color,
    /// Error/loss color
    pub error: Color,
    /// Success/win color
    pub success: Color,
    /// Timer/info text color
    pub info: Color,
    /// Key binding text color
    pub key: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            name: ThemeName::Dark,
            bg: Color::Rgb { r: 20, g: 22, b: 30 },
            fg: Color::Rgb { r: 230, g: 230, b: 240 },
            border: Color::Rgb { r: 70, g: 75, b: 90 },
            accent: Color::Rgb { r: 130, g: 140, b: 255 },
            input_bg: Color::Rgb { r: 70, g: 90, b: 140 },
            disabled: Color::Rgb { r: 100, g: 100, b: 115 },
            low: Color::Rgb { r: 80, g: 180, b: 255 },
            high: Color::Rgb { r: 255, g: 160, b: 80 },
            error: Color::Rgb { r: 255, g: 90, b: 90 },
            success: Color::Rgb { r: 90, g: 255, b: 130 },
            info: Color::Rgb { r: 160, g: 165, b: 185 },
            key: Color::Rgb { r: 255, g: 210, b: 100 },
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            name: ThemeName::Light,
            bg: Color::Rgb { r: 248, g: 248, b: 252 },
            fg: Color::Rgb { r: 30, g: 30, b: 40 },
            border: Color::Rgb { r: 180, g: 180, b: 195 },
            accent: Color::Rgb { r: 60, g: 60, b: 180 },
            input_bg: Color::Rgb { r: 180, g: 200, b: 255 },
            disabled: Color::Rgb { r: 160, g: 160, b: 170 },
            low: Color::Rgb { r: 30, g: 100, b: 200 },
            high: Color::Rgb { r: 200, g: 100, b: 20 },
            error: Color::Rgb { r: 220, g: 50, b: 50 },
            success: Color::Rgb { r: 40, g: 160, b: 60 },
            info: Color::Rgb { r: 90, g: 90, b: 110 },
            key: Color::Rgb { r: 200, g: 120, b: 20 },
        }
    }
}
