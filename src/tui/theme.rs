use ratatui::style::Color;

use crate::config::ThemeMode;
use crate::status::Tone;

/// Terminal colour palette for one colour mode.
///
/// `System` leans on the terminal's own defaults (`Color::Reset` text),
/// while `Light` and `Dark` pick explicit colours that hold up on the
/// corresponding background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub active: Color,
    pub attention: Color,
    pub not_started: Color,
    pub selection_bg: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::System => Self {
                text: Color::Reset,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                positive: Color::Green,
                negative: Color::Red,
                active: Color::Blue,
                attention: Color::Yellow,
                not_started: Color::Gray,
                selection_bg: Color::DarkGray,
            },
            ThemeMode::Dark => Self {
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::LightCyan,
                positive: Color::LightGreen,
                negative: Color::LightRed,
                active: Color::LightBlue,
                attention: Color::LightYellow,
                not_started: Color::Gray,
                selection_bg: Color::DarkGray,
            },
            ThemeMode::Light => Self {
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                positive: Color::Green,
                negative: Color::Red,
                active: Color::Blue,
                attention: Color::Magenta,
                not_started: Color::DarkGray,
                selection_bg: Color::Gray,
            },
        }
    }

    /// Colour for a status tone from the mapping table.
    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Positive => self.positive,
            Tone::Negative => self.negative,
            Tone::Active => self.active,
            Tone::Attention => self.attention,
            Tone::NotStarted => self.not_started,
            Tone::Neutral => self.muted,
        }
    }
}
