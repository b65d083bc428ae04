//! Color themes for revnav.
//!
//! Two built-in themes:
//!
//! - `dark`: ANSI 16 colors, works on any terminal.
//! - `catppuccin-mocha`: Catppuccin Mocha palette in RGB; needs truecolor.

use ratatui::style::Color;

/// Every color revnav renders with.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // State panel
    /// Field names in the state and projection panels.
    pub field_label: Color,
    pub field_value: Color,
    /// Placeholder for unset optional fields.
    pub field_unset: Color,
    /// One-shot flags that are still set (about to be cleared).
    pub one_shot: Color,

    // URL panel
    pub url: Color,

    // Emission log
    /// The empty emission published at the start of a reload.
    pub emission_empty: Color,
    pub emission_state: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    /// Mode indicator while typing a URL.
    pub status_mode_input: Color,
    pub status_error: Color,

    pub background: Color,
}

impl Theme {
    /// The built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            field_label: Color::Blue,
            field_value: Color::Reset,
            field_unset: Color::DarkGray,
            one_shot: Color::Yellow,

            url: Color::Green,

            emission_empty: Color::Red,
            emission_state: Color::Reset,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_input: Color::Green,
            status_error: Color::Red,

            background: Color::Reset,
        }
    }

    /// The Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            field_label: blue,
            field_value: text,
            field_unset: overlay1,
            one_shot: peach,

            url: green,

            emission_empty: red,
            emission_state: text,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_input: green,
            status_error: yellow,

            background: base,
        }
    }

    /// Resolves a theme name from config.
    ///
    /// Unknown names fall back to `dark()` with a warning, so a typo never
    /// prevents startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
