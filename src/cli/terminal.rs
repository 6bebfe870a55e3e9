//! Terminal capability detection and styling

use owo_colors::{OwoColorize, Style, colors::css};

/// Whether stdout accepts colour codes.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Whether the terminal is narrower than 60 columns.
///
/// Long answers are wrapped onto their own line in narrow terminals.
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

/// Extension trait for styling interview output
pub trait Colorize {
    /// Accepted answers (green)
    fn success(&self) -> String;
    /// Rejections and notices (amber)
    fn warning(&self) -> String;
    /// Questions and headings (blue)
    fn info(&self) -> String;
    /// Progress and secondary text
    fn dim(&self) -> String;
}

fn paint(text: &str, style: Style) -> String {
    if supports_color() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, Style::new().fg::<css::Green>())
    }

    fn warning(&self) -> String {
        paint(self, Style::new().fg::<css::Orange>())
    }

    fn info(&self) -> String {
        paint(self, Style::new().fg::<css::LightBlue>().bold())
    }

    fn dim(&self) -> String {
        paint(self, Style::new().dimmed())
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn info(&self) -> String {
        self.as_str().info()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}
