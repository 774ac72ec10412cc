use dashboard_core::Badge;
use ratatui::style::{Color, Modifier, Style};

pub const TITLE: &str = "Crawl Dashboard";
pub const MISSING_VALUE: &str = "—";
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const HELP_INPUT: &str = "Enter submit · Tab table · Ctrl+C quit";
pub const HELP_TABLE: &str =
    "↑/↓ move · Space select · Enter open · ←/→ page · s size · r re-run · d delete · Tab input · q quit";
pub const HELP_DETAIL: &str = "Esc back · q quit";

pub const FOCUSED_BORDER: Style = Style::new().fg(Color::Cyan);
pub const IDLE_BORDER: Style = Style::new().fg(Color::DarkGray);
pub const HEADER_ROW: Style = Style::new().add_modifier(Modifier::BOLD);
pub const CURSOR_ROW: Style = Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD);
pub const ERROR_TEXT: Style = Style::new().fg(Color::Red);
pub const MUTED_TEXT: Style = Style::new().fg(Color::Gray);

pub fn badge_style(badge: Badge) -> Style {
    let color = match badge {
        Badge::Success => Color::Green,
        Badge::Warning => Color::Yellow,
        Badge::Error => Color::Red,
        Badge::Info => Color::Cyan,
        Badge::Default => Color::Gray,
    };
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}
