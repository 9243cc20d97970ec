use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;
use crate::session::NoticeLevel;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(52, 211, 21))
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BAR_STYLE: Style = Style::new().fg(Color::Rgb(52, 211, 21));

pub fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Success => Style::new().fg(Color::Green),
        NoticeLevel::Info => Style::new().fg(Color::Cyan),
        NoticeLevel::Warning => Style::new().fg(Color::Yellow),
        NoticeLevel::Error => Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn money_span(amount: f64) -> Span<'static> {
    Span::styled(money(amount), AMOUNT_STYLE)
}
