use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{app::Section, ui::theme::Theme};

pub fn render_tabs(frame: &mut Frame<'_>, area: Rect, active: Section, theme: &Theme) {
    let mut spans = vec![Span::raw(" ")];

    for (i, section) in Section::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("F{} ", i + 1),
            Style::default().fg(theme.dim),
        ));
        if *section == active {
            spans.push(Span::styled(
                format!("[{}]", section.label()),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                section.label(),
                Style::default().fg(theme.text_muted),
            ));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
