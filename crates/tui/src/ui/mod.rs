pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::app::{AppState, Section};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};

use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tabs
            Constraint::Min(0),
            Constraint::Length(1), // Hints
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.section, &theme);

    match state.section {
        Section::Caja => screens::caja::render(frame, layout[2], state),
        Section::Movimiento => screens::movimiento::render(frame, layout[2], state),
        Section::Rendicion => screens::rendicion::render(frame, layout[2], state),
        Section::Arqueo => screens::arqueo::render(frame, layout[2], state),
    }

    render_bottom_bar(frame, layout[3], state, &theme);
    render_busy(frame, area, state, &theme);
    components::toast::render(frame, area, state.toast.as_ref(), &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let selection = state.desk.state().reconciliation.selection();
    let refresh = state
        .last_refresh
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let (status, status_color) = if state.connected {
        ("OK", theme.positive)
    } else {
        ("SIN CONEXIÓN", theme.error)
    };
    let label = Style::default().fg(theme.text_muted);

    let line = Line::from(vec![
        Span::styled("Usuario", label),
        Span::raw(format!(": {}  ", state.desk.actor())),
        Span::styled("Fecha", label),
        Span::raw(format!(": {}  ", selection.date.format("%d/%m/%Y"))),
        Span::styled("Turno", label),
        Span::raw(format!(": {}  ", selection.shift.label())),
        Span::styled("Actualizado", label),
        Span::raw(format!(": {refresh}  ")),
        Span::styled(status, Style::default().fg(status_color)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = Vec::new();
    for (key, text) in context_hints(state) {
        if !parts.is_empty() {
            parts.push(Span::raw("  "));
        }
        parts.push(Span::styled(key, Style::default().fg(theme.accent)));
        parts.push(Span::raw(format!(" {text}")));
    }
    parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
    parts.push(Span::styled("Ctrl+C", Style::default().fg(theme.accent)));
    parts.push(Span::raw(" salir"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn context_hints(state: &AppState) -> Vec<(&'static str, &'static str)> {
    match state.section {
        Section::Caja => vec![("1-4", "sección"), ("r", "actualizar"), ("q", "salir")],
        Section::Movimiento => vec![("Tab", "campo"), ("←/→", "opción"), ("Enter", "registrar")],
        Section::Rendicion if state.count.editing_handler => {
            vec![("Enter", "aplicar"), ("Esc", "cancelar")]
        }
        Section::Rendicion => vec![
            ("↑/↓", "billete"),
            ("0-9", "cantidad"),
            ("t", "turno"),
            ("d", "repartidor"),
            ("l", "recargar"),
            ("c", "limpiar"),
            ("Enter", "procesar"),
        ],
        Section::Arqueo => vec![("0-9", "importe"), ("b", "usar conteo"), ("Enter", "registrar")],
    }
}

fn render_busy(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(label) = state.busy else {
        return;
    };
    let width = (label.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height / 2,
        width,
        height: 1,
    };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("  {label}  "),
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        ))),
        rect,
    );
}
