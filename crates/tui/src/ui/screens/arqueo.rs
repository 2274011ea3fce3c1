use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use engine::Money;

use crate::{
    app::AppState,
    ui::{
        components::{
            card::Card,
            money::{difference_badge, neutral_amount},
        },
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    render_form(frame, layout[0], state, &theme);
    render_last(frame, layout[1], state, &theme);
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let label = Style::default().fg(theme.text_muted);
    let closing = &state.desk.state().closing;
    let physical = Money::parse_input(&state.closing.input).ok();

    let system = match state.desk.state().balance {
        Some(balance) => neutral_amount(balance.cash, theme),
        None => Span::styled("cargando...", Style::default().fg(theme.dim)),
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Efectivo en sistema: ", label), system]),
        Line::from(vec![
            Span::styled("Efectivo físico:     ", label),
            Span::styled(
                format!("{}_", state.closing.input),
                Style::default().fg(theme.accent),
            ),
        ]),
    ];

    if let Some(difference) = physical.and_then(|physical| state.desk.preview_closing(physical)) {
        lines.push(Line::from(vec![
            Span::styled("Diferencia:          ", label),
            difference_badge(&difference, theme),
        ]));
    }
    lines.push(Line::from(""));

    let hint = if closing.is_closed() {
        Span::styled("La caja ya fue cerrada.", Style::default().fg(theme.dim))
    } else if state.closing.confirming {
        Span::styled(
            "Enter confirma el cierre · Esc cancela",
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "b usa el conteo de billetes · Enter registra",
            Style::default().fg(theme.dim),
        )
    };
    lines.push(Line::from(hint));

    let card = Card::new("Arqueo de caja", theme).focused(!closing.is_closed());
    card.render_with(frame, area, Paragraph::new(lines));
}

fn render_last(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(outcome) = state.desk.state().closing.last_outcome() else {
        return;
    };
    let label = Style::default().fg(theme.text_muted);
    let adjustment = if outcome.difference.amount.is_zero() {
        Span::styled("sin ajuste", Style::default().fg(theme.dim))
    } else if outcome.adjusted {
        Span::styled("ajuste registrado", Style::default().fg(theme.positive))
    } else {
        Span::styled("ajuste pendiente", Style::default().fg(theme.error))
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Físico:  ", label),
            neutral_amount(outcome.physical, theme),
        ]),
        Line::from(vec![
            Span::styled("Sistema: ", label),
            neutral_amount(outcome.system, theme),
        ]),
        Line::from(vec![
            Span::styled("Resultado: ", label),
            difference_badge(&outcome.difference, theme),
            Span::raw("  "),
            adjustment,
        ]),
    ];
    Card::new("Último arqueo", theme).render_with(frame, area, Paragraph::new(lines));
}
