use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
};

use engine::{Money, ReconciliationState};

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
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_counter(frame, columns[0], state, &theme);
    render_summary(frame, columns[1], state, &theme);
}

fn render_counter(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let ledger = &state.desk.state().ledger;
    let rows = ledger.rows().iter().map(|row| {
        let quantity = if row.quantity == 0 {
            Span::styled("-", Style::default().fg(theme.dim))
        } else {
            Span::raw(row.quantity.to_string())
        };
        Row::new(vec![
            Cell::from(Money::from_pesos(row.face).format()),
            Cell::from(quantity),
            Cell::from(neutral_amount(row.subtotal(), theme)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Billete", "Cant.", "Subtotal"])
            .style(Style::default().fg(theme.text_muted)),
    )
    .row_highlight_style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("» ");

    let card = Card::new("Conteo de billetes", theme).focused(!state.count.editing_handler);
    let block = card.block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let mut table_state = TableState::default();
    table_state.select(Some(state.count.selected));
    frame.render_stateful_widget(table, parts[0], &mut table_state);

    let total = Line::from(vec![
        Span::styled("Total contado: ", Style::default().fg(theme.text_muted)),
        Span::styled(
            ledger.total().format(),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(total), parts[1]);
}

fn render_summary(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let reconciliation = &state.desk.state().reconciliation;
    let selection = reconciliation.selection();
    let label = Style::default().fg(theme.text_muted);

    let handler = if state.count.editing_handler {
        Span::styled(
            format!("{}_", state.count.handler_input),
            Style::default().fg(theme.accent),
        )
    } else if selection.handler.is_empty() {
        Span::styled("(todos)", Style::default().fg(theme.dim))
    } else {
        Span::raw(selection.handler.clone())
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Fecha:      ", label),
            Span::raw(selection.date.format("%d/%m/%Y").to_string()),
        ]),
        Line::from(vec![
            Span::styled("Turno:      ", label),
            Span::raw(selection.shift.label()),
        ]),
        Line::from(vec![Span::styled("Repartidor: ", label), handler]),
        Line::from(""),
    ];

    match reconciliation.expected() {
        Some(expected) => lines.push(Line::from(vec![
            Span::styled("Esperado:   ", label),
            neutral_amount(expected.amount, theme),
        ])),
        None => {
            let message = reconciliation
                .not_found_message()
                .unwrap_or("Sin rendición esperada para esta selección.");
            lines.push(Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(theme.warning),
            )));
        }
    }
    lines.push(Line::from(vec![
        Span::styled("Contado:    ", label),
        neutral_amount(state.desk.state().ledger.total(), theme),
    ]));
    if let Some(difference) = state.desk.preview_reconciliation() {
        lines.push(Line::from(vec![
            Span::styled("Diferencia: ", label),
            difference_badge(&difference, theme),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(status_line(state, theme));

    if let Some(outcome) = reconciliation.last_outcome() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Última: ", label),
            difference_badge(&outcome.difference, theme),
            Span::styled(
                outcome
                    .reconciliation_id
                    .as_deref()
                    .map(|id| format!("  #{id}"))
                    .unwrap_or_default(),
                Style::default().fg(theme.dim),
            ),
        ]));
    }

    let card = Card::new("Rendición", theme).focused(state.count.editing_handler);
    card.render_with(frame, area, Paragraph::new(lines));
}

fn status_line(state: &AppState, theme: &Theme) -> Line<'static> {
    if state.count.confirming {
        return Line::from(Span::styled(
            "Enter confirma · Esc revisa",
            Style::default()
                .fg(theme.warning)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let (text, color) = match state.desk.state().reconciliation.state() {
        ReconciliationState::NoExpectation => ("Envío deshabilitado", theme.dim),
        ReconciliationState::Pending if state.desk.can_reconcile() => {
            ("Enter para procesar", theme.accent)
        }
        ReconciliationState::Pending => ("Ingresá el conteo", theme.text_muted),
        ReconciliationState::Submitting => ("Procesando...", theme.warning),
        ReconciliationState::Resolved => ("Rendición procesada", theme.positive),
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}
