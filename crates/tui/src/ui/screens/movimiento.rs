use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{AppState, MovementField},
    ui::{components::card::Card, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_form(frame, columns[0], state, &theme);
    render_suggestions(frame, columns[1], state, &theme);
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.movement;
    let lines = form
        .visible_fields()
        .into_iter()
        .map(|field| {
            let focused = field == form.focus;
            let value = field_value(state, field);
            let marker = if focused { "» " } else { "  " };
            let value_style = if focused {
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            let value = if focused && field.is_text() {
                format!("{value}_")
            } else if focused {
                format!("‹ {value} ›")
            } else {
                value
            };
            Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.accent)),
                Span::styled(
                    format!("{:<15}", field.label()),
                    Style::default().fg(theme.text_muted),
                ),
                Span::styled(value, value_style),
            ])
        })
        .chain([
            Line::from(""),
            Line::from(Span::styled(
                "Tab campo · ←/→ opción · Enter registra · Esc limpia",
                Style::default().fg(theme.dim),
            )),
        ])
        .collect::<Vec<_>>();

    Card::new("Nuevo movimiento", theme)
        .focused(true)
        .render_with(frame, area, Paragraph::new(lines));
}

fn field_value(state: &AppState, field: MovementField) -> String {
    let draft = &state.movement.draft;
    match field {
        MovementField::Action => draft.action.label().to_string(),
        MovementField::Kind => draft.kind.label().to_string(),
        MovementField::Payment => draft.payment.label().to_string(),
        MovementField::Amount => state.movement.amount_input.clone(),
        MovementField::Subject => draft.subject.clone(),
        MovementField::Bank => draft.bank.clone(),
        MovementField::Cheque => draft.cheque_number.clone(),
        MovementField::Observation => {
            if draft.observation.is_empty() && state.movement.focus != MovementField::Observation {
                draft.action.default_observation(&draft.subject)
            } else {
                draft.observation.clone()
            }
        }
    }
}

fn render_suggestions(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let title = state
        .movement
        .draft
        .action
        .subject()
        .map(|subject| subject.label())
        .unwrap_or("Sugerencias");
    let suggestions = state.movement.suggestions(&state.catalogs);
    let card = Card::new(title, theme);

    if suggestions.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Escribí para buscar; → completa.",
            Style::default().fg(theme.dim),
        )));
        card.render_with(frame, area, hint);
        return;
    }

    let items = suggestions
        .into_iter()
        .map(|name| ListItem::new(Line::from(name.to_string())))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(card.block())
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    let mut list_state = ListState::default();
    list_state.select(Some(state.movement.suggestion));
    frame.render_stateful_widget(list, area, &mut list_state);
}
