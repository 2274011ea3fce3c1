use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use engine::Money;

use crate::{
    app::AppState,
    ui::{
        components::{
            card::{Card, StatCard},
            money::{neutral_amount, styled_amount},
        },
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    render_balance(frame, layout[0], state, &theme);
    render_movements(frame, layout[1], state, &theme);
}

fn render_balance(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let Some(balance) = state.desk.state().balance else {
        let loading = Span::styled("cargando...", Style::default().fg(theme.dim));
        for (area, title) in cards.iter().zip(["Efectivo", "Cheques", "Banco", "Total"]) {
            StatCard::new(title, loading.clone(), theme).render(frame, *area);
        }
        return;
    };

    let caption = if state.desk.state().closing.is_closed() {
        "caja cerrada"
    } else {
        "en caja"
    };
    StatCard::new("Efectivo", neutral_amount(balance.cash, theme), theme)
        .caption(caption)
        .render(frame, cards[0]);
    StatCard::new("Cheques", neutral_amount(balance.checks, theme), theme).render(frame, cards[1]);
    StatCard::new("Banco", neutral_amount(balance.bank, theme), theme).render(frame, cards[2]);
    StatCard::new("Total", styled_amount(balance.total, theme), theme).render(frame, cards[3]);
}

fn render_movements(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let movements = &state.desk.state().movements;
    let card = Card::new("Movimientos del día", theme);

    if movements.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Sin movimientos registrados.",
            Style::default().fg(theme.dim),
        )));
        card.render_with(frame, area, empty);
        return;
    }

    let items = movements
        .iter()
        .map(|movement| {
            let amount = Money::from_major(movement.importe);
            let signed = if movement.tipo.eq_ignore_ascii_case("egreso") {
                -amount
            } else {
                amount
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<6}", movement.hora),
                    Style::default().fg(theme.text_muted),
                ),
                Span::raw(format!("{:<22} ", truncate(&movement.categoria, 22))),
                Span::styled(
                    format!("{:<10} ", movement.forma_pago),
                    Style::default().fg(theme.dim),
                ),
                styled_amount(signed, theme),
                Span::styled(
                    format!("  {}", movement.observacion),
                    Style::default().fg(theme.text_muted),
                ),
            ]))
        })
        .collect::<Vec<_>>();

    card.render_with(frame, area, List::new(items));
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn long_categories_are_cut() {
        assert_eq!(truncate("Combustible", 22), "Combustible");
        assert_eq!(truncate("Pago de haberes", 8), "Pago de…");
    }
}
