use engine::{Classification, Difference, Money};
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

/// Amount colored by sign.
#[must_use]
pub fn styled_amount(amount: Money, theme: &Theme) -> Span<'static> {
    let color = if amount.is_positive() {
        theme.positive
    } else if amount.is_negative() {
        theme.negative
    } else {
        theme.text
    };
    Span::styled(amount.format(), Style::default().fg(color))
}

/// Plain amount in the text color, e.g. balances and subtotals.
#[must_use]
pub fn neutral_amount(amount: Money, theme: &Theme) -> Span<'static> {
    Span::styled(amount.format(), Style::default().fg(theme.text))
}

/// "FALTAN $2.000" / "SOBRAN $500" / "EXACTO", bold.
#[must_use]
pub fn difference_badge(difference: &Difference, theme: &Theme) -> Span<'static> {
    let color = match difference.classification {
        Classification::Exact => theme.positive,
        Classification::Surplus => theme.warning,
        Classification::Shortfall => theme.negative,
    };
    Span::styled(
        difference.summary(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_text_follows_classification() {
        let theme = Theme::default();
        let short = Difference::between(Money::from_pesos(18_000), Money::from_pesos(20_000));
        let badge = difference_badge(&short, &theme);
        assert_eq!(badge.content, "FALTAN $2.000");
        assert_eq!(badge.style.fg, Some(theme.negative));
    }
}
