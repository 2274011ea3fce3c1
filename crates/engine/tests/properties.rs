use engine::{Classification, DenominationLedger, Difference, Money, denominations::DEFAULT_FACES};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Input {
    Count(u32),
    Empty,
    Garbage(String),
}

impl Input {
    fn raw(&self) -> String {
        match self {
            Input::Count(n) => n.to_string(),
            Input::Empty => String::new(),
            Input::Garbage(s) => s.clone(),
        }
    }

    fn quantity(&self) -> u64 {
        match self {
            Input::Count(n) => u64::from(*n),
            Input::Empty | Input::Garbage(_) => 0,
        }
    }
}

fn input() -> impl Strategy<Value = Input> {
    prop_oneof![
        (0u32..500).prop_map(Input::Count),
        Just(Input::Empty),
        "[a-zA-Z ]{1,6}".prop_map(Input::Garbage),
    ]
}

fn edit() -> impl Strategy<Value = (usize, Input)> {
    (0..DEFAULT_FACES.len(), input())
}

proptest! {
    #[test]
    fn total_is_the_sum_of_rows(edits in prop::collection::vec(edit(), 0..40)) {
        let mut ledger = DenominationLedger::default();
        let mut expected = [0u64; DEFAULT_FACES.len()];

        for (index, value) in &edits {
            let face = DEFAULT_FACES[*index];
            ledger.set_quantity(face, &value.raw()).unwrap();
            expected[*index] = value.quantity();
        }

        let sum: i64 = DEFAULT_FACES
            .iter()
            .zip(expected)
            .map(|(face, quantity)| face * quantity as i64)
            .sum();
        prop_assert_eq!(ledger.total(), Money::from_pesos(sum));

        let rows: Money = ledger.rows().iter().map(|row| row.subtotal()).sum();
        prop_assert_eq!(ledger.total(), rows);
    }

    #[test]
    fn reset_always_clears(edits in prop::collection::vec(edit(), 0..20)) {
        let mut ledger = DenominationLedger::default();
        for (index, value) in &edits {
            ledger.set_quantity(DEFAULT_FACES[*index], &value.raw()).unwrap();
        }

        ledger.reset();
        prop_assert_eq!(ledger.total(), Money::ZERO);
        ledger.reset();
        prop_assert_eq!(ledger.total(), Money::ZERO);
        prop_assert!(ledger.rows().iter().all(|row| row.quantity == 0));
    }

    #[test]
    fn classification_follows_the_comparison(
        counted in -10_000_000i64..10_000_000,
        reference in -10_000_000i64..10_000_000,
    ) {
        let difference = Difference::between(Money::new(counted), Money::new(reference));
        let expected = match counted.cmp(&reference) {
            std::cmp::Ordering::Equal => Classification::Exact,
            std::cmp::Ordering::Greater => Classification::Surplus,
            std::cmp::Ordering::Less => Classification::Shortfall,
        };
        prop_assert_eq!(difference.classification, expected);
        prop_assert_eq!(difference.amount, Money::new(counted - reference));
    }
}

#[test]
fn equal_decimal_amounts_are_exact() {
    let counted = Money::from_major(1_234.50);
    let reference: Money = "1.234,50".parse().unwrap();
    assert_eq!(
        Difference::between(counted, reference).classification,
        Classification::Exact
    );
}
