//! Bill counter.
//!
//! The ledger holds one row per known face value. The counted total is
//! recomputed from every row on each mutation and cached; it is never patched
//! incrementally, so it always equals the sum of the visible subtotals.

use crate::{EngineError, Money};

/// Peso notes accepted at the register, largest first.
pub const DEFAULT_FACES: [i64; 10] = [20_000, 10_000, 2_000, 1_000, 500, 200, 100, 50, 20, 10];

/// One row of the bill counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenominationCount {
    /// Face value in whole pesos.
    pub face: i64,
    pub quantity: u64,
}

impl DenominationCount {
    pub fn face_value(&self) -> Money {
        Money::from_pesos(self.face)
    }

    pub fn subtotal(&self) -> Money {
        let quantity = i64::try_from(self.quantity).unwrap_or(i64::MAX);
        self.face_value().saturating_mul(quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenominationLedger {
    rows: Vec<DenominationCount>,
    total: Money,
}

impl Default for DenominationLedger {
    fn default() -> Self {
        Self::new(DEFAULT_FACES)
    }
}

impl DenominationLedger {
    /// Builds a ledger with every quantity at zero. Non-positive and duplicate
    /// faces are dropped; rows are kept largest first.
    pub fn new(faces: impl IntoIterator<Item = i64>) -> Self {
        let mut faces: Vec<i64> = faces.into_iter().filter(|face| *face > 0).collect();
        faces.sort_unstable_by(|a, b| b.cmp(a));
        faces.dedup();

        Self {
            rows: faces
                .into_iter()
                .map(|face| DenominationCount { face, quantity: 0 })
                .collect(),
            total: Money::ZERO,
        }
    }

    /// Stores the quantity typed for `face` and returns the row subtotal.
    ///
    /// Every non-digit is stripped first; an empty or unparsable result counts
    /// as zero, so clearing a field never fails.
    pub fn set_quantity(&mut self, face: i64, raw: &str) -> Result<Money, EngineError> {
        let quantity = parse_quantity(raw);
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.face == face)
            .ok_or(EngineError::UnknownDenomination(face))?;
        row.quantity = quantity;
        let subtotal = row.subtotal();
        self.recompute();
        Ok(subtotal)
    }

    /// Latest counted total, always in sync with the last mutation.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn quantity(&self, face: i64) -> Option<u64> {
        self.row(face).map(|row| row.quantity)
    }

    pub fn subtotal(&self, face: i64) -> Option<Money> {
        self.row(face).map(DenominationCount::subtotal)
    }

    pub fn rows(&self) -> &[DenominationCount] {
        &self.rows
    }

    pub fn faces(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(|row| row.face)
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_zero()
    }

    /// Sets every quantity back to zero.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.quantity = 0;
        }
        self.recompute();
    }

    fn row(&self, face: i64) -> Option<&DenominationCount> {
        self.rows.iter().find(|row| row.face == face)
    }

    fn recompute(&mut self) {
        self.total = self
            .rows
            .iter()
            .map(DenominationCount::subtotal)
            .fold(Money::ZERO, |acc, subtotal| {
                acc.checked_add(subtotal).unwrap_or(Money::new(i64::MAX))
            });
    }
}

fn parse_quantity(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
