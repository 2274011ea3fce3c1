use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Money;

/// Outcome of comparing counted cash against a reference amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Exact,
    Surplus,
    Shortfall,
}

impl Classification {
    /// Classifies a signed difference.
    pub fn of(difference: Money) -> Self {
        if difference.is_positive() {
            Self::Surplus
        } else if difference.is_negative() {
            Self::Shortfall
        } else {
            Self::Exact
        }
    }

    /// Parses the labels used by the service (`Exacto`, `OK`, `Sobrante`,
    /// `Faltante`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "exacto" | "ok" => Some(Self::Exact),
            "sobrante" => Some(Self::Surplus),
            "faltante" => Some(Self::Shortfall),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exacto",
            Self::Surplus => "Sobrante",
            Self::Shortfall => "Faltante",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed difference `counted - reference` with its classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub amount: Money,
    pub classification: Classification,
}

impl Difference {
    pub fn between(counted: Money, reference: Money) -> Self {
        Self::from_amount(counted - reference)
    }

    pub fn from_amount(amount: Money) -> Self {
        Self {
            amount,
            classification: Classification::of(amount),
        }
    }

    /// A surplus larger than `limit` should be confirmed before submitting.
    pub fn needs_confirmation(&self, limit: Money) -> bool {
        self.classification == Classification::Surplus && self.amount > limit
    }

    /// Short text for the summary line, e.g. `FALTAN $2.000`.
    pub fn summary(&self) -> String {
        match self.classification {
            Classification::Exact => "EXACTO".to_string(),
            Classification::Surplus => format!("SOBRAN {}", self.amount.format_abs()),
            Classification::Shortfall => format!("FALTAN {}", self.amount.format_abs()),
        }
    }
}
