//! Client core of the cash register.
//!
//! The engine has no IO of its own. Remote calls go through the [`Gateway`]
//! trait; everything else (bill counting, difference classification, the
//! reconciliation and closing state machines, fetch ordering) is plain state
//! owned by a [`CashDesk`].

pub use closing::{ClosingEngine, ClosingOutcome, ClosingState};
pub use denominations::{DenominationCount, DenominationLedger};
pub use desk::{AppState, CashBalance, CashDesk};
pub use difference::{Classification, Difference};
pub use error::EngineError;
pub use gateway::{Gateway, Reply};
pub use money::Money;
pub use reconciliation::{
    ExpectedCash, ExpectedOutcome, ReconciliationEngine, ReconciliationOutcome,
    ReconciliationState, Selection,
};
pub use shift::{Shift, shift_at};

pub mod closing;
pub mod denominations;
pub mod desk;
pub mod difference;
mod error;
pub mod gateway;
mod money;
pub mod movements;
pub mod reconciliation;
pub mod sequence;
pub mod shift;
