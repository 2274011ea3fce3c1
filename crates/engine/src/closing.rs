//! End-of-day closing count ("arqueo").
//!
//! Closing is a two-step protocol: the closing record first, then, for a
//! non-zero difference, a separate compensating cash movement. The two calls
//! are not atomic and a failed adjustment is reported on its own.

use api_types::closing::{ClosingNew, ClosingRecorded};

use crate::{
    Classification, Difference, EngineError, Money, Shift,
    gateway::{self, Gateway},
    movements::closing_adjustment,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosingState {
    Open,
    Submitting,
    /// Closed for the day; the view is read-only.
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosingOutcome {
    pub physical: Money,
    pub system: Money,
    pub difference: Difference,
    /// Whether a compensating movement was recorded.
    pub adjusted: bool,
}

/// Local preview of `physical - system`.
pub fn compute_difference(physical: Money, system: Money) -> Difference {
    Difference::between(physical, system)
}

#[derive(Debug, Clone)]
pub struct ClosingEngine {
    state: ClosingState,
    last_outcome: Option<ClosingOutcome>,
}

impl Default for ClosingEngine {
    fn default() -> Self {
        Self {
            state: ClosingState::Open,
            last_outcome: None,
        }
    }
}

impl ClosingEngine {
    pub fn state(&self) -> ClosingState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ClosingState::Closed
    }

    pub fn last_outcome(&self) -> Option<&ClosingOutcome> {
        self.last_outcome.as_ref()
    }

    /// Records the closing count and, when needed, the adjustment movement.
    /// `system` is the last known cash balance, used when the reply omits
    /// its own figures.
    pub async fn submit<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        physical: Money,
        actor: &str,
        shift: Option<Shift>,
        system: Option<Money>,
    ) -> Result<ClosingOutcome, EngineError> {
        match self.state {
            ClosingState::Submitting => return Err(EngineError::Busy),
            ClosingState::Closed => return Err(EngineError::DayClosed),
            ClosingState::Open => {}
        }
        if !physical.is_positive() {
            return Err(EngineError::Validation(
                "Ingresá el efectivo físico contado.".to_string(),
            ));
        }
        if actor.trim().is_empty() {
            return Err(EngineError::Validation("Falta el usuario.".to_string()));
        }

        self.state = ClosingState::Submitting;
        tracing::info!(%physical, "submitting closing count");

        let request = ClosingNew {
            usuario: actor.to_string(),
            efectivo_fisico: physical.to_major(),
        };
        let recorded = match gateway::call(gateway, &request).await {
            Ok(recorded) => recorded,
            Err(err) => {
                self.state = ClosingState::Open;
                tracing::warn!("closing failed: {err}");
                return Err(err);
            }
        };

        let mut outcome = outcome_from_reply(&recorded, physical, system);
        self.state = ClosingState::Closed;
        self.last_outcome = Some(outcome.clone());

        let Some(adjustment) = closing_adjustment(outcome.difference.amount, actor, shift) else {
            tracing::info!("closing count exact");
            return Ok(outcome);
        };

        let adjusted = gateway::call(gateway, &adjustment)
            .await
            .and_then(|reply| match reply.ok {
                Some(false) => Err(EngineError::Rejected(
                    reply
                        .mensaje
                        .unwrap_or_else(|| "Movimiento rechazado".to_string()),
                )),
                _ => Ok(()),
            });

        match adjusted {
            Ok(()) => {
                outcome.adjusted = true;
                self.last_outcome = Some(outcome.clone());
                tracing::info!(difference = %outcome.difference.amount, "closing adjusted");
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!("closing recorded but adjustment failed: {err}");
                Err(EngineError::AdjustmentFailed {
                    difference: outcome.difference.amount,
                    reason: err.to_string(),
                })
            }
        }
    }
}

fn outcome_from_reply(
    reply: &ClosingRecorded,
    physical: Money,
    local_system: Option<Money>,
) -> ClosingOutcome {
    let physical = if reply.efectivo_fisico > 0.0 {
        Money::from_major(reply.efectivo_fisico)
    } else {
        physical
    };
    let system = reply
        .efectivo_sistema
        .map(Money::from_major)
        .or(local_system);
    let amount = match (reply.diferencia, system) {
        (Some(diferencia), _) => Money::from_major(diferencia),
        (None, Some(system)) => physical - system,
        (None, None) => {
            tracing::warn!("closing reply without difference and no local balance");
            Money::ZERO
        }
    };
    let classification = match Classification::from_label(&reply.resultado) {
        Some(label) if reply.diferencia.is_some() => label,
        _ => Classification::of(amount),
    };

    ClosingOutcome {
        physical,
        system: system.unwrap_or(physical - amount),
        difference: Difference {
            amount,
            classification,
        },
        adjusted: false,
    }
}
