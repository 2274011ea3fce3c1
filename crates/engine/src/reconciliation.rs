//! Driver cash reconciliation ("rendición").
//!
//! The engine holds the expected amount for one date, shift and driver,
//! previews the difference against the bill counter, and submits the counted
//! amount. The service is the source of truth for the persisted difference and
//! posts the compensating ledger movement itself; the client only reflects the
//! reply.

use api_types::reconciliation::{
    ExpectedCashGet, ExpectedCashReply, ReconciliationProcess, ReconciliationProcessed,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    Classification, DenominationLedger, Difference, EngineError, Money, Shift,
    gateway::{self, Gateway},
    sequence::{FetchTicket, Sequencer},
};

const REJECTED_FALLBACK: &str = "No se pudo procesar la rendición.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconciliationState {
    /// Nothing loaded, or no record exists for the selection.
    NoExpectation,
    /// Expected amount loaded; waiting for the count and confirmation.
    Pending,
    /// Submission in flight.
    Submitting,
    /// The service accepted the reconciliation.
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconciliationEvent {
    ExpectedFound,
    ExpectedMissing,
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed,
}

/// Pure transition function. Events that do not apply keep the state.
pub fn transition(state: ReconciliationState, event: ReconciliationEvent) -> ReconciliationState {
    use ReconciliationEvent as E;
    use ReconciliationState as S;

    match (state, event) {
        (S::Submitting, E::SubmitSucceeded) => S::Resolved,
        (S::Submitting, E::SubmitFailed) => S::Pending,
        (S::Submitting, _) => S::Submitting,
        (S::Pending, E::SubmitStarted) => S::Submitting,
        (_, E::ExpectedFound) => S::Pending,
        (_, E::ExpectedMissing) => S::NoExpectation,
        (state, _) => state,
    }
}

/// Which reconciliation is being worked on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub date: NaiveDate,
    pub shift: Shift,
    pub handler: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCash {
    pub amount: Money,
    pub date: NaiveDate,
    pub shift: Shift,
    pub handler: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpectedOutcome {
    Found(ExpectedCash),
    /// No record yet; carries the service message when there is one.
    NotFound(Option<String>),
    /// The record that was just reconciled; it does not reopen the engine.
    AlreadyReconciled(ExpectedCash),
}

/// Authoritative result returned by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    pub counted: Money,
    pub expected: Money,
    pub difference: Difference,
    pub reconciliation_id: Option<String>,
    pub movement_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    state: ReconciliationState,
    selection: Selection,
    expected: Option<ExpectedCash>,
    not_found_message: Option<String>,
    last_outcome: Option<ReconciliationOutcome>,
    fetches: Sequencer,
}

impl ReconciliationEngine {
    pub fn new(selection: Selection) -> Self {
        Self {
            state: ReconciliationState::NoExpectation,
            selection,
            expected: None,
            not_found_message: None,
            last_outcome: None,
            fetches: Sequencer::default(),
        }
    }

    pub fn state(&self) -> ReconciliationState {
        self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn expected(&self) -> Option<&ExpectedCash> {
        self.expected.as_ref()
    }

    pub fn not_found_message(&self) -> Option<&str> {
        self.not_found_message.as_deref()
    }

    pub fn last_outcome(&self) -> Option<&ReconciliationOutcome> {
        self.last_outcome.as_ref()
    }

    /// Switches to another date, shift or driver. Outstanding fetches become
    /// stale and the cached amount of the previous selection is dropped.
    pub fn select(&mut self, selection: Selection) -> Result<(), EngineError> {
        if self.state == ReconciliationState::Submitting {
            return Err(EngineError::Busy);
        }
        if selection == self.selection {
            return Ok(());
        }
        tracing::debug!(?selection, "reconciliation selection changed");
        self.selection = selection;
        self.fetches.invalidate();
        self.expected = None;
        self.not_found_message = None;
        self.last_outcome = None;
        self.state = transition(self.state, ReconciliationEvent::ExpectedMissing);
        Ok(())
    }

    /// Uses a previously seen expectation without fetching. Ignored when it
    /// belongs to another selection or was already reconciled.
    pub fn seed(&mut self, expected: ExpectedCash) -> bool {
        let matches = expected.date == self.selection.date
            && expected.shift == self.selection.shift
            && expected.handler == self.selection.handler;
        if !matches
            || self.state == ReconciliationState::Submitting
            || self.is_reconciled(&expected)
        {
            return false;
        }
        self.expected = Some(expected);
        self.not_found_message = None;
        self.state = transition(self.state, ReconciliationEvent::ExpectedFound);
        true
    }

    /// Starts a fetch: returns its ticket and the request to send.
    pub fn begin_load(&mut self) -> (FetchTicket, ExpectedCashGet) {
        let handler = self.selection.handler.trim();
        let request = ExpectedCashGet {
            fecha_str: self.selection.date,
            turno: self.selection.shift,
            repartidor: (!handler.is_empty()).then(|| handler.to_string()),
        };
        (self.fetches.issue(), request)
    }

    /// Applies a fetch result. `Ok(None)` means the response was stale and
    /// ignored. Errors leave the engine untouched.
    pub fn apply_expected(
        &mut self,
        ticket: FetchTicket,
        result: Result<ExpectedCashReply, EngineError>,
    ) -> Result<Option<ExpectedOutcome>, EngineError> {
        if self.state == ReconciliationState::Submitting || !self.fetches.accept(ticket) {
            return Ok(None);
        }
        let reply = result?;

        let outcome = if reply.is_found() {
            let handler = reply
                .repartidor
                .filter(|handler| !handler.trim().is_empty())
                .unwrap_or_else(|| self.selection.handler.clone());
            let expected = ExpectedCash {
                amount: Money::from_major(reply.efectivo_esperado.unwrap_or_default()),
                date: self.selection.date,
                shift: self.selection.shift,
                handler,
            };
            if self.is_reconciled(&expected) {
                tracing::debug!(selection = ?self.selection, "expected cash already reconciled");
                return Ok(Some(ExpectedOutcome::AlreadyReconciled(expected)));
            }
            tracing::info!(amount = %expected.amount, "expected cash loaded");
            self.expected = Some(expected.clone());
            self.not_found_message = None;
            self.state = transition(self.state, ReconciliationEvent::ExpectedFound);
            ExpectedOutcome::Found(expected)
        } else {
            tracing::info!(selection = ?self.selection, "no expected cash for selection");
            self.expected = None;
            self.not_found_message = reply.mensaje.clone();
            self.state = transition(self.state, ReconciliationEvent::ExpectedMissing);
            ExpectedOutcome::NotFound(reply.mensaje)
        };
        Ok(Some(outcome))
    }

    /// Fetches the expected amount for the current selection.
    pub async fn load_expected<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<ExpectedOutcome, EngineError> {
        let (ticket, request) = self.begin_load();
        let result = gateway::call(gateway, &request).await;
        self.apply_expected(ticket, result)?
            .ok_or_else(|| EngineError::Transport("response superseded".to_string()))
    }

    /// A resolved reconciliation stays resolved while the service keeps
    /// reporting the same date, shift and driver.
    fn is_reconciled(&self, expected: &ExpectedCash) -> bool {
        self.state == ReconciliationState::Resolved
            && self.expected.as_ref().is_some_and(|resolved| {
                resolved.date == expected.date
                    && resolved.shift == expected.shift
                    && resolved.handler == expected.handler
            })
    }

    /// Local preview of `counted - expected`. Never persisted.
    pub fn preview(&self, counted: Money) -> Option<Difference> {
        self.expected
            .as_ref()
            .map(|expected| Difference::between(counted, expected.amount))
    }

    pub fn can_submit(&self, counted: Money) -> bool {
        self.state == ReconciliationState::Pending && counted.is_positive()
    }

    /// Submits the counted total. On success the ledger is reset; on failure
    /// it is kept so the count is not lost.
    pub async fn submit<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        ledger: &mut DenominationLedger,
        actor: &str,
    ) -> Result<ReconciliationOutcome, EngineError> {
        match self.state {
            ReconciliationState::Submitting => return Err(EngineError::Busy),
            ReconciliationState::NoExpectation => return Err(EngineError::NoExpectation),
            ReconciliationState::Resolved => {
                return Err(EngineError::Validation(
                    "La rendición ya fue procesada.".to_string(),
                ));
            }
            ReconciliationState::Pending => {}
        }
        let expected = self.expected.clone().ok_or(EngineError::NoExpectation)?;
        let counted = ledger.total();
        if !counted.is_positive() {
            return Err(EngineError::Validation(
                "El contador de billetes todavía está en cero.".to_string(),
            ));
        }
        if actor.trim().is_empty() {
            return Err(EngineError::Validation("Falta el usuario.".to_string()));
        }

        self.state = transition(self.state, ReconciliationEvent::SubmitStarted);
        self.fetches.invalidate();
        tracing::info!(%counted, expected = %expected.amount, "submitting reconciliation");

        let request = ReconciliationProcess {
            fecha_str: expected.date,
            turno: expected.shift,
            repartidor: expected.handler.clone(),
            efectivo_contado: counted.to_major(),
            efectivo_esperado: expected.amount.to_major(),
            usuario: actor.to_string(),
        };
        let result = gateway::call(gateway, &request)
            .await
            .and_then(|reply| outcome_from_reply(reply, counted, expected.amount));

        match result {
            Ok(outcome) => {
                self.state = transition(self.state, ReconciliationEvent::SubmitSucceeded);
                ledger.reset();
                self.last_outcome = Some(outcome.clone());
                tracing::info!(
                    difference = %outcome.difference.amount,
                    classification = %outcome.difference.classification,
                    "reconciliation resolved"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.state = transition(self.state, ReconciliationEvent::SubmitFailed);
                tracing::warn!("reconciliation failed: {err}");
                Err(err)
            }
        }
    }
}

fn outcome_from_reply(
    reply: ReconciliationProcessed,
    counted: Money,
    expected: Money,
) -> Result<ReconciliationOutcome, EngineError> {
    if !reply.ok {
        let message = reply
            .mensaje
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| REJECTED_FALLBACK.to_string());
        return Err(EngineError::Rejected(message));
    }

    let amount = Money::from_major(reply.diferencia);
    let classification = reply
        .tipo_diferencia
        .as_deref()
        .and_then(Classification::from_label)
        .unwrap_or_else(|| Classification::of(amount));

    Ok(ReconciliationOutcome {
        counted,
        expected,
        difference: Difference {
            amount,
            classification,
        },
        reconciliation_id: reply.id_rendicion.map(opaque_id),
        movement_id: reply.mov_principal_id.map(opaque_id),
    })
}

fn opaque_id(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(id) => id,
        other => other.to_string(),
    }
}
