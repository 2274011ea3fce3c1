//! Application state of the register and the actions that mutate it.
//!
//! [`CashDesk`] owns every engine and the gateway; the front end holds one
//! instance and drives it from key presses and timer ticks.

use std::sync::Arc;

use api_types::{
    balance::{CashStatus, CashStatusGet},
    movement::{MovementView, MovementsGet},
    reconciliation::{ExpectedCashGet, ExpectedCashReply},
};
use chrono::NaiveDate;

use crate::{
    ClosingEngine, ClosingOutcome, DenominationLedger, Difference, EngineError, Money,
    ReconciliationEngine, ReconciliationOutcome, Shift,
    closing::compute_difference,
    gateway::{self, Gateway},
    movements::MovementDraft,
    reconciliation::{ExpectedCash, ExpectedOutcome, Selection},
    sequence::{FetchTicket, Sequencer},
};

/// Running totals reported by the service. Read-only on the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CashBalance {
    pub cash: Money,
    pub checks: Money,
    pub bank: Money,
    pub total: Money,
}

impl From<CashStatus> for CashBalance {
    fn from(status: CashStatus) -> Self {
        Self {
            cash: Money::from_major(status.efectivo),
            checks: Money::from_major(status.cheques),
            bank: Money::from_major(status.banco),
            total: Money::from_major(status.total),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub balance: Option<CashBalance>,
    pub ledger: DenominationLedger,
    pub reconciliation: ReconciliationEngine,
    pub closing: ClosingEngine,
    pub movements: Vec<MovementView>,
}

pub struct CashDesk<G: Gateway + ?Sized> {
    gateway: Arc<G>,
    actor: String,
    state: AppState,
    balance_fetches: Sequencer,
    movement_fetches: Sequencer,
}

impl<G: Gateway + ?Sized> CashDesk<G> {
    pub fn new(gateway: Arc<G>, actor: impl Into<String>, selection: Selection) -> Self {
        Self::with_ledger(gateway, actor, selection, DenominationLedger::default())
    }

    pub fn with_ledger(
        gateway: Arc<G>,
        actor: impl Into<String>,
        selection: Selection,
        ledger: DenominationLedger,
    ) -> Self {
        Self {
            gateway,
            actor: actor.into(),
            state: AppState {
                balance: None,
                ledger,
                reconciliation: ReconciliationEngine::new(selection),
                closing: ClosingEngine::default(),
                movements: Vec::new(),
            },
            balance_fetches: Sequencer::default(),
            movement_fetches: Sequencer::default(),
        }
    }

    pub fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway)
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    // ---- bill counter ----

    pub fn set_quantity(&mut self, face: i64, raw: &str) -> Result<Money, EngineError> {
        self.state.ledger.set_quantity(face, raw)
    }

    pub fn reset_count(&mut self) {
        self.state.ledger.reset();
    }

    // ---- balance ----

    pub fn begin_balance_refresh(&mut self) -> (FetchTicket, CashStatusGet) {
        (self.balance_fetches.issue(), CashStatusGet::default())
    }

    /// Returns `Ok(false)` when the response was stale.
    pub fn apply_balance(
        &mut self,
        ticket: FetchTicket,
        result: Result<CashStatus, EngineError>,
    ) -> Result<bool, EngineError> {
        if !self.balance_fetches.accept(ticket) {
            return Ok(false);
        }
        self.state.balance = Some(result?.into());
        Ok(true)
    }

    pub async fn refresh_balance(&mut self) -> Result<CashBalance, EngineError> {
        let (ticket, request) = self.begin_balance_refresh();
        let result = gateway::call(self.gateway.as_ref(), &request).await;
        self.apply_balance(ticket, result)?;
        self.state
            .balance
            .ok_or_else(|| EngineError::Transport("balance not loaded".to_string()))
    }

    // ---- day movements ----

    pub fn begin_movements_refresh(&mut self, date: NaiveDate) -> (FetchTicket, MovementsGet) {
        (self.movement_fetches.issue(), MovementsGet { fecha_str: date })
    }

    pub fn apply_movements(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<MovementView>, EngineError>,
    ) -> Result<bool, EngineError> {
        if !self.movement_fetches.accept(ticket) {
            return Ok(false);
        }
        self.state.movements = result?;
        Ok(true)
    }

    pub async fn refresh_movements(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        let (ticket, request) = self.begin_movements_refresh(date);
        let result = gateway::call(self.gateway.as_ref(), &request).await;
        self.apply_movements(ticket, result).map(|_| ())
    }

    /// Registers a manual movement and refreshes the balance once.
    pub async fn register_movement(
        &mut self,
        draft: &MovementDraft,
        shift: Option<Shift>,
    ) -> Result<(), EngineError> {
        let request = draft.validate(&self.actor, shift)?;
        tracing::info!(
            kind = request.tipo.label(),
            amount = request.importe,
            category = %request.categoria,
            "registering movement"
        );
        let reply = gateway::call(self.gateway.as_ref(), &request).await?;
        if reply.ok == Some(false) {
            return Err(EngineError::Rejected(
                reply
                    .mensaje
                    .unwrap_or_else(|| "No se pudo registrar el movimiento.".to_string()),
            ));
        }
        self.refresh_after_mutation().await;
        Ok(())
    }

    // ---- reconciliation ----

    pub fn select(&mut self, selection: Selection) -> Result<(), EngineError> {
        self.state.reconciliation.select(selection)
    }

    pub fn seed_expected(&mut self, expected: ExpectedCash) -> bool {
        self.state.reconciliation.seed(expected)
    }

    pub fn begin_expected_load(&mut self) -> (FetchTicket, ExpectedCashGet) {
        self.state.reconciliation.begin_load()
    }

    pub fn apply_expected(
        &mut self,
        ticket: FetchTicket,
        result: Result<ExpectedCashReply, EngineError>,
    ) -> Result<Option<ExpectedOutcome>, EngineError> {
        self.state.reconciliation.apply_expected(ticket, result)
    }

    pub async fn load_expected(&mut self) -> Result<ExpectedOutcome, EngineError> {
        self.state
            .reconciliation
            .load_expected(self.gateway.as_ref())
            .await
    }

    pub fn preview_reconciliation(&self) -> Option<Difference> {
        self.state
            .reconciliation
            .preview(self.state.ledger.total())
    }

    pub fn can_reconcile(&self) -> bool {
        self.state
            .reconciliation
            .can_submit(self.state.ledger.total())
    }

    /// Submits the bill count; on success the counter is cleared and the
    /// balance refreshed once.
    pub async fn reconcile(&mut self) -> Result<ReconciliationOutcome, EngineError> {
        let outcome = self
            .state
            .reconciliation
            .submit(self.gateway.as_ref(), &mut self.state.ledger, &self.actor)
            .await?;
        self.refresh_after_mutation().await;
        Ok(outcome)
    }

    // ---- closing ----

    /// `None` until a balance has been loaded.
    pub fn preview_closing(&self, physical: Money) -> Option<Difference> {
        self.state
            .balance
            .map(|balance| compute_difference(physical, balance.cash))
    }

    /// Records the closing count. The balance is refreshed whenever the
    /// closing itself was recorded, including a failed adjustment.
    pub async fn close_day(
        &mut self,
        physical: Money,
        shift: Option<Shift>,
    ) -> Result<ClosingOutcome, EngineError> {
        let system = self.state.balance.map(|balance| balance.cash);
        let result = self
            .state
            .closing
            .submit(self.gateway.as_ref(), physical, &self.actor, shift, system)
            .await;
        if matches!(&result, Ok(_) | Err(EngineError::AdjustmentFailed { .. })) {
            self.refresh_after_mutation().await;
        }
        result
    }

    async fn refresh_after_mutation(&mut self) {
        if let Err(err) = self.refresh_balance().await {
            tracing::warn!("balance refresh after mutation failed: {err}");
        }
    }
}
