mod forms;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use api_types::{
    Operation,
    balance::CashStatus,
    movement::MovementView,
    reconciliation::ExpectedCashReply,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::{
    CashDesk, EngineError, ExpectedOutcome, Money, ReconciliationState, Selection, Shift,
    movements::MovementDraft, sequence::FetchTicket, shift_at,
};
use tokio::sync::mpsc;

use crate::{
    client::HttpGateway,
    config::AppConfig,
    error::{AppError, Result},
    local_state::DayCache,
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

use forms::{Catalogs, ClosingForm, CountForm, MovementForm};
pub use forms::MovementField;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Caja,
    Movimiento,
    Rendicion,
    Arqueo,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Self::Caja,
        Self::Movimiento,
        Self::Rendicion,
        Self::Arqueo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Caja => "Caja",
            Self::Movimiento => "Movimiento",
            Self::Rendicion => "Rendición",
            Self::Arqueo => "Arqueo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub shown_at: Instant,
}

pub struct AppState {
    pub desk: CashDesk<HttpGateway>,
    pub section: Section,
    pub count: CountForm,
    pub movement: MovementForm,
    pub closing: ClosingForm,
    pub catalogs: Catalogs,
    pub toast: Option<ToastState>,
    /// Label of the submission in flight, if any.
    pub busy: Option<&'static str>,
    pub connected: bool,
    pub last_refresh: Option<DateTime<Tz>>,
    pub surplus_limit: Money,
}

/// Poll results coming back from spawned fetch tasks.
enum Fetched {
    Balance(FetchTicket, std::result::Result<CashStatus, EngineError>),
    Movements(FetchTicket, std::result::Result<Vec<MovementView>, EngineError>),
    Expected(FetchTicket, std::result::Result<ExpectedCashReply, EngineError>),
}

/// Submission waiting for the next frame so the busy label gets drawn first.
enum Pending {
    Reconcile,
    Close(Money),
    Movement(MovementDraft),
}

pub struct App {
    config: AppConfig,
    tz: Tz,
    pub state: AppState,
    cache: DayCache,
    fetch_tx: mpsc::UnboundedSender<Fetched>,
    fetch_rx: mpsc::UnboundedReceiver<Fetched>,
    last_poll: Option<Instant>,
    skip_expected_fetch: bool,
    pending: Option<Pending>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let tz = config.tz()?;
        let gateway = HttpGateway::new(&config.base_url, config.timeout())?;
        tracing::info!(endpoint = %gateway.endpoint(), usuario = %config.usuario, "starting");

        let now = Utc::now().with_timezone(&tz);
        let today = now.date_naive();
        let selection = Selection {
            date: today,
            shift: shift_at(now.time()),
            handler: config.repartidor.trim().to_string(),
        };

        let cache = DayCache::load(&config.state_path, today).unwrap_or_else(|err| {
            tracing::warn!("ignoring unreadable day cache: {err}");
            DayCache::default()
        });
        let mut desk = CashDesk::new(Arc::new(gateway), config.usuario.trim(), selection.clone());
        let seeded = cache
            .valid_for(today, selection.shift, &selection.handler)
            .cloned()
            .is_some_and(|expected| desk.seed_expected(expected));
        if seeded {
            tracing::info!("expected cash restored from day cache");
        }

        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let state = AppState {
            desk,
            section: Section::Caja,
            count: CountForm {
                handler_input: selection.handler.clone(),
                ..CountForm::default()
            },
            movement: MovementForm::default(),
            closing: ClosingForm::default(),
            catalogs: Catalogs {
                proveedores: config.proveedores.clone(),
                vehiculos: config.vehiculos.clone(),
                empleados: config.empleados.clone(),
            },
            toast: None,
            busy: None,
            connected: true,
            last_refresh: None,
            surplus_limit: config.surplus_limit(),
        };

        let mut app = Self {
            config,
            tz,
            state,
            cache,
            fetch_tx,
            fetch_rx,
            last_poll: None,
            skip_expected_fetch: seeded,
            pending: None,
            should_quit: false,
        };
        if app.state.desk.actor().is_empty() {
            app.toast(ToastLevel::Error, "Falta configurar el usuario.");
        }
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        tracing::info!("stopped");
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.drain_fetches();
            self.expire_toast();
            if self.poll_due() {
                self.poll();
            }

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if let Some(pending) = self.pending.take() {
                self.execute(pending).await;
                self.state.busy = None;
                continue;
            }

            if event::poll(tick_rate)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key);
            }
        }

        Ok(())
    }

    // ---- polling ----

    fn poll_due(&self) -> bool {
        self.last_poll
            .is_none_or(|last| last.elapsed() >= self.config.poll_interval())
    }

    fn poll(&mut self) {
        self.last_poll = Some(Instant::now());
        self.roll_date();

        let (ticket, request) = self.state.desk.begin_balance_refresh();
        self.spawn_fetch(request, move |result| Fetched::Balance(ticket, result));
        self.fetch_movements();

        if self.skip_expected_fetch {
            self.skip_expected_fetch = false;
        } else if matches!(
            self.state.desk.state().reconciliation.state(),
            ReconciliationState::NoExpectation | ReconciliationState::Resolved
        ) {
            self.fetch_expected();
        }
    }

    fn fetch_movements(&mut self) {
        let date = self.state.desk.state().reconciliation.selection().date;
        let (ticket, request) = self.state.desk.begin_movements_refresh(date);
        self.spawn_fetch(request, move |result| Fetched::Movements(ticket, result));
    }

    fn fetch_expected(&mut self) {
        let (ticket, request) = self.state.desk.begin_expected_load();
        self.spawn_fetch(request, move |result| Fetched::Expected(ticket, result));
    }

    fn spawn_fetch<O, F>(&self, request: O, wrap: F)
    where
        O: Operation + Send + Sync + 'static,
        O::Reply: Send + 'static,
        F: FnOnce(std::result::Result<O::Reply, EngineError>) -> Fetched + Send + 'static,
    {
        let gateway = self.state.desk.gateway();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = engine::gateway::call(gateway.as_ref(), &request).await;
            if tx.send(wrap(result)).is_err() {
                tracing::debug!(operation = O::NAME, "fetch finished after shutdown");
            }
        });
    }

    fn drain_fetches(&mut self) {
        while let Ok(fetched) = self.fetch_rx.try_recv() {
            self.apply_fetched(fetched);
        }
    }

    fn apply_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Balance(ticket, result) => {
                let applied = self.state.desk.apply_balance(ticket, result);
                self.note_refresh(applied);
            }
            Fetched::Movements(ticket, result) => {
                let applied = self.state.desk.apply_movements(ticket, result);
                self.note_refresh(applied);
            }
            Fetched::Expected(ticket, result) => match self.state.desk.apply_expected(ticket, result) {
                Ok(Some(outcome)) => {
                    self.state.connected = true;
                    self.remember(&outcome);
                }
                Ok(None) => {}
                Err(err) => self.fetch_failed(err),
            },
        }
    }

    fn note_refresh(&mut self, applied: std::result::Result<bool, EngineError>) {
        match applied {
            Ok(true) => {
                self.state.connected = true;
                self.state.last_refresh = Some(self.now());
            }
            Ok(false) => {}
            Err(err) => self.fetch_failed(err),
        }
    }

    fn fetch_failed(&mut self, err: EngineError) {
        tracing::warn!("refresh failed: {err}");
        if err.is_retryable() {
            // One notice per outage; the status bar shows the rest.
            if self.state.connected {
                self.toast_error(&err);
            }
            self.state.connected = false;
        } else {
            self.toast_error(&err);
        }
    }

    fn remember(&mut self, outcome: &ExpectedOutcome) {
        match outcome {
            ExpectedOutcome::Found(expected) => self.cache.remember(expected.clone()),
            ExpectedOutcome::NotFound(_) | ExpectedOutcome::AlreadyReconciled(_) => {
                self.cache.forget()
            }
        }
        self.save_cache();
    }

    fn save_cache(&self) {
        if let Err(err) = self.cache.save(&self.config.state_path) {
            tracing::warn!("cannot save day cache: {err}");
        }
    }

    // ---- selection ----

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    fn current_shift(&self) -> Shift {
        shift_at(self.now().time())
    }

    /// Moves the reconciliation to the new local date after midnight.
    fn roll_date(&mut self) {
        let today = self.now().date_naive();
        if today != self.state.desk.state().reconciliation.selection().date {
            tracing::info!(%today, "date changed");
            self.change_selection(|selection| selection.date = today);
        }
    }

    fn change_selection(&mut self, update: impl FnOnce(&mut Selection)) {
        let mut selection = self.state.desk.state().reconciliation.selection().clone();
        update(&mut selection);
        if let Err(err) = self.state.desk.select(selection.clone()) {
            self.toast_error(&err);
            return;
        }
        self.state.count.confirming = false;
        let cached = self
            .cache
            .valid_for(selection.date, selection.shift, &selection.handler)
            .cloned();
        let seeded = cached.is_some_and(|expected| self.state.desk.seed_expected(expected));
        if !seeded {
            self.fetch_expected();
        }
    }

    // ---- submissions ----

    async fn execute(&mut self, pending: Pending) {
        match pending {
            Pending::Reconcile => match self.state.desk.reconcile().await {
                Ok(outcome) => {
                    self.toast(
                        ToastLevel::Success,
                        format!("Rendición registrada: {}", outcome.difference.summary()),
                    );
                    self.cache.forget();
                    self.save_cache();
                    self.after_mutation();
                }
                Err(err) => self.toast_error(&err),
            },
            Pending::Close(physical) => match self
                .state
                .desk
                .close_day(physical, Some(self.current_shift()))
                .await
            {
                Ok(outcome) => {
                    self.state.closing.input.clear();
                    self.toast(
                        ToastLevel::Success,
                        format!("Arqueo registrado: {}", outcome.difference.summary()),
                    );
                    self.after_mutation();
                }
                Err(err) => {
                    if matches!(err, EngineError::AdjustmentFailed { .. }) {
                        self.state.closing.input.clear();
                        self.after_mutation();
                    }
                    self.toast_error(&err);
                }
            },
            Pending::Movement(draft) => {
                let shift = self.current_shift();
                match self.state.desk.register_movement(&draft, Some(shift)).await {
                    Ok(()) => {
                        self.state.movement.reset();
                        self.toast(ToastLevel::Success, "Movimiento registrado.");
                        self.after_mutation();
                    }
                    Err(err) => self.toast_error(&err),
                }
            }
        }
    }

    fn after_mutation(&mut self) {
        if self.state.desk.state().balance.is_some() {
            self.state.last_refresh = Some(self.now());
        }
        self.fetch_movements();
    }

    fn submit(&mut self, pending: Pending, label: &'static str) {
        self.state.busy = Some(label);
        self.pending = Some(pending);
    }

    // ---- keys ----

    fn handle_key(&mut self, key: KeyEvent) {
        match map_key(key) {
            AppAction::Quit => self.should_quit = true,
            AppAction::GoTo(index) => {
                if let Some(section) = Section::ALL.get(index) {
                    self.state.section = *section;
                }
            }
            AppAction::None => {}
            action => match self.state.section {
                Section::Caja => self.handle_caja(action),
                Section::Movimiento => self.handle_movement(action),
                Section::Rendicion => self.handle_count(action),
                Section::Arqueo => self.handle_closing(action),
            },
        }
    }

    fn handle_caja(&mut self, action: AppAction) {
        match action {
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('r') => self.poll(),
            AppAction::Input(ch @ '1'..='4') => {
                let index = ch as usize - '1' as usize;
                self.state.section = Section::ALL[index];
            }
            _ => {}
        }
    }

    fn handle_count(&mut self, action: AppAction) {
        if self.state.count.editing_handler {
            self.handle_handler_input(action);
            return;
        }
        let rows = self.state.desk.state().ledger.rows().len();
        match action {
            AppAction::Up => self.state.count.select_prev(),
            AppAction::Down => self.state.count.select_next(rows),
            AppAction::Input(ch) if ch.is_ascii_digit() => {
                self.edit_quantity(|quantity| forms::push_digit(quantity, ch));
            }
            AppAction::Backspace => self.edit_quantity(forms::pop_digit),
            AppAction::Input('t') => self.change_selection(|selection| {
                selection.shift = selection.shift.toggle();
            }),
            AppAction::Input('d') | AppAction::NextField => {
                self.state.count.handler_input = self
                    .state
                    .desk
                    .state()
                    .reconciliation
                    .selection()
                    .handler
                    .clone();
                self.state.count.editing_handler = true;
            }
            AppAction::Input('l') => self.fetch_expected(),
            AppAction::Input('c') => {
                self.state.desk.reset_count();
                self.state.count.confirming = false;
            }
            AppAction::Submit => self.submit_reconciliation(),
            AppAction::Cancel => self.state.count.confirming = false,
            _ => {}
        }
    }

    fn handle_handler_input(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.state.count.handler_input.push(ch),
            AppAction::Backspace => {
                self.state.count.handler_input.pop();
            }
            AppAction::Submit | AppAction::NextField => {
                self.state.count.editing_handler = false;
                let handler = self.state.count.handler_input.trim().to_string();
                self.change_selection(|selection| selection.handler = handler);
            }
            AppAction::Cancel => self.state.count.editing_handler = false,
            _ => {}
        }
    }

    fn edit_quantity(&mut self, edit: impl FnOnce(u64) -> String) {
        let Some(row) = self
            .state
            .desk
            .state()
            .ledger
            .rows()
            .get(self.state.count.selected)
            .copied()
        else {
            return;
        };
        let raw = edit(row.quantity);
        if let Err(err) = self.state.desk.set_quantity(row.face, &raw) {
            self.toast_error(&err);
        }
        self.state.count.confirming = false;
    }

    fn submit_reconciliation(&mut self) {
        if self.state.count.confirming {
            self.state.count.confirming = false;
            self.submit(Pending::Reconcile, "Procesando rendición...");
            return;
        }
        if !self.state.desk.can_reconcile() {
            let message = match self.state.desk.state().reconciliation.state() {
                ReconciliationState::NoExpectation => EngineError::NoExpectation.user_message(),
                ReconciliationState::Resolved => "La rendición ya fue procesada.".to_string(),
                ReconciliationState::Submitting => EngineError::Busy.user_message(),
                ReconciliationState::Pending => "Ingresá el conteo de billetes.".to_string(),
            };
            self.toast(ToastLevel::Info, message);
            return;
        }
        let needs_confirmation = self
            .state
            .desk
            .preview_reconciliation()
            .is_some_and(|difference| difference.needs_confirmation(self.state.surplus_limit));
        if needs_confirmation {
            self.state.count.confirming = true;
            self.toast(
                ToastLevel::Info,
                "Sobrante alto: Enter para confirmar, Esc para revisar.",
            );
            return;
        }
        self.submit(Pending::Reconcile, "Procesando rendición...");
    }

    fn handle_closing(&mut self, action: AppAction) {
        let form = &mut self.state.closing;
        match action {
            AppAction::Input(ch) if ch.is_ascii_digit() || ch == ',' || ch == '.' => {
                form.input.push(ch);
                form.confirming = false;
            }
            AppAction::Backspace => {
                form.input.pop();
                form.confirming = false;
            }
            AppAction::Input('b') => {
                let counted = self.state.desk.state().ledger.total();
                self.state.closing.input = counted.format();
                self.state.closing.confirming = false;
            }
            AppAction::Cancel => form.confirming = false,
            AppAction::Submit => self.submit_closing(),
            _ => {}
        }
    }

    fn submit_closing(&mut self) {
        if self.state.desk.state().closing.is_closed() {
            self.toast_error(&EngineError::DayClosed);
            return;
        }
        let physical = match Money::parse_input(&self.state.closing.input) {
            Ok(physical) => physical,
            Err(err) => {
                self.toast_error(&err);
                return;
            }
        };
        if !self.state.closing.confirming {
            self.state.closing.confirming = true;
            self.toast(
                ToastLevel::Info,
                format!("Cerrar caja con {physical}: Enter para confirmar."),
            );
            return;
        }
        self.state.closing.confirming = false;
        self.submit(Pending::Close(physical), "Registrando arqueo...");
    }

    fn handle_movement(&mut self, action: AppAction) {
        let form = &mut self.state.movement;
        match action {
            AppAction::NextField => form.focus_next(),
            AppAction::PrevField => form.focus_prev(),
            AppAction::Left => form.cycle(false),
            AppAction::Right if form.focus == MovementField::Subject => {
                form.accept_suggestion(&self.state.catalogs);
            }
            AppAction::Right => form.cycle(true),
            AppAction::Up if form.focus == MovementField::Subject => {
                form.suggestion = form.suggestion.saturating_sub(1);
            }
            AppAction::Down if form.focus == MovementField::Subject => {
                let available = form.suggestions(&self.state.catalogs).len();
                if form.suggestion + 1 < available {
                    form.suggestion += 1;
                }
            }
            AppAction::Input(ch) => {
                if let Some(text) = form.text_mut() {
                    text.push(ch);
                    form.suggestion = 0;
                }
            }
            AppAction::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                    form.suggestion = 0;
                }
            }
            AppAction::Cancel => form.reset(),
            AppAction::Submit => match form.to_draft() {
                Ok(draft) => self.submit(Pending::Movement(draft), "Registrando movimiento..."),
                Err(err) => self.toast_error(&err),
            },
            _ => {}
        }
    }

    // ---- toasts ----

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    fn toast_error(&mut self, err: &EngineError) {
        self.toast(ToastLevel::Error, err.user_message());
    }

    fn expire_toast(&mut self) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.shown_at.elapsed() >= TOAST_TTL)
        {
            self.state.toast = None;
        }
    }
}
