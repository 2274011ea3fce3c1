use engine::{
    Money,
    movements::{MovementDraft, MovementKind, PaymentFields, PaymentMethod, QuickAction, Subject, suggest},
};

/// Supplier, vehicle and employee names offered by the movement form.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub proveedores: Vec<String>,
    pub vehiculos: Vec<String>,
    pub empleados: Vec<String>,
}

impl Catalogs {
    pub fn for_subject(&self, subject: Subject) -> &[String] {
        match subject {
            Subject::Supplier => &self.proveedores,
            Subject::Vehicle => &self.vehiculos,
            Subject::Employee => &self.empleados,
        }
    }
}

/// Cursor and prompts of the bill counter / reconciliation screen.
#[derive(Debug, Default)]
pub struct CountForm {
    pub selected: usize,
    pub handler_input: String,
    pub editing_handler: bool,
    pub confirming: bool,
}

impl CountForm {
    pub fn select_next(&mut self, rows: usize) {
        if rows == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(rows - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Text of a quantity cell after typing `digit`.
pub fn push_digit(quantity: u64, digit: char) -> String {
    if quantity == 0 {
        digit.to_string()
    } else {
        format!("{quantity}{digit}")
    }
}

/// Text of a quantity cell after a backspace. Empty means zero.
pub fn pop_digit(quantity: u64) -> String {
    let mut raw = quantity.to_string();
    raw.pop();
    raw
}

#[derive(Debug, Default)]
pub struct ClosingForm {
    pub input: String,
    pub confirming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementField {
    Action,
    Kind,
    Payment,
    Amount,
    Subject,
    Bank,
    Cheque,
    Observation,
}

impl MovementField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Action => "Acción",
            Self::Kind => "Tipo",
            Self::Payment => "Forma de pago",
            Self::Amount => "Importe",
            Self::Subject => "Destinatario",
            Self::Bank => "Banco",
            Self::Cheque => "Nº cheque",
            Self::Observation => "Observación",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::Amount | Self::Subject | Self::Bank | Self::Cheque | Self::Observation
        )
    }
}

#[derive(Debug)]
pub struct MovementForm {
    pub draft: MovementDraft,
    pub amount_input: String,
    pub focus: MovementField,
    pub suggestion: usize,
}

impl Default for MovementForm {
    fn default() -> Self {
        Self {
            draft: MovementDraft::new(QuickAction::SupplierPayment),
            amount_input: String::new(),
            focus: MovementField::Action,
            suggestion: 0,
        }
    }
}

impl MovementForm {
    /// Fields shown for the current action and payment method, in tab order.
    pub fn visible_fields(&self) -> Vec<MovementField> {
        let mut fields = vec![MovementField::Action];
        if self.draft.action == QuickAction::Free {
            fields.push(MovementField::Kind);
        }
        fields.push(MovementField::Payment);
        fields.push(MovementField::Amount);
        if self.draft.action.subject().is_some() {
            fields.push(MovementField::Subject);
        }
        if self.draft.payment.needs_bank() {
            fields.push(MovementField::Bank);
        }
        if self.draft.payment.needs_cheque_number() {
            fields.push(MovementField::Cheque);
        }
        fields.push(MovementField::Observation);
        fields
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(-1);
    }

    fn move_focus(&mut self, step: isize) {
        let fields = self.visible_fields();
        let current = fields
            .iter()
            .position(|field| *field == self.focus)
            .unwrap_or(0);
        let len = fields.len() as isize;
        let next = (current as isize + step).rem_euclid(len) as usize;
        self.focus = fields[next];
        self.suggestion = 0;
    }

    /// Left/right on a selector field.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            MovementField::Action => {
                let actions = QuickAction::ALL;
                let current = actions
                    .iter()
                    .position(|action| *action == self.draft.action)
                    .unwrap_or(0);
                let next = step(current, actions.len(), forward);
                self.draft.action = actions[next];
                self.draft.kind = self.draft.action.default_kind();
                self.draft.subject.clear();
            }
            MovementField::Kind => {
                self.draft.kind = match self.draft.kind {
                    MovementKind::Ingreso => MovementKind::Egreso,
                    MovementKind::Egreso => MovementKind::Ingreso,
                };
            }
            MovementField::Payment => {
                let methods = [PaymentMethod::Efectivo, PaymentMethod::Cheque, PaymentMethod::Banco];
                let current = methods
                    .iter()
                    .position(|method| *method == self.draft.payment)
                    .unwrap_or(0);
                self.draft.payment = methods[step(current, methods.len(), forward)];
            }
            _ => {}
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            MovementField::Amount => Some(&mut self.amount_input),
            MovementField::Subject => Some(&mut self.draft.subject),
            MovementField::Bank => Some(&mut self.draft.bank),
            MovementField::Cheque => Some(&mut self.draft.cheque_number),
            MovementField::Observation => Some(&mut self.draft.observation),
            _ => None,
        }
    }

    pub fn suggestions<'a>(&self, catalogs: &'a Catalogs) -> Vec<&'a str> {
        match self.draft.action.subject() {
            Some(subject) if self.focus == MovementField::Subject => {
                suggest(&self.draft.subject, catalogs.for_subject(subject))
            }
            _ => Vec::new(),
        }
    }

    pub fn accept_suggestion(&mut self, catalogs: &Catalogs) {
        let picked = self
            .suggestions(catalogs)
            .get(self.suggestion)
            .map(|name| name.to_string());
        if let Some(name) = picked {
            self.draft.subject = name;
            self.suggestion = 0;
        }
    }

    /// Draft ready to send, with the typed amount parsed.
    pub fn to_draft(&self) -> Result<MovementDraft, engine::EngineError> {
        let amount = Money::parse_input(&self.amount_input)?;
        Ok(MovementDraft {
            amount,
            ..self.draft.clone()
        })
    }

    /// Clears the entered values but keeps the selected action.
    pub fn reset(&mut self) {
        self.draft = MovementDraft::new(self.draft.action);
        self.amount_input.clear();
        self.focus = MovementField::Action;
        self.suggestion = 0;
    }
}

fn step(current: usize, len: usize, forward: bool) -> usize {
    if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}
