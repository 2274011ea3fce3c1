//! Manual cash movements: the quick actions of the movement form, their
//! categories and automatic observations, and validation into the wire
//! request.

use api_types::movement::MovementNew;
pub use api_types::{MovementKind, PaymentMethod};

use crate::{EngineError, Money, Shift};

/// Category used by the compensating movement posted after a closing count.
pub const CLOSING_ADJUSTMENT_CATEGORY: &str = "Ajuste arqueo";

const MAX_SUGGESTIONS: usize = 8;

/// Which extra fields the form shows for a payment method.
pub trait PaymentFields {
    fn needs_bank(self) -> bool;
    fn needs_cheque_number(self) -> bool;
}

impl PaymentFields for PaymentMethod {
    fn needs_bank(self) -> bool {
        matches!(self, PaymentMethod::Cheque | PaymentMethod::Banco)
    }

    fn needs_cheque_number(self) -> bool {
        matches!(self, PaymentMethod::Cheque)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuickAction {
    SupplierPayment,
    Fuel,
    Advance,
    Wages,
    Free,
}

impl QuickAction {
    pub const ALL: [QuickAction; 5] = [
        Self::SupplierPayment,
        Self::Fuel,
        Self::Advance,
        Self::Wages,
        Self::Free,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SupplierPayment => "Pago a proveedor",
            Self::Fuel => "Combustible",
            Self::Advance => "Adelanto",
            Self::Wages => "Haberes",
            Self::Free => "Movimiento libre",
        }
    }

    /// Quick actions are expenses, except the free movement which the cashier
    /// may flip.
    pub fn default_kind(self) -> MovementKind {
        MovementKind::Egreso
    }

    /// Extra subject the form asks for (supplier, vehicle or employee).
    pub fn subject(self) -> Option<Subject> {
        match self {
            Self::SupplierPayment => Some(Subject::Supplier),
            Self::Fuel => Some(Subject::Vehicle),
            Self::Advance | Self::Wages => Some(Subject::Employee),
            Self::Free => None,
        }
    }

    pub fn category(self, subject: &str) -> String {
        match self {
            Self::SupplierPayment => "Pago a proveedor".to_string(),
            Self::Fuel => {
                let vehicle = non_empty(subject).unwrap_or("Vehículo");
                format!("Combustible {vehicle}")
            }
            Self::Advance => "Adelanto empleado".to_string(),
            Self::Wages => "Pago de haberes".to_string(),
            Self::Free => "Movimiento libre".to_string(),
        }
    }

    /// Observation used when the cashier leaves it blank.
    pub fn default_observation(self, subject: &str) -> String {
        match self {
            Self::SupplierPayment => {
                format!("Pago a proveedor {}", non_empty(subject).unwrap_or("N/D"))
            }
            Self::Fuel => format!("Carga combustible {}", subject.trim())
                .trim()
                .to_string(),
            Self::Advance => format!("Adelanto a {}", non_empty(subject).unwrap_or("Empleado")),
            Self::Wages => format!(
                "Pago de haberes a {}",
                non_empty(subject).unwrap_or("Empleado")
            ),
            Self::Free => String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Supplier,
    Vehicle,
    Employee,
}

impl Subject {
    pub fn label(self) -> &'static str {
        match self {
            Self::Supplier => "Proveedor",
            Self::Vehicle => "Vehículo",
            Self::Employee => "Empleado",
        }
    }
}

/// Movement form contents before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementDraft {
    pub action: QuickAction,
    pub kind: MovementKind,
    pub payment: PaymentMethod,
    pub amount: Money,
    pub subject: String,
    pub bank: String,
    pub cheque_number: String,
    pub observation: String,
}

impl MovementDraft {
    pub fn new(action: QuickAction) -> Self {
        Self {
            action,
            kind: action.default_kind(),
            payment: PaymentMethod::Efectivo,
            amount: Money::ZERO,
            subject: String::new(),
            bank: String::new(),
            cheque_number: String::new(),
            observation: String::new(),
        }
    }

    /// Checks the draft and builds the request. Bank and cheque fields are
    /// dropped when the payment method does not use them.
    pub fn validate(&self, actor: &str, shift: Option<Shift>) -> Result<MovementNew, EngineError> {
        if !self.amount.is_positive() {
            return Err(EngineError::Validation(
                "El importe debe ser mayor a 0".to_string(),
            ));
        }
        if actor.trim().is_empty() {
            return Err(EngineError::Validation("Falta el usuario.".to_string()));
        }
        let bank = if self.payment.needs_bank() {
            non_empty(&self.bank)
                .ok_or_else(|| EngineError::Validation("Indicá el banco.".to_string()))?
                .to_string()
        } else {
            String::new()
        };
        let cheque_number = if self.payment.needs_cheque_number() {
            non_empty(&self.cheque_number)
                .ok_or_else(|| EngineError::Validation("Indicá el número de cheque.".to_string()))?
                .to_string()
        } else {
            String::new()
        };

        let observation = match non_empty(&self.observation) {
            Some(observation) => observation.to_string(),
            None => self.action.default_observation(&self.subject),
        };

        Ok(MovementNew {
            tipo: self.kind,
            forma_pago: self.payment,
            importe: self.amount.to_major(),
            categoria: self.action.category(&self.subject),
            repartidor: String::new(),
            turno: shift.map(|shift| shift.label().to_string()).unwrap_or_default(),
            banco: bank,
            nro_cheque: cheque_number,
            usuario: actor.to_string(),
            observacion: observation,
        })
    }
}

/// Compensating cash movement for a closing difference: a surplus is credited,
/// a shortfall debited. `None` for an exact count.
pub fn closing_adjustment(
    difference: Money,
    actor: &str,
    shift: Option<Shift>,
) -> Option<MovementNew> {
    let kind = if difference.is_positive() {
        MovementKind::Ingreso
    } else if difference.is_negative() {
        MovementKind::Egreso
    } else {
        return None;
    };
    let label = if kind == MovementKind::Ingreso {
        "Sobrante"
    } else {
        "Faltante"
    };

    Some(MovementNew {
        tipo: kind,
        forma_pago: PaymentMethod::Efectivo,
        importe: difference.abs().to_major(),
        categoria: CLOSING_ADJUSTMENT_CATEGORY.to_string(),
        repartidor: String::new(),
        turno: shift.map(|shift| shift.label().to_string()).unwrap_or_default(),
        banco: String::new(),
        nro_cheque: String::new(),
        usuario: actor.to_string(),
        observacion: format!("Ajuste por arqueo ({label})"),
    })
}

/// Case-insensitive substring search over a catalog (suppliers, vehicles,
/// employees), sorted, at most eight entries.
pub fn suggest<'a>(term: &str, catalog: &'a [String]) -> Vec<&'a str> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    let mut matches: Vec<&str> = catalog
        .iter()
        .map(String::as_str)
        .filter(|entry| entry.to_lowercase().contains(&term))
        .collect();
    matches.sort_by_key(|entry| entry.to_lowercase());
    matches.truncate(MAX_SUGGESTIONS);
    matches
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(action: QuickAction, amount: i64) -> MovementDraft {
        MovementDraft {
            amount: Money::from_pesos(amount),
            ..MovementDraft::new(action)
        }
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = draft(QuickAction::Free, 0).validate("Laura", None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn observation_is_derived_from_subject() {
        let mut d = draft(QuickAction::SupplierPayment, 1_000);
        d.subject = "Make".to_string();
        let req = d.validate("Laura", Some(Shift::Afternoon)).unwrap();
        assert_eq!(req.categoria, "Pago a proveedor");
        assert_eq!(req.observacion, "Pago a proveedor Make");
        assert_eq!(req.turno, "Tarde");
        assert_eq!(req.importe, 1_000.0);

        let mut d = draft(QuickAction::Fuel, 500);
        d.subject = "Toyota Hiace".to_string();
        let req = d.validate("Laura", None).unwrap();
        assert_eq!(req.categoria, "Combustible Toyota Hiace");
        assert_eq!(req.observacion, "Carga combustible Toyota Hiace");

        let req = draft(QuickAction::Wages, 500).validate("Laura", None).unwrap();
        assert_eq!(req.observacion, "Pago de haberes a Empleado");
    }

    #[test]
    fn manual_observation_wins() {
        let mut d = draft(QuickAction::Advance, 200);
        d.subject = "Nancy".to_string();
        d.observation = "Adelanto quincena".to_string();
        let req = d.validate("Laura", None).unwrap();
        assert_eq!(req.observacion, "Adelanto quincena");
        assert_eq!(req.categoria, "Adelanto empleado");
    }

    #[test]
    fn cheque_requires_bank_and_number() {
        let mut d = draft(QuickAction::SupplierPayment, 1_000);
        d.payment = PaymentMethod::Cheque;
        assert!(d.validate("Laura", None).is_err());

        d.bank = "Nación".to_string();
        assert!(d.validate("Laura", None).is_err());

        d.cheque_number = "0042".to_string();
        let req = d.validate("Laura", None).unwrap();
        assert_eq!(req.banco, "Nación");
        assert_eq!(req.nro_cheque, "0042");
    }

    #[test]
    fn cash_drops_bank_fields() {
        let mut d = draft(QuickAction::Free, 100);
        d.bank = "Galicia".to_string();
        d.cheque_number = "1".to_string();
        let req = d.validate("Laura", None).unwrap();
        assert!(req.banco.is_empty());
        assert!(req.nro_cheque.is_empty());
    }

    #[test]
    fn adjustment_direction_follows_sign() {
        let credit =
            closing_adjustment(Money::from_pesos(2_000), "Laura", Some(Shift::Afternoon)).unwrap();
        assert_eq!(credit.tipo, MovementKind::Ingreso);
        assert_eq!(credit.turno, "Tarde");
        assert_eq!(credit.importe, 2_000.0);
        assert_eq!(credit.categoria, CLOSING_ADJUSTMENT_CATEGORY);

        let debit = closing_adjustment(Money::from_pesos(-350), "Laura", None).unwrap();
        assert_eq!(debit.tipo, MovementKind::Egreso);
        assert_eq!(debit.importe, 350.0);
        assert!(debit.turno.is_empty());

        assert!(closing_adjustment(Money::ZERO, "Laura", None).is_none());
    }

    #[test]
    fn suggestions_are_sorted_and_capped() {
        let catalog: Vec<String> = [
            "Marwiplast", "Mis Plast", "Modoplast", "Desesplast", "Matriplaster", "Romyl",
            "Coolbazar", "Plast A", "Plast B", "Plast C",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let found = suggest("PLAST", &catalog);
        assert_eq!(found.len(), 8);
        assert_eq!(found[0], "Desesplast");
        assert!(suggest("  ", &catalog).is_empty());
        assert_eq!(suggest("rom", &catalog), vec!["Romyl"]);
    }

    #[test]
    fn field_visibility() {
        assert!(PaymentMethod::Cheque.needs_bank());
        assert!(PaymentMethod::Cheque.needs_cheque_number());
        assert!(PaymentMethod::Banco.needs_bank());
        assert!(!PaymentMethod::Banco.needs_cheque_number());
        assert!(!PaymentMethod::Efectivo.needs_bank());
    }
}
