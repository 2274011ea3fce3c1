//! Wire types of the remote ledger service.
//!
//! Every call is a POST of `{"fn": <operation>, "params": {...}}`. Field names
//! are fixed by the remote side, so they are renamed here and nowhere else.
//! Amounts travel as JSON numbers in major units (pesos); conversion to cents
//! happens in the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A remote operation: the params struct is the request, `Reply` the answer.
pub trait Operation: Serialize {
    const NAME: &'static str;
    type Reply: DeserializeOwned;
}

/// Request envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, P: Serialize> {
    #[serde(rename = "fn")]
    pub operation: &'a str,
    pub params: &'a P,
}

/// Body returned by the service when an operation fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// One of the two daily periods used to scope expected-cash lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "Mañana")]
    Morning,
    #[serde(rename = "Tarde")]
    Afternoon,
}

impl Shift {
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Mañana",
            Self::Afternoon => "Tarde",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Morning => Self::Afternoon,
            Self::Afternoon => Self::Morning,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    Ingreso,
    Egreso,
}

impl MovementKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ingreso => "Ingreso",
            Self::Egreso => "Egreso",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Efectivo,
    Cheque,
    Banco,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Efectivo => "Efectivo",
            Self::Cheque => "Cheque",
            Self::Banco => "Banco",
        }
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CashStatusGet {}

    impl Operation for CashStatusGet {
        const NAME: &'static str = "getEstadoCaja";
        type Reply = CashStatus;
    }

    /// Running ledger totals.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CashStatus {
        pub efectivo: f64,
        pub cheques: f64,
        pub banco: f64,
        pub total: f64,
    }
}

pub mod movement {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementNew {
        pub tipo: MovementKind,
        pub forma_pago: PaymentMethod,
        pub importe: f64,
        pub categoria: String,
        /// Delivery driver; empty for general movements.
        pub repartidor: String,
        /// Shift label, or empty.
        pub turno: String,
        pub banco: String,
        pub nro_cheque: String,
        pub usuario: String,
        pub observacion: String,
    }

    impl Operation for MovementNew {
        const NAME: &'static str = "registrarMovimientoCaja";
        type Reply = MovementCreated;
    }

    /// `ok` is optional: older deployments answer with an empty object.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct MovementCreated {
        pub ok: Option<bool>,
        pub mensaje: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementsGet {
        /// `YYYY-MM-DD`.
        pub fecha_str: NaiveDate,
    }

    impl Operation for MovementsGet {
        const NAME: &'static str = "getMovimientos";
        type Reply = Vec<MovementView>;
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MovementView {
        pub tipo: String,
        pub categoria: String,
        pub hora: String,
        pub forma_pago: String,
        pub observacion: String,
        pub importe: f64,
    }
}

pub mod reconciliation {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpectedCashGet {
        pub fecha_str: NaiveDate,
        pub turno: Shift,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub repartidor: Option<String>,
    }

    impl Operation for ExpectedCashGet {
        const NAME: &'static str = "getDatosRendicionEsperada";
        type Reply = ExpectedCashReply;
    }

    /// Either `{ok, efectivoEsperado, fecha, turno, repartidor}` or
    /// `{ok: false, mensaje}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct ExpectedCashReply {
        pub ok: Option<bool>,
        pub efectivo_esperado: Option<f64>,
        pub fecha: Option<String>,
        pub turno: Option<String>,
        pub repartidor: Option<String>,
        pub mensaje: Option<String>,
    }

    impl ExpectedCashReply {
        /// A record exists when `ok` is true, or `ok` is missing but the amount
        /// is present.
        pub fn is_found(&self) -> bool {
            match self.ok {
                Some(ok) => ok && self.efectivo_esperado.is_some(),
                None => self.efectivo_esperado.is_some(),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReconciliationProcess {
        pub fecha_str: NaiveDate,
        pub turno: Shift,
        pub repartidor: String,
        pub efectivo_contado: f64,
        pub efectivo_esperado: f64,
        pub usuario: String,
    }

    impl Operation for ReconciliationProcess {
        const NAME: &'static str = "procesarRendicionDesdeRecibo";
        type Reply = ReconciliationProcessed;
    }

    /// Identifiers are opaque: the service sends numbers or strings.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct ReconciliationProcessed {
        pub ok: bool,
        pub diferencia: f64,
        pub tipo_diferencia: Option<String>,
        pub id_rendicion: Option<serde_json::Value>,
        pub mov_principal_id: Option<serde_json::Value>,
        pub mensaje: Option<String>,
    }
}

pub mod closing {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClosingNew {
        pub usuario: String,
        pub efectivo_fisico: f64,
    }

    impl Operation for ClosingNew {
        const NAME: &'static str = "registrarArqueo";
        type Reply = ClosingRecorded;
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct ClosingRecorded {
        /// `OK`, `Sobrante` or `Faltante`.
        pub resultado: String,
        pub diferencia: Option<f64>,
        pub efectivo_fisico: f64,
        pub efectivo_sistema: Option<f64>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_fn_and_params_keys() {
        let params = closing::ClosingNew {
            usuario: "Laura".to_string(),
            efectivo_fisico: 50_000.0,
        };
        let envelope = Envelope {
            operation: closing::ClosingNew::NAME,
            params: &params,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "fn": "registrarArqueo",
                "params": { "usuario": "Laura", "efectivoFisico": 50000.0 }
            })
        );
    }

    #[test]
    fn shift_serializes_with_spanish_labels() {
        assert_eq!(serde_json::to_value(Shift::Morning).unwrap(), json!("Mañana"));
        assert_eq!(serde_json::to_value(Shift::Afternoon).unwrap(), json!("Tarde"));
        let parsed: Shift = serde_json::from_value(json!("Tarde")).unwrap();
        assert_eq!(parsed, Shift::Afternoon);
    }

    #[test]
    fn expected_cash_query_formats_date_and_omits_missing_driver() {
        let query = reconciliation::ExpectedCashGet {
            fecha_str: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            turno: Shift::Morning,
            repartidor: None,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "fechaStr": "2025-03-07", "turno": "Mañana" })
        );
    }

    #[test]
    fn expected_cash_reply_found_and_not_found() {
        let found: reconciliation::ExpectedCashReply = serde_json::from_value(json!({
            "ok": true,
            "efectivoEsperado": 21500,
            "fecha": "2025-03-07",
            "turno": "Mañana",
            "repartidor": "Nico"
        }))
        .unwrap();
        assert!(found.is_found());

        let missing: reconciliation::ExpectedCashReply =
            serde_json::from_value(json!({ "ok": false, "mensaje": "Sin rendición" })).unwrap();
        assert!(!missing.is_found());
        assert_eq!(missing.mensaje.as_deref(), Some("Sin rendición"));

        let legacy: reconciliation::ExpectedCashReply =
            serde_json::from_value(json!({ "efectivoEsperado": 0 })).unwrap();
        assert!(legacy.is_found());
    }

    #[test]
    fn movement_new_uses_camel_case_fields() {
        let movement = movement::MovementNew {
            tipo: MovementKind::Egreso,
            forma_pago: PaymentMethod::Cheque,
            importe: 1500.5,
            categoria: "Pago a proveedor".to_string(),
            repartidor: String::new(),
            turno: "Tarde".to_string(),
            banco: "Nación".to_string(),
            nro_cheque: "0042".to_string(),
            usuario: "Laura".to_string(),
            observacion: "Pago a proveedor Make".to_string(),
        };
        let value = serde_json::to_value(&movement).unwrap();
        assert_eq!(value["formaPago"], json!("Cheque"));
        assert_eq!(value["nroCheque"], json!("0042"));
        assert_eq!(value["tipo"], json!("Egreso"));
    }

    #[test]
    fn replies_tolerate_missing_fields() {
        let status: balance::CashStatus = serde_json::from_value(json!({ "efectivo": 100 })).unwrap();
        assert_eq!(status.efectivo, 100.0);
        assert_eq!(status.total, 0.0);

        let processed: reconciliation::ReconciliationProcessed = serde_json::from_value(json!({
            "ok": true,
            "diferencia": -2000,
            "tipoDiferencia": "Faltante",
            "idRendicion": 17,
            "movPrincipalId": "MOV-9"
        }))
        .unwrap();
        assert!(processed.ok);
        assert_eq!(processed.diferencia, -2000.0);
        assert_eq!(processed.id_rendicion, Some(json!(17)));
    }
}
