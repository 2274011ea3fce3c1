//! The module contains the errors the engine can return.
//!
//! They fall in four groups:
//!
//! - validation, rejected before any remote call ([`Validation`],
//!   [`InvalidAmount`], [`NoExpectation`], [`Busy`], [`DayClosed`]);
//! - business rejection reported by the service ([`Rejected`]);
//! - transport failure, always retryable ([`Transport`]);
//! - partial failure of the closing protocol ([`AdjustmentFailed`]).
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`NoExpectation`]: EngineError::NoExpectation
//!  [`Busy`]: EngineError::Busy
//!  [`DayClosed`]: EngineError::DayClosed
//!  [`Rejected`]: EngineError::Rejected
//!  [`Transport`]: EngineError::Transport
//!  [`AdjustmentFailed`]: EngineError::AdjustmentFailed
use thiserror::Error;

use crate::Money;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Unknown denomination: {0}")]
    UnknownDenomination(i64),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("No expected cash loaded")]
    NoExpectation,
    #[error("A submission is already in flight")]
    Busy,
    #[error("The day is already closed")]
    DayClosed,
    #[error("Rejected by server: {0}")]
    Rejected(String),
    #[error("Server unavailable: {0}")]
    Transport(String),
    #[error("Closing recorded, adjustment of {difference} failed: {reason}")]
    AdjustmentFailed { difference: Money, reason: String },
}

impl EngineError {
    /// Transport failures are retried by the next poll or user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Text shown to the cashier in a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount(_) => "Ingresá un importe válido.".to_string(),
            Self::UnknownDenomination(face) => format!("Billete desconocido: {face}."),
            Self::Validation(message) => message.clone(),
            Self::NoExpectation => {
                "Tenés que obtener el efectivo esperado primero.".to_string()
            }
            Self::Busy => "Procesando, esperá un momento.".to_string(),
            Self::DayClosed => "La caja ya fue cerrada hoy.".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Transport(_) => "No se pudo conectar con el servidor.".to_string(),
            Self::AdjustmentFailed { difference, .. } => format!(
                "Arqueo registrado, pero falló el ajuste de {}.",
                difference.format_abs()
            ),
        }
    }
}
