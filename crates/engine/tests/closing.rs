mod common;

use std::sync::Arc;

use engine::{
    Classification, ClosingState, EngineError, Money, Reply, Shift,
    movements::{CLOSING_ADJUSTMENT_CATEGORY, MovementDraft, QuickAction},
};
use serde_json::json;

use common::{ScriptedGateway, desk};

fn closing_reply(resultado: &str, diferencia: f64, fisico: f64, sistema: f64) -> serde_json::Value {
    json!({
        "resultado": resultado,
        "diferencia": diferencia,
        "efectivoFisico": fisico,
        "efectivoSistema": sistema
    })
}

#[tokio::test]
async fn surplus_closes_then_credits_the_difference() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data("getEstadoCaja", json!({ "efectivo": 48000, "total": 48000 }))
        .data(
            "registrarArqueo",
            closing_reply("Sobrante", 2_000.0, 50_000.0, 48_000.0),
        )
        .data("registrarMovimientoCaja", json!({ "ok": true }))
        .data("getEstadoCaja", json!({ "efectivo": 50000, "total": 50000 }));
    let mut desk = desk(&gateway);
    desk.refresh_balance().await.unwrap();

    let preview = desk.preview_closing(Money::from_pesos(50_000)).unwrap();
    assert_eq!(preview.classification, Classification::Surplus);
    assert_eq!(preview.amount, Money::from_pesos(2_000));

    let outcome = desk.close_day(Money::from_pesos(50_000), None).await.unwrap();

    assert!(outcome.adjusted);
    assert_eq!(outcome.difference.classification, Classification::Surplus);
    assert_eq!(
        gateway.operations(),
        vec![
            "getEstadoCaja",
            "registrarArqueo",
            "registrarMovimientoCaja",
            "getEstadoCaja"
        ]
    );

    let adjustment = gateway.last_params("registrarMovimientoCaja").unwrap();
    assert_eq!(adjustment["importe"], json!(2000.0));
    assert_eq!(adjustment["tipo"], json!("Ingreso"));
    assert_eq!(adjustment["formaPago"], json!("Efectivo"));
    assert_eq!(adjustment["categoria"], json!(CLOSING_ADJUSTMENT_CATEGORY));
    assert_eq!(adjustment["usuario"], json!("Laura"));

    assert_eq!(desk.state().closing.state(), ClosingState::Closed);
    assert_eq!(desk.state().balance.unwrap().cash, Money::from_pesos(50_000));
}

#[tokio::test]
async fn shortfall_is_debited() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data(
            "registrarArqueo",
            closing_reply("Faltante", -700.0, 9_300.0, 10_000.0),
        )
        .data("registrarMovimientoCaja", json!({ "ok": true }))
        .data("getEstadoCaja", json!({ "efectivo": 9300 }));
    let mut desk = desk(&gateway);

    desk.close_day(Money::from_pesos(9_300), Some(Shift::Afternoon))
        .await
        .unwrap();

    let adjustment = gateway.last_params("registrarMovimientoCaja").unwrap();
    assert_eq!(adjustment["tipo"], json!("Egreso"));
    assert_eq!(adjustment["importe"], json!(700.0));
    assert_eq!(adjustment["turno"], json!("Tarde"));
}

#[tokio::test]
async fn reply_without_difference_uses_the_loaded_balance() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data("getEstadoCaja", json!({ "efectivo": 10000, "total": 10000 }))
        .data("registrarArqueo", json!({ "resultado": "Sobrante" }))
        .data("registrarMovimientoCaja", json!({ "ok": true }))
        .data("getEstadoCaja", json!({ "efectivo": 10500 }));
    let mut desk = desk(&gateway);
    desk.refresh_balance().await.unwrap();

    let outcome = desk.close_day(Money::from_pesos(10_500), None).await.unwrap();

    assert_eq!(outcome.difference.amount, Money::from_pesos(500));
    assert_eq!(outcome.difference.classification, Classification::Surplus);
    assert!(outcome.adjusted);
    let adjustment = gateway.last_params("registrarMovimientoCaja").unwrap();
    assert_eq!(adjustment["tipo"], json!("Ingreso"));
    assert_eq!(adjustment["importe"], json!(500.0));
}

#[tokio::test]
async fn exact_count_makes_a_single_call() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data("registrarArqueo", closing_reply("OK", 0.0, 10_000.0, 10_000.0))
        .data("getEstadoCaja", json!({ "efectivo": 10000 }));
    let mut desk = desk(&gateway);

    let outcome = desk.close_day(Money::from_pesos(10_000), None).await.unwrap();

    assert!(!outcome.adjusted);
    assert_eq!(outcome.difference.classification, Classification::Exact);
    assert_eq!(gateway.count("registrarMovimientoCaja"), 0);
    assert_eq!(gateway.count("getEstadoCaja"), 1);
}

#[tokio::test]
async fn failed_closing_never_attempts_the_adjustment() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.reply(
        "registrarArqueo",
        Reply::Rejected("Arqueo duplicado".to_string()),
    );
    let mut desk = desk(&gateway);

    let err = desk.close_day(Money::from_pesos(5_000), None).await.unwrap_err();

    assert_eq!(err, EngineError::Rejected("Arqueo duplicado".to_string()));
    assert_eq!(gateway.operations(), vec!["registrarArqueo"]);
    assert_eq!(desk.state().closing.state(), ClosingState::Open);
}

#[tokio::test]
async fn failed_adjustment_is_reported_distinctly() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data(
            "registrarArqueo",
            closing_reply("Sobrante", 2_000.0, 50_000.0, 48_000.0),
        )
        .reply(
            "registrarMovimientoCaja",
            Reply::Unavailable("connection reset".to_string()),
        )
        .data("getEstadoCaja", json!({ "efectivo": 48000 }));
    let mut desk = desk(&gateway);

    let err = desk.close_day(Money::from_pesos(50_000), None).await.unwrap_err();

    match &err {
        EngineError::AdjustmentFailed { difference, .. } => {
            assert_eq!(*difference, Money::from_pesos(2_000));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.user_message(),
        "Arqueo registrado, pero falló el ajuste de $2.000."
    );
    assert!(desk.state().closing.is_closed());
    assert!(!desk.state().closing.last_outcome().unwrap().adjusted);
    assert_eq!(gateway.count("getEstadoCaja"), 1);
}

#[tokio::test]
async fn extreme_count_against_negative_cash_still_previews() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.data("getEstadoCaja", json!({ "efectivo": -500, "total": -500 }));
    let mut desk = desk(&gateway);
    desk.refresh_balance().await.unwrap();

    let physical = Money::parse_input("92233720368547758,07").unwrap();
    let preview = desk.preview_closing(physical).unwrap();

    assert_eq!(preview.classification, Classification::Surplus);
    assert_eq!(preview.amount, Money::new(i64::MAX));
}

#[tokio::test]
async fn zero_physical_amount_is_a_validation_error() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut desk = desk(&gateway);

    let err = desk.close_day(Money::ZERO, None).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn the_day_closes_only_once() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data("registrarArqueo", closing_reply("OK", 0.0, 100.0, 100.0))
        .data("getEstadoCaja", json!({ "efectivo": 100 }));
    let mut desk = desk(&gateway);
    desk.close_day(Money::from_pesos(100), None).await.unwrap();

    let err = desk.close_day(Money::from_pesos(100), None).await.unwrap_err();

    assert_eq!(err, EngineError::DayClosed);
    assert_eq!(gateway.count("registrarArqueo"), 1);
}

#[tokio::test]
async fn registering_a_movement_refreshes_the_balance() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .data("registrarMovimientoCaja", json!({ "ok": true }))
        .data("getEstadoCaja", json!({ "efectivo": 900, "total": 900 }));
    let mut desk = desk(&gateway);

    let mut draft = MovementDraft::new(QuickAction::Advance);
    draft.amount = Money::from_pesos(100);
    draft.subject = "Nancy".to_string();
    desk.register_movement(&draft, None).await.unwrap();

    assert_eq!(
        gateway.operations(),
        vec!["registrarMovimientoCaja", "getEstadoCaja"]
    );
    let params = gateway.last_params("registrarMovimientoCaja").unwrap();
    assert_eq!(params["observacion"], json!("Adelanto a Nancy"));
    assert_eq!(desk.state().balance.unwrap().total, Money::from_pesos(900));
}

#[tokio::test]
async fn invalid_movement_is_not_sent() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut desk = desk(&gateway);

    let draft = MovementDraft::new(QuickAction::Free);
    let err = desk.register_movement(&draft, None).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn day_movements_are_listed() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.data(
        "getMovimientos",
        json!([
            { "tipo": "Egreso", "categoria": "Combustible", "hora": "09:12",
              "formaPago": "Efectivo", "observacion": "Nafta", "importe": 15000 },
            { "tipo": "Ingreso", "categoria": "Rendición", "hora": "13:40",
              "formaPago": "Efectivo", "importe": 21500 }
        ]),
    );
    let mut desk = desk(&gateway);

    desk.refresh_movements(common::selection().date).await.unwrap();

    let movements = &desk.state().movements;
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[1].observacion, "");
    assert_eq!(
        gateway.last_params("getMovimientos").unwrap(),
        json!({ "fechaStr": "2025-03-07" })
    );
}
