use std::time::Duration;

use api_types::{Envelope, ErrorBody};
use async_trait::async_trait;
use engine::{Gateway, Reply};
use reqwest::Url;
use serde_json::Value;

use crate::error::{AppError, Result};

/// Gateway speaking the service's single-endpoint JSON protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(base_url).map_err(|err| AppError::Setting {
            key: "base_url",
            reason: err.to_string(),
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn invoke(&self, operation: &str, params: Value) -> Reply {
        tracing::debug!(operation, "calling service");
        let envelope = Envelope {
            operation,
            params: &params,
        };

        let res = match self
            .http
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                let reason = if err.is_timeout() {
                    "timeout".to_string()
                } else {
                    err.to_string()
                };
                tracing::warn!(operation, "transport failure: {reason}");
                return Reply::Unavailable(reason);
            }
        };

        let status = res.status();
        // Bodies come as text/plain often enough that the content type is ignored.
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(operation, "cannot read body: {err}");
                return Reply::Unavailable(err.to_string());
            }
        };

        let value: Option<Value> = serde_json::from_str(&body).ok();
        if let Some(error) = value
            .as_ref()
            .and_then(|value| serde_json::from_value::<ErrorBody>(value.clone()).ok())
        {
            tracing::warn!(operation, %status, "service error: {}", error.error);
            return Reply::Rejected(error.error);
        }

        if !status.is_success() {
            tracing::warn!(operation, %status, "unexpected status");
            return Reply::Unavailable(format!("HTTP {status}"));
        }

        match value {
            Some(value) => Reply::Data(value),
            None => {
                tracing::warn!(operation, "malformed body");
                Reply::Unavailable("respuesta inválida del servidor".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/exec")
    }

    fn gateway(url: &str) -> HttpGateway {
        HttpGateway::new(url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn posts_envelope_and_parses_plain_text() {
        let app = Router::new().route(
            "/exec",
            post(|body: String| async move {
                let request: Value = serde_json::from_str(&body).unwrap();
                assert_eq!(request["fn"], "getEstadoCaja");
                assert_eq!(request["params"], json!({}));
                r#"{"efectivo":1500,"cheques":0,"banco":0,"total":1500}"#
            }),
        );
        let url = serve(app).await;

        let reply = gateway(&url).invoke("getEstadoCaja", json!({})).await;
        assert_eq!(
            reply,
            Reply::Data(json!({ "efectivo": 1500, "cheques": 0, "banco": 0, "total": 1500 }))
        );
    }

    #[tokio::test]
    async fn error_body_is_a_rejection() {
        let app = Router::new().route(
            "/exec",
            post(|| async { r#"{"error":"Función desconocida"}"# }),
        );
        let url = serve(app).await;

        let reply = gateway(&url).invoke("registrarArqueo", json!({})).await;
        assert_eq!(reply, Reply::Rejected("Función desconocida".to_string()));
    }

    #[tokio::test]
    async fn server_error_without_body_is_unavailable() {
        let app = Router::new().route(
            "/exec",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let url = serve(app).await;

        let reply = gateway(&url).invoke("getMovimientos", json!({})).await;
        assert!(matches!(reply, Reply::Unavailable(reason) if reason.contains("502")));
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let app = Router::new().route("/exec", post(|| async { "<html>login</html>" }));
        let url = serve(app).await;

        let reply = gateway(&url).invoke("getEstadoCaja", json!({})).await;
        assert!(matches!(reply, Reply::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let app = Router::new().route(
            "/exec",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let url = serve(app).await;
        let gateway = HttpGateway::new(&url, Duration::from_millis(200)).unwrap();

        let reply = gateway.invoke("getEstadoCaja", json!({})).await;
        assert_eq!(reply, Reply::Unavailable("timeout".to_string()));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let reply = gateway("http://127.0.0.1:9/exec")
            .invoke("getEstadoCaja", json!({}))
            .await;
        assert!(matches!(reply, Reply::Unavailable(_)));
    }

    #[test]
    fn invalid_url_is_a_setting_error() {
        let err = HttpGateway::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, AppError::Setting { key: "base_url", .. }));
    }
}
