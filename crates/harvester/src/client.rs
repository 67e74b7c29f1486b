// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::time::Duration;

use codewell_core::ProxySpec;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Thin wrapper over `reqwest::Client` bound to a single upstream proxy.
///
/// One instance per worker, held for that worker's entire lifetime — the
/// bound proxy is never shared with another worker concurrently.
pub struct PromoClient {
    http: reqwest::Client,
    base_url: String,
}

/// The outcome categories the worker state machine switches on. HTML bodies
/// and the `TooManyRegister` rate signal are surfaced distinctly from a
/// generic transient fault so the caller can apply the right backoff.
#[derive(Debug)]
pub enum PromoResponse<T> {
    Ok(T),
    Html,
    TooManyRegister,
    Transient,
}

impl PromoClient {
    pub fn new(base_url: impl Into<String>, proxy: &ProxySpec, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));

        let proxy = reqwest::Proxy::all(proxy.url())?;
        let http = reqwest::Client::builder()
            .proxy(proxy)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url: base_url.into() })
    }

    pub async fn login_client(&self, app_token: &str, client_id: &str) -> PromoResponse<LoginResponse> {
        let body = serde_json::json!({
            "appToken": app_token,
            "clientId": client_id,
            "clientOrigin": "deviceid",
        });
        self.post_json(&format!("{}/promo/login-client", self.base_url), &body, None).await
    }

    pub async fn register_event(
        &self,
        promo_id: &str,
        event_id: &str,
        client_token: &str,
    ) -> PromoResponse<RegisterEventResponse> {
        let body = serde_json::json!({
            "promoId": promo_id,
            "eventId": event_id,
            "eventOrigin": "undefined",
        });
        self.post_json(&format!("{}/promo/register-event", self.base_url), &body, Some(client_token)).await
    }

    pub async fn create_code(&self, promo_id: &str, client_token: &str) -> PromoResponse<CreateCodeResponse> {
        let body = serde_json::json!({ "promoId": promo_id });
        self.post_json(&format!("{}/promo/create-code", self.base_url), &body, Some(client_token)).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> PromoResponse<T> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(_) => return PromoResponse::Transient,
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let text = match response.text().await {
            Ok(t) => t,
            Err(_) => return PromoResponse::Transient,
        };

        classify(status, &content_type, &text)
    }
}

/// Pure classification of an upstream response into the worker's outcome
/// categories, split out of [`PromoClient::post_json`] so the branching can
/// be unit-tested without a live HTTP transport.
fn classify<T: DeserializeOwned>(status: u16, content_type: &str, text: &str) -> PromoResponse<T> {
    if content_type.contains("text/html") {
        return PromoResponse::Html;
    }

    if status == 400 && text.contains("TooManyRegister") {
        return PromoResponse::TooManyRegister;
    }

    if !(200..300).contains(&status) {
        return PromoResponse::Transient;
    }

    match serde_json::from_str::<T>(text) {
        Ok(parsed) => PromoResponse::Ok(parsed),
        Err(_) => PromoResponse::Transient,
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "clientToken")]
    pub client_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterEventResponse {
    #[serde(rename = "hasCode", default)]
    pub has_code: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCodeResponse {
    #[serde(rename = "promoCode", default)]
    pub promo_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_content_type_takes_priority() {
        let resp: PromoResponse<LoginResponse> =
            classify(400, "text/html; charset=utf-8", r#"{"error_code":"TooManyRegister"}"#);
        assert!(matches!(resp, PromoResponse::Html));
    }

    #[test]
    fn too_many_register_detected_on_400_with_marker() {
        let resp: PromoResponse<RegisterEventResponse> =
            classify(400, "application/json", r#"{"error_code":"TooManyRegister"}"#);
        assert!(matches!(resp, PromoResponse::TooManyRegister));
    }

    #[test]
    fn non_2xx_without_marker_is_transient() {
        let resp: PromoResponse<RegisterEventResponse> = classify(500, "application/json", "internal error");
        assert!(matches!(resp, PromoResponse::Transient));
    }

    #[test]
    fn malformed_json_on_success_is_transient() {
        let resp: PromoResponse<RegisterEventResponse> = classify(200, "application/json", "not json");
        assert!(matches!(resp, PromoResponse::Transient));
    }

    #[test]
    fn success_parses_into_ok() {
        let resp: PromoResponse<RegisterEventResponse> =
            classify(200, "application/json", r#"{"hasCode":true}"#);
        match resp {
            PromoResponse::Ok(r) => assert!(r.has_code),
            other => panic!("expected Ok, got {other:?}"),
        }
    }
}
