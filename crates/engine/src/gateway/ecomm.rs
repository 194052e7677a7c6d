//! E-commerce gateway adapter (certificate-based auth).
//!
//! This provider authenticates merchants with a client certificate instead
//! of credentials. Orders return a `TRANSACTION_ID`; the hosted page is
//! reached by passing that id to the client handler URL. Status checks
//! answer with `RESULT: OK | FAILED | CREATED`.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{
    CallbackEvent, CreatedOrder, GatewayAdapter, GatewayError, GatewayStatus, map_reqwest_error,
};

#[derive(Clone, Debug)]
pub struct EcommConfig {
    pub base_url: String,
    /// URL of the hosted payment page users are redirected to.
    pub client_url: String,
    /// PEM bundle with the merchant certificate and key.
    pub identity_pem: Vec<u8>,
}

#[derive(Debug)]
pub struct EcommGateway {
    base_url: String,
    client_url: Url,
    client: reqwest::Client,
}

impl EcommGateway {
    pub fn new(config: EcommConfig) -> Result<Self, GatewayError> {
        if config.identity_pem.is_empty() {
            return Err(GatewayError::NotConfigured(
                "ecomm gateway certificate missing".to_string(),
            ));
        }
        let client_url = Url::parse(&config.client_url)
            .map_err(|err| GatewayError::NotConfigured(format!("invalid client url: {err}")))?;
        let identity = reqwest::Identity::from_pem(&config.identity_pem)
            .map_err(|err| GatewayError::NotConfigured(format!("invalid certificate: {err}")))?;
        let client = reqwest::Client::builder()
            .identity(identity)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| GatewayError::NotConfigured(err.to_string()))?;
        Ok(Self {
            base_url: config.base_url,
            client_url,
            client,
        })
    }

    /// Responses are `KEY: value` lines, not JSON.
    fn parse_kv(body: &str, key: &str) -> Option<String> {
        body.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k.trim() == key).then(|| v.trim().to_string())
        })
    }

    fn map_result(result: &str) -> GatewayStatus {
        match result {
            "OK" => GatewayStatus::Completed,
            "FAILED" | "DECLINED" => GatewayStatus::Failed,
            "REVERSED" | "TIMEOUT" => GatewayStatus::Cancelled,
            _ => GatewayStatus::Pending,
        }
    }
}

#[async_trait]
impl GatewayAdapter for EcommGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<CreatedOrder, GatewayError> {
        let amount = amount_minor.to_string();
        let params = [
            ("command", "v"),
            ("amount", amount.as_str()),
            ("currency", currency),
            ("description", reference),
            ("msg_type", "SMS"),
        ];

        let body = self
            .client
            .post(&self.base_url)
            .form(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .text()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        if let Some(error) = Self::parse_kv(&body, "error") {
            return Err(GatewayError::Rejected(error));
        }

        let transaction_id = Self::parse_kv(&body, "TRANSACTION_ID").ok_or_else(|| {
            GatewayError::Malformed("response without TRANSACTION_ID".to_string())
        })?;

        let mut redirect = self.client_url.clone();
        redirect
            .query_pairs_mut()
            .append_pair("trans_id", &transaction_id);
        Ok(CreatedOrder {
            external_order_id: transaction_id,
            redirect_url: redirect.into(),
        })
    }

    fn parse_callback(&self, payload: &serde_json::Value) -> Result<CallbackEvent, GatewayError> {
        let trans_id = payload
            .get("trans_id")
            .or_else(|| payload.get("order_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Malformed("callback without trans_id".to_string()))?;

        let result = payload
            .get("result")
            .or_else(|| payload.get("status"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Malformed("callback without result".to_string()))?;

        Ok(CallbackEvent {
            external_order_id: trans_id.to_string(),
            status: Self::map_result(result),
            external_transaction_id: payload
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }

    async fn fetch_status(&self, external_order_id: &str) -> Result<GatewayStatus, GatewayError> {
        let params = [("command", "c"), ("trans_id", external_order_id)];

        let body = self
            .client
            .post(&self.base_url)
            .form(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .text()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        if let Some(error) = Self::parse_kv(&body, "error") {
            return Err(GatewayError::Rejected(error));
        }

        let result = Self::parse_kv(&body, "RESULT")
            .ok_or_else(|| GatewayError::Malformed("response without RESULT".to_string()))?;
        Ok(Self::map_result(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_is_not_configured() {
        let err = EcommGateway::new(EcommConfig {
            base_url: "https://ecomm.example/merchant".to_string(),
            client_url: "https://ecomm.example/client".to_string(),
            identity_pem: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured(_)));
    }

    #[test]
    fn kv_parsing_extracts_fields() {
        let body = "TRANSACTION_ID: abc+/=\nRESULT: OK\n";
        assert_eq!(
            EcommGateway::parse_kv(body, "TRANSACTION_ID").as_deref(),
            Some("abc+/=")
        );
        assert_eq!(EcommGateway::parse_kv(body, "RESULT").as_deref(), Some("OK"));
        assert_eq!(EcommGateway::parse_kv(body, "missing"), None);
    }

    #[test]
    fn result_mapping() {
        assert_eq!(EcommGateway::map_result("OK"), GatewayStatus::Completed);
        assert_eq!(EcommGateway::map_result("FAILED"), GatewayStatus::Failed);
        assert_eq!(EcommGateway::map_result("CREATED"), GatewayStatus::Pending);
        assert_eq!(EcommGateway::map_result("REVERSED"), GatewayStatus::Cancelled);
    }

    #[test]
    fn invalid_client_url_is_not_configured() {
        let err = EcommGateway::new(EcommConfig {
            base_url: "https://ecomm.example/merchant".to_string(),
            client_url: "not a url".to_string(),
            identity_pem: b"irrelevant".to_vec(),
        })
        .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured(_)));
    }
}
