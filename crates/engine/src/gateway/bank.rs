//! Bank-hosted checkout adapter.
//!
//! The bank exposes a form-encoded API: `register.do` creates an order and
//! returns `{orderId, formUrl}`, `getOrderStatusExtended.do` reports a
//! numeric `orderStatus`. Callbacks carry `{orderId, status}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    CallbackEvent, CreatedOrder, GatewayAdapter, GatewayError, GatewayStatus, map_reqwest_error,
};

#[derive(Clone, Debug)]
pub struct BankConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Where the bank sends the user back after the hosted page.
    pub return_url: String,
}

#[derive(Debug)]
pub struct BankGateway {
    config: BankConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(rename = "orderId")]
    order_id: Option<String>,
    #[serde(rename = "formUrl")]
    form_url: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "orderStatus")]
    order_status: Option<i64>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

impl BankGateway {
    pub fn new(config: BankConfig) -> Result<Self, GatewayError> {
        if config.username.trim().is_empty() || config.password.trim().is_empty() {
            return Err(GatewayError::NotConfigured(
                "bank gateway credentials missing".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| GatewayError::NotConfigured(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Bank order statuses: 2 = deposited, 3/6 = declined, everything else
    /// is still in flight.
    fn map_order_status(status: i64) -> GatewayStatus {
        match status {
            2 => GatewayStatus::Completed,
            3 | 6 => GatewayStatus::Failed,
            _ => GatewayStatus::Pending,
        }
    }
}

#[async_trait]
impl GatewayAdapter for BankGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<CreatedOrder, GatewayError> {
        let url = format!("{}/register.do", self.config.base_url.trim_end_matches('/'));
        let amount = amount_minor.to_string();
        let params = [
            ("userName", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("orderNumber", reference),
            ("amount", amount.as_str()),
            ("currency", currency),
            ("returnUrl", self.config.return_url.as_str()),
        ];

        let response: RegisterResponse = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        if let Some(code) = response.error_code.filter(|c| c != "0") {
            let message = response.error_message.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{code}: {message}")));
        }

        match (response.order_id, response.form_url) {
            (Some(external_order_id), Some(redirect_url)) => Ok(CreatedOrder {
                external_order_id,
                redirect_url,
            }),
            _ => Err(GatewayError::Malformed(
                "register.do response without orderId/formUrl".to_string(),
            )),
        }
    }

    fn parse_callback(&self, payload: &serde_json::Value) -> Result<CallbackEvent, GatewayError> {
        let order_id = payload
            .get("orderId")
            .or_else(|| payload.get("bank_order_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Malformed("callback without orderId".to_string()))?;

        let status = match payload.get("status") {
            Some(serde_json::Value::Number(n)) => {
                Self::map_order_status(n.as_i64().unwrap_or_default())
            }
            Some(serde_json::Value::String(s)) => match s.as_str() {
                "1" | "success" | "deposited" => GatewayStatus::Completed,
                "0" | "declined" | "failed" => GatewayStatus::Failed,
                other => {
                    return Err(GatewayError::Malformed(format!(
                        "unknown callback status: {other}"
                    )));
                }
            },
            _ => return Err(GatewayError::Malformed("callback without status".to_string())),
        };

        let external_transaction_id = payload
            .get("transaction_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(CallbackEvent {
            external_order_id: order_id.to_string(),
            status,
            external_transaction_id,
        })
    }

    async fn fetch_status(&self, external_order_id: &str) -> Result<GatewayStatus, GatewayError> {
        let url = format!(
            "{}/getOrderStatusExtended.do",
            self.config.base_url.trim_end_matches('/')
        );
        let params = [
            ("userName", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("orderId", external_order_id),
        ];

        let response: StatusResponse = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;

        if let Some(code) = response.error_code.filter(|c| c != "0") {
            let message = response.error_message.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{code}: {message}")));
        }

        let status = response.order_status.ok_or_else(|| {
            GatewayError::Malformed("status response without orderStatus".to_string())
        })?;
        Ok(Self::map_order_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> BankGateway {
        BankGateway::new(BankConfig {
            base_url: "https://bank.example".to_string(),
            username: "merchant".to_string(),
            password: "secret".to_string(),
            return_url: "https://app.example/return".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn missing_credentials_is_not_configured() {
        let err = BankGateway::new(BankConfig {
            base_url: "https://bank.example".to_string(),
            username: String::new(),
            password: "secret".to_string(),
            return_url: String::new(),
        })
        .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured(_)));
    }

    #[test]
    fn callback_numeric_status_maps_to_ledger_status() {
        let gw = gateway();
        let event = gw
            .parse_callback(&serde_json::json!({
                "orderId": "ext-1",
                "status": 2,
                "transaction_id": "bank-tx-9"
            }))
            .unwrap();
        assert_eq!(event.external_order_id, "ext-1");
        assert_eq!(event.status, GatewayStatus::Completed);
        assert_eq!(event.external_transaction_id.as_deref(), Some("bank-tx-9"));

        let failed = gw
            .parse_callback(&serde_json::json!({"orderId": "ext-2", "status": 6}))
            .unwrap();
        assert_eq!(failed.status, GatewayStatus::Failed);
    }

    #[test]
    fn callback_without_order_id_is_malformed() {
        let gw = gateway();
        let err = gw
            .parse_callback(&serde_json::json!({"status": 2}))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }
}
