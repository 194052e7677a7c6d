use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Bank,
    GardenBalance,
    AgentBalance,
    GardenCardChange,
}

pub mod payment {
    use super::*;

    /// One ledger entry as exposed over the API.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: String,
        pub transaction_number: String,
        pub kind: PaymentKind,
        pub status: String,
        pub amount_minor: i64,
        pub currency: String,
        pub garden_id: Option<String>,
        pub card_id: Option<String>,
        pub gateway_id: Option<String>,
        pub external_order_id: Option<String>,
        pub external_transaction_id: Option<String>,
        pub comment: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query-string filters for payment lists. All optional, AND-composed;
    /// role-based scoping is applied server-side before any of them.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct PaymentList {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub country_id: Option<String>,
        pub city_id: Option<String>,
        pub dister_id: Option<String>,
        pub garden_id: Option<String>,
        pub gateway_id: Option<String>,
        pub kind: Option<PaymentKind>,
        pub status: Option<String>,
        pub card_phone: Option<String>,
        pub limit: Option<u64>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PaymentListResponse {
        pub payments: Vec<PaymentView>,
    }
}

pub mod order {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct OrderNew {
        pub amount_minor: Option<i64>,
        pub currency: Option<String>,
        pub garden_id: Option<String>,
        pub card_id: Option<String>,
        pub gateway_id: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct OrderCreated {
        pub success: bool,
        pub payment: payment::PaymentView,
        pub redirect_url: String,
        pub external_transaction_id: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct OrderStatusResponse {
        pub payment_id: String,
        pub status: String,
        /// Whether the remote gateway was queried during this poll.
        pub synced: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BulkOrderNew {
        pub garden_id: String,
        pub card_ids: Vec<String>,
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BulkOrderItem {
        pub card_id: String,
        pub payment_id: Option<String>,
        pub redirect_url: Option<String>,
        pub external_transaction_id: Option<String>,
        pub error: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BulkOrderResponse {
        pub results: Vec<BulkOrderItem>,
        pub success_count: usize,
        pub failed_count: usize,
    }

    /// Webhook acknowledgement. Duplicate deliveries also answer
    /// `success: true`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CallbackAck {
        pub success: bool,
        pub message: String,
    }
}

pub mod balance {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BalanceAdjust {
        pub garden_id: String,
        /// Signed: positive credits the garden, negative debits it.
        pub amount_minor: i64,
        pub currency: Option<String>,
        pub comment: Option<String>,
        pub status: Option<String>,
    }
}

pub mod licenses {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PayForCards {
        pub garden_id: String,
        pub card_ids: Vec<String>,
        pub comment: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CardActivationView {
        pub card_id: String,
        pub payment_id: String,
        pub transaction_number: String,
        pub license_kind: String,
        pub license_until: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PayForCardsResponse {
        pub garden_id: String,
        pub tariff_minor: i64,
        pub total_minor: i64,
        pub cards: Vec<CardActivationView>,
    }
}

pub mod distribution {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct DistributionLineView {
        pub dister_id: String,
        pub name: String,
        pub percent: i64,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct DistributionResponse {
        pub payment_id: String,
        pub garden_id: Option<String>,
        pub admin_percent: i64,
        pub admin_amount_minor: i64,
        pub dister: Option<DistributionLineView>,
        pub second_dister: Option<DistributionLineView>,
    }
}
