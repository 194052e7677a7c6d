use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, EntityTrait};
use serde_json::json;

use engine::{
    CallbackEvent, CreateOrderCmd, CreatedOrder, Engine, EngineError, GatewayAdapter,
    GatewayError, GatewayKind, GatewayRegistry, GatewayStatus, Money, PaymentKind,
    STATUS_COMPLETED, STATUS_PENDING, cards, cities, countries, gardens, gateways, groups,
};
use migration::MigratorTrait;

/// In-process stand-in for a hosted-payment provider. Callbacks are plain
/// `{order_id, status}` JSON; `fetch_status` answers from a settable slot.
struct FakeGateway {
    remote_status: Mutex<GatewayStatus>,
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    reject_creates: bool,
}

impl FakeGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            remote_status: Mutex::new(GatewayStatus::Pending),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            reject_creates: false,
        })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            remote_status: Mutex::new(GatewayStatus::Pending),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            reject_creates: true,
        })
    }

    fn set_remote_status(&self, status: GatewayStatus) {
        *self.remote_status.lock().unwrap() = status;
    }
}

#[async_trait]
impl GatewayAdapter for FakeGateway {
    async fn create_order(
        &self,
        _amount_minor: i64,
        _currency: &str,
        reference: &str,
    ) -> Result<CreatedOrder, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_creates {
            return Err(GatewayError::Rejected("order refused".to_string()));
        }
        Ok(CreatedOrder {
            external_order_id: format!("ext-{reference}"),
            redirect_url: format!("https://pay.example/{reference}"),
        })
    }

    fn parse_callback(&self, payload: &serde_json::Value) -> Result<CallbackEvent, GatewayError> {
        let order_id = payload
            .get("order_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Malformed("order_id missing".to_string()))?;
        let status = match payload.get("status").and_then(|v| v.as_str()) {
            Some("completed") => GatewayStatus::Completed,
            Some("failed") => GatewayStatus::Failed,
            _ => GatewayStatus::Pending,
        };
        Ok(CallbackEvent {
            external_order_id: order_id.to_string(),
            status,
            external_transaction_id: payload
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }

    async fn fetch_status(&self, _external_order_id: &str) -> Result<GatewayStatus, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.remote_status.lock().unwrap())
    }
}

async fn engine_with_gateway(adapter: Arc<FakeGateway>) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    countries::Entity::insert(countries::ActiveModel {
        id: Set("am".to_string()),
        name: Set("Armenia".to_string()),
        currency: Set("AMD".to_string()),
        tariff_minor: Set(100),
    })
    .exec(&db)
    .await
    .unwrap();
    cities::Entity::insert(cities::ActiveModel {
        id: Set("yerevan".to_string()),
        country_id: Set("am".to_string()),
        name: Set("Yerevan".to_string()),
    })
    .exec(&db)
    .await
    .unwrap();
    gardens::Entity::insert(gardens::ActiveModel {
        id: Set("g1".to_string()),
        name: Set("Garden g1".to_string()),
        city_id: Set("yerevan".to_string()),
        balance_minor: Set(0),
        currency: Set("AMD".to_string()),
    })
    .exec(&db)
    .await
    .unwrap();
    groups::Entity::insert(groups::ActiveModel {
        id: Set("g1-group".to_string()),
        garden_id: Set("g1".to_string()),
        name: Set("Sunflowers".to_string()),
    })
    .exec(&db)
    .await
    .unwrap();
    cards::Entity::insert(cards::ActiveModel {
        id: Set("card-1".to_string()),
        group_id: Set("g1-group".to_string()),
        phone: Set(Some("+37499000".to_string())),
        license_kind: Set("boolean".to_string()),
        license_active: Set(false),
        license_until: Set(None),
    })
    .exec(&db)
    .await
    .unwrap();
    gateways::Entity::insert(gateways::ActiveModel {
        id: Set("gw-bank".to_string()),
        kind: Set("bank".to_string()),
        name: Set("Test Bank".to_string()),
        currency: Set("AMD".to_string()),
    })
    .exec(&db)
    .await
    .unwrap();

    let registry = GatewayRegistry::new().with(GatewayKind::Bank, adapter);
    let engine = Engine::builder()
        .database(db.clone())
        .gateways(registry)
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn create_order_records_pending_payment() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway.clone()).await;

    let order = engine
        .create_order(CreateOrderCmd {
            amount: Some(Money::new(2500)),
            currency: None,
            garden_id: Some("g1".to_string()),
            card_id: None,
            gateway_id: Some("gw-bank".to_string()),
            description: Some("top-up".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(order.payment.status, STATUS_PENDING);
    assert_eq!(order.payment.kind, PaymentKind::Bank);
    assert_eq!(order.payment.amount_minor, 2500);
    assert_eq!(order.payment.currency, "AMD");
    assert!(order.redirect_url.starts_with("https://pay.example/"));
    assert_eq!(
        order.payment.external_order_id.as_deref(),
        Some(order.external_order_id.as_str())
    );

    // Registered but not completed: nothing on the balance yet.
    assert_eq!(engine.garden_balance("g1").await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn rejected_registration_leaves_no_ledger_entry() {
    let gateway = FakeGateway::rejecting();
    let (engine, _db) = engine_with_gateway(gateway).await;

    let err = engine
        .create_order(CreateOrderCmd {
            amount: Some(Money::new(2500)),
            currency: None,
            garden_id: Some("g1".to_string()),
            card_id: None,
            gateway_id: Some("gw-bank".to_string()),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Gateway(GatewayError::Rejected(_))
    ));

    let payments = engine
        .list_payments(
            &engine::Actor::Admin,
            &engine::PaymentListFilter::default(),
        )
        .await
        .unwrap();
    assert!(payments.is_empty());
}

#[tokio::test]
async fn callback_completes_order_and_replays_are_inert() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway).await;

    let order = engine
        .create_order(CreateOrderCmd {
            amount: Some(Money::new(2500)),
            currency: None,
            garden_id: Some("g1".to_string()),
            card_id: None,
            gateway_id: Some("gw-bank".to_string()),
            description: None,
        })
        .await
        .unwrap();

    let payload = json!({
        "order_id": order.external_order_id,
        "status": "completed",
        "transaction_id": "rrn-42",
    });

    let (payment, transition) = engine
        .handle_callback(GatewayKind::Bank, &payload)
        .await
        .unwrap();
    assert!(transition.changed());
    assert_eq!(payment.status, STATUS_COMPLETED);
    assert_eq!(payment.external_transaction_id.as_deref(), Some("rrn-42"));

    // Identical delivery again: same answer, no second application.
    let (payment, transition) = engine
        .handle_callback(GatewayKind::Bank, &payload)
        .await
        .unwrap();
    assert!(!transition.changed());
    assert_eq!(payment.status, STATUS_COMPLETED);
}

#[tokio::test]
async fn callback_for_unknown_order_is_not_found() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway).await;

    let err = engine
        .handle_callback(
            GatewayKind::Bank,
            &json!({"order_id": "ext-nope", "status": "completed"}),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("payment not exists".to_string()));
}

#[tokio::test]
async fn status_poll_syncs_pending_orders_with_the_gateway() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway.clone()).await;

    let order = engine
        .create_order(CreateOrderCmd {
            amount: Some(Money::new(2500)),
            currency: None,
            garden_id: Some("g1".to_string()),
            card_id: None,
            gateway_id: Some("gw-bank".to_string()),
            description: None,
        })
        .await
        .unwrap();
    let payment_id = order.payment.id.to_string();

    // Remote still pending: synced, status unchanged.
    let state = engine.order_status(&payment_id).await.unwrap();
    assert!(state.synced);
    assert_eq!(state.payment.status, STATUS_PENDING);
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 1);

    gateway.set_remote_status(GatewayStatus::Completed);
    let state = engine.order_status(&payment_id).await.unwrap();
    assert!(state.synced);
    assert_eq!(state.payment.status, STATUS_COMPLETED);

    // Non-pending payments answer from storage without a remote call.
    let calls_before = gateway.fetch_calls.load(Ordering::SeqCst);
    let state = engine.order_status(&payment_id).await.unwrap();
    assert!(!state.synced);
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), calls_before);
}

#[tokio::test]
async fn card_order_defaults_amount_to_the_country_tariff() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway).await;

    let order = engine
        .create_order(CreateOrderCmd {
            amount: None,
            currency: None,
            garden_id: None,
            card_id: Some("card-1".to_string()),
            gateway_id: Some("gw-bank".to_string()),
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(order.payment.amount_minor, 100);
    assert_eq!(order.payment.card_id.as_deref(), Some("card-1"));
}

#[tokio::test]
async fn bulk_orders_report_partial_success() {
    let gateway = FakeGateway::new();
    let (engine, _db) = engine_with_gateway(gateway).await;

    let outcome = engine
        .create_orders_bulk(
            "g1",
            &["card-1".to_string(), "card-missing".to_string()],
            Some("renewal"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.failed_count, 1);
    assert_eq!(outcome.results.len(), 2);

    let ok = &outcome.results[0];
    assert_eq!(ok.card_id, "card-1");
    assert!(ok.order.is_some());
    assert!(ok.error.is_none());

    let bad = &outcome.results[1];
    assert_eq!(bad.card_id, "card-missing");
    assert!(bad.order.is_none());
    assert!(bad.error.is_some());
}

#[tokio::test]
async fn unconfigured_gateway_kind_fails_order_creation() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    gateways::Entity::insert(gateways::ActiveModel {
        id: Set("gw-ecomm".to_string()),
        kind: Set("ecomm".to_string()),
        name: Set("Ecomm".to_string()),
        currency: Set("GEL".to_string()),
    })
    .exec(&db)
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let err = engine
        .create_order(CreateOrderCmd {
            amount: Some(Money::new(100)),
            currency: None,
            garden_id: None,
            card_id: None,
            gateway_id: Some("gw-ecomm".to_string()),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Gateway(GatewayError::NotConfigured(_))
    ));
}
