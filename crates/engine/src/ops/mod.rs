use sea_orm::{DatabaseConnection, DatabaseTransaction, prelude::*};

use crate::{EngineError, GatewayRegistry, ResultEngine, cards, gardens, groups};

mod access;
mod distribution;
mod ledger;
mod licenses;
mod orders;
mod reconcile;

pub use distribution::{DistributionLine, DistributionReport};
pub use ledger::Transition;
pub use licenses::{CardActivation, LicensePurchase};
pub use orders::{BulkOrderOutcome, CardOrderResult, CreatedPaymentOrder, OrderState};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    gateways: GatewayRegistry,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) async fn require_garden(
        &self,
        db_tx: &DatabaseTransaction,
        garden_id: &str,
    ) -> ResultEngine<gardens::Model> {
        gardens::Entity::find_by_id(garden_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("garden not exists".to_string()))
    }

    pub(crate) async fn require_card(
        &self,
        db_tx: &DatabaseTransaction,
        card_id: &str,
    ) -> ResultEngine<cards::Model> {
        cards::Entity::find_by_id(card_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("card not exists".to_string()))
    }

    /// Resolves the garden a card belongs to via its group.
    pub(crate) async fn card_garden_id(
        &self,
        db_tx: &DatabaseTransaction,
        card: &cards::Model,
    ) -> ResultEngine<String> {
        let group = groups::Entity::find_by_id(card.group_id.clone())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        Ok(group.garden_id)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    gateways: GatewayRegistry,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the gateway adapter registry (may be empty: every gateway call
    /// then fails as not-configured, which is the honest state).
    pub fn gateways(mut self, gateways: GatewayRegistry) -> EngineBuilder {
        self.gateways = gateways;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            gateways: self.gateways,
        })
    }
}
