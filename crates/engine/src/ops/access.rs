//! Role-scoped visibility over ledger reads.
//!
//! One scoping predicate, applied before any optional filter:
//! - admin: unrestricted;
//! - garden actor: payments touching its garden (directly or via a card);
//! - child dister (has a parent): only its own garden set;
//! - root dister: its own set plus every garden in its country.
//!
//! An empty scope yields an empty result set, never an error.

use sea_orm::{Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Actor, EngineError, Payment, PaymentListFilter, ResultEngine, cards, cities, dister_gardens,
    disters, gardens, groups, payments,
};

use super::Engine;

/// What a caller is allowed to see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum PaymentScope {
    All,
    Gardens(Vec<String>),
}

impl Engine {
    pub(super) async fn visible_garden_scope(&self, actor: &Actor) -> ResultEngine<PaymentScope> {
        match actor {
            Actor::Admin => Ok(PaymentScope::All),
            Actor::Garden { garden_id } => Ok(PaymentScope::Gardens(vec![garden_id.clone()])),
            Actor::Dister { dister_id } => {
                let dister = disters::Entity::find_by_id(dister_id.clone())
                    .one(&self.database)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("dister not exists".to_string()))?;

                let mut garden_ids: Vec<String> = dister_gardens::Entity::find()
                    .filter(dister_gardens::Column::DisterId.eq(dister_id.clone()))
                    .all(&self.database)
                    .await?
                    .into_iter()
                    .map(|link| link.garden_id)
                    .collect();

                // Root disters additionally see every garden in their
                // country; child disters are confined to their own set.
                if !dister.is_child() {
                    let country_gardens = self.gardens_in_country(&dister.country_id).await?;
                    for id in country_gardens {
                        if !garden_ids.contains(&id) {
                            garden_ids.push(id);
                        }
                    }
                }

                Ok(PaymentScope::Gardens(garden_ids))
            }
        }
    }

    /// Lists payments visible to `actor`, newest first.
    ///
    /// Optional filters are AND-composed after the role scope.
    pub async fn list_payments(
        &self,
        actor: &Actor,
        filter: &PaymentListFilter,
    ) -> ResultEngine<Vec<Payment>> {
        let scope = self.visible_garden_scope(actor).await?;

        let mut query = payments::Entity::find()
            .order_by_desc(payments::Column::CreatedAt)
            .limit(filter.limit.unwrap_or(100));

        if let PaymentScope::Gardens(ref garden_ids) = scope {
            if garden_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(self.touching_condition(garden_ids).await?);
        }

        if let Some(from) = filter.from {
            query = query.filter(payments::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(payments::Column::CreatedAt.lte(to));
        }
        if let Some(gateway_id) = filter.gateway_id.as_deref() {
            query = query.filter(payments::Column::GatewayId.eq(gateway_id.to_string()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(payments::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status.as_deref() {
            query = query.filter(payments::Column::Status.eq(status.to_string()));
        }

        if let Some(garden_id) = filter.garden_id.as_deref() {
            query = query.filter(self.touching_condition(&[garden_id.to_string()]).await?);
        }
        if let Some(city_id) = filter.city_id.as_deref() {
            let garden_ids = self.gardens_in_city(city_id).await?;
            if garden_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(self.touching_condition(&garden_ids).await?);
        }
        if let Some(country_id) = filter.country_id.as_deref() {
            let garden_ids = self.gardens_in_country(country_id).await?;
            if garden_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(self.touching_condition(&garden_ids).await?);
        }
        if let Some(dister_id) = filter.dister_id.as_deref() {
            let garden_ids: Vec<String> = dister_gardens::Entity::find()
                .filter(dister_gardens::Column::DisterId.eq(dister_id.to_string()))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|link| link.garden_id)
                .collect();
            if garden_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(self.touching_condition(&garden_ids).await?);
        }
        if let Some(phone) = filter.card_phone.as_deref() {
            let card_ids: Vec<String> = cards::Entity::find()
                .filter(cards::Column::Phone.contains(phone))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|card| card.id)
                .collect();
            if card_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(payments::Column::CardId.is_in(card_ids));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Payment::try_from).collect()
    }

    /// Returns a payment if — and only if — the actor's scope covers it.
    ///
    /// Out-of-scope payments answer "not found" so their existence does not
    /// leak.
    pub async fn payment_detail(&self, actor: &Actor, payment_id: &str) -> ResultEngine<Payment> {
        let payment = self.payment(payment_id).await?;

        match self.visible_garden_scope(actor).await? {
            PaymentScope::All => Ok(payment),
            PaymentScope::Gardens(garden_ids) => {
                let touched = self.resolve_payment_garden(&payment).await?;
                match touched {
                    Some(garden_id) if garden_ids.contains(&garden_id) => Ok(payment),
                    _ => Err(EngineError::KeyNotFound("payment not exists".to_string())),
                }
            }
        }
    }

    /// "Payment touches one of these gardens": directly by garden id, or
    /// through a card belonging to one of their groups.
    async fn touching_condition(&self, garden_ids: &[String]) -> ResultEngine<Condition> {
        let card_ids: Vec<String> = cards::Entity::find()
            .join(JoinType::InnerJoin, cards::Relation::Groups.def())
            .filter(groups::Column::GardenId.is_in(garden_ids.to_vec()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|card| card.id)
            .collect();

        let mut condition =
            Condition::any().add(payments::Column::GardenId.is_in(garden_ids.to_vec()));
        if !card_ids.is_empty() {
            condition = condition.add(payments::Column::CardId.is_in(card_ids));
        }
        Ok(condition)
    }

    async fn gardens_in_country(&self, country_id: &str) -> ResultEngine<Vec<String>> {
        let ids = gardens::Entity::find()
            .join(JoinType::InnerJoin, gardens::Relation::Cities.def())
            .filter(cities::Column::CountryId.eq(country_id.to_string()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|garden| garden.id)
            .collect();
        Ok(ids)
    }

    async fn gardens_in_city(&self, city_id: &str) -> ResultEngine<Vec<String>> {
        let ids = gardens::Entity::find()
            .filter(gardens::Column::CityId.eq(city_id.to_string()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|garden| garden.id)
            .collect();
        Ok(ids)
    }
}
