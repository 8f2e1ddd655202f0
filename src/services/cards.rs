use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::payment_card;
use crate::errors::ServiceError;
use crate::gateway::{CardTokenRequest, PaymentGateway};

pub struct CardService {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
}

impl CardService {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { db, gateway }
    }

    /// Tokenizes card details with the provider and stores the token
    /// with display metadata. The first card a user saves becomes the
    /// default automatically.
    pub async fn add_card(
        &self,
        user_id: Uuid,
        req: CardTokenRequest,
    ) -> Result<payment_card::Model, ServiceError> {
        if req.card_number.len() < 13 || !req.card_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::ValidationError(
                "card number must be at least 13 digits".to_string(),
            ));
        }
        if !(1..=12).contains(&req.expiration_month) {
            return Err(ServiceError::ValidationError(
                "expiration month must be 1-12".to_string(),
            ));
        }

        let fallback_last_four = req.card_number[req.card_number.len() - 4..].to_string();
        let token = self.gateway.create_card_token(&req).await?;
        let last_four = if token.last_four_digits.is_empty() {
            fallback_last_four
        } else {
            token.last_four_digits.clone()
        };

        let has_cards = payment_card::Entity::find()
            .filter(payment_card::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .is_some();

        let card = payment_card::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            card_token: Set(token.id),
            brand: Set(token
                .payment_method_id
                .unwrap_or_else(|| "card".to_string())),
            last_four: Set(last_four),
            expiry_month: Set(req.expiration_month),
            expiry_year: Set(req.expiration_year),
            is_default: Set(!has_cards),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        info!(%user_id, card_id = %card.id, "payment card saved");
        Ok(card)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<payment_card::Model>, ServiceError> {
        Ok(payment_card::Entity::find()
            .filter(payment_card::Column::UserId.eq(user_id))
            .order_by_desc(payment_card::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Makes a card the user's default. Clearing the previous default
    /// and setting the new one happen in one transaction; a partial
    /// unique index on (user_id) where is_default backstops the
    /// at-most-one-default invariant.
    pub async fn set_default(
        &self,
        user_id: Uuid,
        card_id: Uuid,
    ) -> Result<payment_card::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let card = payment_card::Entity::find_by_id(card_id)
            .filter(payment_card::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("card not found".to_string()))?;

        let current_default = payment_card::Entity::find()
            .filter(payment_card::Column::UserId.eq(user_id))
            .filter(payment_card::Column::IsDefault.eq(true))
            .one(&txn)
            .await?;

        if let Some(current) = current_default {
            if current.id == card.id {
                txn.commit().await?;
                return Ok(card);
            }
            let mut active: payment_card::ActiveModel = current.into();
            active.is_default = Set(false);
            active.update(&txn).await?;
        }

        let mut active: payment_card::ActiveModel = card.into();
        active.is_default = Set(true);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, card_id: Uuid) -> Result<(), ServiceError> {
        let card = payment_card::Entity::find_by_id(card_id)
            .filter(payment_card::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("card not found".to_string()))?;

        card.delete(&self.db).await?;
        Ok(())
    }
}
