use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{order, order_item, product};
use crate::errors::ServiceError;
use crate::models::OrderStatus;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99, message = "quantity must be 1-99"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutInput {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    #[validate]
    pub items: Vec<CheckoutItem>,
}

/// An order with its line items, as returned to the client.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Clone)]
pub struct OrderService {
    db: DatabaseConnection,
}

impl OrderService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a PENDING order, snapshotting unit prices from the
    /// catalog. Stock is validated here but only deducted when the
    /// payment is approved.
    pub async fn checkout(
        &self,
        user_id: Uuid,
        input: CheckoutInput,
    ) -> Result<OrderWithItems, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let mut total = Decimal::ZERO;
        let order_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(input.items.len());

        for line in &input.items {
            let prod = product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))?;

            if !prod.is_available {
                return Err(ServiceError::InvalidOperation(format!(
                    "product '{}' is not available",
                    prod.name
                )));
            }
            if prod.stock < line.quantity {
                return Err(ServiceError::InvalidOperation(format!(
                    "insufficient stock for '{}'",
                    prod.name
                )));
            }

            total += prod.price * Decimal::from(line.quantity);
            items.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(prod.id),
                quantity: Set(line.quantity),
                unit_price: Set(prod.price),
            });
        }

        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total),
            payment_method: Set(None),
            provider_payment_id: Set(None),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            inserted.push(item.insert(&txn).await?);
        }

        txn.commit().await?;
        info!(%order_id, %user_id, %total, "order created");

        Ok(OrderWithItems {
            order,
            items: inserted,
        })
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Fetches one of the user's orders with its items. Other users'
    /// orders are treated as not found.
    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Cancels a pending order. Orders in any other state cannot be
    /// cancelled by the customer.
    pub async fn cancel(&self, user_id: Uuid, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot cancel an order in status '{}'",
                order.status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;

        info!(%order_id, %user_id, "order cancelled by customer");
        Ok(updated)
    }

    pub async fn list_all(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
