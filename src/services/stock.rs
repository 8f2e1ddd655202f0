use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{order_item, product};
use crate::errors::ServiceError;

/// Deducts stock for every item of an order. Runs inside the payment
/// reconciliation transaction so the order status change and the stock
/// movement commit or roll back together.
///
/// Stock never goes below zero: when the on-hand quantity is short the
/// deduction clamps and the shortfall is logged for manual follow-up.
/// A product whose stock reaches zero is taken off the storefront.
pub async fn deduct_for_order(txn: &DatabaseTransaction, order_id: Uuid) -> Result<(), ServiceError> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(txn)
        .await?;

    for item in items {
        let Some(prod) = product::Entity::find_by_id(item.product_id).one(txn).await? else {
            warn!(%order_id, product_id = %item.product_id, "ordered product no longer exists");
            continue;
        };

        let new_stock = prod.stock - item.quantity;
        if new_stock < 0 {
            warn!(
                %order_id,
                product_id = %prod.id,
                on_hand = prod.stock,
                ordered = item.quantity,
                "stock shortfall, clamping at zero"
            );
        }

        let remaining = new_stock.max(0);
        let mut active: product::ActiveModel = prod.into();
        active.stock = Set(remaining);
        if remaining == 0 {
            active.is_available = Set(false);
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(txn).await?;
    }

    Ok(())
}
