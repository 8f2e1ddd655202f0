use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{order, order_item, payment, payment_card, product};
use crate::errors::ServiceError;
use crate::gateway::{
    GatewayPayment, PaymentGateway, PaymentRequest, PreferenceItem, PreferenceRequest,
    PreferenceResponse,
};
use crate::models::{map_provider_status, NotificationType, OrderStatus, PaymentOutcome};
use crate::services::{stock, NotificationService};

pub const PROVIDER_NAME: &str = "mercadopago";

/// Provider webhook body: a notification type plus the provider-side
/// id of the resource that changed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookData {
    pub id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CardPaymentInput {
    pub order_id: Uuid,
    /// A one-time token from the card tokenizer, or the id of a saved
    /// card. Exactly one must be provided.
    pub card_token: Option<String>,
    pub card_id: Option<Uuid>,
    #[validate(range(min = 1, max = 24, message = "installments must be 1-24"))]
    #[serde(default = "default_installments")]
    pub installments: u32,
}

fn default_installments() -> u32 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardPaymentResult {
    pub order: order::Model,
    /// Raw provider status, e.g. "approved" or "rejected".
    pub provider_status: String,
}

pub struct PaymentService {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    notifications: NotificationService,
}

impl PaymentService {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            gateway,
            notifications,
        }
    }

    /// Creates a hosted-checkout preference for a pending order and
    /// records a pending payment row carrying the preference id.
    pub async fn create_preference(
        &self,
        user_id: Uuid,
        user_email: &str,
        order_id: Uuid,
    ) -> Result<PreferenceResponse, ServiceError> {
        let (order, items) = self.load_pending_order(user_id, order_id).await?;

        let mut preference_items = Vec::with_capacity(items.len());
        for item in &items {
            let name = product::Entity::find_by_id(item.product_id)
                .one(&self.db)
                .await?
                .map(|p| p.name)
                .unwrap_or_else(|| "item".to_string());
            preference_items.push(PreferenceItem {
                title: name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        let preference = self
            .gateway
            .create_preference(&PreferenceRequest {
                items: preference_items,
                external_reference: order.id.to_string(),
                payer_email: user_email.to_string(),
            })
            .await?;

        let now = Utc::now();
        payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            status: Set(crate::models::PaymentStatus::Pending),
            provider: Set(PROVIDER_NAME.to_string()),
            amount: Set(order.total_amount),
            provider_payment_id: Set(None),
            preference_id: Set(Some(preference.id.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(%order_id, preference_id = %preference.id, "checkout preference created");
        Ok(preference)
    }

    /// Charges a pending order with a card token or a saved card, then
    /// reconciles the provider's verdict through the same state machine
    /// the webhook uses.
    pub async fn pay_with_card(
        &self,
        user_id: Uuid,
        user_email: &str,
        input: CardPaymentInput,
    ) -> Result<CardPaymentResult, ServiceError> {
        input.validate()?;

        let token = match (&input.card_token, input.card_id) {
            (Some(token), None) => token.clone(),
            (None, Some(card_id)) => {
                let card = payment_card::Entity::find_by_id(card_id)
                    .filter(payment_card::Column::UserId.eq(user_id))
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("card not found".to_string()))?;
                card.card_token
            }
            _ => {
                return Err(ServiceError::ValidationError(
                    "provide exactly one of card_token or card_id".to_string(),
                ))
            }
        };

        let (order, _items) = self.load_pending_order(user_id, input.order_id).await?;

        let gateway_payment = self
            .gateway
            .create_payment(&PaymentRequest {
                token,
                transaction_amount: order.total_amount,
                installments: input.installments,
                description: format!("Order {}", order.id),
                external_reference: order.id.to_string(),
                payer_email: user_email.to_string(),
            })
            .await?;

        let provider_status = gateway_payment.status.clone();
        self.reconcile(&gateway_payment).await?;

        let order = order::Entity::find_by_id(input.order_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;

        Ok(CardPaymentResult {
            order,
            provider_status,
        })
    }

    /// Handles a provider webhook. Non-payment notifications and
    /// payments we cannot attribute to an order are acknowledged and
    /// dropped; only infrastructure failures propagate so the provider
    /// retries the delivery.
    pub async fn process_webhook(&self, payload: WebhookPayload) -> Result<(), ServiceError> {
        if payload.kind != "payment" {
            info!(kind = %payload.kind, "ignoring non-payment webhook");
            return Ok(());
        }

        let gateway_payment = match self.gateway.get_payment(&payload.data.id).await {
            Ok(p) => p,
            Err(ServiceError::NotFound(_)) => {
                warn!(provider_payment_id = %payload.data.id, "webhook for unknown payment");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.reconcile(&gateway_payment).await
    }

    /// Applies a provider payment to the local order: status
    /// transition, payment row upsert and stock deduction happen in
    /// one transaction. Replayed deliveries find the transition
    /// already applied and change nothing.
    pub async fn reconcile(&self, gateway_payment: &GatewayPayment) -> Result<(), ServiceError> {
        let outcome = map_provider_status(&gateway_payment.status);
        if outcome == PaymentOutcome::Unknown {
            warn!(
                provider_payment_id = %gateway_payment.id,
                status = %gateway_payment.status,
                "unrecognized provider status, ignoring"
            );
            return Ok(());
        }

        let Some(order_id) = gateway_payment
            .external_reference
            .as_deref()
            .and_then(|r| Uuid::parse_str(r).ok())
        else {
            warn!(
                provider_payment_id = %gateway_payment.id,
                "payment has no usable external reference, ignoring"
            );
            return Ok(());
        };

        let txn = self.db.begin().await?;

        let Some(order) = order::Entity::find_by_id(order_id).one(&txn).await? else {
            warn!(%order_id, "payment references unknown order, ignoring");
            txn.rollback().await?;
            return Ok(());
        };

        self.upsert_payment_row(&txn, &order, gateway_payment, outcome)
            .await?;

        let transition = match (order.status, outcome) {
            (OrderStatus::Pending, PaymentOutcome::Approved) => Some(OrderStatus::Paid),
            (OrderStatus::Pending, PaymentOutcome::Rejected) => Some(OrderStatus::Failed),
            (OrderStatus::Pending, PaymentOutcome::Cancelled) => Some(OrderStatus::Cancelled),
            (OrderStatus::Pending, PaymentOutcome::Pending) => None,
            (OrderStatus::Paid, PaymentOutcome::Refunded) => Some(OrderStatus::Refunded),
            (current, outcome) => {
                // Duplicate delivery or an out-of-order status. The
                // order stays as it is.
                info!(
                    %order_id,
                    ?current,
                    ?outcome,
                    "no order transition for this payment outcome"
                );
                None
            }
        };

        let user_id = order.user_id;
        let notification = match transition {
            Some(new_status) => {
                let mut active: order::ActiveModel = order.into();
                active.status = Set(new_status);
                active.updated_at = Set(Utc::now());
                if new_status == OrderStatus::Paid {
                    active.paid_at = Set(Some(Utc::now()));
                    active.payment_method = Set(Some(PROVIDER_NAME.to_string()));
                    active.provider_payment_id = Set(Some(gateway_payment.id.clone()));
                    stock::deduct_for_order(&txn, order_id).await?;
                }
                info!(%order_id, ?new_status, "order reconciled");
                Some((new_status, active.update(&txn).await?))
            }
            None => None,
        };

        txn.commit().await?;

        if let Some((new_status, _)) = notification {
            self.notify_order_status(user_id, order_id, new_status, &gateway_payment.id)
                .await?;
        }

        Ok(())
    }

    /// Every settled transition produces two notifications: one for
    /// the payment outcome and one for the order status change.
    async fn notify_order_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        provider_payment_id: &str,
    ) -> Result<(), ServiceError> {
        let short_ref = &order_id.to_string()[..8];
        let (payment_title, payment_message, order_message) = match status {
            OrderStatus::Paid => (
                format!("Payment approved for order {}", short_ref),
                "Your payment was approved.",
                "Your order is confirmed and being prepared.",
            ),
            OrderStatus::Failed => (
                format!("Payment rejected for order {}", short_ref),
                "Your payment was rejected. Please try another payment method.",
                "The order could not be completed.",
            ),
            OrderStatus::Cancelled => (
                format!("Payment cancelled for order {}", short_ref),
                "The payment was cancelled before completing.",
                "The order is closed.",
            ),
            OrderStatus::Refunded => (
                format!("Payment refunded for order {}", short_ref),
                "Your payment was refunded.",
                "The order was refunded and closed.",
            ),
            OrderStatus::Pending => return Ok(()),
        };

        let payload = json!({
            "order_id": order_id,
            "provider_payment_id": provider_payment_id,
        });

        self.notifications
            .notify(
                user_id,
                NotificationType::Payment,
                &payment_title,
                payment_message,
                Some(payload.clone()),
            )
            .await?;

        self.notifications
            .notify(
                user_id,
                NotificationType::OrderStatus,
                &format!("Order {} is now {}", short_ref, status),
                order_message,
                Some(payload),
            )
            .await?;

        Ok(())
    }

    /// Records the provider payment locally, keyed by the unique
    /// provider payment id. A row created at preference time (no
    /// provider id yet) is claimed by the first delivery.
    async fn upsert_payment_row(
        &self,
        txn: &DatabaseTransaction,
        order: &order::Model,
        gateway_payment: &GatewayPayment,
        outcome: PaymentOutcome,
    ) -> Result<(), ServiceError> {
        let Some(status) = outcome.payment_status() else {
            return Ok(());
        };

        let existing = payment::Entity::find()
            .filter(payment::Column::ProviderPaymentId.eq(gateway_payment.id.clone()))
            .one(txn)
            .await?;

        if let Some(existing) = existing {
            if existing.status != status {
                let mut active: payment::ActiveModel = existing.into();
                active.status = Set(status);
                active.updated_at = Set(Utc::now());
                active.update(txn).await?;
            }
            return Ok(());
        }

        let unclaimed = payment::Entity::find()
            .filter(payment::Column::OrderId.eq(order.id))
            .filter(payment::Column::ProviderPaymentId.is_null())
            .one(txn)
            .await?;

        let amount = gateway_payment
            .transaction_amount
            .unwrap_or(order.total_amount);

        match unclaimed {
            Some(row) => {
                let mut active: payment::ActiveModel = row.into();
                active.status = Set(status);
                active.provider_payment_id = Set(Some(gateway_payment.id.clone()));
                active.amount = Set(amount);
                active.updated_at = Set(Utc::now());
                active.update(txn).await?;
            }
            None => {
                let now = Utc::now();
                payment::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order.id),
                    status: Set(status),
                    provider: Set(PROVIDER_NAME.to_string()),
                    amount: Set(amount),
                    provider_payment_id: Set(Some(gateway_payment.id.clone())),
                    preference_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;
            }
        }

        Ok(())
    }

    async fn load_pending_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "order is not awaiting payment (status '{}')",
                order.status
            )));
        }

        if order.total_amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(
                "order total must be positive".to_string(),
            ));
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&self.db)
            .await?;

        Ok((order, items))
    }

    /// Payment history for one of the user's orders.
    pub async fn list_for_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<payment::Model>, ServiceError> {
        order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;

        Ok(payment::Entity::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .order_by_desc(payment::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn list_all(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<payment::Model>, u64), ServiceError> {
        let paginator = payment::Entity::find()
            .order_by_desc(payment::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
