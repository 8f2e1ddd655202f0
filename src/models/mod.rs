use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order lifecycle status, shared by the orders API and payment
/// reconciliation. Stored lowercase in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// Payment record status as mirrored from the provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Notification category, also the dedupe discriminator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "order_status")]
    OrderStatus,
    #[sea_orm(string_value = "system")]
    System,
}

/// The single interpretation of a provider payment status string.
/// Every code path that reads a provider status goes through this;
/// the reconciliation state machine consumes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved,
    Rejected,
    Pending,
    Cancelled,
    Refunded,
    Unknown,
}

/// Maps a raw provider status to a [`PaymentOutcome`].
///
/// The provider reports "approved", "rejected", "pending",
/// "in_process", "in_mediation", "cancelled", "refunded" and
/// "charged_back". Anything unrecognized is `Unknown` and left for
/// the caller to log and ignore.
pub fn map_provider_status(status: &str) -> PaymentOutcome {
    match status {
        "approved" => PaymentOutcome::Approved,
        "rejected" => PaymentOutcome::Rejected,
        "pending" | "in_process" | "in_mediation" => PaymentOutcome::Pending,
        "cancelled" => PaymentOutcome::Cancelled,
        "refunded" | "charged_back" => PaymentOutcome::Refunded,
        _ => PaymentOutcome::Unknown,
    }
}

impl PaymentOutcome {
    /// The payment-row status mirroring this outcome, if any.
    pub fn payment_status(self) -> Option<PaymentStatus> {
        match self {
            Self::Approved => Some(PaymentStatus::Approved),
            Self::Rejected => Some(PaymentStatus::Rejected),
            Self::Pending => Some(PaymentStatus::Pending),
            Self::Cancelled => Some(PaymentStatus::Cancelled),
            Self::Refunded => Some(PaymentStatus::Refunded),
            Self::Unknown => None,
        }
    }
}
