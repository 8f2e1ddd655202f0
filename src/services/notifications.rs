use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::entities::notification;
use crate::errors::ServiceError;
use crate::models::NotificationType;

/// Suppression window for repeated notifications with the same
/// recipient, type, title and message.
const DEDUPE_WINDOW_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseConnection,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a notification for the user unless an identical one
    /// (same user, type, title and message) was recorded within the
    /// dedupe window. Returns the created row, or `None` when
    /// suppressed.
    pub async fn notify(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        payload: Option<Value>,
    ) -> Result<Option<notification::Model>, ServiceError> {
        let cutoff = Utc::now() - Duration::minutes(DEDUPE_WINDOW_MINUTES);
        let duplicate = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::NotificationType.eq(notification_type))
            .filter(notification::Column::Title.eq(title))
            .filter(notification::Column::Message.eq(message))
            .filter(notification::Column::CreatedAt.gte(cutoff))
            .one(&self.db)
            .await?;

        if duplicate.is_some() {
            debug!(%user_id, title, "duplicate notification suppressed");
            return Ok(None);
        }

        let now = Utc::now();
        let model = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            payload: Set(payload),
            is_read: Set(false),
            created_at: Set(now),
        };

        Ok(Some(model.insert(&self.db).await?))
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<notification::Model>, u64), ServiceError> {
        let paginator = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Marks one of the user's notifications as read. Rows belonging
    /// to other users are treated as not found.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let found = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("notification not found".to_string()))?;

        if found.is_read {
            return Ok(found);
        }

        let mut active: notification::ActiveModel = found.into();
        active.is_read = Set(true);
        Ok(active.update(&self.db).await?)
    }
}
