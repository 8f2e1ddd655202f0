use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::entities::user;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            role: Set("customer".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Validates credentials. The same error is returned for an
    /// unknown email and a wrong password.
    pub async fn authenticate(&self, input: LoginInput) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        let invalid = || ServiceError::AuthError("invalid email or password".to_string());
        let user = found.ok_or_else(invalid)?;
        if !verify_password(&input.password, &user.password_hash)? {
            return Err(invalid());
        }
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))
    }

    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let paginator = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
