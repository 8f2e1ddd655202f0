use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::product;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: i32,
    #[serde(default)]
    pub is_available: bool,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: Option<i32>,
    pub is_available: Option<bool>,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct ProductService {
    db: DatabaseConnection,
}

impl ProductService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Storefront listing: available products only.
    pub async fn list_available(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = product::Entity::find()
            .filter(product::Column::IsAvailable.eq(true))
            .order_by_asc(product::Column::Name)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Back-office listing: every product regardless of availability.
    pub async fn list_all(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = product::Entity::find()
            .order_by_asc(product::Column::Name)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))
    }

    pub async fn create(&self, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            is_available: Set(input.is_available),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if matches!(input.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        let existing = self.get(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(is_available) = input.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        existing.delete(&self.db).await?;
        Ok(())
    }
}
