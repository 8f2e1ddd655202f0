use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Envelope for successful responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Items per page, capped at 100.
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let params = PaginationParams {
            page: None,
            per_page: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 20);

        let params = PaginationParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 100);
    }
}
