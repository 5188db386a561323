use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block attached to list responses.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PageMeta {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            current_page: page,
            page_size,
            total_count: total,
            total_pages,
            has_more: page.saturating_mul(page_size) < total,
        }
    }
}

/// The one canonical envelope every handler returns.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: Some(meta),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_rounds_total_pages_up() {
        let meta = PageMeta::new(2, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);
    }

    #[test]
    fn page_meta_last_page_has_no_more() {
        let meta = PageMeta::new(3, 10, 25);
        assert!(!meta.has_more);
        assert_eq!(meta.total_count, 25);
    }

    #[test]
    fn page_meta_exact_multiple() {
        let meta = PageMeta::new(2, 10, 20);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_more);
    }

    #[test]
    fn envelope_serializes_camel_case_pagination() {
        let resp = ApiResponse::paginated("ok", serde_json::json!([]), PageMeta::new(1, 10, 0));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["pagination"]["currentPage"], 1);
        assert_eq!(json["pagination"]["totalCount"], 0);
        assert_eq!(json["success"], true);
    }
}
