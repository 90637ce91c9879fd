use serde::{Deserialize, Serialize};

use stockpile_core::Page;
use stockpile_inventory::{InventoryRecord, ItemDraft};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct InventoryItemRequest {
    pub product_name: String,
    pub price: i64,
    pub currency: String,
    pub discount: i64,
    pub vendor: String,
    #[serde(default)]
    pub accessories: Option<Vec<String>>,
}

impl InventoryItemRequest {
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            name: self.product_name,
            price: self.price,
            currency: self.currency,
            discount: self.discount,
            vendor: self.vendor,
            accessories: self.accessories.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendQuery {
    pub flag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub flag: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Comma-separated vendor names.
    pub vendor: Option<String>,
}

impl ListItemsQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn vendors(&self) -> Vec<String> {
        self.vendor
            .as_deref()
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsResponse {
    pub items: Vec<InventoryRecord>,
    pub total_records: u64,
    pub page: u64,
    pub page_size: u64,
}

impl From<Page<InventoryRecord>> for ListItemsResponse {
    fn from(page: Page<InventoryRecord>) -> Self {
        Self {
            items: page.items,
            total_records: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
