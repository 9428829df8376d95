use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::propertymodel::{ContractType, PropertyImage, PropertyStatus};

#[derive(Debug, Deserialize, Clone)]
pub struct CreatePropertyDto {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub city: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub monthly_price: BigDecimal,
    pub deposit_amount: BigDecimal,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_m2: BigDecimal,
    pub is_furnished: bool,
    pub available_from: NaiveDate,
    pub contract_type: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct UpdatePropertyDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub monthly_price: Option<BigDecimal>,
    pub deposit_amount: Option<BigDecimal>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<BigDecimal>,
    pub is_furnished: Option<bool>,
    pub available_from: Option<NaiveDate>,
    pub contract_type: Option<String>,
    pub status: Option<String>,
}

/// Create payload after trimming and enum parsing. Built by the validator,
/// never directly from request JSON.
#[derive(Debug, Clone)]
pub struct NormalizedCreateProperty {
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub monthly_price: BigDecimal,
    pub deposit_amount: BigDecimal,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_m2: BigDecimal,
    pub is_furnished: bool,
    pub available_from: NaiveDate,
    pub contract_type: ContractType,
    pub status: PropertyStatus,
}

/// Patch payload after normalization: absent fields stay `None` and are
/// never written. Optional text that trims to blank is treated as absent.
#[derive(Debug, Default, Clone)]
pub struct NormalizedPatchProperty {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub monthly_price: Option<BigDecimal>,
    pub deposit_amount: Option<BigDecimal>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<BigDecimal>,
    pub is_furnished: Option<bool>,
    pub available_from: Option<NaiveDate>,
    pub contract_type: Option<ContractType>,
    pub status: Option<PropertyStatus>,
}

impl NormalizedPatchProperty {
    pub fn has_any_field(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.city.is_some()
            || self.neighborhood.is_some()
            || self.address.is_some()
            || self.monthly_price.is_some()
            || self.deposit_amount.is_some()
            || self.bedrooms.is_some()
            || self.bathrooms.is_some()
            || self.area_m2.is_some()
            || self.is_furnished.is_some()
            || self.available_from.is_some()
            || self.contract_type.is_some()
            || self.status.is_some()
    }
}

pub fn optional_text(raw: &str) -> Option<String> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Image response shape: `storage_path` stays internal.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PropertyImageDto {
    pub id: Uuid,
    pub property_id: Uuid,
    pub public_url: String,
    pub mime_type: String,
    pub file_size_bytes: i32,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl PropertyImageDto {
    pub fn from_image(image: &PropertyImage) -> Self {
        Self {
            id: image.id,
            property_id: image.property_id,
            public_url: image.public_url.clone(),
            mime_type: image.mime_type.clone(),
            file_size_bytes: image.file_size_bytes,
            display_order: image.display_order,
            created_at: image.created_at,
        }
    }
}

/// Row-to-insert for a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewPropertyImage {
    pub storage_path: String,
    pub public_url: String,
    pub mime_type: String,
    pub file_size_bytes: i32,
    pub display_order: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct ImageOrderItemDto {
    pub image_id: Uuid,
    pub display_order: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReorderImagesDto {
    #[serde(default)]
    pub items: Vec<ImageOrderItemDto>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModeratePropertyDto {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ModerationQueueItemDto {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub title: String,
    pub city: String,
    pub status: PropertyStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicSortOption {
    Newest,
    PriceAsc,
    PriceDesc,
}

impl PublicSortOption {
    /// Unknown values fall back to newest-first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("price_asc") => PublicSortOption::PriceAsc,
            Some("price_desc") => PublicSortOption::PriceDesc,
            _ => PublicSortOption::Newest,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct PublicSearchQueryDto {
    pub city: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<BigDecimal>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<BigDecimal>,
    pub bedrooms: Option<i32>,
    #[serde(rename = "isFurnished")]
    pub is_furnished: Option<bool>,
    pub sort: Option<String>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    #[validate(range(min = 1, max = 100, message = "pageSize must be between 1 and 100"))]
    pub page_size: Option<u32>,
}

/// Store-level search filters, already normalized by the endpoint layer.
#[derive(Debug, Default, Clone)]
pub struct PublicSearchFilters {
    pub city: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub bedrooms: Option<i32>,
    pub is_furnished: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PublicPropertyListItemDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub monthly_price: BigDecimal,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicSearchPageDto {
    pub items: Vec<PublicPropertyListItemDto>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
}
