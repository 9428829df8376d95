use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "property_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Pendiente, // Awaiting moderation
    Publicado, // Visible to the public
    Rechazado, // Rejected by an admin
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Pendiente => "pendiente",
            PropertyStatus::Publicado => "publicado",
            PropertyStatus::Rechazado => "rechazado",
        }
    }

    /// Case-insensitive parse, leading/trailing whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pendiente" => Some(PropertyStatus::Pendiente),
            "publicado" => Some(PropertyStatus::Publicado),
            "rechazado" => Some(PropertyStatus::Rechazado),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "contract_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    LongTerm,
    Temporary,
    Monthly,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::LongTerm => "long_term",
            ContractType::Temporary => "temporary",
            ContractType::Monthly => "monthly",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "long_term" => Some(ContractType::LongTerm),
            "temporary" => Some(ContractType::Temporary),
            "monthly" => Some(ContractType::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Property {
    pub id: Uuid,
    pub owner_user_id: Uuid,

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

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PropertyImage {
    pub id: Uuid,
    pub property_id: Uuid,
    pub storage_path: String,
    pub public_url: String,
    pub mime_type: String,
    pub file_size_bytes: i32,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PropertyStatusHistory {
    pub id: Uuid,
    pub property_id: Uuid,
    pub previous_status: PropertyStatus,
    pub new_status: PropertyStatus,
    pub changed_by_user_id: Option<Uuid>,
    pub changed_by_role: String,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}
