use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::propertydb::{total_pages, PropertyStoreExt, StoreError};
use crate::dtos::propertydtos::{
    ImageOrderItemDto, ModerationQueueItemDto, NewPropertyImage, NormalizedCreateProperty,
    NormalizedPatchProperty, PublicPropertyListItemDto, PublicSearchFilters, PublicSearchPageDto,
    PublicSortOption,
};
use crate::models::propertymodel::{Property, PropertyImage, PropertyStatus, PropertyStatusHistory};

#[derive(Debug, Default)]
struct Inner {
    owners: HashMap<Uuid, Uuid>,
    properties: HashMap<Uuid, Property>,
    images: Vec<PropertyImage>,
    history: Vec<PropertyStatusHistory>,
}

/// In-memory counterpart of the Postgres store, used by the HTTP tests.
/// Mirrors the same semantics: case-insensitive city match, stable sort
/// tiebreaks, idempotent status updates, all-or-nothing reorders.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    inner: Mutex<Inner>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an auth principal -> internal user mapping.
    pub fn insert_owner_mapping(&self, auth_user_id: Uuid, user_id: Uuid) {
        self.inner.lock().unwrap().owners.insert(auth_user_id, user_id);
    }

    fn sorted_images(inner: &Inner, property_id: Uuid) -> Vec<PropertyImage> {
        let mut images: Vec<PropertyImage> = inner
            .images
            .iter()
            .filter(|image| image.property_id == property_id)
            .cloned()
            .collect();
        images.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        images
    }
}

#[async_trait]
impl PropertyStoreExt for MemoryPropertyStore {
    async fn find_owner_user_id(&self, auth_user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.inner.lock().unwrap().owners.get(&auth_user_id).copied())
    }

    async fn get_property_by_id(&self, property_id: Uuid) -> Result<Option<Property>, StoreError> {
        Ok(self.inner.lock().unwrap().properties.get(&property_id).cloned())
    }

    async fn create_property(
        &self,
        owner_user_id: Uuid,
        input: NormalizedCreateProperty,
    ) -> Result<Property, StoreError> {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            owner_user_id,
            title: input.title,
            description: input.description,
            city: input.city,
            neighborhood: input.neighborhood,
            address: input.address,
            monthly_price: input.monthly_price,
            deposit_amount: input.deposit_amount,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area_m2: input.area_m2,
            is_furnished: input.is_furnished,
            available_from: input.available_from,
            contract_type: input.contract_type,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .unwrap()
            .properties
            .insert(property.id, property.clone());
        Ok(property)
    }

    async fn update_property(
        &self,
        property_id: Uuid,
        input: NormalizedPatchProperty,
    ) -> Result<Option<Property>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let property = match inner.properties.get_mut(&property_id) {
            Some(property) => property,
            None => return Ok(None),
        };
        if !input.has_any_field() {
            return Ok(Some(property.clone()));
        }

        if let Some(title) = input.title {
            property.title = title;
        }
        if let Some(description) = input.description {
            property.description = Some(description);
        }
        if let Some(city) = input.city {
            property.city = city;
        }
        if let Some(neighborhood) = input.neighborhood {
            property.neighborhood = Some(neighborhood);
        }
        if let Some(address) = input.address {
            property.address = Some(address);
        }
        if let Some(monthly_price) = input.monthly_price {
            property.monthly_price = monthly_price;
        }
        if let Some(deposit_amount) = input.deposit_amount {
            property.deposit_amount = deposit_amount;
        }
        if let Some(bedrooms) = input.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = input.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(area_m2) = input.area_m2 {
            property.area_m2 = area_m2;
        }
        if let Some(is_furnished) = input.is_furnished {
            property.is_furnished = is_furnished;
        }
        if let Some(available_from) = input.available_from {
            property.available_from = available_from;
        }
        if let Some(contract_type) = input.contract_type {
            property.contract_type = contract_type;
        }
        if let Some(status) = input.status {
            property.status = status;
        }
        property.updated_at = Utc::now();
        Ok(Some(property.clone()))
    }

    async fn list_images(&self, property_id: Uuid) -> Result<Vec<PropertyImage>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::sorted_images(&inner, property_id))
    }

    async fn count_images(&self, property_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .images
            .iter()
            .filter(|image| image.property_id == property_id)
            .count() as i64)
    }

    async fn add_images(
        &self,
        property_id: Uuid,
        images: Vec<NewPropertyImage>,
    ) -> Result<Vec<PropertyImage>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::with_capacity(images.len());
        for image in images {
            let record = PropertyImage {
                id: Uuid::new_v4(),
                property_id,
                storage_path: image.storage_path,
                public_url: image.public_url,
                mime_type: image.mime_type,
                file_size_bytes: image.file_size_bytes,
                display_order: image.display_order,
                created_at: Utc::now(),
            };
            inner.images.push(record.clone());
            created.push(record);
        }
        Ok(created)
    }

    async fn reorder_images(
        &self,
        property_id: Uuid,
        items: Vec<ImageOrderItemDto>,
    ) -> Result<Vec<PropertyImage>, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Validate the whole batch before touching anything.
        for item in &items {
            let owned = inner
                .images
                .iter()
                .any(|image| image.id == item.image_id && image.property_id == property_id);
            if !owned {
                return Err(StoreError::ForeignImage(item.image_id));
            }
        }

        for item in &items {
            if let Some(image) = inner.images.iter_mut().find(|image| image.id == item.image_id) {
                image.display_order = item.display_order;
            }
        }

        Ok(Self::sorted_images(&inner, property_id))
    }

    async fn list_pending_moderation(&self) -> Result<Vec<ModerationQueueItemDto>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<&Property> = inner
            .properties
            .values()
            .filter(|property| property.status == PropertyStatus::Pendiente)
            .collect();
        pending.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(pending
            .into_iter()
            .map(|property| ModerationQueueItemDto {
                id: property.id,
                owner_user_id: property.owner_user_id,
                title: property.title.clone(),
                city: property.city.clone(),
                status: property.status,
                updated_at: property.updated_at,
            })
            .collect())
    }

    async fn search_published(
        &self,
        filters: PublicSearchFilters,
        sort: PublicSortOption,
        page: u32,
        page_size: u32,
    ) -> Result<PublicSearchPageDto, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<&Property> = inner
            .properties
            .values()
            .filter(|property| property.status == PropertyStatus::Publicado)
            .filter(|property| match &filters.city {
                Some(city) => property.city.to_lowercase() == city.to_lowercase(),
                None => true,
            })
            .filter(|property| match &filters.min_price {
                Some(min_price) => property.monthly_price >= *min_price,
                None => true,
            })
            .filter(|property| match &filters.max_price {
                Some(max_price) => property.monthly_price <= *max_price,
                None => true,
            })
            .filter(|property| match filters.bedrooms {
                Some(bedrooms) => property.bedrooms == bedrooms,
                None => true,
            })
            .filter(|property| match filters.is_furnished {
                Some(is_furnished) => property.is_furnished == is_furnished,
                None => true,
            })
            .collect();

        match sort {
            PublicSortOption::Newest => matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            PublicSortOption::PriceAsc => matches.sort_by(|a, b| {
                a.monthly_price
                    .cmp(&b.monthly_price)
                    .then(b.updated_at.cmp(&a.updated_at))
            }),
            PublicSortOption::PriceDesc => matches.sort_by(|a, b| {
                b.monthly_price
                    .cmp(&a.monthly_price)
                    .then(b.updated_at.cmp(&a.updated_at))
            }),
        }

        let total_items = matches.len() as i64;
        let offset = (page.saturating_sub(1) as usize) * page_size as usize;
        let items = matches
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .map(|property| PublicPropertyListItemDto {
                id: property.id,
                title: property.title.clone(),
                description: property.description.clone(),
                city: property.city.clone(),
                neighborhood: property.neighborhood.clone(),
                address: property.address.clone(),
                monthly_price: property.monthly_price.clone(),
                bedrooms: property.bedrooms,
                bathrooms: property.bathrooms,
                cover_image_url: Self::sorted_images(&inner, property.id)
                    .first()
                    .map(|image| image.public_url.clone()),
            })
            .collect();

        Ok(PublicSearchPageDto {
            items,
            page,
            page_size,
            total_items,
            total_pages: total_pages(total_items, page_size),
        })
    }

    async fn update_status(
        &self,
        property_id: Uuid,
        new_status: PropertyStatus,
        changed_by_user_id: Option<Uuid>,
        changed_by_role: &str,
        reason: Option<String>,
    ) -> Result<Option<Property>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let property = match inner.properties.get_mut(&property_id) {
            Some(property) => property,
            None => return Ok(None),
        };
        let previous_status = property.status;

        if previous_status == new_status {
            return Ok(Some(property.clone()));
        }

        property.status = new_status;
        property.updated_at = Utc::now();
        let updated = property.clone();

        inner.history.push(PropertyStatusHistory {
            id: Uuid::new_v4(),
            property_id,
            previous_status,
            new_status,
            changed_by_user_id,
            changed_by_role: changed_by_role.to_string(),
            reason,
            changed_at: Utc::now(),
        });

        Ok(Some(updated))
    }

    async fn get_status_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyStatusHistory>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut history: Vec<PropertyStatusHistory> = inner
            .history
            .iter()
            .filter(|entry| entry.property_id == property_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(history)
    }
}
