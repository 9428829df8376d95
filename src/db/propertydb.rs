use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::db::db::DBClient;
use crate::db::retry::with_transient_retry;
use crate::dtos::propertydtos::{
    ImageOrderItemDto, ModerationQueueItemDto, NewPropertyImage, NormalizedCreateProperty,
    NormalizedPatchProperty, PublicPropertyListItemDto, PublicSearchFilters, PublicSearchPageDto,
    PublicSortOption,
};
use crate::models::propertymodel::{Property, PropertyImage, PropertyStatus, PropertyStatusHistory};

const PROPERTY_COLUMNS: &str = "id, owner_user_id, title, description, city, neighborhood, address, \
     monthly_price, deposit_amount, bedrooms, bathrooms, area_m2, \
     is_furnished, available_from, contract_type, status, created_at, updated_at";

const IMAGE_COLUMNS: &str =
    "id, property_id, storage_path, public_url, mime_type, file_size_bytes, display_order, created_at";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Reorder referenced an image that does not belong to the property.
    #[error("image '{0}' does not belong to this property")]
    ForeignImage(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The repository contract consumed by the endpoint layer. Backed by
/// Postgres in production and by `MemoryPropertyStore` in tests.
#[async_trait]
pub trait PropertyStoreExt: Send + Sync {
    /// Bridges an external auth principal to the internal owner id.
    async fn find_owner_user_id(&self, auth_user_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn get_property_by_id(&self, property_id: Uuid) -> Result<Option<Property>, StoreError>;

    async fn create_property(
        &self,
        owner_user_id: Uuid,
        input: NormalizedCreateProperty,
    ) -> Result<Property, StoreError>;

    /// Applies only the provided fields. An empty patch is a pure read:
    /// no row write, no `updated_at` bump.
    async fn update_property(
        &self,
        property_id: Uuid,
        input: NormalizedPatchProperty,
    ) -> Result<Option<Property>, StoreError>;

    async fn list_images(&self, property_id: Uuid) -> Result<Vec<PropertyImage>, StoreError>;

    async fn count_images(&self, property_id: Uuid) -> Result<i64, StoreError>;

    async fn add_images(
        &self,
        property_id: Uuid,
        images: Vec<NewPropertyImage>,
    ) -> Result<Vec<PropertyImage>, StoreError>;

    async fn reorder_images(
        &self,
        property_id: Uuid,
        items: Vec<ImageOrderItemDto>,
    ) -> Result<Vec<PropertyImage>, StoreError>;

    async fn list_pending_moderation(&self) -> Result<Vec<ModerationQueueItemDto>, StoreError>;

    async fn search_published(
        &self,
        filters: PublicSearchFilters,
        sort: PublicSortOption,
        page: u32,
        page_size: u32,
    ) -> Result<PublicSearchPageDto, StoreError>;

    /// Atomic read-compare-write-append. Setting the current status again
    /// is a no-op that returns the record unchanged without a history row.
    async fn update_status(
        &self,
        property_id: Uuid,
        new_status: PropertyStatus,
        changed_by_user_id: Option<Uuid>,
        changed_by_role: &str,
        reason: Option<String>,
    ) -> Result<Option<Property>, StoreError>;

    async fn get_status_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyStatusHistory>, StoreError>;
}

#[async_trait]
impl PropertyStoreExt for DBClient {
    async fn find_owner_user_id(&self, auth_user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let owner_id = with_transient_retry(|| async {
            sqlx::query_scalar::<_, Uuid>("select id from users where auth_user_id = $1 limit 1")
                .bind(auth_user_id)
                .fetch_optional(&self.pool)
                .await
        })
        .await?;

        Ok(owner_id)
    }

    async fn get_property_by_id(&self, property_id: Uuid) -> Result<Option<Property>, StoreError> {
        let sql = format!("select {PROPERTY_COLUMNS} from properties where id = $1 limit 1");
        let property = with_transient_retry(|| async {
            sqlx::query_as::<_, Property>(&sql)
                .bind(property_id)
                .fetch_optional(&self.pool)
                .await
        })
        .await?;

        Ok(property)
    }

    async fn create_property(
        &self,
        owner_user_id: Uuid,
        input: NormalizedCreateProperty,
    ) -> Result<Property, StoreError> {
        let sql = format!(
            "insert into properties (
                owner_user_id, title, description, city, neighborhood, address,
                monthly_price, deposit_amount, bedrooms, bathrooms, area_m2,
                is_furnished, available_from, contract_type, status
            )
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            returning {PROPERTY_COLUMNS}"
        );

        let property = sqlx::query_as::<_, Property>(&sql)
            .bind(owner_user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.city)
            .bind(&input.neighborhood)
            .bind(&input.address)
            .bind(&input.monthly_price)
            .bind(&input.deposit_amount)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(&input.area_m2)
            .bind(input.is_furnished)
            .bind(input.available_from)
            .bind(input.contract_type)
            .bind(input.status)
            .fetch_one(&self.pool)
            .await?;

        Ok(property)
    }

    async fn update_property(
        &self,
        property_id: Uuid,
        input: NormalizedPatchProperty,
    ) -> Result<Option<Property>, StoreError> {
        if !input.has_any_field() {
            return self.get_property_by_id(property_id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("update properties set ");
        {
            let mut sets = builder.separated(", ");
            if let Some(title) = &input.title {
                sets.push("title = ").push_bind_unseparated(title.clone());
            }
            if let Some(description) = &input.description {
                sets.push("description = ")
                    .push_bind_unseparated(description.clone());
            }
            if let Some(city) = &input.city {
                sets.push("city = ").push_bind_unseparated(city.clone());
            }
            if let Some(neighborhood) = &input.neighborhood {
                sets.push("neighborhood = ")
                    .push_bind_unseparated(neighborhood.clone());
            }
            if let Some(address) = &input.address {
                sets.push("address = ").push_bind_unseparated(address.clone());
            }
            if let Some(monthly_price) = &input.monthly_price {
                sets.push("monthly_price = ")
                    .push_bind_unseparated(monthly_price.clone());
            }
            if let Some(deposit_amount) = &input.deposit_amount {
                sets.push("deposit_amount = ")
                    .push_bind_unseparated(deposit_amount.clone());
            }
            if let Some(bedrooms) = input.bedrooms {
                sets.push("bedrooms = ").push_bind_unseparated(bedrooms);
            }
            if let Some(bathrooms) = input.bathrooms {
                sets.push("bathrooms = ").push_bind_unseparated(bathrooms);
            }
            if let Some(area_m2) = &input.area_m2 {
                sets.push("area_m2 = ").push_bind_unseparated(area_m2.clone());
            }
            if let Some(is_furnished) = input.is_furnished {
                sets.push("is_furnished = ").push_bind_unseparated(is_furnished);
            }
            if let Some(available_from) = input.available_from {
                sets.push("available_from = ")
                    .push_bind_unseparated(available_from);
            }
            if let Some(contract_type) = input.contract_type {
                sets.push("contract_type = ")
                    .push_bind_unseparated(contract_type);
            }
            if let Some(status) = input.status {
                sets.push("status = ").push_bind_unseparated(status);
            }
            sets.push("updated_at = now()");
        }

        builder.push(" where id = ");
        builder.push_bind(property_id);
        builder.push(format!(" returning {PROPERTY_COLUMNS}"));

        let property = builder
            .build_query_as::<Property>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(property)
    }

    async fn list_images(&self, property_id: Uuid) -> Result<Vec<PropertyImage>, StoreError> {
        let sql = format!(
            "select {IMAGE_COLUMNS} from property_images
             where property_id = $1
             order by display_order asc, created_at asc"
        );
        let images = with_transient_retry(|| async {
            sqlx::query_as::<_, PropertyImage>(&sql)
                .bind(property_id)
                .fetch_all(&self.pool)
                .await
        })
        .await?;

        Ok(images)
    }

    async fn count_images(&self, property_id: Uuid) -> Result<i64, StoreError> {
        let count = with_transient_retry(|| async {
            sqlx::query_scalar::<_, i64>(
                "select count(*) from property_images where property_id = $1",
            )
            .bind(property_id)
            .fetch_one(&self.pool)
            .await
        })
        .await?;

        Ok(count)
    }

    async fn add_images(
        &self,
        property_id: Uuid,
        images: Vec<NewPropertyImage>,
    ) -> Result<Vec<PropertyImage>, StoreError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "insert into property_images (
                property_id, storage_path, public_url, mime_type, file_size_bytes, display_order
            )
            values ($1, $2, $3, $4, $5, $6)
            returning {IMAGE_COLUMNS}"
        );

        // All-or-nothing: a failing insert rolls the whole batch back.
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(images.len());
        for image in &images {
            let record = sqlx::query_as::<_, PropertyImage>(&sql)
                .bind(property_id)
                .bind(&image.storage_path)
                .bind(&image.public_url)
                .bind(&image.mime_type)
                .bind(image.file_size_bytes)
                .bind(image.display_order)
                .fetch_one(&mut *tx)
                .await?;
            created.push(record);
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn reorder_images(
        &self,
        property_id: Uuid,
        items: Vec<ImageOrderItemDto>,
    ) -> Result<Vec<PropertyImage>, StoreError> {
        if items.is_empty() {
            return self.list_images(property_id).await;
        }

        let mut tx = self.pool.begin().await?;
        for item in &items {
            let result = sqlx::query(
                "update property_images set display_order = $1
                 where id = $2 and property_id = $3",
            )
            .bind(item.display_order)
            .bind(item.image_id)
            .bind(property_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back every earlier update.
                return Err(StoreError::ForeignImage(item.image_id));
            }
        }
        tx.commit().await?;

        self.list_images(property_id).await
    }

    async fn list_pending_moderation(&self) -> Result<Vec<ModerationQueueItemDto>, StoreError> {
        let items = with_transient_retry(|| async {
            sqlx::query_as::<_, ModerationQueueItemDto>(
                "select id, owner_user_id, title, city, status, updated_at
                 from properties
                 where status = 'pendiente'
                 order by updated_at desc",
            )
            .fetch_all(&self.pool)
            .await
        })
        .await?;

        Ok(items)
    }

    async fn search_published(
        &self,
        filters: PublicSearchFilters,
        sort: PublicSortOption,
        page: u32,
        page_size: u32,
    ) -> Result<PublicSearchPageDto, StoreError> {
        let (total_items, items) = with_transient_retry(|| async {
            let mut count_builder =
                QueryBuilder::<Postgres>::new("select count(*) from properties p where p.status = 'publicado'");
            push_public_filters(&mut count_builder, &filters);
            let total_items: i64 = count_builder
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await?;

            let mut data_builder = QueryBuilder::<Postgres>::new(
                "select p.id, p.title, p.description, p.city, p.neighborhood, p.address,
                        p.monthly_price, p.bedrooms, p.bathrooms,
                        (
                          select i.public_url
                          from property_images i
                          where i.property_id = p.id
                          order by i.display_order asc, i.created_at asc
                          limit 1
                        ) as cover_image_url
                 from properties p
                 where p.status = 'publicado'",
            );
            push_public_filters(&mut data_builder, &filters);
            data_builder.push(match sort {
                PublicSortOption::PriceAsc => " order by p.monthly_price asc, p.updated_at desc",
                PublicSortOption::PriceDesc => " order by p.monthly_price desc, p.updated_at desc",
                PublicSortOption::Newest => " order by p.updated_at desc",
            });
            data_builder.push(" limit ");
            data_builder.push_bind(page_size as i64);
            data_builder.push(" offset ");
            data_builder.push_bind((page.saturating_sub(1) as i64) * page_size as i64);

            let items = data_builder
                .build_query_as::<PublicPropertyListItemDto>()
                .fetch_all(&self.pool)
                .await?;

            Ok((total_items, items))
        })
        .await?;

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
        let select_sql = format!("select {PROPERTY_COLUMNS} from properties where id = $1 limit 1");
        let update_sql = format!(
            "update properties set status = $1, updated_at = now()
             where id = $2
             returning {PROPERTY_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Property>(&select_sql)
            .bind(property_id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = match current {
            Some(current) => current,
            None => return Ok(None),
        };

        if current.status == new_status {
            tx.commit().await?;
            return Ok(Some(current));
        }

        let updated = sqlx::query_as::<_, Property>(&update_sql)
            .bind(new_status)
            .bind(property_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "insert into property_status_history (
                property_id, previous_status, new_status, changed_by_user_id, changed_by_role, reason
            )
            values ($1, $2, $3, $4, $5, $6)",
        )
        .bind(property_id)
        .bind(current.status)
        .bind(new_status)
        .bind(changed_by_user_id)
        .bind(changed_by_role)
        .bind(&reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn get_status_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyStatusHistory>, StoreError> {
        let history = with_transient_retry(|| async {
            sqlx::query_as::<_, PropertyStatusHistory>(
                "select id, property_id, previous_status, new_status,
                        changed_by_user_id, changed_by_role, reason, changed_at
                 from property_status_history
                 where property_id = $1
                 order by changed_at desc",
            )
            .bind(property_id)
            .fetch_all(&self.pool)
            .await
        })
        .await?;

        Ok(history)
    }
}

pub fn total_pages(total_items: i64, page_size: u32) -> i64 {
    if total_items == 0 {
        0
    } else {
        (total_items + page_size as i64 - 1) / page_size as i64
    }
}

fn push_public_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &PublicSearchFilters) {
    if let Some(city) = &filters.city {
        builder.push(" and lower(p.city) = lower(");
        builder.push_bind(city.clone());
        builder.push(")");
    }
    if let Some(min_price) = &filters.min_price {
        builder.push(" and p.monthly_price >= ");
        builder.push_bind(min_price.clone());
    }
    if let Some(max_price) = &filters.max_price {
        builder.push(" and p.monthly_price <= ");
        builder.push_bind(max_price.clone());
    }
    if let Some(bedrooms) = filters.bedrooms {
        builder.push(" and p.bedrooms = ");
        builder.push_bind(bedrooms);
    }
    if let Some(is_furnished) = filters.is_furnished {
        builder.push(" and p.is_furnished = ");
        builder.push_bind(is_furnished);
    }
}
