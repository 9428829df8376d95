use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::propertydb::StoreError,
    dtos::propertydtos::{
        CreatePropertyDto, ModeratePropertyDto, NewPropertyImage, PropertyImageDto,
        PublicSearchFilters, PublicSearchQueryDto, PublicSortOption, ReorderImagesDto,
        UpdatePropertyDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddleware,
    models::propertymodel::{Property, PropertyStatus},
    service::property_validator::{add_error, validate_for_create, validate_for_patch},
    service::roles::{is_in_any_role, ClaimSet, ROLE_ADMIN, ROLE_PROPIETARIO},
    AppState,
};

pub const MAX_IMAGES_PER_PROPERTY: usize = 15;
pub const MAX_IMAGE_SIZE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

fn map_store_error(error: StoreError) -> HttpError {
    match error {
        StoreError::ForeignImage(image_id) => {
            let mut errors = BTreeMap::new();
            add_error(
                &mut errors,
                "items",
                format!("Image '{image_id}' does not belong to this property."),
            );
            HttpError::validation_error(errors)
        }
        StoreError::Database(db_error) => {
            tracing::error!(error = %db_error, "database operation failed");
            HttpError::server_error(ErrorMessage::DatabaseError.to_string())
        }
    }
}

fn require_any_role(claims: &ClaimSet, allowed_roles: &[&str]) -> Result<(), HttpError> {
    if is_in_any_role(claims, allowed_roles) {
        Ok(())
    } else {
        Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()))
    }
}

/// Maps the token subject to the internal user id. A valid token without a
/// usable subject is a 401; a subject with no profile row is a 403.
async fn resolve_profile_id(
    app_state: &AppState,
    claims: &ClaimSet,
) -> Result<Uuid, HttpError> {
    let auth_user_id = claims
        .auth_user_id()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    app_state
        .db_client
        .find_owner_user_id(auth_user_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| HttpError::forbidden(ErrorMessage::MissingUserProfile.to_string()))
}

/// Admins may manage any listing, owners only their own.
async fn authorize_listing_access(
    app_state: &AppState,
    claims: &ClaimSet,
    property: &Property,
) -> Result<(), HttpError> {
    if is_in_any_role(claims, &[ROLE_ADMIN]) {
        return Ok(());
    }

    let profile_id = resolve_profile_id(app_state, claims).await?;
    if property.owner_user_id != profile_id {
        return Err(HttpError::forbidden(ErrorMessage::NotPropertyOwner.to_string()));
    }
    Ok(())
}

async fn load_property(app_state: &AppState, property_id: Uuid) -> Result<Property, HttpError> {
    app_state
        .db_client
        .get_property_by_id(property_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PropertyNotFound.to_string()))
}

pub async fn create_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreatePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_PROPIETARIO, ROLE_ADMIN])?;

    // Payload problems are reported before identity resolution.
    let normalized = validate_for_create(&body).map_err(HttpError::validation_error)?;

    let owner_user_id = resolve_profile_id(&app_state, &auth.claims).await?;

    let property = app_state
        .db_client
        .create_property(owner_user_id, normalized)
        .await
        .map_err(map_store_error)?;

    tracing::info!(property_id = %property.id, owner_user_id = %owner_user_id, "property created");

    let location = format!("/properties/{}", property.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(serde_json::json!({
            "status": "success",
            "data": { "property": property }
        })),
    ))
}

pub async fn edit_property(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdatePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_PROPIETARIO, ROLE_ADMIN])?;

    // Payload problems are reported before the record is even looked up.
    let normalized = validate_for_patch(&body).map_err(HttpError::validation_error)?;
    if !normalized.has_any_field() {
        return Err(HttpError::bad_request(
            "At least one field must be provided".to_string(),
        ));
    }

    let property = load_property(&app_state, property_id).await?;
    authorize_listing_access(&app_state, &auth.claims, &property).await?;

    let updated = app_state
        .db_client
        .update_property(property_id, normalized)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PropertyNotFound.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "property": updated }
    })))
}

pub async fn get_moderation_queue(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_ADMIN])?;

    let items = app_state
        .db_client
        .list_pending_moderation()
        .await
        .map_err(map_store_error)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "items": items }
    })))
}

pub async fn moderate_property(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<ModeratePropertyDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_ADMIN])?;

    // Moderation can only publish or reject, never send back to pending.
    let new_status = match PropertyStatus::parse(&body.status) {
        Some(PropertyStatus::Publicado) => PropertyStatus::Publicado,
        Some(PropertyStatus::Rechazado) => PropertyStatus::Rechazado,
        _ => {
            let mut errors = BTreeMap::new();
            add_error(&mut errors, "status", "status must be publicado or rechazado.");
            return Err(HttpError::validation_error(errors));
        }
    };

    let changed_by_user_id = match auth.claims.auth_user_id() {
        Some(auth_user_id) => app_state
            .db_client
            .find_owner_user_id(auth_user_id)
            .await
            .map_err(map_store_error)?,
        None => None,
    };

    let updated = app_state
        .db_client
        .update_status(
            property_id,
            new_status,
            changed_by_user_id,
            ROLE_ADMIN,
            body.reason.as_deref().and_then(crate::dtos::propertydtos::optional_text),
        )
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::PropertyNotFound.to_string()))?;

    tracing::info!(property_id = %property_id, status = %updated.status, "property moderated");

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "property": updated }
    })))
}

pub async fn get_status_history(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_ADMIN])?;

    load_property(&app_state, property_id).await?;

    let history = app_state
        .db_client
        .get_status_history(property_id)
        .await
        .map_err(map_store_error)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "history": history }
    })))
}

pub async fn list_property_images(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    load_property(&app_state, property_id).await?;

    let images = app_state
        .db_client
        .list_images(property_id)
        .await
        .map_err(map_store_error)?;
    let images: Vec<PropertyImageDto> = images.iter().map(PropertyImageDto::from_image).collect();

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "images": images }
    })))
}

struct UploadedPart {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

pub async fn upload_property_images(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_PROPIETARIO, ROLE_ADMIN])?;

    let property = load_property(&app_state, property_id).await?;
    authorize_listing_access(&app_state, &auth.claims, &property).await?;

    let mut parts: Vec<UploadedPart> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field
            .file_name()
            .map(str::to_string)
            .or_else(|| field.name().map(str::to_string))
            .unwrap_or_else(|| format!("file{}", parts.len() + 1));
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(format!("Failed to read uploaded file: {e}")))?;
        parts.push(UploadedPart {
            name,
            content_type,
            bytes,
        });
    }

    if parts.is_empty() {
        return Err(HttpError::bad_request(
            "At least one image file must be provided".to_string(),
        ));
    }

    // All files are checked before any of them is stored.
    let mut errors = BTreeMap::new();
    for part in &parts {
        let allowed = part
            .content_type
            .as_deref()
            .map(|mime| {
                ALLOWED_IMAGE_MIME_TYPES
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(mime))
            })
            .unwrap_or(false);
        if !allowed {
            add_error(&mut errors, &part.name, "Only JPEG, PNG or WebP images are allowed.");
        }
        if part.bytes.is_empty() {
            add_error(&mut errors, &part.name, "File is empty.");
        } else if part.bytes.len() > MAX_IMAGE_SIZE_BYTES {
            add_error(&mut errors, &part.name, "File exceeds the 5MB size limit.");
        }
    }
    if !errors.is_empty() {
        return Err(HttpError::validation_error(errors));
    }

    let existing = app_state
        .db_client
        .count_images(property_id)
        .await
        .map_err(map_store_error)?;
    if existing as usize + parts.len() > MAX_IMAGES_PER_PROPERTY {
        return Err(HttpError::bad_request(format!(
            "A property can have at most {MAX_IMAGES_PER_PROPERTY} images"
        )));
    }

    let mut new_images = Vec::with_capacity(parts.len());
    for (index, part) in parts.into_iter().enumerate() {
        let content_type = part.content_type.unwrap_or_default();
        let stored = app_state
            .image_storage
            .save(property_id, &content_type, part.bytes)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, property_id = %property_id, "image write failed");
                HttpError::server_error("Failed to store uploaded image".to_string())
            })?;
        new_images.push(NewPropertyImage {
            storage_path: stored.storage_path,
            public_url: stored.public_url,
            mime_type: stored.mime_type,
            file_size_bytes: stored.file_size_bytes,
            display_order: existing as i32 + index as i32,
        });
    }

    let created = app_state
        .db_client
        .add_images(property_id, new_images)
        .await
        .map_err(map_store_error)?;
    let created: Vec<PropertyImageDto> = created.iter().map(PropertyImageDto::from_image).collect();

    tracing::info!(property_id = %property_id, count = created.len(), "images uploaded");

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "images": created }
    })))
}

pub async fn reorder_property_images(
    Path(property_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<ReorderImagesDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_any_role(&auth.claims, &[ROLE_PROPIETARIO, ROLE_ADMIN])?;

    let property = load_property(&app_state, property_id).await?;
    authorize_listing_access(&app_state, &auth.claims, &property).await?;

    if body.items.is_empty() {
        return Err(HttpError::bad_request(
            "At least one order item must be provided".to_string(),
        ));
    }

    let mut errors = BTreeMap::new();
    let mut seen_ids = std::collections::HashSet::new();
    let mut seen_orders = std::collections::HashSet::new();
    for item in &body.items {
        if item.display_order < 0 {
            add_error(&mut errors, "displayOrder", "displayOrder cannot be negative.");
        }
        if !seen_ids.insert(item.image_id) {
            add_error(
                &mut errors,
                "items",
                format!("Image '{}' appears more than once.", item.image_id),
            );
        }
        if !seen_orders.insert(item.display_order) {
            add_error(
                &mut errors,
                "items",
                format!("displayOrder {} appears more than once.", item.display_order),
            );
        }
    }
    if !errors.is_empty() {
        return Err(HttpError::validation_error(errors));
    }

    let images = app_state
        .db_client
        .reorder_images(property_id, body.items)
        .await
        .map_err(map_store_error)?;
    let images: Vec<PropertyImageDto> = images.iter().map(PropertyImageDto::from_image).collect();

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "images": images }
    })))
}

pub async fn search_public_properties(
    Query(query_params): Query<PublicSearchQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if let (Some(min_price), Some(max_price)) = (&query_params.min_price, &query_params.max_price) {
        if min_price > max_price {
            let mut errors = BTreeMap::new();
            add_error(&mut errors, "minPrice", "minPrice cannot be greater than maxPrice.");
            return Err(HttpError::validation_error(errors));
        }
    }

    let filters = PublicSearchFilters {
        city: query_params
            .city
            .as_deref()
            .and_then(crate::dtos::propertydtos::optional_text),
        min_price: query_params.min_price.clone(),
        max_price: query_params.max_price.clone(),
        bedrooms: query_params.bedrooms,
        is_furnished: query_params.is_furnished,
    };
    let sort = PublicSortOption::parse(query_params.sort.as_deref());
    let page = query_params.page.unwrap_or(1);
    let page_size = query_params.page_size.unwrap_or(20);

    let result = app_state
        .db_client
        .search_published(filters, sort, page, page_size)
        .await
        .map_err(map_store_error)?;

    Ok(Json(result))
}
