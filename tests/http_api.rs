use std::sync::Arc;

use alquila::config::Config;
use alquila::db::memory::MemoryPropertyStore;
use alquila::db::propertydb::PropertyStoreExt;
use alquila::dtos::propertydtos::NewPropertyImage;
use alquila::routes::create_router;
use alquila::service::storage::LocalImageStorage;
use alquila::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "http-api-test-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryPropertyStore>,
    content_root: std::path::PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.content_root);
    }
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryPropertyStore::new());
    let content_root = std::env::temp_dir().join(format!("alquila-http-{}", Uuid::new_v4()));
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        port: 0,
        content_root: content_root.to_string_lossy().to_string(),
    };
    let app_state = Arc::new(AppState {
        env: config,
        db_client: store.clone(),
        image_storage: Arc::new(LocalImageStorage::new(&content_root)),
    });
    TestApp {
        router: create_router(app_state),
        store,
        content_root,
    }
}

fn sign_token(claims: Value) -> String {
    let mut claims = claims;
    claims["exp"] = json!(chrono::Utc::now().timestamp() + 600);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn owner_token(auth_user_id: Uuid) -> String {
    sign_token(json!({ "sub": auth_user_id.to_string(), "role": "propietario" }))
}

fn admin_token() -> String {
    sign_token(json!({ "sub": Uuid::new_v4().to_string(), "role": "admin" }))
}

fn valid_create_body() -> Value {
    json!({
        "title": "Piso luminoso en el centro",
        "description": "Dos habitaciones con balcon",
        "city": "Madrid",
        "neighborhood": "Chamberi",
        "address": "Calle Mayor 1",
        "monthly_price": "950.00",
        "deposit_amount": "950.00",
        "bedrooms": 2,
        "bathrooms": 1,
        "area_m2": "70.5",
        "is_furnished": true,
        "available_from": "2026-10-01",
        "contract_type": "long_term",
        "status": "pendiente"
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers a propietario profile and returns (token, internal user id).
fn seed_owner(app: &TestApp) -> (String, Uuid) {
    let auth_user_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    app.store.insert_owner_mapping(auth_user_id, user_id);
    (owner_token(auth_user_id), user_id)
}

async fn create_listing(app: &TestApp, token: &str) -> Uuid {
    let (status, body) = send(
        &app.router,
        json_request("POST", "/properties", Some(token), valid_create_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(body["data"]["property"]["id"].as_str().unwrap()).unwrap()
}

fn multipart_request(uri: &str, token: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let mut body: Vec<u8> = Vec::new();
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = test_app();
    let (status, body) = send(&app.router, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_requires_a_token() {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        json_request("POST", "/properties", None, valid_create_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_rejects_tokens_without_an_accepted_role() {
    let app = test_app();
    let token = sign_token(json!({ "sub": Uuid::new_v4().to_string(), "role": "inquilino" }));
    let (status, _) = send(
        &app.router,
        json_request("POST", "/properties", Some(&token), valid_create_body()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_rejects_principals_without_a_profile() {
    let app = test_app();
    let token = owner_token(Uuid::new_v4());
    let (status, _) = send(
        &app.router,
        json_request("POST", "/properties", Some(&token), valid_create_body()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_returns_location_and_pending_listing() {
    let app = test_app();
    let (token, user_id) = seed_owner(&app);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/properties",
            Some(&token),
            valid_create_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    let property = &body["data"]["property"];
    assert_eq!(location, format!("/properties/{}", property["id"].as_str().unwrap()));
    assert_eq!(property["status"], "pendiente");
    assert_eq!(property["owner_user_id"], user_id.to_string());
    assert_eq!(property["title"], "Piso luminoso en el centro");
}

#[tokio::test]
async fn create_reports_field_errors() {
    let app = test_app();
    let (token, _) = seed_owner(&app);
    let mut body = valid_create_body();
    body["title"] = json!("   ");
    body["monthly_price"] = json!("0");
    body["contract_type"] = json!("weekly");

    let (status, response) = send(
        &app.router,
        json_request("POST", "/properties", Some(&token), body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "fail");
    let errors = response["errors"].as_object().unwrap();
    assert!(errors.contains_key("title"));
    assert!(errors.contains_key("monthly_price"));
    assert!(errors.contains_key("contract_type"));
}

#[tokio::test]
async fn owners_can_only_edit_their_own_listings() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let (intruder_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let patch = json!({ "monthly_price": "1200" });
    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}"),
            Some(&intruder_token),
            patch.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}"),
            Some(&owner_token),
            patch,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["property"]["monthly_price"], "1200");
}

#[tokio::test]
async fn admin_can_edit_any_listing() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}"),
            Some(&admin_token()),
            json!({ "title": "Edited by moderation" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn patch_without_any_field_is_rejected() {
    let app = test_app();
    let (token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &token).await;

    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}"),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_on_unknown_property_is_not_found() {
    let app = test_app();
    let (token, _) = seed_owner(&app);
    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{}", Uuid::new_v4()),
            Some(&token),
            json!({ "title": "anything" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moderation_endpoints_require_the_admin_role() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, _) = send(
        &app.router,
        get_request("/properties/moderation/pending", Some(&owner_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/moderation"),
            Some(&owner_token),
            json!({ "status": "publicado" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        get_request(
            &format!("/properties/{property_id}/status-history"),
            Some(&owner_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_role_can_come_from_metadata_claims() {
    let app = test_app();
    let token = sign_token(json!({
        "sub": Uuid::new_v4().to_string(),
        "app_metadata": "{\"role\":\"Admin\"}"
    }));
    let (status, _) = send(
        &app.router,
        get_request("/properties/moderation/pending", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cookie_tokens_are_accepted() {
    let app = test_app();
    let token = admin_token();
    let request = Request::builder()
        .method("GET")
        .uri("/properties/moderation/pending")
        .header("cookie", format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn moderation_flow_publishes_and_records_history() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;
    let admin = admin_token();

    let (status, body) = send(
        &app.router,
        get_request("/properties/moderation/pending", Some(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/moderation"),
            Some(&admin),
            json!({ "status": "Publicado", "reason": "verified" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["property"]["status"], "publicado");

    // Repeating the same decision leaves history untouched.
    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/moderation"),
            Some(&admin),
            json!({ "status": "publicado" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        get_request(
            &format!("/properties/{property_id}/status-history"),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["previous_status"], "pendiente");
    assert_eq!(history[0]["new_status"], "publicado");
    assert_eq!(history[0]["changed_by_role"], "admin");
    assert_eq!(history[0]["reason"], "verified");
}

#[tokio::test]
async fn moderation_cannot_send_back_to_pending() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/moderation"),
            Some(&admin_token()),
            json!({ "status": "pendiente" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_object().unwrap().contains_key("status"));
}

#[tokio::test]
async fn public_search_returns_published_listings_with_paging() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let admin = admin_token();
    let first = create_listing(&app, &owner_token).await;
    let second = create_listing(&app, &owner_token).await;
    for property_id in [first, second] {
        let (status, _) = send(
            &app.router,
            json_request(
                "PATCH",
                &format!("/properties/{property_id}/moderation"),
                Some(&admin),
                json!({ "status": "publicado" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    // A pending one stays invisible.
    create_listing(&app, &owner_token).await;

    let (status, body) = send(
        &app.router,
        get_request("/properties/public?city=MADRID&pageSize=1&sort=price_asc", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn public_search_rejects_inverted_price_range() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        get_request("/properties/public?minPrice=1000&maxPrice=500", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_object().unwrap().contains_key("minPrice"));
}

#[tokio::test]
async fn public_search_rejects_out_of_range_page_size() {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        get_request("/properties/public?pageSize=500", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_listing_is_public_but_checks_existence() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, _) = send(
        &app.router,
        get_request(&format!("/properties/{}/images", Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        get_request(&format!("/properties/{property_id}/images"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["images"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_stores_files_and_assigns_display_order() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, body) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &owner_token,
            &[
                ("a.png", "image/png", b"first-image"),
                ("b.jpg", "image/jpeg", b"second-image"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let images = body["data"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["display_order"], 0);
    assert_eq!(images[1]["display_order"], 1);
    assert_eq!(images[0]["mime_type"], "image/png");
    assert!(images[0]["public_url"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/properties/"));
    assert!(images[0].get("storage_path").is_none());
}

#[tokio::test]
async fn upload_rejects_unsupported_and_oversized_files_by_name() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let oversized = vec![0u8; 5 * 1024 * 1024 + 1];
    let (status, body) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &owner_token,
            &[
                ("doc.pdf", "application/pdf", b"not-an-image"),
                ("big.png", "image/png", &oversized),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("doc.pdf"));
    assert!(errors.contains_key("big.png"));

    // Nothing was stored.
    let (_, body) = send(
        &app.router,
        get_request(&format!("/properties/{property_id}/images"), None),
    )
    .await;
    assert!(body["data"]["images"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_enforces_the_image_cap() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let seeded: Vec<NewPropertyImage> = (0..15)
        .map(|order| NewPropertyImage {
            storage_path: format!("uploads/properties/x/{order}.jpg"),
            public_url: format!("/uploads/properties/x/{order}.jpg"),
            mime_type: "image/jpeg".to_string(),
            file_size_bytes: 100,
            display_order: order,
        })
        .collect();
    app.store.add_images(property_id, seeded).await.unwrap();

    let (status, _) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &owner_token,
            &[("one-too-many.png", "image/png", b"bytes")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_owner_uploads_images() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let (intruder_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, _) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &intruder_token,
            &[("a.png", "image/png", b"bytes")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reorder_validates_items_and_names_foreign_images() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, _) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &owner_token,
            &[("a.png", "image/png", b"bytes")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/images/order"),
            Some(&owner_token),
            json!({ "items": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = Uuid::new_v4();
    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/images/order"),
            Some(&owner_token),
            json!({ "items": [ { "imageId": foreign, "displayOrder": 0 } ] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages = body["errors"]["items"].as_array().unwrap();
    assert!(messages[0].as_str().unwrap().contains(&foreign.to_string()));
}

#[tokio::test]
async fn reorder_rejects_duplicates_and_negative_orders() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;
    let image_id = Uuid::new_v4();

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/images/order"),
            Some(&owner_token),
            json!({ "items": [
                { "imageId": image_id, "displayOrder": -1 },
                { "imageId": image_id, "displayOrder": 0 }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("displayOrder"));
    assert!(errors.contains_key("items"));
}

#[tokio::test]
async fn create_validation_runs_before_profile_resolution() {
    let app = test_app();
    // Valid role but no profile row: an invalid payload is still a 400.
    let token = owner_token(Uuid::new_v4());
    let mut body = valid_create_body();
    body["monthly_price"] = json!("-5");

    let (status, response) = send(
        &app.router,
        json_request("POST", "/properties", Some(&token), body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["errors"]
        .as_object()
        .unwrap()
        .contains_key("monthly_price"));
}

#[tokio::test]
async fn patch_validation_runs_before_record_lookup() {
    let app = test_app();
    let (token, _) = seed_owner(&app);

    let (status, response) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{}", Uuid::new_v4()),
            Some(&token),
            json!({ "monthly_price": "-5" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["errors"]
        .as_object()
        .unwrap()
        .contains_key("monthly_price"));
}

#[tokio::test]
async fn empty_patch_is_rejected_before_record_lookup() {
    let app = test_app();
    let (token, _) = seed_owner(&app);

    let (status, _) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{}", Uuid::new_v4()),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reorder_applies_new_ordering() {
    let app = test_app();
    let (owner_token, _) = seed_owner(&app);
    let property_id = create_listing(&app, &owner_token).await;

    let (status, body) = send(
        &app.router,
        multipart_request(
            &format!("/properties/{property_id}/images"),
            &owner_token,
            &[
                ("a.png", "image/png", b"first"),
                ("b.png", "image/png", b"second"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let uploaded = body["data"]["images"].as_array().unwrap().to_vec();
    let first_id = uploaded[0]["id"].as_str().unwrap().to_string();
    let second_id = uploaded[1]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/properties/{property_id}/images/order"),
            Some(&owner_token),
            json!({ "items": [
                { "imageId": first_id, "displayOrder": 1 },
                { "imageId": second_id, "displayOrder": 0 }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let images = body["data"]["images"].as_array().unwrap();
    assert_eq!(images[0]["id"], second_id.as_str());
    assert_eq!(images[1]["id"], first_id.as_str());
}
