//! Router configuration and server setup.

use axum::{
    http::HeaderValue,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::handlers;
use crate::state::AppState;

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        // Site pages
        .route("/api/products", get(handlers::search_products))
        .route("/api/products/page/:page", get(handlers::list_page_products))
        .route("/api/categories/page/:page", get(handlers::list_page_categories))
        .route(
            "/api/products/category/:category",
            get(handlers::list_category_products),
        )
        .route("/api/products/featured", get(handlers::list_featured))
        .route("/api/products/apps", get(handlers::list_apps))
        .route("/api/services", get(handlers::list_services))
        // Unified content
        .route("/api/content", post(handlers::create_content))
        .route("/api/content/item/:key", get(handlers::get_content_item))
        .route(
            "/api/content/:key",
            get(handlers::list_content)
                .put(handlers::update_content)
                .delete(handlers::delete_content),
        )
        .route(
            "/api/content/:key/categories",
            get(handlers::list_content_categories),
        )
        .route("/api/content/:key/featured", patch(handlers::set_content_featured))
        .route("/api/content/:key/active", patch(handlers::set_content_active))
        // Admin
        .route("/api/admin/auth", post(handlers::admin_auth))
        .route(
            "/api/admin/products",
            get(handlers::admin_list_products).post(handlers::admin_create_product),
        )
        .route(
            "/api/admin/products/:id",
            put(handlers::admin_update_product).delete(handlers::admin_delete_product),
        )
        .route("/api/admin/stats", get(handlers::admin_stats))
        .route("/api/admin/channel-posts", get(handlers::admin_channel_posts))
        // Images
        .route("/api/placeholder/:width/:height", get(handlers::placeholder))
        // Apply middleware
        .layer(cors)
        .with_state(state)
}

/// Starts the API server with extra routes merged in (webhook, photo proxy).
pub async fn serve_with(config: &ApiConfig, app: Router) -> Result<(), std::io::Error> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, app).await
}

/// Starts the API server.
pub async fn serve(config: ApiConfig, state: AppState) -> Result<(), std::io::Error> {
    serve_with(&config, create_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{make_test_state, make_test_state_in, TEST_PASSWORD};
    use axum::http::{HeaderName, StatusCode};
    use axum_test::TestServer;
    use pickntrust_core::Environment;
    use pickntrust_models::{ContentBuilder, DisplayPages};
    use serde_json::json;

    fn seed(state: &AppState, title: &str, pages: &[&str]) -> i64 {
        state
            .db
            .insert_content(
                &ContentBuilder::new(title, format!("https://amzn.to/{}", title.len()))
                    .category("Electronics & Gadgets")
                    .display_pages(DisplayPages::from_slugs(pages.iter().copied()))
                    .build(),
            )
            .unwrap()
    }

    fn admin_header() -> HeaderName {
        HeaderName::from_static(crate::auth::ADMIN_PASSWORD_HEADER)
    }

    fn server(state: AppState) -> TestServer {
        TestServer::new(create_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = server(make_test_state());

        let response = server.get("/api/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert!(!body["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_products() {
        let state = make_test_state();
        seed(&state, "Earbuds", &["prime-picks", "home"]);
        seed(&state, "AI Writer", &["apps-ai-apps"]);
        let server = server(state);

        let response = server.get("/api/products/page/prime-picks").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Earbuds");
        assert_eq!(rows[0]["displayPages"], json!(["prime-picks", "home"]));

        // the apps page selects by flag, not by display page
        let body: serde_json::Value = server.get("/api/products/page/apps").await.json();
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_page_is_bad_request() {
        let server = server(make_test_state());
        let response = server.get("/api/products/page/%20").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_categories() {
        let state = make_test_state();
        seed(&state, "Earbuds", &["home"]);
        let server = server(state);

        let body: serde_json::Value = server.get("/api/categories/page/home").await.json();
        assert_eq!(body, json!(["Electronics & Gadgets"]));
    }

    #[tokio::test]
    async fn test_category_products_default_to_home() {
        let state = make_test_state();
        seed(&state, "Earbuds", &["home"]);
        seed(&state, "Speaker", &["loot-box"]);
        let server = server(state);

        let path = "/api/products/category/Electronics%20%26%20Gadgets";
        let body: serde_json::Value = server.get(path).await.json();
        assert_eq!(body.as_array().unwrap().len(), 1);

        let body: serde_json::Value = server
            .get(path)
            .add_query_param("page", "all")
            .await
            .json();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_content_crud_requires_password() {
        let server = server(make_test_state());

        let response = server
            .post("/api/content")
            .json(&json!({"title": "Notion AI", "pageType": "apps", "isAiApp": true}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/content")
            .add_header(admin_header(), HeaderValue::from_static(TEST_PASSWORD))
            .json(&json!({"title": "Notion AI", "pageType": "apps", "isAiApp": true}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        let id = body["id"].as_i64().unwrap();
        assert_eq!(body["product"]["sourceType"], "manual");
        assert_eq!(body["product"]["contentType"], "app");

        let listed: serde_json::Value = server.get("/api/content/apps").await.json();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let response = server
            .put(&format!("/api/content/{}", id))
            .json(&json!({"price": 499, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["price"], "499");

        let response = server
            .patch(&format!("/api/content/{}/featured", id))
            .json(&json!({"isFeatured": true, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let featured: serde_json::Value = server.get("/api/products/featured").await.json();
        assert_eq!(featured.as_array().unwrap().len(), 1);

        let item: serde_json::Value = server.get(&format!("/api/content/item/{}", id)).await.json();
        assert_eq!(item["name"], "Notion AI");

        // development: delete without a password is allowed
        server
            .delete(&format!("/api/content/{}", id))
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/content/item/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_content_categories() {
        let state = make_test_state();
        state
            .db
            .insert_content(
                &ContentBuilder::new("VPN", "https://x.in/vpn")
                    .page_type("services")
                    .category("Cloud Services")
                    .build(),
            )
            .unwrap();
        let server = server(state);

        let body: serde_json::Value = server.get("/api/content/services/categories").await.json();
        assert_eq!(body, json!(["Cloud Services"]));
    }

    #[tokio::test]
    async fn test_delete_with_wrong_password_rejected() {
        let state = make_test_state();
        let id = seed(&state, "Earbuds", &["home"]);
        let server = server(state);

        server
            .delete(&format!("/api/admin/products/{}", id))
            .add_query_param("password", "wrong")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_production_delete_requires_password() {
        let state = make_test_state_in(Environment::Production);
        let id = seed(&state, "Earbuds", &["home"]);
        let server = server(state);

        server
            .delete(&format!("/api/admin/products/{}", id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .delete(&format!("/api/admin/products/{}", id))
            .json(&json!({"password": TEST_PASSWORD}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_admin_auth_and_stats() {
        let state = make_test_state();
        seed(&state, "Earbuds", &["home"]);
        let server = server(state);

        server
            .post("/api/admin/auth")
            .json(&json!({"password": "nope"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/admin/auth")
            .json(&json!({"password": TEST_PASSWORD}))
            .await
            .assert_status_ok();

        let stats: serde_json::Value = server
            .get("/api/admin/stats")
            .add_header(admin_header(), HeaderValue::from_static(TEST_PASSWORD))
            .await
            .json();
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["bySource"]["manual"], 1);

        let posts: serde_json::Value = server
            .get("/api/admin/channel-posts")
            .add_query_param("password", TEST_PASSWORD)
            .await
            .json();
        assert!(posts.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_create_tags_source() {
        let server = server(make_test_state());

        let response = server
            .post("/api/admin/products")
            .json(&json!({
                "name": "Kettle",
                "price": "899",
                "affiliateUrl": "https://amzn.to/k",
                "displayPages": "prime-picks, home",
                "password": TEST_PASSWORD
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["product"]["sourceType"], "admin_panel");
        assert_eq!(body["product"]["displayPages"], json!(["prime-picks", "home"]));
    }

    #[tokio::test]
    async fn test_automation_source_is_categorized() {
        let server = server(make_test_state());

        let response = server
            .post("/api/content")
            .json(&json!({
                "title": "ChatGPT Plus AI assistant app",
                "affiliateUrl": "https://chat.openai.com",
                "pageType": "apps",
                "sourceType": "RSS",
                "password": TEST_PASSWORD
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["product"]["sourceType"], "rss");
        assert_eq!(body["product"]["isAiApp"], true);
        let pages = body["product"]["displayPages"].as_array().unwrap();
        assert!(pages.contains(&json!("apps")));
        assert!(pages.contains(&json!("home")));

        let manual = server
            .post("/api/content")
            .json(&json!({
                "title": "ChatGPT Plus AI assistant app",
                "affiliateUrl": "https://chat.openai.com/m",
                "pageType": "apps",
                "password": TEST_PASSWORD
            }))
            .await;
        manual.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = manual.json();
        assert_eq!(body["product"]["sourceType"], "manual");
        assert_eq!(body["product"]["isAiApp"], false);
        assert_eq!(body["product"]["displayPages"], json!(["apps"]));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let server = server(make_test_state());

        let response = server
            .put("/api/admin/products/999")
            .json(&json!({"title": "Ghost", "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_placeholder_svg() {
        let server = server(make_test_state());

        let response = server.get("/api/placeholder/300/9999").await;
        response.assert_status_ok();
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "image/svg+xml"
        );
        assert!(response.text().contains(r#"height="2000""#));
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let server = server(make_test_state());

        let response = server
            .get("/api/health")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("https://pickntrust.com"),
            )
            .await;

        assert!(response.headers().contains_key("access-control-allow-origin"));
    }
}
