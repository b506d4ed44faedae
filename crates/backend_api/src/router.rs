use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

/// Chart screenshots travel in request bodies.
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/catalog", get(handlers::get_catalog))
        // Admin session
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/session", get(handlers::session))
        // Whole-document proxy
        .route(
            "/api/jsonbin/data",
            get(handlers::get_store_data).put(handlers::put_store_data),
        )
        // Trade library
        .route(
            "/api/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route(
            "/api/trades/:id",
            get(handlers::get_trade).delete(handlers::delete_trade),
        )
        // Profile
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route(
            "/api/profile/photo",
            post(handlers::upload_profile_photo).delete(handlers::delete_profile_photo),
        )
        // Legacy file-backed endpoints
        .route(
            "/api/data",
            get(handlers::get_legacy_data).post(handlers::post_legacy_data),
        )
        .route("/store/image", post(handlers::store_image))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use journal::{AuthGate, TradeJournal};
    use models::{Profile, StoreDocument, Trade};
    use remote_store::{MemoryImageHost, MemoryStore};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "journal-test-boundary";

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        legacy: Arc<MemoryStore>,
        images: Arc<MemoryImageHost>,
    }

    fn trade(id: &str, category: &str, outcome: &str) -> Trade {
        Trade {
            id: id.into(),
            instrument: Some("XAUUSD".into()),
            category: Some(category.into()),
            outcome: Some(outcome.into()),
            ..Default::default()
        }
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new(StoreDocument {
            trades: vec![trade("1", "FVG", "Win"), trade("2", "BOS", "Loss"), trade("3", "FVG", "Loss")],
            profile: Some(Profile::named("Trader")),
            ..Default::default()
        }));
        let legacy = Arc::new(MemoryStore::new(StoreDocument {
            trades: vec![trade("10", "FVG", "Win")],
            profile: Some(Profile::default()),
            ..Default::default()
        }));
        let images = Arc::new(MemoryImageHost::new());

        let state = AppState::new(
            Arc::new(TradeJournal::new(store.clone(), images.clone(), "Trader")),
            Arc::new(TradeJournal::new(legacy.clone(), images.clone(), "Trader")),
            Arc::new(AuthGate::new("admin123", "Gk1d#")),
        );

        Harness { app: create_router(state), store, legacy, images }
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn login(app: &Router) -> String {
        let response = send(app, json_request(Method::POST, "/api/auth/login", None, json!({ "password": "admin123" }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    /// Multipart body from (name, filename, content) parts.
    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(uri: &str, token: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_catalog() {
        let h = harness();
        let response = send(&h.app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let catalog = body_json(send(&h.app, get("/api/catalog")).await).await;
        assert_eq!(catalog["catalog"]["timeframes"], json!(["M1", "M5", "M15", "H1", "H4", "D1"]));
        assert_eq!(catalog["defaults"]["instrument"], json!("XAUUSD"));
        assert_eq!(catalog["defaults"]["confidence"], json!("3"));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let h = harness();
        let response = send(&h.app, json_request(Method::POST, "/api/auth/login", None, json!({ "password": "admin" }))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], json!("Invalid Credentials"));
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let h = harness();
        let token = login(&h.app).await;

        let mut req = get("/api/auth/session");
        req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(body_json(send(&h.app, req).await).await["isAdmin"], json!(true));

        let response = send(&h.app, json_request(Method::POST, "/api/auth/logout", Some(&token), json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut req = get("/api/auth/session");
        req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(body_json(send(&h.app, req).await).await["isAdmin"], json!(false));
    }

    #[tokio::test]
    async fn test_list_trades_with_filters() {
        let h = harness();
        let all = body_json(send(&h.app, get("/api/trades")).await).await;
        assert_eq!(all["count"], json!(3));

        let fvg = body_json(send(&h.app, get("/api/trades?category=FVG&outcome=Loss")).await).await;
        assert_eq!(fvg["count"], json!(1));
        assert_eq!(fvg["trades"][0]["id"], json!("3"));

        let reset = body_json(send(&h.app, get("/api/trades?category=all&outcome=all&instrument=all")).await).await;
        assert_eq!(reset["count"], json!(3));
    }

    #[tokio::test]
    async fn test_get_trade() {
        let h = harness();
        let response = send(&h.app, get("/api/trades/2")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["category"], json!("BOS"));

        let response = send(&h.app, get("/api/trades/99")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_writes_require_admin() {
        let h = harness();
        let response = send(&h.app, json_request(Method::PUT, "/api/jsonbin/data", None, json!({ "trades": [] }))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&h.app, json_request(Method::PUT, "/api/profile", Some("bogus"), json!({ "name": "x" }))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_proxy_put_replaces_document() {
        let h = harness();
        let token = login(&h.app).await;
        let doc = json!({
            "trades": [{ "id": "7", "outcome": "BE", "confidence": 2 }],
            "profile": { "name": "Trader", "photo": null }
        });
        let response = send(&h.app, json_request(Method::PUT, "/api/jsonbin/data", Some(&token), doc)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("success"));

        let stored = h.store.snapshot().await;
        assert_eq!(stored.trades.len(), 1);
        assert_eq!(stored.trades[0].confidence.as_ref().unwrap().as_str(), "2");

        // served back exactly as sent
        let data = body_json(send(&h.app, get("/api/jsonbin/data")).await).await;
        assert_eq!(data["trades"][0]["confidence"], json!(2));
        assert_eq!(data["trades"][0]["id"], json!("7"));
    }

    #[tokio::test]
    async fn test_create_trade_multipart() {
        let h = harness();
        let token = login(&h.app).await;
        let parts: &[(&str, Option<&str>, &str)] = &[
            ("instrument", None, "BTCUSD"),
            ("outcome", None, "Pending"),
            ("rr", None, "1:3"),
            ("confidence", None, "5"),
            ("imageBefore", Some("before.png"), "PNG"),
            ("imageAfter", Some(""), ""),
        ];
        let response = send(&h.app, multipart_request("/api/trades", &token, parts)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["instrument"], json!("BTCUSD"));
        assert_eq!(created["timeframe"], json!("M15"));
        assert_eq!(created["imageBefore"], json!("memory://1/before.png"));
        assert_eq!(created["imageAfter"], Value::Null);
        assert_eq!(h.images.uploads(), 1);

        let stored = h.store.snapshot().await;
        assert_eq!(stored.trades.len(), 4);
        assert_eq!(stored.trades[0].instrument(), "BTCUSD");
    }

    #[tokio::test]
    async fn test_create_trade_rejects_invalid_form() {
        let h = harness();
        let token = login(&h.app).await;
        let parts: &[(&str, Option<&str>, &str)] = &[("confidence", None, "9")];
        let response = send(&h.app, multipart_request("/api/trades", &token, parts)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_delete_needs_delete_password() {
        let h = harness();
        let token = login(&h.app).await;

        let mut req = json_request(Method::DELETE, "/api/trades/1", Some(&token), json!({}));
        req.headers_mut().insert("x-delete-password", "admin123".parse().unwrap());
        assert_eq!(send(&h.app, req).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(h.store.snapshot().await.trades.len(), 3);

        let mut req = json_request(Method::DELETE, "/api/trades/1", Some(&token), json!({}));
        req.headers_mut().insert("x-delete-password", "Gk1d#".parse().unwrap());
        assert_eq!(send(&h.app, req).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(h.store.snapshot().await.trades.len(), 2);

        let mut req = json_request(Method::DELETE, "/api/trades/1", Some(&token), json!({}));
        req.headers_mut().insert("x-delete-password", "Gk1d#".parse().unwrap());
        assert_eq!(send(&h.app, req).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(h.store.saves(), 1);
    }

    #[tokio::test]
    async fn test_profile_endpoints() {
        let h = harness();
        let token = login(&h.app).await;

        let profile = body_json(send(&h.app, get("/api/profile")).await).await;
        assert_eq!(profile["name"], json!("Trader"));

        let parts: &[(&str, Option<&str>, &str)] = &[("file", Some("me.png"), "PNG")];
        let response = send(&h.app, multipart_request("/api/profile/photo", &token, parts)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["photo"], json!("memory://1/me.png"));

        let response = send(&h.app, json_request(Method::DELETE, "/api/profile/photo", Some(&token), json!({}))).await;
        assert_eq!(body_json(response).await["photo"], Value::Null);

        let response = send(
            &h.app,
            json_request(Method::PUT, "/api/profile", Some(&token), json!({ "name": "Renamed", "photo": null })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.store.snapshot().await.profile.unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let h = harness();
        let token = login(&h.app).await;
        h.store.fail_saves(true);
        let response = send(&h.app, json_request(Method::PUT, "/api/profile", Some(&token), json!({ "name": "x" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_legacy_data_endpoints() {
        let h = harness();
        let data = body_json(send(&h.app, get("/api/data")).await).await;
        assert_eq!(data["trades"][0]["id"], json!("10"));

        let response = send(&h.app, json_request(Method::POST, "/api/data", None, json!({ "trades": [], "profile": {} }))).await;
        assert_eq!(body_json(response).await, json!({ "status": "success" }));
        assert!(h.legacy.snapshot().await.trades.is_empty());
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_legacy_store_image() {
        let h = harness();

        let response = send(&h.app, json_request(Method::POST, "/store/image", None, json!({ "tradeId": "10" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], json!("imageUrl is required"));

        let response = send(
            &h.app,
            json_request(Method::POST, "/store/image", None, json!({ "imageUrl": "https://img/a.png", "tradeId": "404" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], json!("Trade not found"));

        let response = send(
            &h.app,
            json_request(Method::POST, "/store/image", None, json!({ "imageUrl": "https://img/a.png", "tradeId": "10" })),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("Image URL stored successfully"));
        assert_eq!(body["data"]["trades"][0]["imageBefore"], json!("https://img/a.png"));

        let response = send(
            &h.app,
            json_request(Method::POST, "/store/image", None, json!({ "imageUrl": "https://img/b.png" })),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["trades"][0]["imageUrl"], json!("https://img/b.png"));
        assert_eq!(h.legacy.snapshot().await.trades.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_document_round_trips_unchanged() {
        let h = harness();
        let doc = json!({
            "trades": [
                { "id": "1", "imageUrl": "https://img/a.png", "timestamp": "2024-12-28T10:00:00.000Z" },
                { "id": 1700000000000u64, "rr": null, "confidence": 5 }
            ],
            "profile": { "name": "A", "bio": "hi" },
            "version": 3
        });
        let response = send(&h.app, json_request(Method::POST, "/api/data", None, doc.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let back = body_json(send(&h.app, get("/api/data")).await).await;
        assert_eq!(back, doc);
        assert_eq!(h.legacy.raw_snapshot().await, doc);
    }

    #[tokio::test]
    async fn test_proxy_document_round_trips_unchanged() {
        let h = harness();
        let token = login(&h.app).await;
        let doc = json!({
            "trades": [{ "id": 42, "notes": null, "custom": { "a": 1 } }],
            "profile": { "name": "A", "photo": null, "bio": "hi" },
            "theme": "dark"
        });
        let response = send(&h.app, json_request(Method::PUT, "/api/jsonbin/data", Some(&token), doc.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(send(&h.app, get("/api/jsonbin/data")).await).await, doc);
    }

    #[tokio::test]
    async fn test_malformed_json_gets_json_error() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(body_json(response).await["error"].is_string());

        let response = send(&h.app, json_request(Method::POST, "/store/image", None, json!({ "imageUrl": 5 }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/data")
            .body(Body::from("{}"))
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
}
