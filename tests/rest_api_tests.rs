//! End-to-end tests for the JSON API
//!
//! Each test builds its own in-memory store, seeds it, loads the directory
//! and drives the router through `axum_test::TestServer`.

#[macro_use]
mod storage_harness;

use axum::http::StatusCode;
use axum_test::TestServer;
use estate::config::{ListingsConfig, SeedData};
use estate::core::auth::AuthGate;
use estate::core::listing::{Furnishing, ListingId, Plot, PlotType, RentalHouse};
use estate::core::service::Credentials;
use estate::directory::{PropertyDirectory, SyncHandle};
use estate::server::AppState;
use estate::storage::{InMemoryListingService, InMemorySessionService, StoreBackend};
use serde_json::{Value, json};
use std::sync::Arc;
use storage_harness::*;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin123";

fn seed() -> SeedData {
    SeedData {
        plots: vec![
            plot_draft("Green Valley Plot", 125_000.0, "Green Valley, Sector 5", 2400.0, PlotType::Residential),
            plot_draft("Highway Plot", 285_000.0, "Highway Junction, Block A", 5000.0, PlotType::Commercial),
            plot_draft("Sunrise Colony Plot", 75_000.0, "Sunrise Colony, Phase 2", 1800.0, PlotType::Residential),
            plot_draft("Palm Heights Plot", 350_000.0, "Palm Heights, Premium Block", 4800.0, PlotType::Residential),
        ],
        rentals: vec![
            rental_draft("Modern 3BHK", 2500.0, "Riverside Colony", 3, 2, Furnishing::SemiFurnished),
            rental_draft("Cozy 2BHK", 1800.0, "Downtown Plaza", 2, 1, Furnishing::FullyFurnished),
            rental_draft("Family Home", 3500.0, "Oak Street", 5, 3, Furnishing::Unfurnished),
            rental_draft("Hillside Mansion", 6000.0, "Skyline Ridge", 6, 4, Furnishing::FullyFurnished),
        ],
    }
}

async fn create_test_state() -> (AppState, Arc<PropertyDirectory>, SyncHandle) {
    let sessions = InMemorySessionService::new();
    sessions
        .register(&Credentials::new(ADMIN_EMAIL, ADMIN_PASSWORD))
        .unwrap();

    let backend = StoreBackend {
        plots: Arc::new(InMemoryListingService::<Plot>::new(64)),
        rentals: Arc::new(InMemoryListingService::<RentalHouse>::new(64)),
        sessions: Arc::new(sessions),
    };
    backend.seed(&seed()).await.unwrap();

    let directory = Arc::new(PropertyDirectory::from_backend(&backend));
    directory.load_all().await.unwrap();
    let sync = directory.subscribe_to_changes();

    let auth = AuthGate::new(backend.sessions.clone());
    let state = AppState::new(directory.clone(), auth, ListingsConfig::default());

    (state, directory, sync)
}

async fn create_test_server() -> (TestServer, Arc<PropertyDirectory>, SyncHandle) {
    let (state, directory, sync) = create_test_state().await;
    let server = TestServer::new(state.router()).expect("Failed to create test server");

    (server, directory, sync)
}

/// Sign in and return the access token of the new session
async fn login_as_admin(server: &TestServer) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("login returns an access token")
        .to_string()
}

fn titles(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn plot_id(directory: &PropertyDirectory, title: &str) -> ListingId {
    directory
        .plots()
        .iter()
        .find(|p| p.title == title)
        .map(|p| p.id.clone())
        .expect("seeded plot")
}

// =============================================================================
// Health Check Tests
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _, _sync) = create_test_server().await;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

// =============================================================================
// Listing Tests
// =============================================================================

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_plots_unfiltered() {
        let (server, _, _sync) = create_test_server().await;

        let response = server.get("/plots").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["count"], 4);
        assert_eq!(body["sort"], "newest");
    }

    #[tokio::test]
    async fn test_filter_plots_by_type_sorted_by_price() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/plots")
            .add_query_param("type", "Residential")
            .add_query_param("sort", "price-high")
            .await
            .json();

        assert_eq!(
            titles(&body),
            vec!["Palm Heights Plot", "Green Valley Plot", "Sunrise Colony Plot"]
        );
        assert_eq!(body["sort"], "price-high");
    }

    #[tokio::test]
    async fn test_malformed_bound_is_ignored() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/plots")
            .add_query_param("min_price", "cheap")
            .add_query_param("max_price", "200000")
            .add_query_param("sort", "price-low")
            .await
            .json();

        assert_eq!(titles(&body), vec!["Sunrise Colony Plot", "Green Valley Plot"]);
    }

    #[tokio::test]
    async fn test_location_is_case_insensitive_substring() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/plots")
            .add_query_param("location", "VALLEY")
            .await
            .json();

        assert_eq!(titles(&body), vec!["Green Valley Plot"]);
    }

    #[tokio::test]
    async fn test_unknown_sort_falls_back_to_newest() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/plots")
            .add_query_param("sort", "alphabetical")
            .await
            .json();

        assert_eq!(body["sort"], "newest");
        assert_eq!(body["count"], 4);
    }

    #[tokio::test]
    async fn test_bedrooms_sentinel_means_or_more() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/rentals")
            .add_query_param("bedrooms", "5")
            .add_query_param("sort", "price-low")
            .await
            .json();

        assert_eq!(titles(&body), vec!["Family Home", "Hillside Mansion"]);
    }

    #[tokio::test]
    async fn test_bathrooms_exact_match() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/rentals")
            .add_query_param("bathrooms", "1")
            .await
            .json();

        assert_eq!(titles(&body), vec!["Cozy 2BHK"]);
    }

    #[tokio::test]
    async fn test_filter_rentals_by_furnishing_and_rent() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server
            .get("/rentals")
            .add_query_param("furnishing", "Fully Furnished")
            .add_query_param("max_rent", "2000")
            .await
            .json();

        assert_eq!(titles(&body), vec!["Cozy 2BHK"]);
    }

    #[tokio::test]
    async fn test_missing_images_show_placeholder() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server.get("/rentals").await.json();
        for item in body["items"].as_array().unwrap() {
            assert_eq!(item["images"], json!(["/placeholder.svg"]));
        }
    }

    #[tokio::test]
    async fn test_featured_lists_both_collections() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server.get("/featured").await.json();
        assert_eq!(body["plots"].as_array().unwrap().len(), 4);
        assert_eq!(body["rentals"].as_array().unwrap().len(), 4);
    }
}

// =============================================================================
// Detail Tests
// =============================================================================

mod detail_tests {
    use super::*;

    #[tokio::test]
    async fn test_plot_detail_with_similar() {
        let (server, directory, _sync) = create_test_server().await;
        let id = plot_id(&directory, "Green Valley Plot");

        let response = server.get(&format!("/plots/{}", id)).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["listing"]["title"], "Green Valley Plot");
        assert_eq!(body["listing"]["type"], "Residential");

        let similar: Vec<&str> = body["similar"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(similar, vec!["Sunrise Colony Plot", "Palm Heights Plot"]);
    }

    #[tokio::test]
    async fn test_unknown_plot_returns_404() {
        let (server, _, _sync) = create_test_server().await;

        let response = server.get("/plots/no-such-plot").await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["code"], "LISTING_NOT_FOUND");
        assert_eq!(body["message"], "plot with id 'no-such-plot' not found");
    }

    #[tokio::test]
    async fn test_unknown_rental_returns_404() {
        let (server, _, _sync) = create_test_server().await;

        let response = server.get("/rentals/no-such-house").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// Auth Tests
// =============================================================================

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_session_starts_anonymous() {
        let (server, _, _sync) = create_test_server().await;

        let body: Value = server.get("/auth/session").await.json();
        assert_eq!(body["authenticated"], false);
        assert!(body.get("session").is_none());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (server, _, _sync) = create_test_server().await;

        let token = login_as_admin(&server).await;
        let body: Value = server
            .get("/auth/session")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["session"]["email"], ADMIN_EMAIL);

        server
            .post("/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let body: Value = server
            .get("/auth/session")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn test_session_is_not_visible_without_token() {
        let (server, _, _sync) = create_test_server().await;
        login_as_admin(&server).await;

        let body: Value = server.get("/auth/session").await.json();
        assert_eq!(body["authenticated"], false);
        assert!(body.get("session").is_none());

        let body: Value = server
            .get("/auth/session")
            .authorization_bearer("not-a-session")
            .await
            .json();
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn test_logout_without_token_keeps_other_sessions() {
        let (server, _, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;

        server
            .post("/auth/logout")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .post("/auth/logout")
            .authorization_bearer("someone-elses-guess")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let body: Value = server
            .get("/auth/session")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(body["authenticated"], true);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let (server, _, _sync) = create_test_server().await;

        let response = server
            .post("/auth/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: Value = response.json();
        assert_eq!(body["code"], "AUTH_ERROR");
        assert_eq!(body["message"], "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let (server, _, _sync) = create_test_server().await;

        let response = server
            .post("/auth/signup")
            .json(&json!({ "email": "new@example.com", "password": "12345" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: Value = response.json();
        assert_eq!(body["message"], "Password must be at least 6 characters");
    }

    #[tokio::test]
    async fn test_signup_establishes_session() {
        let (server, _, _sync) = create_test_server().await;

        let response = server
            .post("/auth/signup")
            .json(&json!({ "email": "new@example.com", "password": "123456" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let token = body["access_token"].as_str().unwrap().to_string();

        let body: Value = server
            .get("/auth/session")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["session"]["email"], "new@example.com");
    }
}

// =============================================================================
// Admin Tests
// =============================================================================

mod admin_tests {
    use super::*;

    fn plot_body(title: &str) -> Value {
        json!({
            "title": title,
            "price": 99000,
            "location": "Lakeside, Block D",
            "size": 1500,
            "size_unit": "sq ft",
            "dimensions": "30x50 ft",
            "type": "Residential",
            "features": ["Lake View"]
        })
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let (server, directory, _sync) = create_test_server().await;
        let id = plot_id(&directory, "Highway Plot");

        let response = server.post("/admin/plots").json(&plot_body("Sneaky")).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED");

        server
            .delete(&format!("/admin/plots/{}", id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(directory.plots().len(), 4);
    }

    #[tokio::test]
    async fn test_other_client_is_not_admin_after_login() {
        let (state, directory, _sync) = create_test_state().await;
        let admin = TestServer::new(state.clone().router()).unwrap();
        let stranger = TestServer::new(state.router()).unwrap();

        let token = login_as_admin(&admin).await;

        stranger
            .post("/admin/plots")
            .json(&plot_body("Sneaky"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        stranger
            .delete(&format!("/admin/rentals/{}", directory.rentals()[0].id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let body: Value = stranger.get("/auth/session").await.json();
        assert_eq!(body["authenticated"], false);
        assert!(body.get("session").is_none());

        // the stranger cannot end the admin's session either
        stranger
            .post("/auth/logout")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        admin
            .post("/admin/plots")
            .authorization_bearer(&token)
            .json(&plot_body("Lakeside Plot"))
            .await
            .assert_status(StatusCode::CREATED);
        assert_eq!(directory.rentals().len(), 4);
    }

    #[tokio::test]
    async fn test_logged_out_token_is_rejected() {
        let (server, _, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;

        server
            .post("/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .post("/admin/plots")
            .authorization_bearer(&token)
            .json(&plot_body("Too Late"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_plot_appears_in_listing() {
        let (server, directory, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;

        let response = server
            .post("/admin/plots")
            .authorization_bearer(&token)
            .json(&plot_body("Lakeside Plot"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let created: Plot = response.json();
        assert_eq!(created.title, "Lakeside Plot");
        wait_until(|| directory.plot(&created.id).is_some()).await;

        let body: Value = server
            .get("/plots")
            .add_query_param("location", "lakeside")
            .await
            .json();
        assert_eq!(titles(&body), vec!["Lakeside Plot"]);
    }

    #[tokio::test]
    async fn test_delete_rental_disappears_from_listing() {
        let (server, directory, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;
        let id = directory.rentals()[0].id.clone();

        server
            .delete(&format!("/admin/rentals/{}", id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        wait_until(|| directory.rental(&id).is_none()).await;

        let body: Value = server.get("/rentals").await.json();
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_unprocessable() {
        let (server, directory, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;

        let mut body = plot_body("");
        body["size"] = json!(0);
        let response = server
            .post("/admin/plots")
            .authorization_bearer(&token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "STORE_WRITE_ERROR");
        assert_eq!(directory.plots().len(), 4);
    }

    #[tokio::test]
    async fn test_create_rental() {
        let (server, directory, _sync) = create_test_server().await;
        let token = login_as_admin(&server).await;

        let response = server
            .post("/admin/rentals")
            .authorization_bearer(&token)
            .json(&json!({
                "title": "Lakeside Cabin",
                "monthly_rent": 1400,
                "deposit": 2800,
                "location": "Lakeside",
                "bedrooms": 2,
                "bathrooms": 1,
                "sqft": 900,
                "furnishing": "Unfurnished",
                "available_from": "2026-04-01"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let created: RentalHouse = response.json();
        wait_until(|| directory.rental(&created.id).is_some()).await;
        assert_eq!(directory.rentals().len(), 5);
    }
}
