#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::JwtSettings;
use chirpy::error::ErrorResponse;
use chirpy::routes::{LoginResponse, UserResponse};
use chirpy::startup::run;
use chirpy::store::MemoryStore;
use serde_json::json;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub jwt_config: JwtSettings,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(MemoryStore::new());
    let jwt_config = JwtSettings::new(TEST_SECRET);

    let server = run(listener, store.clone(), jwt_config.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        jwt_config,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Create a user and log in, returning the login payload
    pub async fn signed_in_user(&self, email: &str, password: &str) -> LoginResponse {
        let created = self.create_user(email, password).await;
        assert_eq!(201, created.status().as_u16());
        let _: UserResponse = created.json().await.expect("Failed to parse user");

        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn error_code(response: reqwest::Response) -> String {
    let body: ErrorResponse = response.json().await.expect("Failed to parse error body");
    body.code
}
