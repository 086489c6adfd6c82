//! End-to-end tests over HTTP against an in-memory store.

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{ApplicationSettings, AuthSettings, DatabaseSettings, Settings};
use chirpy::startup::run;
use chirpy::store::InMemoryStore;
use serde_json::{json, Value};

const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/users", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/login", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    async fn create_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/chirps", self.address))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "chirpy".to_string(),
            in_memory: true,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
            platform: "dev".to_string(),
        },
        auth: AuthSettings {
            jwt_secret: "api-test-secret".to_string(),
            issuer: "chirpy".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 60 * 24 * 3600,
            polka_key: POLKA_KEY.to_string(),
            password_hash_cost: 4,
        },
    };

    let server = run(listener, Arc::new(InMemoryStore::new()), settings)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

// --- Accounts ---

#[tokio::test]
async fn register_returns_public_user() {
    let app = spawn_app();

    let user = app.register("a@b.com", "hunter2").await;

    assert_eq!(user["email"], "a@b.com");
    assert_eq!(user["is_chirpy_red"], false);
    assert!(user["id"].as_str().is_some());
    assert!(user.get("hashed_password").is_none());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;

    let response = app
        .post_json("/api/users", &json!({ "email": "a@b.com", "password": "x" }))
        .await;
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let app = spawn_app();
    let cases = vec![
        (json!({ "email": "not-an-email", "password": "hunter2" }), "bad email"),
        (json!({ "email": "a@b.com", "password": "" }), "empty password"),
        (json!({ "email": "a@b.com" }), "missing password"),
    ];

    for (body, description) in cases {
        let response = app.post_json("/api/users", &body).await;
        assert_eq!(400, response.status().as_u16(), "case: {}", description);
    }
}

#[tokio::test]
async fn login_returns_tokens() {
    let app = spawn_app();
    let user = app.register("a@b.com", "hunter2").await;

    let session = app.login("a@b.com", "hunter2").await;

    assert_eq!(session["id"], user["id"]);
    assert_eq!(session["email"], "a@b.com");
    assert!(session["token"].as_str().is_some());
    assert_eq!(session["refresh_token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;

    let wrong_password = app
        .post_json("/api/login", &json!({ "email": "a@b.com", "password": "hunter3" }))
        .await;
    let unknown_email = app
        .post_json("/api/login", &json!({ "email": "x@y.com", "password": "hunter2" }))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    let session = app.login("a@b.com", "hunter2").await;
    let token = session["token"].as_str().unwrap();

    let response = app
        .client
        .put(&format!("{}/api/users", app.address))
        .bearer_auth(token)
        .json(&json!({ "email": "new@b.com", "password": "swordfish" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["email"], "new@b.com");

    app.login("new@b.com", "swordfish").await;
    let old = app
        .post_json("/api/login", &json!({ "email": "a@b.com", "password": "hunter2" }))
        .await;
    assert_eq!(401, old.status().as_u16());
}

#[tokio::test]
async fn update_user_requires_token() {
    let app = spawn_app();

    let response = app
        .client
        .put(&format!("{}/api/users", app.address))
        .json(&json!({ "email": "new@b.com", "password": "swordfish" }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let response = app
        .client
        .put(&format!("{}/api/users", app.address))
        .bearer_auth("not.a.jwt")
        .json(&json!({ "email": "new@b.com", "password": "swordfish" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
}

// --- Refresh / revoke ---

#[tokio::test]
async fn refresh_then_revoke() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    let session = app.login("a@b.com", "hunter2").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let response = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let access = body["token"].as_str().unwrap();

    // the fresh access token works on a protected route
    assert_eq!(201, app.create_chirp(access, "still here").await.status().as_u16());

    let response = app.post_with_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, response.status().as_u16());

    let response = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(401, response.status().as_u16());

    // second revoke is a no-op
    let response = app.post_with_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, response.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_access_token_and_missing_header() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    let session = app.login("a@b.com", "hunter2").await;

    let response = app
        .post_with_bearer("/api/refresh", session["token"].as_str().unwrap())
        .await;
    assert_eq!(401, response.status().as_u16());

    let response = app
        .client
        .post(&format!("{}/api/refresh", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

// --- Chirps ---

#[tokio::test]
async fn chirps_are_cleaned_listed_and_fetched() {
    let app = spawn_app();
    let user = app.register("a@b.com", "hunter2").await;
    let session = app.login("a@b.com", "hunter2").await;
    let token = session["token"].as_str().unwrap();

    let response = app
        .create_chirp(token, "I had something interesting for breakfast")
        .await;
    assert_eq!(201, response.status().as_u16());
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["user_id"], user["id"]);

    let response = app
        .create_chirp(token, "What a kerfuffle that was")
        .await;
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["body"], "What a **** that was");

    let listed: Vec<Value> = app
        .client
        .get(&format!("{}/api/chirps", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], first["id"]);

    let desc: Vec<Value> = app
        .client
        .get(&format!("{}/api/chirps?sort=desc", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(desc[0]["id"], second["id"]);

    let fetched: Value = app
        .client
        .get(&format!(
            "{}/api/chirps/{}",
            app.address,
            first["id"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["body"], first["body"]);
}

#[tokio::test]
async fn list_chirps_filters_by_author() {
    let app = spawn_app();
    let alice = app.register("a@b.com", "hunter2").await;
    app.register("c@d.com", "hunter2").await;
    let alice_token = app.login("a@b.com", "hunter2").await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_token = app.login("c@d.com", "hunter2").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    app.create_chirp(&alice_token, "from alice").await;
    app.create_chirp(&bob_token, "from bob").await;

    let listed: Vec<Value> = app
        .client
        .get(&format!(
            "{}/api/chirps?author_id={}",
            app.address,
            alice["id"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["body"], "from alice");

    let response = app
        .client
        .get(&format!("{}/api/chirps?author_id=nope", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn create_chirp_rejects_long_body_and_missing_token() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    let session = app.login("a@b.com", "hunter2").await;

    let response = app
        .create_chirp(session["token"].as_str().unwrap(), &"a".repeat(141))
        .await;
    assert_eq!(400, response.status().as_u16());

    let response = app
        .client
        .post(&format!("{}/api/chirps", app.address))
        .json(&json!({ "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn get_unknown_chirp_is_404() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/api/chirps/{}", app.address, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn delete_chirp_requires_ownership() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    app.register("c@d.com", "hunter2").await;
    let owner = app.login("a@b.com", "hunter2").await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let other = app.login("c@d.com", "hunter2").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let chirp: Value = app.create_chirp(&owner, "mine").await.json().await.unwrap();
    let url = format!("{}/api/chirps/{}", app.address, chirp["id"].as_str().unwrap());

    let response = app.client.delete(&url).bearer_auth(&other).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());

    let response = app.client.delete(&url).bearer_auth(&owner).send().await.unwrap();
    assert_eq!(204, response.status().as_u16());

    let response = app.client.get(&url).send().await.unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn validate_chirp_reports_cleaned_body() {
    let app = spawn_app();

    let response = app
        .post_json("/api/validate_chirp", &json!({ "body": "Sharbert is great" }))
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["cleaned_body"], "**** is great");

    let response = app
        .post_json("/api/validate_chirp", &json!({ "body": "b".repeat(141) }))
        .await;
    assert_eq!(400, response.status().as_u16());
}

// --- Webhooks ---

#[tokio::test]
async fn webhook_upgrades_user_with_valid_key() {
    let app = spawn_app();
    let user = app.register("a@b.com", "hunter2").await;
    let event = json!({ "event": "user.upgraded", "data": { "user_id": user["id"] } });

    let response = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .bearer_auth("wrong-key")
        .json(&event)
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.login("a@b.com", "hunter2").await["is_chirpy_red"], false);

    let response = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .bearer_auth(POLKA_KEY)
        .json(&event)
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());
    assert_eq!(app.login("a@b.com", "hunter2").await["is_chirpy_red"], true);
}

#[tokio::test]
async fn webhook_ignores_other_events_and_404s_unknown_users() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .bearer_auth(POLKA_KEY)
        .json(&json!({ "event": "user.payment_failed", "data": { "user_id": "" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());

    let response = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .bearer_auth(POLKA_KEY)
        .json(&json!({
            "event": "user.upgraded",
            "data": { "user_id": uuid::Uuid::new_v4().to_string() }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn webhook_checks_key_before_reading_body() {
    let app = spawn_app();
    let url = format!("{}/api/polka/webhooks", app.address);

    let response = app
        .client
        .post(&url)
        .bearer_auth("wrong")
        .json(&json!({ "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = app
        .client
        .post(&url)
        .bearer_auth(POLKA_KEY)
        .json(&json!({ "data": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_json_renders_error_response() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/api/users", app.address))
        .header("Content-Type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.expect("error body is JSON");
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["status"], 400);
    assert!(!body["message"].as_str().unwrap().contains("line"));
}

// --- Admin ---

#[tokio::test]
async fn reset_wipes_users() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;

    let response = app.client.post(&format!("{}/admin/reset", app.address)).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let response = app
        .post_json("/api/login", &json!({ "email": "a@b.com", "password": "hunter2" }))
        .await;
    assert_eq!(401, response.status().as_u16());

    // email is free again
    app.register("a@b.com", "hunter2").await;
}

#[tokio::test]
async fn token_outliving_its_account_cannot_post() {
    let app = spawn_app();
    app.register("a@b.com", "hunter2").await;
    let token = app.login("a@b.com", "hunter2").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    app.client.post(&format!("{}/admin/reset", app.address)).send().await.unwrap();

    let response = app.create_chirp(&token, "still here?").await;
    assert_eq!(401, response.status().as_u16());
}
