use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::auth::{JwtKeys, ADMIN_ROLE};
use server::routes;
use server::state::AppState;
use service::notification::repository::mock::MockNotificationRepository;
use service::pet::repository::mock::MockPetRepository;
use service::presence::SocketRegistry;
use service::PetServiceConfig;

const SECRET: &str = "test-secret";

struct TestApp {
    base_url: String,
    pets: Arc<MockPetRepository>,
    admin: String,
    user_id: Uuid,
    user: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let pets = Arc::new(MockPetRepository::default());
    let notes = Arc::new(MockNotificationRepository::default());
    let registry = Arc::new(SocketRegistry::new(16));
    let state = AppState::new(pets.clone(), notes, registry, PetServiceConfig::default(), SECRET);

    let app = routes::build_router(state, CorsLayer::very_permissive());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    let keys = JwtKeys::new(SECRET);
    let user_id = pets.seed_user("Lan").id;
    Ok(TestApp {
        base_url: format!("http://{}:{}", addr.ip(), addr.port()),
        pets,
        admin: keys.issue(Uuid::new_v4(), ADMIN_ROLE, 3600)?,
        user_id,
        user: keys.issue(user_id, "user", 3600)?,
    })
}

fn pet_body(name: &str) -> Value {
    json!({ "name": name, "imageUrl": [format!("https://cdn.example.com/{name}.png")] })
}

#[tokio::test]
async fn operational_endpoints() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let health: Value = c.get(app.url("/health")).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    let metrics = c.get(app.url("/metrics")).send().await?;
    assert_eq!(metrics.status(), HttpStatusCode::OK);

    let doc: Value = c.get(app.url("/api-docs/openapi.json")).send().await?.json().await?;
    assert!(doc["paths"].get("/pets").is_some());
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_admin_token() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let resp = c.post(app.url("/pets")).json(&pet_body("Milo")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], 401);

    let resp = c.post(app.url("/pets")).bearer_auth(&app.user).json(&pet_body("Milo")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::FORBIDDEN);

    let resp = c.get(app.url("/pets/pending")).bearer_auth("garbage").send().await?;
    assert_eq!(resp.status(), HttpStatusCode::UNAUTHORIZED);

    let resp = c.post(app.url("/pets")).bearer_auth(&app.admin).json(&pet_body("Milo")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    let pet: Value = resp.json().await?;
    assert_eq!(pet["isApproved"], true);
    assert_eq!(app.pets.len(), 1);
    Ok(())
}

#[tokio::test]
async fn submit_approve_adopt_flow() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let resp = c.post(app.url("/pets/submit")).bearer_auth(&app.user).json(&json!({ "name": "Rex" })).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::BAD_REQUEST);
    let err: Value = resp.json().await?;
    assert_eq!(err, json!({ "status": 400, "message": "No file uploaded" }));

    let pet: Value = c.post(app.url("/pets/submit")).bearer_auth(&app.user).json(&pet_body("Rex")).send().await?.json().await?;
    assert_eq!(pet["isApproved"], false);
    assert_eq!(pet["submittedBy"], app.user_id.to_string());
    let id = pet["id"].as_str().unwrap_or_default().to_string();

    let pending: Value = c.get(app.url("/pets/pending")).bearer_auth(&app.admin).send().await?.json().await?;
    assert_eq!(pending[0]["id"], id.as_str());
    assert_eq!(pending[0]["submittedBy"]["name"], "Lan");

    let approve = c.post(app.url(&format!("/pets/{id}/approve"))).bearer_auth(&app.admin).send().await?;
    assert_eq!(approve.status(), HttpStatusCode::OK);
    let again = c.post(app.url(&format!("/pets/{id}/approve"))).bearer_auth(&app.admin).send().await?;
    assert_eq!(again.status(), HttpStatusCode::BAD_REQUEST);
    let err: Value = again.json().await?;
    assert_eq!(err["message"], "Pet is already approved");

    let notes: Value = c.get(app.url("/notifications")).bearer_auth(&app.user).send().await?.json().await?;
    assert_eq!(notes.as_array().map(Vec::len), Some(1));
    assert_eq!(notes[0]["type"], "APPROVE");
    assert_eq!(notes[0]["read"], false);

    let listing: Value = c.get(app.url("/pets")).send().await?.json().await?;
    assert_eq!(listing["pagination"]["totalItems"], 1);
    assert_eq!(listing["pagination"]["limit"], 5);

    let req = c.post(app.url(&format!("/pets/{id}/adoption-requests"))).bearer_auth(&app.user).send().await?;
    assert_eq!(req.status(), HttpStatusCode::OK);
    let dup = c.post(app.url(&format!("/pets/{id}/adoption-requests"))).bearer_auth(&app.user).send().await?;
    assert_eq!(dup.status(), HttpStatusCode::BAD_REQUEST);

    let adopted: Value = c
        .post(app.url(&format!("/pets/{id}/adopt")))
        .bearer_auth(&app.admin)
        .json(&json!({ "userId": app.user_id }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(adopted["isAdopted"], true);
    assert_eq!(adopted["owner"], app.user_id.to_string());
    assert_eq!(adopted["adoptionRequests"], json!([]));
    Ok(())
}

#[tokio::test]
async fn get_pet_by_id_statuses() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let resp = c.get(app.url(&format!("/pets/{}", Uuid::new_v4()))).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Pet not found");

    let resp = c.get(app.url("/pets/not-a-uuid")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::BAD_REQUEST);

    let resp = c.get(app.url("/pets?isApproved=false")).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn stream_receives_approval_event() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let pet: Value = c.post(app.url("/pets/submit")).bearer_auth(&app.user).json(&pet_body("Rex")).send().await?.json().await?;
    let id = pet["id"].as_str().unwrap_or_default().to_string();

    let unauthorized = c.get(app.url("/notifications/stream")).send().await?;
    assert_eq!(unauthorized.status(), HttpStatusCode::UNAUTHORIZED);

    let mut stream = c.get(app.url(&format!("/notifications/stream?token={}", app.user))).send().await?;
    assert_eq!(stream.status(), HttpStatusCode::OK);

    let mut seen = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !seen.contains("event: connected") {
            match stream.chunk().await? {
                Some(bytes) => seen.push_str(&String::from_utf8_lossy(&bytes)),
                None => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    })
    .await??;

    let approve = c.post(app.url(&format!("/pets/{id}/approve"))).bearer_auth(&app.admin).send().await?;
    assert_eq!(approve.status(), HttpStatusCode::OK);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !seen.contains("event: notification") {
            match stream.chunk().await? {
                Some(bytes) => seen.push_str(&String::from_utf8_lossy(&bytes)),
                None => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    })
    .await??;

    assert!(seen.contains("event: notification"), "stream output: {seen}");
    assert!(seen.contains("\"type\":\"APPROVE\""));
    assert!(seen.contains("\"sender\":null"));
    Ok(())
}
