use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use stocktake_api::config::{ApiConfig, TokenKey};
use stocktake_core::JournalId;
use stocktake_infra::InMemoryErp;
use stocktake_infra::erp::seed::{self, DEMO_JOURNAL};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    erp: Arc<InMemoryErp>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(session_id: i64) -> Self {
        Self::spawn_with(session_id, |_| {}).await
    }

    async fn spawn_with(session_id: i64, configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let mut config = ApiConfig {
            token_key: TokenKey::Hs256Secret(JWT_SECRET.to_string()),
            erp_session_id: session_id,
            ..ApiConfig::default()
        };
        configure(&mut config);

        // Build app (same router as prod), but bind to an ephemeral port.
        let erp = Arc::new(seed::demo(session_id));
        let app = stocktake_api::app::build_app(&config, erp.clone()).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, erp, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn lock_demo_journal(&self, session_id: &str, user: &str) {
        let id = JournalId::new(DEMO_JOURNAL).unwrap();
        self.erp.lock_journal_as(&id, session_id, user).unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(claims: Value) -> String {
    let now = Utc::now();
    let mut payload = json!({
        "sub": "8d5e3c1a-0000-4000-8000-000000000001",
        "preferred_username": "alice",
        "aud": "account",
        "iat": now.timestamp(),
        "exp": (now + ChronoDuration::minutes(10)).timestamp(),
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), claims.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn staff_token() -> String {
    mint_jwt(json!({ "roles": ["warehouse"] }))
}

async fn send(req: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let res = req.send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn line_url(srv: &TestServer, line: &str) -> String {
    srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/lines/{line}"))
}

#[tokio::test]
async fn health_is_public_and_echoes_request_id() {
    let srv = TestServer::spawn(1).await;

    let res = reqwest::Client::new()
        .get(srv.url("/health"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(1).await;
    let client = reqwest::Client::new();

    let (status, body) = send(client.get(srv.url("/whoami"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["statusCode"], 401);

    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "x", "aud": "account", "exp": Utc::now().timestamp() + 600 }),
        &EncodingKey::from_secret(b"another-secret"),
    )
    .unwrap();
    let (status, _) = send(client.get(srv.url("/api/CountingJournals")).bearer_auth(forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = mint_jwt(json!({ "exp": Utc::now().timestamp() - 3600 }));
    let (status, _) = send(client.get(srv.url("/whoami")).bearer_auth(expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reports_identity_and_resolved_warehouses() {
    let srv = TestServer::spawn(1).await;
    let token = mint_jwt(json!({
        "roles": ["warehouse"],
        "groups": ["/Warehouses/IMS_Warehouse_WH001", "IMS_Warehouse_WH002", "Staff"]
    }));

    let (status, body) = send(reqwest::Client::new().get(srv.url("/whoami")).bearer_auth(token)).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["username"], "alice");
    assert_eq!(data["allWarehouses"], false);
    assert_eq!(data["warehouses"], json!(["WH001", "WH002"]));
    assert_eq!(
        data["warehouseGroups"],
        json!(["/Warehouses/IMS_Warehouse_WH001", "IMS_Warehouse_WH002"])
    );
}

#[tokio::test]
async fn flat_or_client_roles_grant_access() {
    let srv = TestServer::spawn(1).await;
    let client = reqwest::Client::new();

    let (status, body) =
        send(client.get(srv.url("/api/CountingJournals")).bearer_auth(staff_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Counting journals retrieved successfully.");
    assert_eq!(body["data"]["items"][0]["journalId"], DEMO_JOURNAL);

    let nested = mint_jwt(json!({ "resource_access": { "inventory_management_system": { "roles": ["Admin"] } } }));
    let (status, _) = send(client.get(srv.url("/api/Items")).bearer_auth(nested)).await;
    assert_eq!(status, StatusCode::OK);

    let other_client = mint_jwt(json!({ "resource_access": { "account": { "roles": ["admin"] } } }));
    let (status, _) = send(client.get(srv.url("/api/Items")).bearer_auth(other_client)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn denial_is_generic() {
    let srv = TestServer::spawn(1).await;
    let token = mint_jwt(json!({ "roles": ["viewer"] }));

    let (status, body) =
        send(reqwest::Client::new().get(srv.url("/api/CountingJournals")).bearer_auth(token)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");
    assert_eq!(body["errors"], json!([]));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn editing_a_line_follows_the_session_lock() {
    let srv = TestServer::spawn(55).await;
    srv.lock_demo_journal("55", "bob");
    let client = reqwest::Client::new();
    let update = json!({ "inventTransId": "J100_L001", "counted": 12 });

    // Locked by the current session: the handler runs.
    let (status, body) = send(
        client
            .put(line_url(&srv, "J100_L001"))
            .bearer_auth(staff_token())
            .json(&update),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["counted"], 12.0);
    assert_eq!(body["data"]["modifiedBy"], "alice");

    // Same lock, different current session: rejected before the handler.
    srv.erp.set_session_id(99);
    let (status, body) = send(
        client
            .put(line_url(&srv, "J100_L001"))
            .bearer_auth(staff_token())
            .json(&json!({ "inventTransId": "J100_L001", "counted": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["statusCode"], 423);
    assert_eq!(
        body["message"],
        "This journal is currently being edited by another user session."
    );
    assert_eq!(body["errors"], json!(["Journal Session ID: 55", "Blocked By: bob"]));

    srv.erp.set_session_id(55);
    let (_, body) = send(client.get(line_url(&srv, "J100_L001")).bearer_auth(staff_token())).await;
    assert_eq!(body["data"]["counted"], 12.0);
}

#[tokio::test]
async fn unlocked_journals_pass_the_guard() {
    let srv = TestServer::spawn(7).await;
    srv.lock_demo_journal("0", "");

    let (status, body) = send(
        reqwest::Client::new()
            .get(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/lines")))
            .bearer_auth(staff_token()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalCount"], 4);
}

#[tokio::test]
async fn policy_is_checked_before_the_lock_guard() {
    let srv = TestServer::spawn(99).await;
    srv.lock_demo_journal("55", "bob");
    let token = mint_jwt(json!({ "roles": ["viewer"] }));

    let (status, body) = send(
        reqwest::Client::new()
            .get(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}")))
            .bearer_auth(token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.to_string().contains("55"));
    assert!(!body.to_string().contains("bob"));
}

#[tokio::test]
async fn backend_outage_during_lock_lookup_passes_through() {
    let srv = TestServer::spawn(1).await;
    srv.lock_demo_journal("55", "bob");
    srv.erp.set_available(false);

    let (status, body) = send(
        reqwest::Client::new()
            .get(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}")))
            .bearer_auth(staff_token()),
    )
    .await;

    // The guard lets the request through; the handler reports the outage.
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "No response from service");
}

#[tokio::test]
async fn unknown_journal_reaches_the_handler() {
    let srv = TestServer::spawn(1).await;

    let (status, body) = send(
        reqwest::Client::new()
            .get(srv.url("/api/CountingJournals/NOPE"))
            .bearer_auth(staff_token()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
}

#[tokio::test]
async fn route_and_body_ids_must_agree() {
    let srv = TestServer::spawn(1).await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .post(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/lines")))
            .bearer_auth(staff_token())
            .json(&json!({ "journalId": "J200", "itemId": "ITEM-1000", "inventLocationId": "WH001" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "JournalId in the URL does not match the DTO.");

    let (status, body) = send(
        client
            .put(line_url(&srv, "J100_L001"))
            .bearer_auth(staff_token())
            .json(&json!({ "inventTransId": "J100_L002", "counted": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "InventTransId in the URL does not match the DTO.");
}

#[tokio::test]
async fn lock_and_unlock_round_trip() {
    let srv = TestServer::spawn(1).await;
    let client = reqwest::Client::new();
    let lock_url = srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/lines/lock"));

    let (status, body) = send(client.post(&lock_url).bearer_auth(staff_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["journalSessionId"], "1");
    assert_eq!(body["data"]["blockUserId"], "alice");

    // Another gateway session sees the journal as taken.
    srv.erp.set_session_id(2);
    let (status, _) = send(client.delete(&lock_url).bearer_auth(staff_token())).await;
    assert_eq!(status, StatusCode::LOCKED);

    srv.erp.set_session_id(1);
    let (status, body) = send(client.delete(&lock_url).bearer_auth(staff_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["journalSessionId"], "");
}

#[tokio::test]
async fn created_lines_are_attributed_to_the_caller() {
    let srv = TestServer::spawn(1).await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .post(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/lines")))
            .bearer_auth(staff_token())
            .json(&json!({
                "journalId": DEMO_JOURNAL,
                "itemId": "ITEM-1000",
                "inventSiteId": "S1",
                "inventLocationId": "WH001",
                "wmsLocationId": "B-01",
                "inventBatchId": "B-2024-01",
                "counted": 4
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["createdBy"], "alice");

    let (status, body) = send(
        client
            .get(srv.url(&format!("/api/CountingJournals/{DEMO_JOURNAL}/summary")))
            .bearer_auth(staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalLines"], 5);
    assert_eq!(body["data"]["countedLines"], 1);
}

#[tokio::test]
async fn location_enforcement_scopes_warehouse_routes() {
    let srv = TestServer::spawn_with(1, |c| c.location_enforcement = true).await;
    let client = reqwest::Client::new();
    let scoped = mint_jwt(json!({ "roles": ["warehouse"], "groups": ["IMS_Warehouse_WH002"] }));

    let (status, _) = send(
        client
            .get(srv.url("/api/Locations/WMSLocations/WH001"))
            .bearer_auth(&scoped),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        client
            .get(srv.url("/api/Locations/WMSLocations/wh002"))
            .bearer_auth(&scoped),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalCount"], 3);

    let (status, body) = send(
        client
            .get(srv.url("/api/Items/OnHand/InventLocations/S1"))
            .bearer_auth(&scoped),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{ "inventLocationId": "WH002", "inventSiteId": "S1", "name": "Overflow warehouse" }]));

    let (status, _) = send(
        client
            .post(srv.url("/api/CountingJournals"))
            .bearer_auth(&scoped)
            .json(&json!({ "inventSiteId": "S1", "inventLocationId": "WH001" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn users_without_warehouse_groups_are_strict_for_policies_only() {
    let srv = TestServer::spawn_with(1, |c| c.location_enforcement = true).await;
    let client = reqwest::Client::new();

    // WarehouseAccess policy: no grants means no access.
    let (status, _) = send(
        client
            .get(srv.url("/api/Locations/WMSLocations/WH001"))
            .bearer_auth(staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Handler-level location check: no grants means unrestricted.
    let (status, body) = send(
        client
            .post(srv.url("/api/CountingJournals"))
            .bearer_auth(staff_token())
            .json(&json!({ "inventSiteId": "S1", "inventLocationId": "WH001", "description": "Spot check" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["numOfLines"], 4);
}

#[tokio::test]
async fn wildcard_group_opens_every_warehouse() {
    let srv = TestServer::spawn_with(1, |c| c.location_enforcement = true).await;
    let token = mint_jwt(json!({
        "roles": ["warehouse"],
        "groups": ["IMS_Warehouse_WH002", "/Warehouses/IMS_Warehouse_ALL"]
    }));

    let (status, _) = send(
        reqwest::Client::new()
            .get(srv.url("/api/Locations/WMSLocations/WH003/A-01"))
            .bearer_auth(token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}
