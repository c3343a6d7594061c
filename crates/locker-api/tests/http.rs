use std::sync::Arc;

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use locker_api::{AppStateInner, router};
use locker_auth::{Argon2Hasher, FileAccessRow, MemoryStore, Storage, Store};
use locker_db::Database;
use locker_types::models::{Session, User};

/// Healthy store except that sessions can never be deleted.
struct UndeletableSessions(MemoryStore);

impl Store for UndeletableSessions {
    fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        self.0.insert_user(user)
    }
    fn find_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.0.find_user(username)
    }
    fn user_exists(&self, username: &str) -> anyhow::Result<bool> {
        self.0.user_exists(username)
    }
    fn insert_session(&self, session: &Session) -> anyhow::Result<()> {
        self.0.insert_session(session)
    }
    fn find_session(&self, token_hash: &str) -> anyhow::Result<Option<Session>> {
        self.0.find_session(token_hash)
    }
    fn delete_sessions(&self, _username: &str) -> anyhow::Result<usize> {
        anyhow::bail!("disk I/O error")
    }
    fn insert_owner_row(&self, row: &FileAccessRow) -> anyhow::Result<bool> {
        self.0.insert_owner_row(row)
    }
    fn rows_for_grantee(&self, username: &str) -> anyhow::Result<Vec<FileAccessRow>> {
        self.0.rows_for_grantee(username)
    }
    fn find_grant(&self, username: &str, filepath: &str) -> anyhow::Result<Option<FileAccessRow>> {
        self.0.find_grant(username, filepath)
    }
    fn insert_grant(
        &self,
        sender: &str,
        recipient: &str,
        filename: &str,
    ) -> anyhow::Result<Option<FileAccessRow>> {
        self.0.insert_grant(sender, recipient, filename)
    }
}

struct TestApp {
    _dir: TempDir,
    app: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_ttl(chrono::Duration::hours(1)).await
    }

    async fn with_ttl(ttl: chrono::Duration) -> Self {
        Self::with_store(Arc::new(Database::open_in_memory().unwrap()), ttl).await
    }

    async fn with_store(store: Arc<dyn Store>, ttl: chrono::Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(dir.path().join("files")).await.unwrap());
        let state = Arc::new(AppStateInner::new(
            store,
            Arc::new(Argon2Hasher::new(Params::new(8, 1, 1, None).unwrap())),
            storage,
            ttl,
            1024,
        ));
        Self {
            _dir: dir,
            app: router(state),
        }
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.unwrap()
    }

    async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::get(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    async fn upload(&self, filename: &str, data: &'static [u8], cookie: &str) -> Response<Body> {
        let req = Request::post(format!("/files/{filename}"))
            .header(header::COOKIE, cookie)
            .body(Body::from(data))
            .unwrap();
        self.send(req).await
    }

    /// Register and return the `session_token=...` pair to send back.
    async fn register(&self, username: &str, password: &str) -> String {
        let resp = self
            .post_json(
                "/auth/register",
                json!({ "username": username, "password": password }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        session_pair(&resp)
    }
}

fn set_cookie(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

fn session_pair(resp: &Response<Body>) -> String {
    set_cookie(resp).split(';').next().unwrap().to_string()
}

async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

#[tokio::test]
async fn health_needs_no_session() {
    let t = TestApp::new().await;
    let resp = t.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ok");
}

#[tokio::test]
async fn register_sets_strict_session_cookie() {
    let t = TestApp::new().await;
    let resp = t
        .post_json(
            "/auth/register",
            json!({ "username": "alice", "password": "pw" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let cookie = set_cookie(&resp);
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Expires="));

    let body = body_json(resp).await;
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let t = TestApp::new().await;
    t.register("alice", "pw").await;
    let resp = t
        .post_json(
            "/auth/register",
            json!({ "username": "alice", "password": "other" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_outcomes() {
    let t = TestApp::new().await;
    t.register("alice", "pw").await;

    let ok = t
        .post_json("/auth/login", json!({ "username": "alice", "password": "pw" }), None)
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(set_cookie(&ok).starts_with("session_token="));

    let wrong = t
        .post_json("/auth/login", json!({ "username": "alice", "password": "nope" }), None)
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.headers().get(header::SET_COOKIE).is_none());

    let unknown = t
        .post_json("/auth/login", json!({ "username": "ghost", "password": "pw" }), None)
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bogus_sessions() {
    let t = TestApp::new().await;
    assert_eq!(t.get("/files", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        t.get("/files", Some("session_token=forged")).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        t.upload("a.txt", b"x", "session_token=forged").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn expired_session_is_treated_as_anonymous() {
    let t = TestApp::with_ttl(chrono::Duration::seconds(-5)).await;
    let cookie = t.register("alice", "pw").await;
    assert_eq!(
        t.get("/files", Some(&cookie)).await.status(),
        StatusCode::UNAUTHORIZED
    );
    // public routes still work for the same request shape
    assert_eq!(t.get("/health", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_all_sessions_and_clears_cookie() {
    let t = TestApp::new().await;
    let first = t.register("alice", "pw").await;
    let login = t
        .post_json("/auth/login", json!({ "username": "alice", "password": "pw" }), None)
        .await;
    let second = session_pair(&login);

    let resp = t.post_json("/auth/logout", json!({}), Some(&first)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cleared = set_cookie(&resp);
    assert!(cleared.starts_with("session_token=;"));
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(t.get("/files", Some(&first)).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(t.get("/files", Some(&second)).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_logout_is_a_server_error_but_clears_cookie() {
    let t = TestApp::with_store(
        Arc::new(UndeletableSessions(MemoryStore::new())),
        chrono::Duration::hours(1),
    )
    .await;
    let cookie = t.register("alice", "pw").await;

    let resp = t.post_json("/auth/logout", json!({}), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cleared = set_cookie(&resp);
    assert!(cleared.starts_with("session_token=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_bytes(resp).await, b"logout failed");
}

#[tokio::test]
async fn logout_without_cookie_still_redirects() {
    let t = TestApp::new().await;
    let resp = t.post_json("/auth/logout", json!({}), None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn traversal_filename_is_rejected() {
    let t = TestApp::new().await;
    let cookie = t.register("alice", "pw").await;
    let resp = t.upload("..%2F..%2Fetc%2Fpasswd", b"root", &cookie).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let t = TestApp::new().await;
    let cookie = t.register("alice", "pw").await;
    let resp = t.upload("big.bin", &[7u8; 2048], &cookie).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn self_share_is_a_bad_request() {
    let t = TestApp::new().await;
    let cookie = t.register("alice", "pw").await;
    let resp = t
        .post_json(
            "/share",
            json!({ "username": "alice", "filename": "x" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn alice_shares_notes_with_bob_and_carol_is_refused() {
    let t = TestApp::new().await;
    let alice = t.register("alice", "a-pw").await;
    let bob = t.register("bob", "b-pw").await;
    let carol = t.register("carol", "c-pw").await;

    let resp = t.upload("notes.txt", b"meeting at noon", &alice).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let entry = body_json(resp).await;
    let filepath = entry["filepath"].as_str().unwrap().to_string();
    assert_eq!(filepath, "alice/notes.txt");

    let resp = t
        .post_json(
            "/share",
            json!({ "username": "bob", "filename": "notes.txt" }),
            Some(&alice),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let listing = body_json(t.get("/files", Some(&bob)).await).await;
    assert_eq!(listing["username"], "bob");
    let files = listing["files"].as_array().unwrap();
    assert!(files.iter().any(|f| {
        f["owner"] == "alice" && f["filename"] == "notes.txt" && f["shared"] == true
    }));

    let resp = t.get(&format!("/file/{filepath}"), Some(&bob)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=notes.txt"
    );
    assert_eq!(body_bytes(resp).await, b"meeting at noon");

    let resp = t.get(&format!("/file/{filepath}"), Some(&carol)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // bob holds a grant, not ownership
    let resp = t
        .post_json(
            "/share",
            json!({ "username": "carol", "filename": "notes.txt" }),
            Some(&bob),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
