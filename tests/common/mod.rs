//! Shared harness for the end-to-end tests: a real server on a free port
//! backed by a fresh in-memory or temporary-file database.

#![allow(dead_code)]

use myblog::{get_random_free_port, init_db, make_router, serve};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
    _db_dir: Option<TempDir>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::start("sqlite::memory:", None).await
    }

    /// Uses a database file with a full connection pool, so requests really
    /// run in parallel.
    pub async fn spawn_with_file_db() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("blog.db").display());
        Self::start(&url, Some(dir)).await
    }

    async fn start(db_url: &str, db_dir: Option<TempDir>) -> Self {
        let db = init_db(db_url)
            .await
            .expect("failed to open test database");
        let (listener, addr) = get_random_free_port().expect("failed to bind test port");
        let handle = tokio::spawn(async move {
            if let Err(error) = serve(make_router(), listener, db).await {
                eprintln!("test server stopped: {error}");
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
            _db_dir: db_dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("POST failed")
    }

    /// Creates a resource and returns the response body, asserting a 201.
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.post(path, &body).await;
        assert_eq!(response.status(), StatusCode::CREATED, "creating {path}");
        response.json().await.expect("invalid JSON body")
    }

    pub async fn create_category(&self, name: &str) -> i64 {
        self.create("/categories", json!({ "name": name })).await["id"]
            .as_i64()
            .expect("category id")
    }

    pub async fn create_author(&self, firstname: &str, lastname: &str) -> i64 {
        self.create(
            "/authors",
            json!({ "firstname": firstname, "lastname": lastname }),
        )
        .await["id"]
            .as_i64()
            .expect("author id")
    }

    pub async fn create_article(&self, body: Value) -> Value {
        self.create("/articles", body).await
    }
}

pub async fn setup() -> (TestServer, TestClient) {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    (server, client)
}
