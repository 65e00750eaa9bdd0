#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use invhub::api;
use invhub::config::AppConfig;
use invhub::discovery::{CollectorSettings, MockConnector, SshFactsCollector};
use invhub::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_OS: &str = "NAME=\"TestOS\"\nVERSION=\"1.0\"\n";

pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: AppConfig,
    pub connector: Arc<MockConnector>,
    pub app: axum::Router,
}

impl TestContext {
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config.discovery.log_dir.clone()
    }
}

pub fn default_hosts() -> Value {
    json!([
        {
            "id": 1,
            "fqdn": "app01.local",
            "ip": "10.0.0.5",
            "status": "new",
            "login": "admin",
            "password": "secret",
            "key": ""
        },
        {
            "id": 2,
            "fqdn": "nopass.local",
            "ip": "10.0.0.6",
            "status": "new",
            "login": "admin"
        }
    ])
}

pub fn build_test_context(connector: MockConnector) -> TestContext {
    build_test_context_with_hosts(connector, Some(default_hosts()))
}

pub fn build_test_context_with_hosts(
    connector: MockConnector,
    hosts: Option<Value>,
) -> TestContext {
    let temp_dir = tempfile::tempdir().expect("tempdir should be created");
    let root = temp_dir.path();

    let static_dir = root.join("front");
    std::fs::create_dir_all(&static_dir).expect("static dir should be created");
    std::fs::write(static_dir.join("index.html"), "<html>invhub</html>")
        .expect("index should be written");

    let mut config = AppConfig {
        static_dir,
        tree_path: root.join("tree.json"),
        scheme_path: root.join("scheme.json"),
        hosts_path: root.join("discovery_hosts.json"),
        ..AppConfig::default()
    };
    config.discovery.log_dir = root.join("logs");

    if let Some(hosts) = hosts {
        std::fs::write(&config.hosts_path, hosts.to_string()).expect("hosts should be written");
    }

    let connector = Arc::new(connector);
    let collector = SshFactsCollector::new(
        CollectorSettings {
            port: config.discovery.ssh_port,
            timeout: Duration::from_millis(300),
            log_dir: config.discovery.log_dir.clone(),
            max_output_bytes: config.discovery.max_output_bytes,
        },
        connector.clone(),
    );
    let state = AppState::with_collector(&config, Arc::new(collector));
    let app = api::build_router(state, &config.static_dir);

    TestContext {
        temp_dir,
        config,
        connector,
        app,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("body should be json")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string())
    }
}

pub async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("Content-Type", "application/json");
    }
    let req = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");

    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).to_string(),
    }
}

pub async fn post_json(app: &axum::Router, uri: &str, body: Value) -> TestResponse {
    request(app, "POST", uri, Some(body.to_string())).await
}
