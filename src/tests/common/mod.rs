// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::Client;
use serde_json::Value;

use crate::credentials::{CredentialSource, Environment};

pub const SERVICE_ACCOUNT_JSON: &str = include_str!("../fixtures/service_account.json");
pub const SERVICE_ACCOUNT_PUBLIC_PEM: &str = include_str!("../fixtures/service_account_public.pem");
pub const AUTHORIZED_USER_JSON: &str = include_str!("../fixtures/authorized_user.json");

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Discovery inputs with no credentials anywhere: no env override and a home
/// directory without a gcloud config.
pub fn bare_environment() -> Environment {
    Environment {
        home_dir: Some(PathBuf::from("/nonexistent/gcloud-rest-test-home")),
        ..Default::default()
    }
}

/// Fixture descriptor with its `token_uri` pointed at a local server.
pub fn descriptor_with_token_uri(fixture: &str, token_uri: &str) -> CredentialSource {
    let mut descriptor: Value = serde_json::from_str(fixture).expect("fixture is valid JSON");
    descriptor["token_uri"] = Value::String(token_uri.to_owned());
    CredentialSource::from_json(descriptor.to_string())
}
