//! Tests against a local mock registry.

extern crate dkregistry_auth;
extern crate mockito;
extern crate tokio;

mod api_version;
mod base_client;
mod tags;

use dkregistry_auth::reference::Reference;
use dkregistry_auth::v2::{Client, Config};
use std::str::FromStr;

pub static API_VERSION_K: &str = "Docker-Distribution-API-Version";
pub static API_VERSION_V: &str = "registry/2.0";

pub static REPO: &str = "library/busybox";

/// Reference to `path` on the mock server.
pub fn mock_reference(path: &str) -> Reference {
    let _ = env_logger::try_init();
    Reference::from_str(&format!("{}/{}", mockito::server_address(), path)).unwrap()
}

/// Configuration isolated from the local user's Docker and signature settings.
pub fn mock_config() -> Config {
    Client::configure()
        .insecure_registry(true)
        .home_dir(Some("/nonexistent/home".into()))
        .registries_dir(Some("/nonexistent/registries.d".into()))
}

pub fn mock_client() -> Client {
    mock_config().build(&mock_reference(REPO), false).unwrap()
}

/// Mock a `/v2/` endpoint answering 401 with `challenge`.
pub fn mock_challenge(challenge: &str) -> mockito::Mock {
    mockito::mock("GET", "/v2/")
        .with_status(401)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header("WWW-Authenticate", challenge)
        .create()
}

/// Mock a `/v2/` endpoint answering 200 without challenges.
pub fn mock_anonymous() -> mockito::Mock {
    mockito::mock("GET", "/v2/")
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .create()
}
