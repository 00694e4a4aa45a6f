use super::*;

use mockito::{mock, Matcher};
use tokio::runtime::Runtime;

#[test]
fn test_base_api_version_header() {
    let m = mock("GET", "/v2/")
        .match_header(API_VERSION_K, API_VERSION_V)
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .expect(1)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    runtime.block_on(dclient.detect_scheme()).unwrap();
    m.assert();

    mockito::reset();
}

#[test]
fn test_base_useragent() {
    let ua = "dkregistry-auth-test/1.0";
    let m = mock("GET", "/v2/")
        .match_header("user-agent", ua)
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .expect(1)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config()
        .user_agent(Some(ua.to_string()))
        .build(&mock_reference(REPO), false)
        .unwrap();

    runtime.block_on(dclient.detect_scheme()).unwrap();
    m.assert();

    mockito::reset();
}

#[test]
fn test_base_no_useragent() {
    let m = mock("GET", "/v2/")
        .match_header("user-agent", Matcher::Missing)
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .expect(1)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    runtime.block_on(dclient.detect_scheme()).unwrap();
    m.assert();

    mockito::reset();
}

#[test]
fn test_base_client_fields() {
    let dclient = mock_client();

    assert_eq!(dclient.registry(), mockito::server_address().to_string());
    assert_eq!(dclient.scope().remote_name(), REPO);
    assert_eq!(dclient.scope().actions(), "pull");
    assert!(dclient.signature_base().is_none());
    assert!(dclient.scheme().is_none());
    assert!(dclient.token().is_none());

    let writer = mock_config().build(&mock_reference(REPO), true).unwrap();
    assert_eq!(writer.scope().actions(), "pull,push");
}
