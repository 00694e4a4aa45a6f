use super::*;

use dkregistry_auth::errors::Error;
use dkregistry_auth::v2::Scheme;
use mockito::mock;
use reqwest::StatusCode;
use tokio::runtime::Runtime;

#[test]
fn test_version_check_status_ok() {
    let m = mock("GET", "/v2/")
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .expect(1)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    let res = runtime.block_on(dclient.detect_scheme()).unwrap();
    assert_eq!(res, Scheme::Http);
    assert_eq!(dclient.scheme(), Some(Scheme::Http));
    assert!(dclient.challenges().is_empty());

    // Cached, no second ping.
    let res = runtime.block_on(dclient.detect_scheme()).unwrap();
    assert_eq!(res, Scheme::Http);
    m.assert();

    mockito::reset();
}

#[test]
fn test_version_check_status_unauth() {
    let _m = mock_challenge(r#"Bearer realm="https://auth.example.com/token",service="registry.example.com""#);

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    let res = runtime.block_on(dclient.detect_scheme()).unwrap();
    assert_eq!(res, Scheme::Http);

    let challenges = dclient.challenges();
    assert_eq!(challenges.len(), 1);
    assert_eq!(challenges[0].scheme, "bearer");
    assert_eq!(
        challenges[0].parameter("service"),
        Some("registry.example.com")
    );

    mockito::reset();
}

#[test]
fn test_version_check_status_notfound() {
    let _m = mock("GET", "/v2/").with_status(404).create();
    let _v1 = mock("GET", "/v1/_ping").with_status(404).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    match err {
        Error::Ping(inner) => assert!(matches!(
            *inner,
            Error::UnexpectedPingStatus(StatusCode::NOT_FOUND)
        )),
        e => panic!("unexpected error: {:?}", e),
    }
    assert_eq!(dclient.scheme(), None);

    mockito::reset();
}

#[test]
fn test_version_check_status_forbidden() {
    let _m = mock("GET", "/v2/").with_status(403).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config()
        .disable_v1_ping(true)
        .build(&mock_reference(REPO), false)
        .unwrap();

    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    assert!(matches!(err, Error::Ping(_)));
    assert_eq!(dclient.scheme(), None);

    mockito::reset();
}

#[test]
fn test_version_check_v1_registry() {
    let _m = mock("GET", "/v2/").with_status(404).create();
    let v1 = mock("GET", "/v1/_ping").with_status(200).expect(1).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    assert!(err.is_v1_registry());
    assert_eq!(dclient.scheme(), None);
    v1.assert();

    mockito::reset();
}

#[test]
fn test_version_check_v1_unauthorized() {
    let _m = mock("GET", "/v2/").with_status(500).create();
    let _v1 = mock("GET", "/v1/_ping").with_status(401).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_client();

    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    assert!(matches!(err, Error::V1NotSupported));

    mockito::reset();
}

#[test]
fn test_version_check_v1_disabled() {
    let _m = mock("GET", "/v2/").with_status(404).create();
    let v1 = mock("GET", "/v1/_ping").with_status(200).expect(0).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config()
        .disable_v1_ping(true)
        .build(&mock_reference(REPO), false)
        .unwrap();

    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    assert!(matches!(err, Error::Ping(_)));
    v1.assert();

    mockito::reset();
}

#[test]
fn test_version_check_no_insecure() {
    let m = mock("GET", "/v2/")
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .expect(0)
        .create();
    let v1 = mock("GET", "/v1/_ping").with_status(200).expect(0).create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config()
        .insecure_registry(false)
        .build(&mock_reference(REPO), false)
        .unwrap();

    // The mock server is HTTP-only and trying to speak TLS to it results in
    // errors. Without the insecure flag there is no downgrade to HTTP.
    let err = runtime.block_on(dclient.detect_scheme()).unwrap_err();
    assert!(matches!(err, Error::Ping(_)));
    assert_eq!(dclient.scheme(), None);
    m.assert();
    v1.assert();

    mockito::reset();
}
