use super::*;

use dkregistry_auth::errors::Error;
use futures::TryStreamExt;
use mockito::mock;
use reqwest::StatusCode;
use tokio::runtime::Runtime;

#[test]
fn test_tags_simple() {
    let name = "repo";
    let tags = r#"{"name": "repo", "tags": [ "t1", "t2" ]}"#;

    let ep = format!("/v2/{}/tags/list", name);
    let _m1 = mock_anonymous();
    let _m2 = mock("GET", ep.as_str())
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header("Content-Type", "application/json")
        .with_body(tags)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config().build(&mock_reference(name), false).unwrap();

    let res: Vec<String> = runtime
        .block_on(dclient.get_tags(None).try_collect())
        .unwrap();
    assert_eq!(res, vec!["t1", "t2"]);

    mockito::reset();
}

#[test]
fn test_tags_paginate() {
    let name = "repo";
    let tags_p1 = r#"{"name": "repo", "tags": [ "t1" ]}"#;
    let tags_p2 = r#"{"name": "repo", "tags": [ "t2" ]}"#;

    let ep1 = format!("/v2/{}/tags/list?n=1", name);
    let ep2 = format!("/v2/{}/tags/list?n=1&last=t1", name);
    let _m1 = mock_anonymous();
    let _m2 = mock("GET", ep1.as_str())
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header(
            "Link",
            &format!(r#"<{}>; rel="next""#, ep2),
        )
        .with_header("Content-Type", "application/json")
        .with_body(tags_p1)
        .create();
    let _m3 = mock("GET", ep2.as_str())
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header("Content-Type", "application/json")
        .with_body(tags_p2)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config().build(&mock_reference(name), false).unwrap();

    let res: Vec<String> = runtime
        .block_on(dclient.get_tags(Some(1)).try_collect())
        .unwrap();
    assert_eq!(res, vec!["t1", "t2"]);

    mockito::reset();
}

#[test]
fn test_tags_404() {
    let name = "repo";
    let ep = format!("/v2/{}/tags/list", name);
    let _m1 = mock_anonymous();
    let _m2 = mock("GET", ep.as_str())
        .with_status(404)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header("Content-Type", "application/json")
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config().build(&mock_reference(name), false).unwrap();

    let err = runtime
        .block_on(dclient.get_tags(None).try_collect::<Vec<_>>())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Client {
            status: StatusCode::NOT_FOUND
        }
    ));

    mockito::reset();
}

#[test]
fn test_tags_missing() {
    let name = "repo";
    let ep = format!("/v2/{}/tags/list", name);
    let _m1 = mock_anonymous();
    let _m2 = mock("GET", ep.as_str())
        .with_status(200)
        .with_header(API_VERSION_K, API_VERSION_V)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"name": "repo"}"#)
        .create();

    let runtime = Runtime::new().unwrap();
    let dclient = mock_config().build(&mock_reference(name), false).unwrap();

    let res: Vec<String> = runtime
        .block_on(dclient.get_tags(None).try_collect())
        .unwrap();
    assert!(res.is_empty());

    mockito::reset();
}
