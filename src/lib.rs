//! A pure-Rust asynchronous client layer for Docker Registry authentication.
//!
//! This crate turns a registry hostname plus optional credentials into an
//! authenticated, protocol-correct request pipeline: it resolves
//! credentials from the per-user Docker configuration, builds a TLS-aware
//! transport, detects scheme and API version, and answers `Basic` and
//! `Bearer` challenges on every request.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use std::str::FromStr;
//! # async fn run() -> dkregistry_auth::errors::Result<()> {
//! use dkregistry_auth::reference::Reference;
//! use dkregistry_auth::v2::Client;
//!
//! let image = Reference::from_str("quay.io/coreos/etcd:latest")?;
//! let client = Client::configure()
//!     .user_agent(Some("my-builder/1.0".to_string()))
//!     .build(&image, false)?;
//!
//! let res = client
//!     .make_request(reqwest::Method::GET, "coreos/etcd/tags/list", None, None)
//!     .await?;
//! println!("{}", res.status());
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;
#[macro_use]
extern crate strum_macros;

pub mod credentials;
pub mod errors;
pub mod lookaside;
pub mod mediatypes;
pub mod reference;
pub mod v2;

/// Registry hostname used in image references for Docker Hub.
pub static DOCKER_HOSTNAME: &str = "docker.io";

/// API host actually serving Docker Hub.
pub static DOCKER_REGISTRY: &str = "registry-1.docker.io";
