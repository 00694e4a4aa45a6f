//! Media-types for API objects.

// schema1 types, see https://docs.docker.com/registry/spec/manifest-v2-1/

/// Manifest, version 2 schema 1.
pub static MANIFEST_V2S1: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Signed manifest, version 2 schema 1.
pub static MANIFEST_V2S1_SIGNED: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws";

// schema2 types, see https://docs.docker.com/registry/spec/manifest-v2-2/

/// Manifest, version 2 schema 2.
pub static MANIFEST_V2S2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Manifest List (aka "fat manifest").
pub static MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

// OCI types, see https://github.com/opencontainers/image-spec/blob/main/media-types.md

/// OCI image manifest.
pub static OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index.
pub static OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Manifest types requested when the caller does not ask for specific ones.
pub static DEFAULT_MANIFEST_TYPES: &[&str] = &[
    MANIFEST_V2S2,
    MANIFEST_LIST,
    OCI_MANIFEST,
    OCI_INDEX,
    MANIFEST_V2S1_SIGNED,
    MANIFEST_V2S1,
];

/// Header announcing the registry API version on every request.
pub static API_VERSION_HEADER: &str = "Docker-Distribution-API-Version";
/// Value of `API_VERSION_HEADER`.
pub static API_VERSION_VALUE: &str = "registry/2.0";
