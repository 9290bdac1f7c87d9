//! Typed errors for the two external seams the sync cycle must reason about:
//! schema extraction and the remote assistant update. Both degrade gracefully
//! — the cycle logs them and the coalescer treats the attempt as completed.
//! Configuration problems stay on `anyhow` at the CLI boundary, where they
//! are fatal.

use thiserror::Error;

/// A failed database connection or introspection query. Never produced for
/// an unsupported URL scheme — that is "no schema", not an error.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// A failed push to the assistants API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to assistants API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistants API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}
