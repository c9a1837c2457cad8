//! # keyrest
//!
//! A REST+JSON front end for key-directory services.
//!
//! keyrest turns an HTTP request into a typed request record, hands it to a
//! [`KeyDirectory`](core::KeyDirectory) implementation and turns the result
//! (or error) back into JSON.
//!
//! ```text
//! HTTP request
//!   │  route match (method + path pattern)        ── 404 / 405
//!   │  bind identifiers from path segments        ── 400 PATH_BINDING_ERROR
//!   │  rewrite RFC 3339 timestamps in raw body    ── 400 TIMESTAMP_FORMAT_ERROR
//!   │  serde_json decode, then query parameters   ── 400 BODY/QUERY_DECODE_ERROR
//!   ▼
//! KeyDirectory::{get_user, create_key, update_key, delete_key}
//!   │
//!   ▼
//! 200 JSON, or the error category's status with an error envelope
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keyrest::{build_server, MemoryKeyDirectory};
//! use keyrest::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("KEYREST").load()?;
//!     build_server(&config, Arc::new(MemoryKeyDirectory::new()))?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/keyrest/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod memory;

pub use keyrest_codec as codec;
pub use keyrest_config as config;
pub use keyrest_core as core;
pub use keyrest_server as server;
pub use keyrest_telemetry as telemetry;

pub use app::{build_server, server_config, status_policy, AppError};
pub use memory::MemoryKeyDirectory;

/// Common imports for implementing and serving a key directory.
pub mod prelude {
    pub use keyrest_core::messages::*;
    pub use keyrest_core::{
        ErrorCategory, KeyDirectory, RequestContext, RestError, RestResult, Timestamp,
    };
    pub use keyrest_server::{
        routes::key_directory_routes, RestHandler, RouteInfo, RouteTable, Server, ServerConfig,
        ShutdownSignal, StatusPolicy,
    };

    pub use crate::MemoryKeyDirectory;
}
