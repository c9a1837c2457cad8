//! # keyrest server
//!
//! Serves a [`KeyDirectory`](keyrest_core::KeyDirectory) over REST+JSON.
//!
//! - [`RouteInfo`] - Method, path pattern, path bindings and handler of one route
//! - [`HandlerInfo`] - Per-request decode-then-invoke state
//! - [`RouteTable`] / [`RestHandler`] - First-match routing and error mapping
//! - [`StatusPolicy`] - HTTP statuses for requests rejected before dispatch
//! - [`Server`] - Hyper listener with body limits and graceful shutdown
//! - [`routes::key_directory_routes`] - The four key-directory routes
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keyrest_server::{routes, Server, ServerConfig, StatusPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = routes::key_directory_routes()
//!         .into_handler(Arc::new(MyDirectory::default()), StatusPolicy::default());
//!
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, handler).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/keyrest-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod dispatch;
mod policy;
mod response;
mod route;
mod router;
pub mod routes;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatch::{BoxFuture, Dispatch, HandlerFn, HandlerInfo};
pub use policy::StatusPolicy;
pub use response::{error_response, json_response, HttpResponse, ResponseBody};
pub use route::RouteInfo;
pub use router::{RestHandler, RouteLookup, RouteTable, UNMATCHED_OPERATION};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
