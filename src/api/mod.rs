//! HTTP API.
//!
//! Exposes the clinic registry, planning lifecycle, AI drafting and PDF
//! exports as JSON endpoints. Routes are nested under `/api/`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, api_router_with_ctx};
pub use server::{start_api_server, ApiServer, ApiSession};
pub use types::ApiContext;
