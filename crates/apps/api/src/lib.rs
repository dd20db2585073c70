#![deny(clippy::unwrap_used)]
// utoipa's derive expands to `for_each` over path registrations.
#![allow(clippy::needless_for_each, clippy::missing_errors_doc)]

pub mod api_state;
mod routes;
mod server;

pub use routes::*;
pub use server::*;
