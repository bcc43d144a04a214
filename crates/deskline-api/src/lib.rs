//! HTTP layer of the helpdesk backend: sessions and identity, the
//! authorization guard, resource handlers and the router that ties them
//! together.

pub mod convert;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod messaging;
pub mod routes;
pub mod state;
pub mod validate;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
