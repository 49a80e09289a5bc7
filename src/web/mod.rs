//! Web server module
//!
//! Serves the search UI, a small JSON API, and the tool-call routes.

mod handlers;
mod routes;
mod state;
mod templates;

pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
