//! Thin control-plane HTTP surface ("External collaborator — API
//! server"): the router the binary mounts alongside the relay pipeline.
//! A single concrete [`state::ApiState`] backs every handler, since the
//! control plane has one implementation.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use handlers::routes;
pub use state::ApiState;
