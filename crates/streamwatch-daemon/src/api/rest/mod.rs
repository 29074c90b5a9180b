//! REST API handlers, routing and shared state

pub mod handlers;
pub mod router;
pub mod state;
