//! Driven adapters implementing the domain ports.

pub mod hooks;
pub mod schema;
