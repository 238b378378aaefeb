//! Thin REST layer shared by the typed service clients.

pub mod client;
pub mod errors;

pub use client::{RequestMethod, RestClient};
pub use errors::{ErrorProto, ErrorResponse};
