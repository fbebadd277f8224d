//! Backend adapters for the booking lifecycle.
//!
//! [`HttpBookingGateway`] talks to the travel-request REST API;
//! [`InMemoryBookingGateway`] is a self-contained reference backend.

pub mod auth;
pub mod envelope;
pub mod http;
pub mod memory;
pub mod transport;

pub use auth::{CredentialProvider, RefreshingCredentials, StaticCredentials};
pub use envelope::ApiEnvelope;
pub use http::HttpBookingGateway;
pub use memory::InMemoryBookingGateway;
pub use transport::AuthenticatedTransport;
