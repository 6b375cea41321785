//! # Fetch Module
//!
//! The network fetch orchestrator and the transports it drives.

#[cfg(feature = "reqwest")]
pub mod reqwest_transport;
pub mod transport;
pub mod wrapper;

#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;
pub use transport::{FetchOptions, SharedTransport, Transport, TransportError, TransportErrorKind};
pub use wrapper::FetchWrapper;
