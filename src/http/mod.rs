//! Thin HTTP layer mapping transport failures onto [`crate::error::NymError`].

mod client;

pub use client::HttpClient;
pub(crate) use client::network_error;
