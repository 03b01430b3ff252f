//! Registry REST collaborator

mod client;
mod error;
mod traits;

pub use client::RegistryClient;
pub use error::{ApiError, FALLBACK_MESSAGE};
#[cfg(test)]
pub use traits::MockRegistryApi;
pub use traits::RegistryApi;
