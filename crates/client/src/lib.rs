//! Typed REST client for the platform's distribution admin endpoints.
//!
//! Provides the [`api::DistributionService`] seam, its HTTP
//! implementation, response envelope parsing, and the pluggable
//! two-factor code provider used for sensitive mutations.

pub mod api;
pub mod envelope;
pub mod two_factor;

pub use api::{DistributionApiClient, DistributionApiError, DistributionService, MutationAck};
pub use two_factor::TwoFactorProvider;
