/*
 * Responsibility
 * - Origin admission policy (pure decision + its configuration)
 * - Handlers / middleware only go through what is re-exported here
 */
mod policy;
mod types;

pub use policy::OriginPolicy;
pub use types::{AdmissionReason, AllowedOrigins, CorsProfile, PolicyConfig};
