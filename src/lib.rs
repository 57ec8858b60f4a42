// Caching, rate-limit-aware GitHub client for Sui Improvement Proposals.

pub mod config;
pub mod digest;
pub mod github;
pub mod report;
