pub mod config;
pub mod constraints;
pub mod error;
pub mod phase;
pub mod policy;
pub mod stimulus;
pub mod take;
