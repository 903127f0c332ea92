pub mod capability;

pub use capability::{check_capability, Capability};
