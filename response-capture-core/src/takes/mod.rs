pub mod handles;
pub mod repository;

pub use handles::HandleRegistry;
pub use repository::{AddOutcome, TakeRepository};
