pub mod lifecycle;
pub mod machine;
pub mod timers;

pub use lifecycle::{ResourceScope, TeardownReport};
pub use machine::{Action, EnginePorts, ResponseEngine};
pub use timers::TimerSet;
