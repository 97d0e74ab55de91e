pub mod registry;
pub mod ride;
pub mod scheduler;
pub mod simulation;
pub mod store;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
