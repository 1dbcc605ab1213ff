//! Error types for the guarded document store.

mod guard_error;
mod store_error;

pub use guard_error::GuardError;
pub use store_error::StoreError;
