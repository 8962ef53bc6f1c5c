// Shared domain types — used by both the engine layer and the UI layer.
// Neither layer depends on the other; both import from this module.

pub mod deployment;
pub mod service;

pub use deployment::*;
pub use service::*;
