//! Ambient infrastructure shared by every FlowCatalyst Rust service.
//!
//! Today that means structured logging setup; it lives in its own crate
//! (rather than folded into each binary) so every service initializes
//! diagnostics the same way.

pub mod logging;

pub use logging::init_logging;
