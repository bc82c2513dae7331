/// Re-export `Config` from `sitepulse-core` for use within this crate.
///
/// All environment-variable parsing lives in `sitepulse-core` so integration
/// tests can build a `Config` without depending on the full server.
pub use sitepulse_core::config::{CacheMode, Config};
