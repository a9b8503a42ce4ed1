/// Re-export `Config` from `frosty-core` for use within this crate.
///
/// All environment-variable parsing lives in `frosty-core` so integration
/// tests can build a `Config` without depending on the server binary.
pub use frosty_core::config::Config;
