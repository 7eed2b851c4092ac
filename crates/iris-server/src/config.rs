/// Re-export `Config` from `iris-core` for use within this crate.
///
/// All environment-variable parsing lives in `iris-core` so integration
/// tests can build a `Config` without depending on the server internals.
pub use iris_core::config::Config;
