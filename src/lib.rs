//! Host shell of the Gyarados browser.
//!
//! Persistence lives in the `gyarados-profile` crate; this crate wires it to
//! a command line (the pre-launch profile dialog), installs logging and
//! hosts the plugin registry.

/// Application version (root crate version, for use by plugins).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod plugins;
pub mod prompt;

pub use gyarados_profile as profile;
