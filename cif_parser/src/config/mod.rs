//! Configuration module for the CIF parser
//!
//! Compile-time limits live in [`constants`]; user preferences that can be
//! changed per run live in [`runtime`].

pub mod constants;
pub mod runtime;

pub use constants::compile_time;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the build profile the crate was compiled with
    pub fn profile() -> &'static str {
        if cfg!(debug_assertions) {
            "development"
        } else {
            "release"
        }
    }

    /// Returns the crate version
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("cif_parser {} ({} profile)", version(), profile())
    }
}
