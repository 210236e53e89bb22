//! Configuration module for the Tcl parser
//! Compile-time limits are generated from TOML by build.rs

// Generated at compile time from config/<profile>.toml
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::RuntimeConfig;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("TCL_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("TCL_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time::{expression, parser};

    #[test]
    fn test_generated_limits_are_consistent() {
        assert!(parser::MAX_PARSE_DEPTH > 0);
        assert!(expression::MAX_EXPRESSION_DEPTH <= parser::MAX_PARSE_DEPTH);
        assert!(parser::INITIAL_TOKEN_CAPACITY <= parser::MAX_TOKEN_COUNT);
    }

    #[test]
    fn test_source_info_names_profile() {
        assert!(super::build_info::source_info().ends_with(".toml"));
    }
}
