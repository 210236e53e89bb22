// build.rs - TOML-driven parser limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    file_processing: FileProcessingLimits,
    parser: ParserLimits,
    expression: ExpressionLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count: usize,
}

#[derive(serde::Deserialize)]
struct ParserLimits {
    max_parse_depth: usize,
    max_token_count: usize,
    max_variable_name_length: usize,
    initial_token_capacity: usize,
}

#[derive(serde::Deserialize)]
struct ExpressionLimits {
    max_expression_depth: usize,
    max_function_arguments: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TCL_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=TCL_CONFIG_DIR");

    let profile = env::var("TCL_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("TCL_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the tcl_parser directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    // Deeper limits can exhaust a 2MB thread stack before the check trips
    const ABSOLUTE_MAX_PARSE_DEPTH: usize = 1_000;

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("LIMITS: max_file_size exceeds absolute maximum");
    }

    if config.parser.max_parse_depth == 0 || config.parser.max_parse_depth > ABSOLUTE_MAX_PARSE_DEPTH {
        panic!(
            "LIMITS: max_parse_depth must be between 1 and {}",
            ABSOLUTE_MAX_PARSE_DEPTH
        );
    }

    if config.expression.max_expression_depth > config.parser.max_parse_depth {
        panic!("LIMITS: max_expression_depth may not exceed max_parse_depth");
    }

    if config.parser.initial_token_capacity > config.parser.max_token_count {
        panic!("LIMITS: initial_token_capacity exceeds max_token_count");
    }

    if config.logging.log_buffer_size < 100 || config.logging.log_buffer_size > 100_000 {
        panic!("LIMITS: log_buffer_size must be between 100 and 100000");
    }

    if profile == "production" && config.file_processing.max_file_size > 50_000_000 {
        panic!("PRODUCTION: max_file_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod file_processing {{
        /// Largest script file accepted by the file processor
        pub const MAX_FILE_SIZE: u64 = {};
        /// Size above which a script file is logged as large
        pub const LARGE_FILE_THRESHOLD: u64 = {};
        /// Maximum number of lines in a script file
        pub const MAX_LINE_COUNT: usize = {};
    }}

    pub mod parser {{
        /// Maximum nesting of brackets, quotes and array indices
        pub const MAX_PARSE_DEPTH: usize = {};
        /// Token count beyond which a state is no longer ready
        pub const MAX_TOKEN_COUNT: usize = {};
        /// Longest accepted variable name
        pub const MAX_VARIABLE_NAME_LENGTH: usize = {};
        /// Initial token vector capacity for a fresh parse state
        pub const INITIAL_TOKEN_CAPACITY: usize = {};
    }}

    pub mod expression {{
        /// Maximum nesting of parentheses, unary chains and ternaries
        pub const MAX_EXPRESSION_DEPTH: usize = {};
        /// Maximum arguments in one function call
        pub const MAX_FUNCTION_ARGUMENTS: usize = {};
    }}

    pub mod logging {{
        /// Events retained by the in-memory logger
        pub const LOG_BUFFER_SIZE: usize = {};
        /// Longer log messages are truncated
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        // File Processing
        config.file_processing.max_file_size,
        config.file_processing.large_file_threshold,
        config.file_processing.max_line_count,
        // Parser
        config.parser.max_parse_depth,
        config.parser.max_token_count,
        config.parser.max_variable_name_length,
        config.parser.initial_token_capacity,
        // Expression
        config.expression.max_expression_depth,
        config.expression.max_function_arguments,
        // Logging
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
