//! Diagnostic codes and their classification
//!
//! Every error and success event the parser emits carries one of these codes.
//! Metadata (category, severity, halting behavior, descriptions) lives in a
//! single registry so callers can classify a failure without matching on the
//! error type itself.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Code wrapper shared by error and success events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Script file loading error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
    pub const TOO_MANY_LINES: Code = Code::new("E013");
}

/// Unbalanced or misplaced delimiters
pub mod delimiter {
    use super::Code;

    pub const MISSING_CLOSE_BRACE: Code = Code::new("E020");
    pub const MISSING_CLOSE_QUOTE: Code = Code::new("E021");
    pub const MISSING_CLOSE_BRACKET: Code = Code::new("E022");
    pub const MISSING_CLOSE_INDEX: Code = Code::new("E023");
    pub const MISSING_VARIABLE_BRACE: Code = Code::new("E024");
    pub const EXTRA_AFTER_CLOSE_BRACE: Code = Code::new("E025");
    pub const EXTRA_AFTER_CLOSE_QUOTE: Code = Code::new("E026");
}

/// Malformed substitutions and commands
pub mod substitution {
    use super::Code;

    pub const DANGLING_BACKSLASH: Code = Code::new("E030");
    pub const EMPTY_VARIABLE_NAME: Code = Code::new("E031");
    pub const EMPTY_ARRAY_INDEX: Code = Code::new("E032");
    pub const VARIABLE_NAME_TOO_LONG: Code = Code::new("E033");
    pub const EMPTY_COMMAND: Code = Code::new("E034");
}

/// Expression grammar error codes
pub mod expression {
    use super::Code;

    pub const EMPTY_EXPRESSION: Code = Code::new("E040");
    pub const MISSING_OPERAND: Code = Code::new("E041");
    pub const MISSING_CLOSE_PAREN: Code = Code::new("E042");
    pub const MISSING_COLON: Code = Code::new("E043");
    pub const EXTRA_TOKENS: Code = Code::new("E044");
    pub const INVALID_BAREWORD: Code = Code::new("E045");
    pub const MALFORMED_NUMBER: Code = Code::new("E046");
    pub const UNEXPECTED_CHARACTER: Code = Code::new("E047");
    pub const TOO_MANY_ARGUMENTS: Code = Code::new("E048");
}

/// Resource limit error codes
pub mod resource {
    use super::Code;

    pub const NESTING_TOO_DEEP: Code = Code::new("E050");
    pub const NOT_READY: Code = Code::new("E051");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");

    pub const COMMAND_PARSED: Code = Code::new("I020");
    pub const SCRIPT_PARSED: Code = Code::new("I021");
    pub const EXPRESSION_PARSED: Code = Code::new("I022");
    pub const ROUND_TRIP_FILTERED: Code = Code::new("I023");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

const REGISTRY_ENTRIES: &[ErrorMetadata] = &[
    // System
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        true,
        "Critical internal error",
        "File a bug report with the input that triggered it",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        true,
        "Logging or configuration initialization failed",
        "Check environment overrides and runtime configuration",
    ),
    // File processing
    ErrorMetadata::new(
        "E005",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file not found",
        "Verify the path exists",
    ),
    ErrorMetadata::new(
        "E006",
        "FileProcessing",
        Severity::Medium,
        true,
        false,
        "Unrecognized script file extension",
        "Use a .tcl, .eagle or .test file, or disable the extension check",
    ),
    ErrorMetadata::new(
        "E007",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file exceeds the configured size limit",
        "Split the script or raise max_file_size in the build profile",
    ),
    ErrorMetadata::new(
        "E008",
        "FileProcessing",
        Severity::Low,
        true,
        false,
        "Script file is empty",
        "Provide a file with at least one command",
    ),
    ErrorMetadata::new(
        "E009",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Permission denied reading script file",
        "Check file permissions",
    ),
    ErrorMetadata::new(
        "E010",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file is not valid UTF-8",
        "Convert the file to UTF-8",
    ),
    ErrorMetadata::new(
        "E011",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "I/O error while reading script file",
        "Retry or check the underlying device",
    ),
    ErrorMetadata::new(
        "E012",
        "FileProcessing",
        Severity::Medium,
        false,
        true,
        "Path does not name a regular file",
        "Pass a file path rather than a directory",
    ),
    ErrorMetadata::new(
        "E013",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file exceeds the configured line limit",
        "Split the script or raise max_line_count in the build profile",
    ),
    // Delimiters
    ErrorMetadata::new(
        "E020",
        "Delimiter",
        Severity::High,
        false,
        true,
        "Open brace without a matching close brace",
        "Balance the braces; a brace inside a comment still counts",
    ),
    ErrorMetadata::new(
        "E021",
        "Delimiter",
        Severity::High,
        false,
        true,
        "Open quote without a matching close quote",
        "Add the closing quote or escape the opening one",
    ),
    ErrorMetadata::new(
        "E022",
        "Delimiter",
        Severity::High,
        false,
        true,
        "Command substitution without a close bracket",
        "Add the closing bracket",
    ),
    ErrorMetadata::new(
        "E023",
        "Delimiter",
        Severity::High,
        false,
        true,
        "Array index without a close parenthesis",
        "Close the array index with ')'",
    ),
    ErrorMetadata::new(
        "E024",
        "Delimiter",
        Severity::High,
        false,
        true,
        "Braced variable name without a close brace",
        "Close the variable name with '}'",
    ),
    ErrorMetadata::new(
        "E025",
        "Delimiter",
        Severity::Medium,
        false,
        true,
        "Characters follow a close brace in the same word",
        "Separate the words with whitespace",
    ),
    ErrorMetadata::new(
        "E026",
        "Delimiter",
        Severity::Medium,
        false,
        true,
        "Characters follow a close quote in the same word",
        "Separate the words with whitespace",
    ),
    // Substitutions
    ErrorMetadata::new(
        "E030",
        "Substitution",
        Severity::Medium,
        false,
        true,
        "Backslash at end of input",
        "Remove the trailing backslash or escape it",
    ),
    ErrorMetadata::new(
        "E031",
        "Substitution",
        Severity::Medium,
        false,
        true,
        "Braced variable name is empty",
        "Name the variable inside ${...}",
    ),
    ErrorMetadata::new(
        "E032",
        "Substitution",
        Severity::Medium,
        false,
        true,
        "Array index is empty",
        "Put an index between the parentheses",
    ),
    ErrorMetadata::new(
        "E033",
        "Substitution",
        Severity::Medium,
        false,
        true,
        "Variable name exceeds the configured maximum length",
        "Shorten the variable name",
    ),
    ErrorMetadata::new(
        "E034",
        "Substitution",
        Severity::Low,
        true,
        false,
        "No command found where one was required",
        "Supply at least one word",
    ),
    // Expressions
    ErrorMetadata::new(
        "E040",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Expression is empty",
        "Supply an expression",
    ),
    ErrorMetadata::new(
        "E041",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Operator is missing an operand",
        "Add the missing operand",
    ),
    ErrorMetadata::new(
        "E042",
        "Expression",
        Severity::High,
        false,
        true,
        "Open parenthesis without a matching close parenthesis",
        "Balance the parentheses",
    ),
    ErrorMetadata::new(
        "E043",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Ternary conditional is missing its colon",
        "Write the conditional as a ? b : c",
    ),
    ErrorMetadata::new(
        "E044",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Extra tokens follow a complete expression",
        "Remove the trailing tokens or add an operator",
    ),
    ErrorMetadata::new(
        "E045",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Bareword is neither a boolean nor a function call",
        "Quote string literals or use $ for variables",
    ),
    ErrorMetadata::new(
        "E046",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Numeric literal is malformed",
        "Check the digits allowed by the literal's prefix",
    ),
    ErrorMetadata::new(
        "E047",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Character cannot start an operand or operator",
        "Remove or quote the character",
    ),
    ErrorMetadata::new(
        "E048",
        "Expression",
        Severity::Medium,
        false,
        true,
        "Function call has too many arguments",
        "Reduce the number of arguments",
    ),
    // Resources
    ErrorMetadata::new(
        "E050",
        "Resource",
        Severity::High,
        false,
        true,
        "Nesting exceeds the configured parse depth",
        "Flatten the script or raise max_parse_depth in the build profile",
    ),
    ErrorMetadata::new(
        "E051",
        "Resource",
        Severity::High,
        false,
        true,
        "Parse state exceeded its token budget",
        "Reset the parse state or parse with readiness checks disabled",
    ),
    // Success
    ErrorMetadata::new(
        "I001",
        "Success",
        Severity::Low,
        true,
        false,
        "Operation completed successfully",
        "Continue",
    ),
    ErrorMetadata::new(
        "I004",
        "Success",
        Severity::Low,
        true,
        false,
        "Logging system initialized",
        "Continue",
    ),
    ErrorMetadata::new(
        "I006",
        "Success",
        Severity::Low,
        true,
        false,
        "Script file loaded and validated",
        "Continue to parsing",
    ),
    ErrorMetadata::new(
        "I020",
        "Success",
        Severity::Low,
        true,
        false,
        "Command parsed",
        "Continue",
    ),
    ErrorMetadata::new(
        "I021",
        "Success",
        Severity::Low,
        true,
        false,
        "Script parsed",
        "Hand tokens to the evaluator",
    ),
    ErrorMetadata::new(
        "I022",
        "Success",
        Severity::Low,
        true,
        false,
        "Expression parsed",
        "Hand tokens to the evaluator",
    ),
    ErrorMetadata::new(
        "I023",
        "Success",
        Severity::Low,
        true,
        false,
        "Round-trip token subsequence produced",
        "Continue",
    ),
];

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTRY_ENTRIES
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity for a code
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if an error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if an error halts the enclosing parse
pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for a code
pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for a code
pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category for a code
pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
