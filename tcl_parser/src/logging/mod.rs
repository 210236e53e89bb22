//! Global logging for the parser
//!
//! A single process-wide `LoggingService` is installed once; until then every
//! logging call is a no-op, so the parser can be embedded without touching
//! logging at all. A thread-local source context names the script being
//! parsed so events can be attributed without threading a file name through
//! every call.

#[macro_use]
pub mod macros;

pub mod codes;
pub mod config;
pub mod events;
pub mod service;

use std::cell::RefCell;
use std::path::Path;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{Logger, LoggingService, MemoryLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static SOURCE_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences, optionally also
/// appending to `log_file`
pub fn init_global_logging(log_file: Option<&Path>) -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let service = service::create_configured_service(log_file)
        .map_err(|e| format!("Cannot open log output: {}", e))?;
    let service = Arc::new(service);

    GLOBAL_LOGGER
        .set(service.clone())
        .map_err(|_| "Global logger already initialized".to_string())?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

pub fn set_source_context(name: &str) {
    SOURCE_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(name.to_string()));
}

pub fn clear_source_context() {
    SOURCE_CONTEXT.with(|ctx| *ctx.borrow_mut() = None);
}

/// Run `f` with `name` as the current source, restoring the previous one
pub fn with_source_context<F, R>(name: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = get_current_source_context();
    set_source_context(name);
    let result = f();
    SOURCE_CONTEXT.with(|ctx| *ctx.borrow_mut() = previous);
    result
}

pub fn get_current_source_context() -> Option<String> {
    SOURCE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn dispatch(mut event: LogEvent, context: Vec<(&str, &str)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };
    if !logger.should_log(event.level) {
        return;
    }

    event.message = config::clamp_message(&event.message).to_string();
    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if config::include_source_context() {
        if let Some(source) = get_current_source_context() {
            event = event.with_context("source", &source);
        }
    }

    logger.log_event(event);
}

/// Used by `log_error!`
pub fn log_error_with_context(
    code: Code,
    message: &str,
    location: Option<(usize, u32)>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some((offset, line)) = location {
        event = event.with_location(offset, line);
    }
    dispatch(event, context);
}

/// Used by `log_success!`
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::success(code, message), context);
}

/// Used by `log_info!`
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::info(message), context);
}

/// Used by `log_warning!`
pub fn log_warning_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::warning(message), context);
}

/// Used by `log_debug!`
pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::debug(message), context);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_context_nesting() {
        assert!(get_current_source_context().is_none());

        let inner = with_source_context("outer.tcl", || {
            with_source_context("inner.tcl", get_current_source_context)
        });

        assert_eq!(inner.as_deref(), Some("inner.tcl"));
        assert!(get_current_source_context().is_none());
    }

    #[test]
    fn test_set_and_clear_source_context() {
        set_source_context("script.tcl");
        assert_eq!(get_current_source_context().as_deref(), Some("script.tcl"));
        clear_source_context();
        assert!(get_current_source_context().is_none());
    }

    #[test]
    fn test_logging_without_initialization_is_harmless() {
        log_error_with_context(codes::system::INTERNAL_ERROR, "ignored", Some((0, 1)), vec![]);
        log_info_with_context("ignored", vec![("k", "v")]);
    }

    #[test]
    fn test_macros_resolve_by_bare_name() {
        log_error!(codes::system::INTERNAL_ERROR, "ignored");
        log_error!(codes::system::INTERNAL_ERROR, "ignored", at = (3, 1), "file" => "a.tcl");
        log_success!(codes::success::SYSTEM_INITIALIZATION_COMPLETED, "ignored", "tokens" => 4);
        log_info!("ignored", "key" => "value");
        log_warning!("ignored");
        log_debug!("ignored", "depth" => 2);
    }
}
