// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message patterns across the crate
///
/// These macros ensure:
/// - Consistent field naming (`session_id`, `question_id`, `key`)
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// Session Operation Logging Macros
// ============================================================================

/// Log the start of a session operation with consistent fields
#[macro_export]
macro_rules! log_session_start {
    ($operation:expr, session_id = $session_id:expr, question_id = $question_id:expr) => {
        tracing::debug!(
            operation = $operation,
            session_id = %$session_id,
            question_id = %$question_id,
            "Session operation started"
        );
    };
    ($operation:expr, session_id = $session_id:expr) => {
        tracing::debug!(
            operation = $operation,
            session_id = %$session_id,
            "Session operation started"
        );
    };
}

/// Log successful completion of a session operation
#[macro_export]
macro_rules! log_session_success {
    ($operation:expr, session_id = $session_id:expr, question_id = $question_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            question_id = %$question_id,
            "Session operation completed: {}", $msg
        );
    };
    ($operation:expr, session_id = $session_id:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            count = $count,
            "Session operation completed: {}", $msg
        );
    };
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            "Session operation completed: {}", $msg
        );
    };
}

/// Log session warnings with context
#[macro_export]
macro_rules! log_session_warn {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            session_id = %$session_id,
            "Session operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Store Operation Logging Macros
// ============================================================================

/// Log key-value store operation performance and results
#[macro_export]
macro_rules! log_store_operation {
    (debug, $operation:expr, key = $key:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = "store",
            operation = $operation,
            key = %$key,
            duration_ms = $duration,
            "Store operation completed"
        );
    };
    (info, $operation:expr, $msg:expr) => {
        tracing::info!(
            component = "store",
            operation = $operation,
            "Store operation: {}", $msg
        );
    };
    (warn, $operation:expr, key = $key:expr, error = $error:expr) => {
        tracing::warn!(
            component = "store",
            operation = $operation,
            key = %$key,
            error = %$error,
            "Stored record unreadable, falling back to defaults"
        );
    };
    (error, $operation:expr, key = $key:expr, error = $error:expr) => {
        tracing::error!(
            component = "store",
            operation = $operation,
            key = %$key,
            error = %$error,
            "Store operation failed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Performance Logging Macros
// ============================================================================

/// Log performance metrics with consistent structure
#[macro_export]
macro_rules! log_performance {
    ($operation:expr, duration_ms = $duration:expr, item_count = $count:expr) => {
        tracing::debug!(
            event_type = "performance",
            operation = $operation,
            duration_ms = $duration,
            item_count = $count,
            "Performance metrics"
        );
    };
    ($operation:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            event_type = "performance",
            operation = $operation,
            duration_ms = $duration,
            "Performance metrics"
        );
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
