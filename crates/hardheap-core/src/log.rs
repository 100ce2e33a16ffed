//! Diagnostic log sink.
//!
//! The engine never owns an output stream. Diagnostics are formatted lazily
//! and handed to an installable sink; nothing is emitted unless debug mode is
//! on (the status report is the one exception, it writes whenever asked).

/// Destination for diagnostic lines. One call per message, no trailing
/// newline in the payload.
pub type LogSink = fn(&str);

/// Default sink: standard error.
pub fn stderr_sink(message: &str) {
    eprintln!("{message}");
}

/// Sink that drops everything. Useful for callers that want debug checks
/// without the chatter.
pub fn null_sink(_message: &str) {}

/// Formats and emits a diagnostic through the policy's sink when debug mode
/// is enabled. Formatting cost is only paid when the message is actually
/// delivered.
macro_rules! heap_log {
    ($policy:expr, $($arg:tt)*) => {
        if $policy.debug_mode {
            ($policy.log_sink)(&format!($($arg)*));
        }
    };
}

pub(crate) use heap_log;

#[cfg(test)]
mod tests {
    use crate::policy::RuntimePolicy;

    use super::*;

    static CAPTURED: std::sync::Mutex<Vec<String>> = std::sync::Mutex::new(Vec::new());

    fn capture_sink(message: &str) {
        CAPTURED.lock().unwrap().push(message.to_owned());
    }

    #[test]
    fn gated_on_debug_mode() {
        let mut policy = RuntimePolicy::new();
        policy.log_sink = capture_sink;

        heap_log!(policy, "dropped {}", 1);
        assert!(CAPTURED.lock().unwrap().is_empty());

        policy.debug_mode = true;
        heap_log!(policy, "delivered {}", 2);
        let lines = CAPTURED.lock().unwrap();
        assert_eq!(lines.as_slice(), ["delivered 2"]);
    }

    #[test]
    fn null_sink_is_silent() {
        null_sink("anything");
    }
}
