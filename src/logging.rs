//! Explicit operation logging: a higher-order wrapper instead of an
//! annotation-driven decorator. The store passes the level, the operation
//! name, and an argument map; the subscriber is whatever the embedding
//! application installed.

use std::time::Instant;

use tracing::Level;

/// Run `f`, logging entry (with arguments) and exit (with elapsed time) at
/// `level`.
pub fn with_logging<T>(
    level: Level,
    operation: &'static str,
    args: &[(&str, String)],
    f: impl FnOnce() -> T,
) -> T {
    log_enter(level, operation, args);
    let start = Instant::now();
    let result = f();
    log_exit(level, operation, start.elapsed().as_millis());
    result
}

// `tracing` event macros take a const level, so dynamic levels dispatch here.
fn log_enter(level: Level, operation: &'static str, args: &[(&str, String)]) {
    if level == Level::ERROR {
        tracing::error!(operation, ?args, "enter");
    } else if level == Level::WARN {
        tracing::warn!(operation, ?args, "enter");
    } else if level == Level::INFO {
        tracing::info!(operation, ?args, "enter");
    } else if level == Level::DEBUG {
        tracing::debug!(operation, ?args, "enter");
    } else {
        tracing::trace!(operation, ?args, "enter");
    }
}

fn log_exit(level: Level, operation: &'static str, elapsed_ms: u128) {
    if level == Level::ERROR {
        tracing::error!(operation, elapsed_ms, "exit");
    } else if level == Level::WARN {
        tracing::warn!(operation, elapsed_ms, "exit");
    } else if level == Level::INFO {
        tracing::info!(operation, elapsed_ms, "exit");
    } else if level == Level::DEBUG {
        tracing::debug!(operation, elapsed_ms, "exit");
    } else {
        tracing::trace!(operation, elapsed_ms, "exit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_the_closure_result() {
        let out = with_logging(Level::INFO, "create_hotel", &[("name", "Grand".into())], || {
            21 * 2
        });
        assert_eq!(out, 42);
    }

    #[test]
    fn runs_the_closure_exactly_once() {
        let mut calls = 0;
        with_logging(Level::DEBUG, "noop", &[], || calls += 1);
        assert_eq!(calls, 1);
    }
}
