//! Shared output helpers for CLI commands.
//!
//! Global flags are exported as environment variables by `main` so every
//! module can check them without threading state through each call.

/// Whether `--json` machine-readable output was requested.
pub fn is_json() -> bool {
    std::env::var("BATCHWISE_JSON").is_ok()
}

/// Whether `--quiet` was requested.
pub fn is_quiet() -> bool {
    std::env::var("BATCHWISE_QUIET").is_ok()
}

/// Whether `--verbose` was requested.
pub fn is_verbose() -> bool {
    std::env::var("BATCHWISE_VERBOSE").is_ok()
}

/// Print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}
