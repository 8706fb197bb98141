// ABOUTME: tracing subscriber setup for the demo binary and embedding applications
// ABOUTME: BARPOP_DEBUG in the environment forces debug output regardless of configuration

use tracing::Level;

pub const DEBUG_ENV_VAR: &str = "BARPOP_DEBUG";

/// Level to run at: debug when `debug_env` is set, otherwise the configured one.
pub fn effective_level(configured: Level, debug_env: Option<&str>) -> Level {
    match debug_env {
        Some(value) if !value.is_empty() && value != "0" => configured.max(Level::DEBUG),
        _ => configured,
    }
}

/// Installs a global fmt subscriber. Later calls are ignored.
pub fn init(configured: Level) {
    let debug_env = std::env::var(DEBUG_ENV_VAR).ok();
    let level = effective_level(configured, debug_env.as_deref());

    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized at {level}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_without_env() {
        assert_eq!(effective_level(Level::WARN, None), Level::WARN);
    }

    #[test]
    fn test_debug_env_raises_level() {
        assert_eq!(effective_level(Level::INFO, Some("1")), Level::DEBUG);
        assert_eq!(effective_level(Level::ERROR, Some("yes")), Level::DEBUG);
    }

    #[test]
    fn test_debug_env_keeps_trace() {
        assert_eq!(effective_level(Level::TRACE, Some("1")), Level::TRACE);
    }

    #[test]
    fn test_disabled_debug_env_values() {
        assert_eq!(effective_level(Level::INFO, Some("")), Level::INFO);
        assert_eq!(effective_level(Level::INFO, Some("0")), Level::INFO);
    }
}
