//! Backend configuration.

use dragon_types::TargetLayout;

/// Options for one [`Backend`](super::Backend).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Check every function body for shared nodes and instructions before
    /// lowering it.
    pub integrity_checks: bool,
    /// Target data layout for size and alignment queries.
    pub target: TargetLayout,
    /// Log a dump of every function body tree before lowering.
    pub dump_trees: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            integrity_checks: cfg!(debug_assertions),
            target: TargetLayout::default(),
            dump_trees: false,
        }
    }
}

impl BackendConfig {
    /// Defaults, overridden by the environment.
    ///
    /// `DRAGON_INTEGRITY_CHECKS=0|1` turns the integrity check off or on.
    /// `DRAGON_DUMP_TREES` (any value) enables tree dumps.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("DRAGON_INTEGRITY_CHECKS") {
            config.integrity_checks = parse_switch(&value, config.integrity_checks);
        }
        if std::env::var("DRAGON_DUMP_TREES").is_ok() {
            config.dump_trees = true;
        }
        config
    }
}

fn parse_switch(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => true,
        "0" | "false" | "off" | "no" => false,
        _ => {
            tracing::warn!(value, "unrecognized DRAGON_INTEGRITY_CHECKS value; keeping default");
            default
        }
    }
}
