//! Analyzer configuration.

use crate::catalog::DEFAULT_DATABASE;

/// Default pass ceiling for the fixed-point loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Overrides `max_iterations` when set to an integer.
pub const MAX_ITERATIONS_ENV: &str = "ARBOR_MAX_ANALYSIS_ITERATIONS";

/// Enables per-rule tracing when present.
pub const TRACE_RULES_ENV: &str = "ARBOR_TRACE_RULES";

/// Configuration for the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Maximum number of passes before analysis gives up.
    pub max_iterations: usize,
    /// Database used for table references without an explicit one.
    pub default_database: String,
    /// Emit a trace event for every rule application.
    pub trace_rules: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            default_database: DEFAULT_DATABASE.to_string(),
            trace_rules: false,
        }
    }
}

impl AnalyzerConfig {
    /// Creates a new analyzer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, falling back to the defaults for
    /// missing or unparsable values.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(max) = lookup(MAX_ITERATIONS_ENV).and_then(|v| v.trim().parse().ok()) {
            config.max_iterations = max;
        }
        config.trace_rules = lookup(TRACE_RULES_ENV).is_some();
        config
    }

    /// Sets the pass ceiling.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the default database.
    #[must_use]
    pub fn with_default_database(mut self, database: impl Into<String>) -> Self {
        self.default_database = database.into();
        self
    }

    /// Enables or disables per-rule tracing.
    #[must_use]
    pub fn with_trace_rules(mut self, trace_rules: bool) -> Self {
        self.trace_rules = trace_rules;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::new();
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.default_database, "default");
        assert!(!config.trace_rules);
    }

    #[test]
    fn test_builders() {
        let config = AnalyzerConfig::new()
            .with_max_iterations(5)
            .with_default_database("sales")
            .with_trace_rules(true);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.default_database, "sales");
        assert!(config.trace_rules);
    }

    #[test]
    fn test_from_lookup() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            (MAX_ITERATIONS_ENV, " 42 "),
            (TRACE_RULES_ENV, "0"),
        ]));
        assert_eq!(config.max_iterations, 42);
        assert!(config.trace_rules);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = AnalyzerConfig::from_lookup(lookup(&[(MAX_ITERATIONS_ENV, "lots")]));
        assert_eq!(config, AnalyzerConfig::default());
    }
}
