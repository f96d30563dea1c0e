//! Fixed-point plan analyzer.
//!
//! The analyzer applies its rules, in order, to the whole plan ("one pass")
//! until a pass leaves the plan structurally unchanged, then checks that the
//! result is fully resolved.

mod config;
pub mod rules;

pub use config::{AnalyzerConfig, DEFAULT_MAX_ITERATIONS, MAX_ITERATIONS_ENV, TRACE_RULES_ENV};
pub use rules::{default_rules, AnalyzerRule, FnRule};

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::error::{ArborError, Result};
use crate::planner::LogicalPlan;
use crate::types::TypeCastRegistry;

/// Resolves logical plans against a catalog.
pub struct Analyzer {
    rules: Vec<Box<dyn AnalyzerRule>>,
    catalog: Arc<Catalog>,
    type_casts: Arc<TypeCastRegistry>,
    current_database: String,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer with the default rules and configuration.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, AnalyzerConfig::default())
    }

    /// Creates an analyzer with the default rules and the given configuration.
    #[must_use]
    pub fn with_config(catalog: Arc<Catalog>, config: AnalyzerConfig) -> Self {
        Analyzer {
            rules: default_rules(),
            catalog,
            type_casts: Arc::new(TypeCastRegistry::with_defaults()),
            current_database: config.default_database.clone(),
            config,
        }
    }

    /// Replaces the rule list.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Box<dyn AnalyzerRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the cast registry used to bind casts.
    #[must_use]
    pub fn with_type_casts(mut self, type_casts: Arc<TypeCastRegistry>) -> Self {
        self.type_casts = type_casts;
        self
    }

    /// Appends a rule; it runs after the existing ones in every pass.
    pub fn add_rule(&mut self, rule: Box<dyn AnalyzerRule>) {
        self.rules.push(rule);
    }

    /// Returns the rule names in application order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn type_casts(&self) -> &TypeCastRegistry {
        &self.type_casts
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Database used for table references that do not name one.
    #[must_use]
    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    pub fn set_current_database(&mut self, database: impl Into<String>) {
        self.current_database = database.into();
    }

    /// Runs the rules to a fixed point and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisIterationLimitExceeded` carrying the last computed
    /// plan if no fixed point is reached within `max_iterations` passes, and
    /// `UnresolvedPlan` carrying the innermost unresolved node if the fixed
    /// point is not fully resolved.
    pub fn analyze(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        debug!(
            database = %self.current_database,
            rules = self.rules.len(),
            "starting analysis"
        );

        let limit = self.config.max_iterations;
        let mut prev = plan;
        let mut passes = 0;
        loop {
            let cur = self.analyze_once(prev.clone());
            passes += 1;

            if cur == prev {
                debug!(passes, "analysis converged");
                return Self::validate(cur);
            }
            if passes >= limit {
                warn!(limit, "exceeded max analysis iterations");
                return Err(ArborError::AnalysisIterationLimitExceeded {
                    limit,
                    plan: Box::new(cur),
                });
            }
            prev = cur;
        }
    }

    /// Applies every rule once, in order.
    fn analyze_once(&self, plan: LogicalPlan) -> LogicalPlan {
        self.rules.iter().fold(plan, |plan, rule| {
            let out = rule.apply(self, plan);
            if self.config.trace_rules {
                trace!(rule = rule.name(), resolved = out.resolved(), "applied rule");
            }
            out
        })
    }

    fn validate(plan: LogicalPlan) -> Result<LogicalPlan> {
        if plan.resolved() {
            return Ok(plan);
        }
        let node = innermost_unresolved(&plan).clone();
        debug!(node = %node.describe(), "plan is not resolved");
        Err(ArborError::UnresolvedPlan(Box::new(node)))
    }
}

/// Descends into the first unresolved child until reaching a node with no
/// unresolved children.
fn innermost_unresolved(plan: &LogicalPlan) -> &LogicalPlan {
    let mut node = plan;
    while let Some(child) = node.children().into_iter().find(|c| !c.resolved()) {
        node = child;
    }
    node
}
