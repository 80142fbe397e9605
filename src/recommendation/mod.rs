//! Recommendation module: survey response in, adaptation plan out.
//! Deterministic and side-effect free.

pub mod plan;
pub mod rules;

pub use plan::{AdaptationPlan, Priority, SettingValue};
pub use rules::{RULES, Rule};

use crate::survey::SurveyResponse;

/// Runs the ordered rule table against a survey response.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    rules: &'static [Rule],
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    pub fn with_rules(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    pub fn generate(&self, responses: &SurveyResponse) -> AdaptationPlan {
        let mut plan = AdaptationPlan::default();
        for rule in self.rules {
            if (rule.when)(responses) {
                (rule.then)(responses, &mut plan);
            }
        }
        plan
    }

    /// Names of the rules whose predicate matched, in evaluation order
    pub fn explain(&self, responses: &SurveyResponse) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| (rule.when)(responses))
            .map(|rule| rule.name)
            .collect()
    }
}
