//! Adaptation plan produced by the recommendation engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Tier from the number of declared accessibility needs
    pub fn from_need_count(count: usize) -> Self {
        match count {
            0 => Priority::Low,
            1 | 2 => Priority::Medium,
            _ => Priority::High,
        }
    }
}

/// A settings hint value. Serializes as a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

/// Adaptations, settings hints, features and priority for one user.
///
/// Tags and features are kept in ordered sets, so duplicates collapse and the
/// serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptationPlan {
    pub adaptations: BTreeSet<String>,
    pub settings: BTreeMap<String, SettingValue>,
    pub features: BTreeSet<String>,
    pub priority: Priority,
}

impl AdaptationPlan {
    pub fn add_adaptations(&mut self, tags: &[&str]) {
        self.adaptations
            .extend(tags.iter().map(|t| (*t).to_string()));
    }

    pub fn add_features(&mut self, features: &[&str]) {
        self.features
            .extend(features.iter().map(|f| (*f).to_string()));
    }

    /// Last writer wins
    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) {
        self.settings.insert(key.to_string(), value.into());
    }

    pub fn setting(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    pub fn has_adaptation(&self, tag: &str) -> bool {
        self.adaptations.contains(tag)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(Priority::from_need_count(0), Priority::Low);
        assert_eq!(Priority::from_need_count(1), Priority::Medium);
        assert_eq!(Priority::from_need_count(2), Priority::Medium);
        assert_eq!(Priority::from_need_count(3), Priority::High);
        assert_eq!(Priority::from_need_count(6), Priority::High);
    }

    #[test]
    fn test_set_overwrites() {
        let mut plan = AdaptationPlan::default();
        plan.set("text_size", "large");
        plan.set("text_size", "x-large");
        assert_eq!(plan.setting("text_size").and_then(|v| v.as_str()), Some("x-large"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut plan = AdaptationPlan::default();
        plan.add_adaptations(&["simplify_text", "key_points"]);
        plan.add_adaptations(&["simplify_text"]);
        assert_eq!(plan.adaptations.len(), 2);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let mut plan = AdaptationPlan::default();
        plan.add_adaptations(&["tts"]);
        plan.add_features(&["Text-to-speech"]);
        plan.set("target_grade", 10_i64);
        plan.set("line_height", 2.0);
        plan.set("dyslexia_font", true);
        plan.set("language", "en-US");
        plan.priority = Priority::High;

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            json!({
                "adaptations": ["tts"],
                "settings": {
                    "dyslexia_font": true,
                    "language": "en-US",
                    "line_height": 2.0,
                    "target_grade": 10
                },
                "features": ["Text-to-speech"],
                "priority": "high"
            })
        );

        let back: AdaptationPlan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }
}
