//! Survey answers with forgiving parsing.
//!
//! Collaborators hand us whatever JSON the client sent. Parsing never fails:
//! unknown keys and wrong-typed values are dropped, and multi-select answers
//! given as a bare string are coerced into a one-element list.

use super::catalog::QuestionId;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl Answer {
    /// Strings become `Single`, arrays become `Multiple` keeping only string
    /// elements. Anything else is treated as unanswered.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Answer::Single(s.clone())),
            Value::Array(items) => Some(Answer::Multiple(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// One user's answers to the survey, normalized at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct SurveyResponse {
    answers: BTreeMap<QuestionId, Answer>,
}

impl SurveyResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary JSON value. Non-objects yield an empty response.
    pub fn from_value(value: &Value) -> Self {
        let mut response = Self::new();
        if let Some(obj) = value.as_object() {
            for (key, raw) in obj {
                let (Some(id), Some(answer)) = (QuestionId::parse(key), Answer::from_value(raw))
                else {
                    continue;
                };
                response = response.with_answer(id, answer);
            }
        }
        response
    }

    /// Add an answer, applying multi-select coercion for list questions.
    pub fn with_answer(mut self, id: QuestionId, answer: Answer) -> Self {
        let answer = match answer {
            Answer::Single(s) if id.kind().is_multi_select() => Answer::Multiple(vec![s]),
            other => other,
        };
        self.answers.insert(id, answer);
        self
    }

    pub fn with_single(self, id: QuestionId, value: impl Into<String>) -> Self {
        self.with_answer(id, Answer::Single(value.into()))
    }

    pub fn with_multiple<I, S>(self, id: QuestionId, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_answer(
            id,
            Answer::Multiple(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn answer(&self, id: QuestionId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    /// Selected options for a multi-select question; empty when unanswered.
    pub fn multi(&self, id: QuestionId) -> &[String] {
        match self.answers.get(&id) {
            Some(Answer::Multiple(items)) => items,
            _ => &[],
        }
    }

    /// Value of a single-choice question; empty when unanswered or a list.
    pub fn single(&self, id: QuestionId) -> &str {
        match self.answers.get(&id) {
            Some(Answer::Single(s)) => s,
            _ => "",
        }
    }

    pub fn selected(&self, id: QuestionId, option: &str) -> bool {
        self.multi(id).iter().any(|s| s == option)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl From<Value> for SurveyResponse {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}
