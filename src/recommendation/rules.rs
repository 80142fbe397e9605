//! Ordered rule table mapping survey answers to plan effects.
//!
//! Rules run top to bottom. Several write the same settings key (`font`,
//! `text_size`), so the order here decides which value survives.

use super::plan::{AdaptationPlan, Priority};
use crate::survey::{QuestionId, SurveyResponse, options};

pub type Predicate = fn(&SurveyResponse) -> bool;
pub type Effect = fn(&SurveyResponse, &mut AdaptationPlan);

/// One (predicate, effect) pair in the rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub question: Option<QuestionId>,
    pub when: Predicate,
    pub then: Effect,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("question", &self.question)
            .finish()
    }
}

pub static RULES: &[Rule] = &[
    // q1: accessibility needs
    Rule {
        name: "needs.dyslexia",
        question: Some(QuestionId::Q1),
        when: needs_dyslexia,
        then: apply_dyslexia_support,
    },
    Rule {
        name: "needs.visual",
        question: Some(QuestionId::Q1),
        when: needs_visual,
        then: apply_visual_support,
    },
    Rule {
        name: "needs.cognitive",
        question: Some(QuestionId::Q1),
        when: needs_cognitive,
        then: apply_cognitive_support,
    },
    // q3: reading level
    Rule {
        name: "reading_level",
        question: Some(QuestionId::Q3),
        when: always,
        then: apply_reading_level,
    },
    // q4: screen reader
    Rule {
        name: "screen_reader",
        question: Some(QuestionId::Q4),
        when: uses_screen_reader,
        then: apply_screen_reader,
    },
    // q5: text-to-speech
    Rule {
        name: "tts.math",
        question: Some(QuestionId::Q5),
        when: wants_math_speech,
        then: apply_math_speech,
    },
    Rule {
        name: "tts.images",
        question: Some(QuestionId::Q5),
        when: wants_image_description,
        then: apply_image_description,
    },
    // q6: visual preferences
    Rule {
        name: "visual.dyslexia_font",
        question: Some(QuestionId::Q6),
        when: prefers_dyslexia_font,
        then: apply_dyslexia_font,
    },
    Rule {
        name: "visual.high_contrast",
        question: Some(QuestionId::Q6),
        when: prefers_high_contrast,
        then: apply_high_contrast_theme,
    },
    Rule {
        name: "visual.larger_text",
        question: Some(QuestionId::Q6),
        when: prefers_larger_text,
        then: apply_larger_text,
    },
    Rule {
        name: "visual.line_spacing",
        question: Some(QuestionId::Q6),
        when: prefers_line_spacing,
        then: apply_line_spacing,
    },
    // q7: diagrams
    Rule {
        name: "diagrams",
        question: Some(QuestionId::Q7),
        when: wants_diagram_text,
        then: apply_diagram_text,
    },
    // q8: language
    Rule {
        name: "language",
        question: Some(QuestionId::Q8),
        when: always,
        then: apply_language,
    },
    // derived from q1 breadth
    Rule {
        name: "priority",
        question: None,
        when: always,
        then: apply_priority,
    },
];

const LANGUAGE_CODES: [(&str, &str); 4] = [
    ("English", "en-US"),
    ("Spanish", "es-ES"),
    ("French", "fr-FR"),
    ("German", "de-DE"),
];

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TARGET_GRADE: i64 = 12;

fn always(_: &SurveyResponse) -> bool {
    true
}

fn needs_dyslexia(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q1, options::DYSLEXIA_SUPPORT)
}

fn needs_visual(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q1, options::VISUAL_IMPAIRMENT)
}

fn needs_cognitive(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q1, options::COGNITIVE_DISABILITY)
}

fn uses_screen_reader(r: &SurveyResponse) -> bool {
    r.single(QuestionId::Q4) == options::YES
}

fn wants_math_speech(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q5, options::MATH_EQUATION_READING)
}

fn wants_image_description(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q5, options::IMAGE_DESCRIPTION)
}

fn prefers_dyslexia_font(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q6, options::DYSLEXIA_FRIENDLY_FONTS)
}

fn prefers_high_contrast(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q6, options::HIGH_CONTRAST_MODE)
}

fn prefers_larger_text(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q6, options::LARGER_TEXT_SIZE)
}

fn prefers_line_spacing(r: &SurveyResponse) -> bool {
    r.selected(QuestionId::Q6, options::INCREASED_LINE_SPACING)
}

fn wants_diagram_text(r: &SurveyResponse) -> bool {
    let pref = r.single(QuestionId::Q7);
    pref.contains(options::TEXT_DESCRIPTION) || pref.contains(options::ALL_OF_THE_ABOVE)
}

fn apply_dyslexia_support(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["dyslexia_font", "text_spacing", "simplify_text"]);
    plan.set("dyslexia_font", true);
    plan.set("font", "OpenDyslexic");
    plan.add_features(&["Dyslexia-friendly formatting"]);
}

fn apply_visual_support(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["high_contrast", "tts", "screen_reader"]);
    plan.set("high_contrast", true);
    plan.set("text_size", "large");
    plan.add_features(&["Text-to-speech", "High contrast mode"]);
}

fn apply_cognitive_support(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["simplify_text", "key_points", "structure_description"]);
    plan.set("simplify_grade", 6_i64);
    plan.add_features(&["Text simplification", "Key points extraction"]);
}

/// Grade for a reading-level answer, by substring. Unmatched means 12.
pub fn target_grade(reading_level: &str) -> i64 {
    if reading_level.contains(options::ELEMENTARY) {
        4
    } else if reading_level.contains(options::MIDDLE_SCHOOL) {
        7
    } else if reading_level.contains(options::HIGH_SCHOOL) {
        10
    } else {
        DEFAULT_TARGET_GRADE
    }
}

fn apply_reading_level(r: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("target_grade", target_grade(r.single(QuestionId::Q3)));
}

fn apply_screen_reader(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["screen_reader_optimized"]);
    plan.add_features(&["Screen reader optimization"]);
    plan.set("alt_text_generation", true);
}

fn apply_math_speech(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["math_to_speech"]);
    plan.add_features(&["Mathematical equation narration"]);
}

fn apply_image_description(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["image_description"]);
    plan.add_features(&["Automatic image descriptions"]);
}

fn apply_dyslexia_font(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("font", "OpenDyslexic");
}

fn apply_high_contrast_theme(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("theme", "high_contrast");
}

fn apply_larger_text(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("text_size", "x-large");
}

fn apply_line_spacing(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("line_height", 2.0);
}

fn apply_diagram_text(_: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.add_adaptations(&["diagram_to_text"]);
    plan.add_features(&["Diagram text descriptions"]);
}

/// Locale for a language answer (exact match), defaulting to en-US
pub fn language_code(language: &str) -> &'static str {
    LANGUAGE_CODES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

fn apply_language(r: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.set("language", language_code(r.single(QuestionId::Q8)));
}

fn apply_priority(r: &SurveyResponse, plan: &mut AdaptationPlan) {
    plan.priority = Priority::from_need_count(r.multi(QuestionId::Q1).len());
}
