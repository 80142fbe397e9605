//! The fixed eight-question accessibility survey.

use serde::Serialize;

/// Question identifiers `q1`..`q8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuestionId {
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
    Q6,
    Q7,
    Q8,
}

impl QuestionId {
    pub const ALL: [QuestionId; 8] = [
        QuestionId::Q1,
        QuestionId::Q2,
        QuestionId::Q3,
        QuestionId::Q4,
        QuestionId::Q5,
        QuestionId::Q6,
        QuestionId::Q7,
        QuestionId::Q8,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionId::Q1 => "q1",
            QuestionId::Q2 => "q2",
            QuestionId::Q3 => "q3",
            QuestionId::Q4 => "q4",
            QuestionId::Q5 => "q5",
            QuestionId::Q6 => "q6",
            QuestionId::Q7 => "q7",
            QuestionId::Q8 => "q8",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == key)
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionId::Q1 | QuestionId::Q2 | QuestionId::Q5 | QuestionId::Q6 => {
                QuestionKind::MultipleChoice
            }
            QuestionId::Q4 => QuestionKind::Boolean,
            QuestionId::Q3 | QuestionId::Q7 | QuestionId::Q8 => QuestionKind::SingleChoice,
        }
    }
}

impl Serialize for QuestionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    SingleChoice,
    Boolean,
}

impl QuestionKind {
    pub fn is_multi_select(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: &'static [&'static str],
}

/// Answer option strings the recommendation rules match on
pub mod options {
    pub const DYSLEXIA_SUPPORT: &str = "Dyslexia support";
    pub const VISUAL_IMPAIRMENT: &str = "Visual impairment";
    pub const COGNITIVE_DISABILITY: &str = "Cognitive disability";

    pub const ELEMENTARY: &str = "Elementary";
    pub const MIDDLE_SCHOOL: &str = "Middle School";
    pub const HIGH_SCHOOL: &str = "High School";

    pub const YES: &str = "Yes";

    pub const MATH_EQUATION_READING: &str = "Math equation reading";
    pub const IMAGE_DESCRIPTION: &str = "Image description";

    pub const DYSLEXIA_FRIENDLY_FONTS: &str = "Dyslexia-friendly fonts";
    pub const HIGH_CONTRAST_MODE: &str = "High contrast mode";
    pub const LARGER_TEXT_SIZE: &str = "Larger text size";
    pub const INCREASED_LINE_SPACING: &str = "Increased line spacing";

    pub const TEXT_DESCRIPTION: &str = "Text description";
    pub const ALL_OF_THE_ABOVE: &str = "All of the above";
}

pub static QUESTIONS: [Question; 8] = [
    Question {
        id: QuestionId::Q1,
        question: "What are your primary accessibility needs?",
        kind: QuestionKind::MultipleChoice,
        options: &[
            "Dyslexia support",
            "Visual impairment",
            "Cognitive disability",
            "Hearing impairment",
            "Motor disability",
            "None",
        ],
    },
    Question {
        id: QuestionId::Q2,
        question: "What type of content do you work with most?",
        kind: QuestionKind::MultipleChoice,
        options: &[
            "Academic papers",
            "Technical documentation",
            "Books and literature",
            "News articles",
            "Educational materials",
            "Other",
        ],
    },
    Question {
        id: QuestionId::Q3,
        question: "What is your preferred reading level?",
        kind: QuestionKind::SingleChoice,
        options: &[
            "Elementary (Grade 3-5)",
            "Middle School (Grade 6-8)",
            "High School (Grade 9-12)",
            "College/Professional",
            "No preference",
        ],
    },
    Question {
        id: QuestionId::Q4,
        question: "Do you use screen readers?",
        kind: QuestionKind::Boolean,
        options: &["Yes", "No"],
    },
    Question {
        id: QuestionId::Q5,
        question: "What text-to-speech features do you need?",
        kind: QuestionKind::MultipleChoice,
        options: &[
            "Standard text reading",
            "Math equation reading",
            "Table description",
            "Image description",
            "None",
        ],
    },
    Question {
        id: QuestionId::Q6,
        question: "What visual adaptations do you prefer?",
        kind: QuestionKind::MultipleChoice,
        options: &[
            "Dyslexia-friendly fonts",
            "High contrast mode",
            "Larger text size",
            "Increased line spacing",
            "Color customization",
            "None",
        ],
    },
    Question {
        id: QuestionId::Q7,
        question: "How do you prefer complex diagrams to be handled?",
        kind: QuestionKind::SingleChoice,
        options: &[
            "Text description",
            "Simplified diagram",
            "Step-by-step breakdown",
            "Audio explanation",
            "All of the above",
        ],
    },
    Question {
        id: QuestionId::Q8,
        question: "What language do you primarily work in?",
        kind: QuestionKind::SingleChoice,
        options: &["English", "Spanish", "French", "German", "Other"],
    },
];

pub fn questions() -> &'static [Question] {
    &QUESTIONS
}
