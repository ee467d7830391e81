//! Query pattern analysis: coarse categories and bounded keyword
//! extraction against fixed clinical vocabularies.

use serde::{Deserialize, Serialize};

/// Coarse query category, decided upstream by the caller (typically
/// from the appointment or triage result type).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Emergency,
    Specialist,
    MentalHealth,
    Routine,
    General,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Specialist => "specialist",
            Self::MentalHealth => "mental_health",
            Self::Routine => "routine",
            Self::General => "general",
        }
    }
}

const SYMPTOM_TERMS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "abdominal pain",
    "headache",
    "dizziness",
    "palpitations",
    "fever",
    "fatigue",
    "nausea",
    "back pain",
    "rash",
    "swelling",
];

const EMERGENCY_TERMS: &[&str] = &[
    "severe",
    "acute",
    "sudden",
    "crushing",
    "collapse",
    "unconscious",
    "unresponsive",
    "bleeding",
    "anaphylaxis",
    "stroke",
    "emergency",
];

const COMPLEXITY_TERMS: &[&str] = &[
    "chronic",
    "recurrent",
    "persistent",
    "worsening",
    "multiple",
    "comorbid",
    "refractory",
];

const MENTAL_HEALTH_TERMS: &[&str] = &[
    "anxiety",
    "depression",
    "panic",
    "stress",
    "insomnia",
    "low mood",
    "self-harm",
    "mental health",
];

const AVIATION_TERMS: &[&str] = &[
    "aviation",
    "aeromedical",
    "flight",
    "pilot",
    "aircrew",
    "altitude",
    "hypoxia",
    "fitness to fly",
];

/// At most this many keywords per query; discovery queries are built
/// from them, so the cap bounds external search fan-out.
const MAX_KEYWORDS: usize = 8;

/// Vocabulary terms present in the query, symptom terms first, capped
/// at [`MAX_KEYWORDS`].
pub(crate) fn extract_keywords(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut keywords = Vec::new();
    for vocab in [SYMPTOM_TERMS, EMERGENCY_TERMS, COMPLEXITY_TERMS, MENTAL_HEALTH_TERMS, AVIATION_TERMS]
    {
        for term in vocab {
            if keywords.len() == MAX_KEYWORDS {
                return keywords;
            }
            if lowered.contains(term) && !keywords.iter().any(|k| k == term) {
                keywords.push((*term).to_string());
            }
        }
    }
    keywords
}

pub(crate) fn has_emergency_language(query: &str) -> bool {
    let lowered = query.to_lowercase();
    EMERGENCY_TERMS.iter().any(|t| lowered.contains(t))
}

pub(crate) fn has_mental_health_language(query: &str) -> bool {
    let lowered = query.to_lowercase();
    MENTAL_HEALTH_TERMS.iter().any(|t| lowered.contains(t))
}

pub(crate) fn has_aviation_language(query: &str) -> bool {
    let lowered = query.to_lowercase();
    AVIATION_TERMS.iter().any(|t| lowered.contains(t))
}
