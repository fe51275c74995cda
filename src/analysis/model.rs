//! Analysis document types and their output schemas.

use serde::{Deserialize, Serialize};

use crate::llm::OutputSchema;

/// Which shape of analysis to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisVariant {
    /// Outlook, milestones, physiognomy, colour and historical figure.
    Classic,
    /// Classic plus natal chart, five elements and interpersonal sections.
    #[default]
    Extended,
}

impl AnalysisVariant {
    pub fn is_extended(&self) -> bool {
        matches!(self, Self::Extended)
    }

    /// Output schema for this variant. Every declared field is required.
    pub fn output_schema(&self) -> OutputSchema {
        let s = || OutputSchema::String;

        let mut schema = OutputSchema::object([
            ("yearlyFortune", s()),
            (
                "milestones",
                OutputSchema::array(OutputSchema::object([
                    ("timeframe", s()),
                    ("prediction", s()),
                    ("advice", s()),
                ])),
            ),
            (
                "physiognomy",
                OutputSchema::object([
                    ("faceAnalysis", s()),
                    ("earAnalysis", s()),
                    ("moleAnalysis", s()),
                ]),
            ),
            (
                "personalityColor",
                OutputSchema::object([("hex", s()), ("name", s()), ("meaning", s())]),
            ),
            (
                "similarPerson",
                OutputSchema::object([("name", s()), ("description", s())]),
            ),
        ]);

        if self.is_extended() {
            schema = schema
                .with_field(
                    "natalChart",
                    OutputSchema::object([
                        ("personality", s()),
                        ("career", s()),
                        ("love", s()),
                        ("marriage", s()),
                        ("wealth", s()),
                    ]),
                    true,
                )
                .with_field(
                    "fiveElements",
                    OutputSchema::object([
                        ("element", s()),
                        ("nature", s()),
                        ("strength", s()),
                        ("supplement", s()),
                        ("taboos", s()),
                    ]),
                    true,
                )
                .with_field(
                    "interpersonal",
                    OutputSchema::object([("style", s()), ("connection", s()), ("caution", s())]),
                    true,
                );
        }
        schema
    }
}

impl std::fmt::Display for AnalysisVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

impl std::str::FromStr for AnalysisVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "extended" => Ok(Self::Extended),
            other => Err(format!(
                "unknown analysis variant {other:?} (expected classic or extended)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub timeframe: String,
    pub prediction: String,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Physiognomy {
    pub face_analysis: String,
    pub ear_analysis: String,
    pub mole_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityColor {
    /// `#RRGGBB` or `#RGB`.
    pub hex: String,
    pub name: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarPerson {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatalChart {
    pub personality: String,
    pub career: String,
    pub love: String,
    pub marriage: String,
    pub wealth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveElements {
    /// Day-master element, e.g. 乙木.
    pub element: String,
    pub nature: String,
    /// 身强 / 身弱 / 中和.
    pub strength: String,
    pub supplement: String,
    pub taboos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpersonal {
    pub style: String,
    pub connection: String,
    pub caution: String,
}

/// A fully validated analysis document.
///
/// The extended sections are `Some` whenever the document was requested with
/// [`AnalysisVariant::Extended`]; validation guarantees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub yearly_fortune: String,
    pub milestones: Vec<Milestone>,
    pub physiognomy: Physiognomy,
    pub personality_color: PersonalityColor,
    pub similar_person: SimilarPerson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natal_chart: Option<NatalChart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five_elements: Option<FiveElements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpersonal: Option<Interpersonal>,
}
