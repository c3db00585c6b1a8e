//! Prompt templates stored as data.
//!
//! Each template is a text file with `{{name}}` placeholders. [`render`] fills
//! them from a [`PromptVars`] map in one pass; substituted values are inserted
//! verbatim and never re-scanned.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::warn;

use crate::interfaces::providers::CompletionOptions;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap());

/// Temperature for prompts whose replies are parsed into fields.
const STRUCTURED_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateId {
    SparkClassify,
    BuildClassify,
    ProblemExtraction,
    GenerateTitle,
    CheckTitle,
    UpdateTitle,
    GenerateAbstract,
    UpdateAbstract,
    GenerateAssumptions,
    GenerateDescription,
    UpdateDescription,
    GenerateConstraints,
    GenerateRisks,
    AssessProblemType,
    ExplainAssessment,
    InterpretSliders,
    MarketAnalysis,
    KeyFindings,
    BreadthDepth,
    UpdateBreadthDepth,
    FutureScenarios,
    FunctionMap,
    TrizPrinciple,
    ProblemSummary,
    RecommendExperts,
    VisualMap,
}

impl TemplateId {
    pub const ALL: [TemplateId; 26] = [
        Self::SparkClassify,
        Self::BuildClassify,
        Self::ProblemExtraction,
        Self::GenerateTitle,
        Self::CheckTitle,
        Self::UpdateTitle,
        Self::GenerateAbstract,
        Self::UpdateAbstract,
        Self::GenerateAssumptions,
        Self::GenerateDescription,
        Self::UpdateDescription,
        Self::GenerateConstraints,
        Self::GenerateRisks,
        Self::AssessProblemType,
        Self::ExplainAssessment,
        Self::InterpretSliders,
        Self::MarketAnalysis,
        Self::KeyFindings,
        Self::BreadthDepth,
        Self::UpdateBreadthDepth,
        Self::FutureScenarios,
        Self::FunctionMap,
        Self::TrizPrinciple,
        Self::ProblemSummary,
        Self::RecommendExperts,
        Self::VisualMap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SparkClassify => "spark_classify",
            Self::BuildClassify => "build_classify",
            Self::ProblemExtraction => "problem_extraction",
            Self::GenerateTitle => "generate_title",
            Self::CheckTitle => "check_title",
            Self::UpdateTitle => "update_title",
            Self::GenerateAbstract => "generate_abstract",
            Self::UpdateAbstract => "update_abstract",
            Self::GenerateAssumptions => "generate_assumptions",
            Self::GenerateDescription => "generate_description",
            Self::UpdateDescription => "update_description",
            Self::GenerateConstraints => "generate_constraints",
            Self::GenerateRisks => "generate_risks",
            Self::AssessProblemType => "assess_problem_type",
            Self::ExplainAssessment => "explain_assessment",
            Self::InterpretSliders => "interpret_sliders",
            Self::MarketAnalysis => "market_analysis",
            Self::KeyFindings => "key_findings",
            Self::BreadthDepth => "breadth_depth",
            Self::UpdateBreadthDepth => "update_breadth_depth",
            Self::FutureScenarios => "future_scenarios",
            Self::FunctionMap => "function_map",
            Self::TrizPrinciple => "triz_principle",
            Self::ProblemSummary => "problem_summary",
            Self::RecommendExperts => "recommend_experts",
            Self::VisualMap => "visual_map",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Self::SparkClassify => include_str!("templates/spark_classify.txt"),
            Self::BuildClassify => include_str!("templates/build_classify.txt"),
            Self::ProblemExtraction => include_str!("templates/problem_extraction.txt"),
            Self::GenerateTitle => include_str!("templates/generate_title.txt"),
            Self::CheckTitle => include_str!("templates/check_title.txt"),
            Self::UpdateTitle => include_str!("templates/update_title.txt"),
            Self::GenerateAbstract => include_str!("templates/generate_abstract.txt"),
            Self::UpdateAbstract => include_str!("templates/update_abstract.txt"),
            Self::GenerateAssumptions => include_str!("templates/generate_assumptions.txt"),
            Self::GenerateDescription => include_str!("templates/generate_description.txt"),
            Self::UpdateDescription => include_str!("templates/update_description.txt"),
            Self::GenerateConstraints => include_str!("templates/generate_constraints.txt"),
            Self::GenerateRisks => include_str!("templates/generate_risks.txt"),
            Self::AssessProblemType => include_str!("templates/assess_problem_type.txt"),
            Self::ExplainAssessment => include_str!("templates/explain_assessment.txt"),
            Self::InterpretSliders => include_str!("templates/interpret_sliders.txt"),
            Self::MarketAnalysis => include_str!("templates/market_analysis.txt"),
            Self::KeyFindings => include_str!("templates/key_findings.txt"),
            Self::BreadthDepth => include_str!("templates/breadth_depth.txt"),
            Self::UpdateBreadthDepth => include_str!("templates/update_breadth_depth.txt"),
            Self::FutureScenarios => include_str!("templates/future_scenarios.txt"),
            Self::FunctionMap => include_str!("templates/function_map.txt"),
            Self::TrizPrinciple => include_str!("templates/triz_principle.txt"),
            Self::ProblemSummary => include_str!("templates/problem_summary.txt"),
            Self::RecommendExperts => include_str!("templates/recommend_experts.txt"),
            Self::VisualMap => include_str!("templates/visual_map.txt"),
        }
    }

    /// Labels the reply is expected to carry, in display order. Empty for
    /// free-text templates.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::AssessProblemType => &[
                "PROBLEM_TYPE",
                "COMPLEXITY_SCORE",
                "NOVELTY_SCORE",
                "URGENCY_SCORE",
                "IMPACT_SCORE",
                "RATIONALE",
            ],
            Self::KeyFindings => &["KEY_FINDINGS", "GAPS", "OPPORTUNITIES", "RECOMMENDATION"],
            Self::BreadthDepth | Self::UpdateBreadthDepth => &[
                "BREADTH_SCORE",
                "DEPTH_SCORE",
                "BREADTH_FACTORS",
                "DEPTH_FACTORS",
                "QUADRANT",
            ],
            Self::FutureScenarios => &[
                "OPTIMISTIC",
                "PESSIMISTIC",
                "TRANSFORMATIVE",
                "MOST_LIKELY",
            ],
            Self::FunctionMap => &[
                "MAIN_FUNCTION",
                "SUB_FUNCTIONS",
                "USEFUL_INTERACTIONS",
                "HARMFUL_INTERACTIONS",
                "INSUFFICIENT_INTERACTIONS",
            ],
            Self::TrizPrinciple => &[
                "CONTRADICTION",
                "IMPROVING_PARAMETER",
                "WORSENING_PARAMETER",
                "PRINCIPLES",
                "SOLUTION_CONCEPT",
            ],
            Self::RecommendExperts => &["EXPERT_DOMAINS", "ROLES", "ORGANIZATIONS", "RATIONALE"],
            _ => &[],
        }
    }

    pub fn is_structured(self) -> bool {
        !self.fields().is_empty()
    }

    pub fn options(self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.is_structured().then_some(STRUCTURED_TEMPERATURE),
        }
    }
}

/// Values for one render call. Anything `Display` is accepted and turned into text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVars {
    values: BTreeMap<String, String>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Display) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Display) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Fills every placeholder of `template`. Unknown placeholders render empty.
pub fn render(template: TemplateId, vars: &PromptVars) -> String {
    PLACEHOLDER_RE
        .replace_all(template.source(), |caps: &Captures<'_>| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.to_string(),
                None => {
                    warn!(
                        template = template.name(),
                        placeholder = name,
                        "no value supplied for placeholder"
                    );
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Criteria the title check evaluates against, one per line in the prompt.
pub const TITLE_GUIDELINES: [&str; 17] = [
    "1. Scope indication: Includes a hint about the scale or scope of the problem. Good example: 'Reducing Plastic Waste in Southeast Asian Coastal Communities'. Bad example: 'Plastic Waste Reduction'.",
    "2. Stakeholder focus: Mentions key stakeholders affected by or involved in the problem. Good example: 'Improving Healthcare Access for Rural Elderly Populations'. Bad example: 'Healthcare Access Improvement'.",
    "3. Timeframe: Indicates whether it's an urgent, ongoing, or future issue. Good example: 'Addressing Immediate Food Insecurity in Drought-Affected Regions'. Bad example: 'Food Insecurity in Drought Regions'.",
    "4. Outcome-oriented: Suggests the desired result or improvement. Good example: 'Enhancing Student Engagement Through Gamified Learning Platforms'. Bad example: 'Using Gamification in Education'.",
    "5. Keyword optimization: Uses relevant keywords for searchability and categorization. Good example: 'Sustainable Urban Development: Implementing Green Infrastructure Solutions'. Bad example: 'City Planning Improvements'.",
    "6. Avoid unnecessary words: Eliminates articles and filler words when possible. Good example: 'Reducing Industrial Carbon Emissions'. Bad example: 'The Challenge of Reducing the Carbon Emissions in the Industry'.",
    "7. Use active voice: Employs active rather than passive language for directness. Good example: 'Implementing Water Conservation Strategies in Arid Regions'. Bad example: 'Water Conservation Strategies Being Implemented in Arid Regions'.",
    "8. Quantify if possible: Includes numbers or metrics if they add significant value. Good example: 'Halving Food Waste: A 10-Year Strategy for Restaurants'. Bad example: 'Reducing Food Waste in Restaurants'.",
    "9. Avoid questions: Frames the title as a statement rather than a question. Good example: 'Improving Public Transportation Efficiency in High-Density Urban Areas'. Bad example: 'How Can We Improve Public Transportation in Crowded Cities?'.",
    "10. Balance creativity and clarity: Uses engaging language but prioritizes clarity over cleverness. Good example: 'From Trash to Treasure: Upcycling Industrial Waste into Valuable Products'. Bad example: 'Turning Garbage into Gold: A Waste Revolution'.",
    "11. Consistency: Ensures the title aligns with the content of the problem statement. Good example: 'Global Climate Change Mitigation Strategies'. Bad example: 'Global Climate Change Mitigation Strategies' (if the content only discusses local initiatives).",
    "12. Avoid abbreviations: Spells out terms unless universally recognized in the field. Good example: 'Reducing Greenhouse Gas Emissions in the Transport Sector'. Bad example: 'Reducing GHG Emissions in the Transport Sector'.",
    "13. Clarity and Simplicity: Ensure the title is easy to understand and free of complex jargon unless necessary. Good example: 'Improving Air Quality in Urban Areas'. Bad example: 'Enhancing Atmospheric Composition Through Pollution Mitigation'.",
    "14. Engagement: Make the title engaging to capture the reader's interest. Good example: 'Boosting Renewable Energy Adoption in Developing Countries'. Bad example: 'Promoting Renewable Energy'.",
    "15. Precision: Use precise and specific language to avoid vagueness. Good example: 'Enhancing Cybersecurity Measures in Online Banking'. Bad example: 'Improving Security in Banking'.",
    "16. Length: Maintain a balance between brevity and informativeness, aiming for 5 to 12 words. Good example: 'Enhancing Urban Mobility Through Bike-Sharing Programs'. Bad example: 'Exploring Ways to Enhance Urban Mobility Through the Implementation of Bike-Sharing Programs'.",
    "17. Perspective: Reflect the perspective or approach being taken, such as policy, technology, or societal impact. Good example: 'Policy Interventions for Reducing Childhood Obesity'. Bad example: 'Childhood Obesity Reduction'.",
];

pub fn title_guidelines() -> String {
    TITLE_GUIDELINES.join("\n")
}
