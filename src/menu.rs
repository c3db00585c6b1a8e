//! Static page and action table.
//!
//! Every action belongs to exactly one page, declares the inputs it reads and
//! is routed to one handler in [`crate::services::conversation`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{KreatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    SparkBlocks,
    BuildBlocks,
    Conversation,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::SparkBlocks, Page::BuildBlocks, Page::Conversation];

    pub fn label(self) -> &'static str {
        match self {
            Page::SparkBlocks => "Spark Blocks",
            Page::BuildBlocks => "Build Blocks",
            Page::Conversation => "Conversation",
        }
    }

    /// Accepts the label in any case, or its first word ("spark", "build").
    pub fn parse(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_lowercase();
        Page::ALL
            .into_iter()
            .find(|page| {
                let label = page.label().to_lowercase();
                label == wanted
                    || label.replace(' ', "-") == wanted
                    || label.split(' ').next() == Some(wanted.as_str())
            })
            .ok_or_else(|| KreatError::Input(format!("unknown page: {raw}")))
    }

    pub fn actions(self) -> impl Iterator<Item = MenuAction> {
        MenuAction::ALL
            .into_iter()
            .filter(move |action| action.page() == self)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Slider { min: i64, max: i64, default: i64 },
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    /// Required fields have no session fallback.
    pub required: bool,
}

impl InputField {
    const fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            kind: InputKind::Text,
            required,
        }
    }

    const fn slider(
        name: &'static str,
        label: &'static str,
        min: i64,
        max: i64,
        default: i64,
    ) -> Self {
        Self {
            name,
            label,
            kind: InputKind::Slider { min, max, default },
            required: false,
        }
    }
}

const PROBLEM_REQUIRED: InputField = InputField::text("problem", "Problem statement", true);
const PROBLEM: InputField = InputField::text(
    "problem",
    "Problem statement (defaults to the session)",
    false,
);
const GOAL: InputField = InputField::text("goal", "Goal", true);
const TITLE: InputField = InputField::text("title", "Title (defaults to the session)", false);
const ABSTRACT: InputField = InputField::text(
    "abstract",
    "Current abstract (defaults to the session)",
    false,
);
const DESCRIPTION: InputField = InputField::text(
    "description",
    "Current description (defaults to the session)",
    false,
);
const FEEDBACK: InputField = InputField::text("feedback", "Feedback", true);
const ASSESSMENT: InputField =
    InputField::text("assessment", "Assessment (defaults to the session)", false);
const QUERY: InputField =
    InputField::text("query", "Search query (defaults to the problem)", false);
const SOURCE_MATERIAL: InputField = InputField::text(
    "source_material",
    "Source material (defaults to market data, then description)",
    false,
);
const ANALYSIS: InputField = InputField::text(
    "analysis",
    "Previous breadth and depth analysis (defaults to the session)",
    false,
);
const SUMMARY: InputField = InputField::text(
    "summary",
    "Problem summary (defaults to the session)",
    false,
);
const COMPLEXITY: InputField = InputField::slider("complexity", "Complexity", 0, 10, 5);
const URGENCY: InputField = InputField::slider("urgency", "Urgency", 0, 10, 5);
const IMPACT: InputField = InputField::slider("impact", "Impact", 0, 10, 5);
const FEASIBILITY: InputField = InputField::slider("feasibility", "Feasibility", 0, 10, 5);
const HORIZON: InputField = InputField::slider("horizon_years", "Horizon (years)", 1, 30, 10);
const REPORT_PATH: InputField = InputField {
    name: "path",
    label: "Report file",
    kind: InputKind::Path,
    required: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    SparkClassify,
    BuildClassify,
    ExtractProblem,
    GenerateTitle,
    CheckTitle,
    UpdateTitle,
    GenerateAbstract,
    UpdateAbstract,
    GenerateAssumptions,
    GenerateDescription,
    GenerateConstraints,
    GenerateRisks,
    AssessProblemType,
    ExplainAssessment,
    VisualizeSliders,
    AccessDataSources,
    SummarizeKeyFindings,
    UpdateDescription,
    AnalyzeBreadthDepth,
    UpdateBreadthDepth,
    FutureScenarios,
    FunctionMap,
    ApplyTriz,
    ProblemSummary,
    RecommendExperts,
    VisualMap,
    DownloadAnalysis,
    ShareAnalysis,
}

impl MenuAction {
    pub const ALL: [MenuAction; 28] = [
        MenuAction::SparkClassify,
        MenuAction::BuildClassify,
        MenuAction::ExtractProblem,
        MenuAction::GenerateTitle,
        MenuAction::CheckTitle,
        MenuAction::UpdateTitle,
        MenuAction::GenerateAbstract,
        MenuAction::UpdateAbstract,
        MenuAction::GenerateAssumptions,
        MenuAction::GenerateDescription,
        MenuAction::GenerateConstraints,
        MenuAction::GenerateRisks,
        MenuAction::AssessProblemType,
        MenuAction::ExplainAssessment,
        MenuAction::VisualizeSliders,
        MenuAction::AccessDataSources,
        MenuAction::SummarizeKeyFindings,
        MenuAction::UpdateDescription,
        MenuAction::AnalyzeBreadthDepth,
        MenuAction::UpdateBreadthDepth,
        MenuAction::FutureScenarios,
        MenuAction::FunctionMap,
        MenuAction::ApplyTriz,
        MenuAction::ProblemSummary,
        MenuAction::RecommendExperts,
        MenuAction::VisualMap,
        MenuAction::DownloadAnalysis,
        MenuAction::ShareAnalysis,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::SparkClassify | MenuAction::BuildClassify => "Classify",
            MenuAction::ExtractProblem => "Extract Problem",
            MenuAction::GenerateTitle => "Generate Title",
            MenuAction::CheckTitle => "Check Title",
            MenuAction::UpdateTitle => "Update Title",
            MenuAction::GenerateAbstract => "Generate Abstract",
            MenuAction::UpdateAbstract => "Update Abstract",
            MenuAction::GenerateAssumptions => "Generate Assumptions",
            MenuAction::GenerateDescription => "Generate Problem Description",
            MenuAction::GenerateConstraints => "Generate Constraints",
            MenuAction::GenerateRisks => "Generate Risks",
            MenuAction::AssessProblemType => "Assess Problem Type",
            MenuAction::ExplainAssessment => "Explain Problem Type Assessment",
            MenuAction::VisualizeSliders => "Visualize Sliders",
            MenuAction::AccessDataSources => "Access Data Sources",
            MenuAction::SummarizeKeyFindings => "Summarize Key Findings",
            MenuAction::UpdateDescription => "Update Problem Description",
            MenuAction::AnalyzeBreadthDepth => "Analyze Problem Breadth and Depth",
            MenuAction::UpdateBreadthDepth => "Update Breadth and Depth",
            MenuAction::FutureScenarios => "Generate Future Scenarios",
            MenuAction::FunctionMap => "Create Function Map",
            MenuAction::ApplyTriz => "Apply TRIZ Principle",
            MenuAction::ProblemSummary => "Generate Problem Summary",
            MenuAction::RecommendExperts => "Recommend Experts",
            MenuAction::VisualMap => "Create Visual Map",
            MenuAction::DownloadAnalysis => "Download Analysis",
            MenuAction::ShareAnalysis => "Share Analysis",
        }
    }

    pub fn page(self) -> Page {
        match self {
            MenuAction::SparkClassify => Page::SparkBlocks,
            MenuAction::BuildClassify => Page::BuildBlocks,
            _ => Page::Conversation,
        }
    }

    pub fn inputs(self) -> &'static [InputField] {
        match self {
            MenuAction::SparkClassify | MenuAction::BuildClassify => &[PROBLEM_REQUIRED],
            MenuAction::GenerateTitle => &[GOAL],
            MenuAction::CheckTitle => &[TITLE],
            MenuAction::UpdateTitle => &[TITLE, FEEDBACK],
            MenuAction::GenerateAbstract => &[TITLE, PROBLEM],
            MenuAction::UpdateAbstract => &[ABSTRACT, FEEDBACK],
            MenuAction::ExplainAssessment => &[PROBLEM, ASSESSMENT],
            MenuAction::VisualizeSliders => &[PROBLEM, COMPLEXITY, URGENCY, IMPACT, FEASIBILITY],
            MenuAction::AccessDataSources => &[PROBLEM, QUERY],
            MenuAction::SummarizeKeyFindings => &[PROBLEM, SOURCE_MATERIAL],
            MenuAction::UpdateDescription => &[DESCRIPTION, FEEDBACK],
            MenuAction::UpdateBreadthDepth => &[PROBLEM, ANALYSIS, FEEDBACK],
            MenuAction::FutureScenarios => &[PROBLEM, HORIZON],
            MenuAction::ProblemSummary => &[],
            MenuAction::VisualMap => &[PROBLEM, SUMMARY],
            MenuAction::DownloadAnalysis => &[REPORT_PATH],
            MenuAction::ShareAnalysis => &[],
            MenuAction::ExtractProblem
            | MenuAction::GenerateAssumptions
            | MenuAction::GenerateDescription
            | MenuAction::GenerateConstraints
            | MenuAction::GenerateRisks
            | MenuAction::AssessProblemType
            | MenuAction::AnalyzeBreadthDepth
            | MenuAction::FunctionMap
            | MenuAction::ApplyTriz
            | MenuAction::RecommendExperts => &[PROBLEM],
        }
    }

    pub fn input(self, name: &str) -> Option<&'static InputField> {
        self.inputs().iter().find(|field| field.name == name)
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.page(), self.label())
    }
}

/// Resolves a label (case-insensitive). Labels shared across pages need `page`.
pub fn find(page: Option<Page>, label: &str) -> Result<MenuAction> {
    let wanted = label.trim();
    let matches: Vec<MenuAction> = MenuAction::ALL
        .into_iter()
        .filter(|action| page.map_or(true, |p| action.page() == p))
        .filter(|action| action.label().eq_ignore_ascii_case(wanted))
        .collect();

    match matches.as_slice() {
        [action] => Ok(*action),
        [] => Err(KreatError::Input(match page {
            Some(page) => format!("no action named '{wanted}' on page {page}"),
            None => format!("no action named '{wanted}'"),
        })),
        many => Err(KreatError::Input(format!(
            "'{wanted}' exists on several pages ({}); pass --page",
            many.iter()
                .map(|action| action.page().label())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Raw values collected by the presentation layer, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    values: BTreeMap<String, String>,
}

impl ActionInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Parses `name=value` pairs; the value may itself contain `=`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inputs = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| KreatError::Input(format!("expected name=value, got '{pair}'")))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(KreatError::Input(format!("input name missing in '{pair}'")));
            }
            inputs.values.insert(name.to_string(), value.to_string());
        }
        Ok(inputs)
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Integer slider value, defaulted and range-checked.
    pub fn slider(&self, field: &InputField) -> Result<i64> {
        let InputKind::Slider { min, max, default } = field.kind else {
            return Err(KreatError::Runtime(format!("{} is not a slider", field.name)));
        };
        let Some(raw) = self.text(field.name) else {
            return Ok(default);
        };
        let value: i64 = raw.parse().map_err(|_| {
            KreatError::Input(format!("{} must be a whole number, got '{raw}'", field.label))
        })?;
        if !(min..=max).contains(&value) {
            return Err(KreatError::Input(format!(
                "{} must be between {min} and {max}, got {value}",
                field.label
            )));
        }
        Ok(value)
    }

    /// Rejects names the action does not declare, so typos surface early.
    pub fn check_declared(&self, action: MenuAction) -> Result<()> {
        for name in self.values.keys() {
            if action.input(name).is_none() {
                let known = action
                    .inputs()
                    .iter()
                    .map(|field| field.name)
                    .collect::<Vec<_>>();
                let accepted = if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                };
                return Err(KreatError::Input(format!(
                    "{action} does not take input '{name}' (accepted: {accepted})"
                )));
            }
        }
        Ok(())
    }
}
