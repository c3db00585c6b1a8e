use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Everything produced so far for one problem. Handlers read and update it
/// explicitly; the CLI can persist it between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub problem: Option<String>,
    pub extracted_problem: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub assumptions: Option<String>,
    pub constraints: Option<String>,
    pub risks: Option<String>,
    pub assessment: Option<String>,
    pub market_data: Option<String>,
    pub key_findings: Option<String>,
    pub breadth_depth: Option<String>,
    pub future_scenarios: Option<String>,
    pub function_map: Option<String>,
    pub triz_solution: Option<String>,
    pub experts: Option<String>,
    pub visual_map: Option<String>,
    pub summary: Option<String>,
}

pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Session {
    /// A missing file is an empty session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn problem(&self) -> Option<&str> {
        present(&self.problem)
    }

    /// Records the problem statement. A changed statement drops the extraction
    /// made from the previous one.
    pub fn set_problem(&mut self, problem: &str) {
        let problem = problem.trim();
        if self.problem() != Some(problem) {
            self.extracted_problem = None;
        }
        self.problem = Some(problem.to_string());
    }

    pub fn extracted_problem(&self) -> Option<&str> {
        present(&self.extracted_problem)
    }

    pub fn title(&self) -> Option<&str> {
        present(&self.title)
    }

    pub fn abstract_text(&self) -> Option<&str> {
        present(&self.abstract_text)
    }

    pub fn description(&self) -> Option<&str> {
        present(&self.description)
    }

    /// Report sections in reading order, skipping anything not produced yet.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Problem", &self.problem),
            ("Extracted Problem", &self.extracted_problem),
            ("Title", &self.title),
            ("Abstract", &self.abstract_text),
            ("Problem Description", &self.description),
            ("Assumptions", &self.assumptions),
            ("Constraints", &self.constraints),
            ("Risks", &self.risks),
            ("Problem Type Assessment", &self.assessment),
            ("Market Data", &self.market_data),
            ("Key Findings", &self.key_findings),
            ("Breadth and Depth", &self.breadth_depth),
            ("Future Scenarios", &self.future_scenarios),
            ("Function Map", &self.function_map),
            ("TRIZ Solution", &self.triz_solution),
            ("Recommended Experts", &self.experts),
            ("Visual Map", &self.visual_map),
            ("Problem Summary", &self.summary),
        ]
        .into_iter()
        .filter_map(|(heading, value)| present(value).map(|v| (heading, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }

    pub fn to_markdown_report(&self) -> String {
        let heading = self.title().unwrap_or("Kreat Analysis");
        let mut out = format!(
            "# {heading}\n\n_Generated {}_\n",
            Local::now().format("%Y-%m-%d %H:%M")
        );
        for (section, body) in self.sections() {
            out.push_str(&format!("\n## {section}\n\n{body}\n"));
        }
        out
    }
}
