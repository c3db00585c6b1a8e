use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{KreatError, Result};
use crate::interfaces::providers::LlmProvider;
use crate::interfaces::search::{SearchDocument, SearchProvider};
use crate::menu::{ActionInputs, InputKind, MenuAction};
use crate::parsing::ParsedFields;
use crate::prompts::{title_guidelines, PromptVars, TemplateId};
use crate::render::{bar, ActionOutput};
use crate::services::market::compile_market_data;
use crate::services::pipeline::{FieldReply, Pipeline};
use crate::session::{present, Session};

const NOT_AVAILABLE: &str = "Not available yet.";
const NO_SOURCE_MATERIAL: &str =
    "No source material: run Access Data Sources or Generate Problem Description first.";

/// Search backend plus the limits applied to one market-analysis run.
#[derive(Clone)]
pub struct MarketSearch {
    pub provider: Arc<dyn SearchProvider>,
    pub num_results: usize,
    pub max_words: usize,
}

/// Runs menu actions against the explicit session.
#[derive(Clone)]
pub struct ConversationService {
    pipeline: Pipeline,
    market: Option<MarketSearch>,
}

fn input_error(message: &str) -> KreatError {
    KreatError::Input(message.to_string())
}

fn not_routed(action: MenuAction) -> KreatError {
    KreatError::Runtime(format!("no handler for {action}"))
}

fn store(slot: &mut Option<String>, value: &str) {
    *slot = Some(value.trim().to_string());
}

/// Keeps the parsed fields of a structured reply; a reply that matched no
/// expected key clears the slot.
fn store_fields(slot: &mut Option<String>, reply: &FieldReply) {
    let fields = &reply.fields;
    *slot = fields.any_present().then(|| fields_text(fields));
}

/// Drops a leading "Okay ...:" line the update prompts ask the model to emit.
fn strip_update_preamble(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some((first, rest)) = trimmed.split_once('\n') else {
        return trimmed;
    };
    let first = first.trim();
    if first.starts_with("Okay") && first.ends_with(':') {
        rest.trim()
    } else {
        trimmed
    }
}

fn fields_text(fields: &ParsedFields) -> String {
    fields
        .rows()
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_row(doc: &SearchDocument) -> (String, String) {
    let title = doc.title.clone().unwrap_or_else(|| "Untitled".to_string());
    (title, doc.url.clone())
}

/// 2x2 breadth/depth grid with the reported quadrant marked.
fn quadrant_matrix(output: ActionOutput, quadrant: &str) -> ActionOutput {
    let quadrant = quadrant.to_lowercase();
    let row = match (quadrant.contains("narrow"), quadrant.contains("broad")) {
        (true, false) => Some(0),
        (false, true) => Some(1),
        _ => None,
    };
    let column = match (quadrant.contains("shallow"), quadrant.contains("deep")) {
        (true, false) => Some(1),
        (false, true) => Some(2),
        _ => None,
    };
    let (Some(row), Some(column)) = (row, column) else {
        let message = format!("Quadrant '{quadrant}' not recognised; no matrix drawn.");
        return output.notice(message);
    };

    let mut rows = vec![
        vec!["Narrow".to_string(), String::new(), String::new()],
        vec!["Broad".to_string(), String::new(), String::new()],
    ];
    rows[row][column] = "X".to_string();
    output.matrix(
        "Breadth / Depth",
        vec![String::new(), "Shallow".to_string(), "Deep".to_string()],
        rows,
    )
}

impl ConversationService {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            pipeline: Pipeline::new(llm),
            market: None,
        }
    }

    pub fn with_market_search(mut self, market: MarketSearch) -> Self {
        self.market = Some(market);
        self
    }

    pub fn has_market_search(&self) -> bool {
        self.market.is_some()
    }

    pub async fn run(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        inputs.check_declared(action)?;
        info!(
            page = action.page().label(),
            action = action.label(),
            "running action"
        );

        match action {
            MenuAction::SparkClassify | MenuAction::BuildClassify => {
                self.classify(action, inputs, session).await
            }
            MenuAction::ExtractProblem => self.extract_problem(inputs, session).await,
            MenuAction::GenerateTitle => self.generate_title(inputs, session).await,
            MenuAction::CheckTitle => self.check_title(inputs, session).await,
            MenuAction::UpdateTitle => self.update_title(inputs, session).await,
            MenuAction::GenerateAbstract => self.generate_abstract(inputs, session).await,
            MenuAction::UpdateAbstract => self.update_abstract(inputs, session).await,
            MenuAction::GenerateAssumptions
            | MenuAction::GenerateDescription
            | MenuAction::GenerateConstraints
            | MenuAction::GenerateRisks => self.from_extracted(action, inputs, session).await,
            MenuAction::AssessProblemType => self.assess_problem_type(inputs, session).await,
            MenuAction::ExplainAssessment => self.explain_assessment(inputs, session).await,
            MenuAction::VisualizeSliders => self.visualize_sliders(action, inputs, session).await,
            MenuAction::AccessDataSources => self.access_data_sources(inputs, session).await,
            MenuAction::SummarizeKeyFindings => self.key_findings(inputs, session).await,
            MenuAction::UpdateDescription => self.update_description(inputs, session).await,
            MenuAction::AnalyzeBreadthDepth => self.breadth_depth(inputs, session).await,
            MenuAction::UpdateBreadthDepth => self.update_breadth_depth(inputs, session).await,
            MenuAction::FutureScenarios => self.future_scenarios(action, inputs, session).await,
            MenuAction::FunctionMap | MenuAction::ApplyTriz | MenuAction::RecommendExperts => {
                self.problem_fields(action, inputs, session).await
            }
            MenuAction::ProblemSummary => self.problem_summary(session).await,
            MenuAction::VisualMap => self.visual_map(inputs, session).await,
            MenuAction::DownloadAnalysis => download_analysis(inputs, session),
            MenuAction::ShareAnalysis => share_analysis(session),
        }
    }

    /// Problem from the inputs (recorded in the session) or from the session.
    fn problem(inputs: &ActionInputs, session: &mut Session) -> Result<String> {
        if let Some(problem) = inputs.text("problem") {
            session.set_problem(problem);
            return Ok(problem.to_string());
        }
        session
            .problem()
            .map(str::to_string)
            .ok_or_else(|| input_error("Please enter a problem statement."))
    }

    /// Extracted problem from the session, extracting on the fly when absent.
    async fn extracted_problem(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<String> {
        let problem = Self::problem(inputs, session)?;
        if let Some(extracted) = session.extracted_problem() {
            return Ok(extracted.to_string());
        }
        let extracted = self
            .pipeline
            .complete(
                TemplateId::ProblemExtraction,
                &PromptVars::new().with("problem", &problem),
            )
            .await?;
        store(&mut session.extracted_problem, &extracted);
        Ok(extracted)
    }

    async fn classify(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let template = match action {
            MenuAction::SparkClassify => TemplateId::SparkClassify,
            MenuAction::BuildClassify => TemplateId::BuildClassify,
            other => return Err(not_routed(other)),
        };
        let problem = inputs
            .text("problem")
            .ok_or_else(|| input_error("Please enter a problem statement."))?;
        session.set_problem(problem);
        let reply = self
            .pipeline
            .complete(template, &PromptVars::new().with("problem", problem))
            .await?;
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn extract_problem(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let extracted = self
            .pipeline
            .complete(
                TemplateId::ProblemExtraction,
                &PromptVars::new().with("problem", &problem),
            )
            .await?;
        store(&mut session.extracted_problem, &extracted);
        Ok(ActionOutput::new().markdown(extracted))
    }

    async fn generate_title(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let goal = inputs
            .text("goal")
            .ok_or_else(|| input_error("Please enter a goal."))?;
        let extracted = self
            .pipeline
            .complete(
                TemplateId::ProblemExtraction,
                &PromptVars::new().with("problem", goal),
            )
            .await?;
        let title = self
            .pipeline
            .complete(
                TemplateId::GenerateTitle,
                &PromptVars::new().with("extracted_problem", &extracted),
            )
            .await?;

        session.set_problem(goal);
        store(&mut session.extracted_problem, &extracted);
        store(&mut session.title, &title);
        Ok(ActionOutput::new().markdown(title))
    }

    fn title(inputs: &ActionInputs, session: &Session) -> Result<String> {
        inputs
            .text("title")
            .or(session.title())
            .map(str::to_string)
            .ok_or_else(|| input_error("Please enter a title or run Generate Title first."))
    }

    async fn check_title(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let title = Self::title(inputs, session)?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::CheckTitle,
                &PromptVars::new()
                    .with("title", &title)
                    .with("guidelines", title_guidelines()),
            )
            .await?;
        Ok(ActionOutput::new().markdown(reply))
    }

    fn feedback(inputs: &ActionInputs) -> Result<&str> {
        inputs
            .text("feedback")
            .ok_or_else(|| input_error("Please enter feedback."))
    }

    async fn update_title(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let title = Self::title(inputs, session)?;
        let feedback = Self::feedback(inputs)?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::UpdateTitle,
                &PromptVars::new()
                    .with("title", &title)
                    .with("feedback", feedback),
            )
            .await?;
        store(&mut session.title, strip_update_preamble(&reply));
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn generate_abstract(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let title = Self::title(inputs, session)?;
        let extracted = self.extracted_problem(inputs, session).await?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::GenerateAbstract,
                &PromptVars::new()
                    .with("title", &title)
                    .with("extracted_problem", &extracted),
            )
            .await?;
        store(&mut session.title, &title);
        store(&mut session.abstract_text, &reply);
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn update_abstract(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let current = inputs
            .text("abstract")
            .or(session.abstract_text())
            .map(str::to_string)
            .ok_or_else(|| input_error("Please enter the current abstract or generate one."))?;
        let feedback = Self::feedback(inputs)?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::UpdateAbstract,
                &PromptVars::new()
                    .with("abstract", &current)
                    .with("feedback", feedback),
            )
            .await?;
        store(&mut session.abstract_text, strip_update_preamble(&reply));
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn from_extracted(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let template = match action {
            MenuAction::GenerateAssumptions => TemplateId::GenerateAssumptions,
            MenuAction::GenerateDescription => TemplateId::GenerateDescription,
            MenuAction::GenerateConstraints => TemplateId::GenerateConstraints,
            MenuAction::GenerateRisks => TemplateId::GenerateRisks,
            other => return Err(not_routed(other)),
        };
        let extracted = self.extracted_problem(inputs, session).await?;
        let reply = self
            .pipeline
            .complete(
                template,
                &PromptVars::new().with("extracted_problem", &extracted),
            )
            .await?;
        let slot = match template {
            TemplateId::GenerateAssumptions => &mut session.assumptions,
            TemplateId::GenerateDescription => &mut session.description,
            TemplateId::GenerateConstraints => &mut session.constraints,
            _ => &mut session.risks,
        };
        store(slot, &reply);
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn assess_problem_type(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let reply = self
            .pipeline
            .complete_fields(
                TemplateId::AssessProblemType,
                &PromptVars::new().with("problem", &problem),
            )
            .await?;
        store_fields(&mut session.assessment, &reply);
        Ok(reply.to_output("Problem Type Assessment"))
    }

    async fn explain_assessment(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let assessment = inputs
            .text("assessment")
            .or(present(&session.assessment))
            .map(str::to_string)
            .ok_or_else(|| input_error("Please run Assess Problem Type or pass an assessment."))?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::ExplainAssessment,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("assessment", &assessment),
            )
            .await?;
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn visualize_sliders(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let mut vars = PromptVars::new().with("problem", &problem);
        let mut rows = Vec::new();
        for field in action.inputs() {
            let InputKind::Slider { min, max, .. } = field.kind else {
                continue;
            };
            let value = inputs.slider(field)?;
            vars.set(field.name, value);
            rows.push((
                field.label.to_string(),
                format!("{value:>2}/{max} {}", bar(value, min, max)),
            ));
        }
        let reply = self
            .pipeline
            .complete(TemplateId::InterpretSliders, &vars)
            .await?;
        Ok(ActionOutput::new()
            .table("Problem Profile", rows)
            .markdown(reply))
    }

    async fn access_data_sources(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let market = self.market.as_ref().ok_or_else(|| {
            KreatError::Config("market analysis needs an Exa API key (EXA_API_KEY)".to_string())
        })?;
        let problem = Self::problem(inputs, session)?;
        let query = inputs.text("query").unwrap_or(&problem).to_string();

        let limit = market.num_results;
        let docs = market.provider.search(&query, limit).await?;
        if docs.is_empty() {
            warn!(%query, "search returned no documents");
            session.market_data = None;
            let message = format!("No search results for '{query}'.");
            return Ok(ActionOutput::new().warning(message));
        }
        let sources: Vec<(String, String)> = docs.iter().map(source_row).collect();
        let market_data = compile_market_data(&docs, market.max_words);
        if market_data.is_empty() {
            session.market_data = None;
            let max_words = market.max_words;
            let message = format!(
                "Every search result exceeds the {max_words}-word limit; nothing to analyse."
            );
            let output = ActionOutput::new().table("Sources", sources);
            return Ok(output.warning(message));
        }
        store(&mut session.market_data, &market_data);

        let analysis = self
            .pipeline
            .complete(
                TemplateId::MarketAnalysis,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("market_data", &market_data),
            )
            .await?;
        Ok(ActionOutput::new()
            .table("Sources", sources)
            .markdown(analysis))
    }

    async fn key_findings(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let source = inputs
            .text("source_material")
            .or(present(&session.market_data))
            .or(session.description())
            .map(str::to_string)
            .ok_or_else(|| input_error(NO_SOURCE_MATERIAL))?;
        let reply = self
            .pipeline
            .complete_fields(
                TemplateId::KeyFindings,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("source_material", &source),
            )
            .await?;
        store_fields(&mut session.key_findings, &reply);
        Ok(reply.to_output("Key Findings"))
    }

    async fn update_description(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let current = inputs
            .text("description")
            .or(session.description())
            .map(str::to_string)
            .ok_or_else(|| input_error("Please enter the current description or generate one."))?;
        let feedback = Self::feedback(inputs)?;
        let reply = self
            .pipeline
            .complete(
                TemplateId::UpdateDescription,
                &PromptVars::new()
                    .with("description", &current)
                    .with("feedback", feedback),
            )
            .await?;
        store(&mut session.description, strip_update_preamble(&reply));
        Ok(ActionOutput::new().markdown(reply))
    }

    fn breadth_depth_output(reply: &FieldReply, session: &mut Session) -> ActionOutput {
        store_fields(&mut session.breadth_depth, reply);
        let output = reply.to_output("Breadth and Depth");
        if reply.fields.is_present("QUADRANT") {
            quadrant_matrix(output, reply.fields.get("QUADRANT"))
        } else {
            output
        }
    }

    async fn breadth_depth(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let reply = self
            .pipeline
            .complete_fields(
                TemplateId::BreadthDepth,
                &PromptVars::new().with("problem", &problem),
            )
            .await?;
        Ok(Self::breadth_depth_output(&reply, session))
    }

    async fn update_breadth_depth(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let analysis = inputs
            .text("analysis")
            .or(present(&session.breadth_depth))
            .map(str::to_string)
            .ok_or_else(|| input_error("Please analyze breadth and depth or pass an analysis."))?;
        let feedback = Self::feedback(inputs)?;
        let reply = self
            .pipeline
            .complete_fields(
                TemplateId::UpdateBreadthDepth,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("analysis", &analysis)
                    .with("feedback", feedback),
            )
            .await?;
        Ok(Self::breadth_depth_output(&reply, session))
    }

    async fn future_scenarios(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let horizon = match action.input("horizon_years") {
            Some(field) => inputs.slider(field)?,
            None => return Err(not_routed(action)),
        };
        let reply = self
            .pipeline
            .complete_fields(
                TemplateId::FutureScenarios,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("horizon_years", horizon),
            )
            .await?;
        store_fields(&mut session.future_scenarios, &reply);
        Ok(reply.to_output(&format!("Future Scenarios ({horizon} years)")))
    }

    async fn problem_fields(
        &self,
        action: MenuAction,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let (template, title) = match action {
            MenuAction::FunctionMap => (TemplateId::FunctionMap, "Function Map"),
            MenuAction::ApplyTriz => (TemplateId::TrizPrinciple, "TRIZ Principle"),
            MenuAction::RecommendExperts => (TemplateId::RecommendExperts, "Recommended Experts"),
            other => return Err(not_routed(other)),
        };
        let problem = Self::problem(inputs, session)?;
        let reply = self
            .pipeline
            .complete_fields(template, &PromptVars::new().with("problem", &problem))
            .await?;
        let slot = match template {
            TemplateId::FunctionMap => &mut session.function_map,
            TemplateId::TrizPrinciple => &mut session.triz_solution,
            _ => &mut session.experts,
        };
        store_fields(slot, &reply);
        Ok(reply.to_output(title))
    }

    async fn problem_summary(&self, session: &mut Session) -> Result<ActionOutput> {
        let has_core = session.title().is_some()
            || session.abstract_text().is_some()
            || session.description().is_some();
        if !has_core {
            return Err(input_error(
                "Nothing to summarise yet; generate a title, abstract or description first.",
            ));
        }
        let or_na = |value: &Option<String>| present(value).unwrap_or(NOT_AVAILABLE).to_string();
        let vars = PromptVars::new()
            .with("title", or_na(&session.title))
            .with("abstract", or_na(&session.abstract_text))
            .with("description", or_na(&session.description))
            .with("insights", or_na(&session.key_findings))
            .with("future_scenarios", or_na(&session.future_scenarios))
            .with("function_map", or_na(&session.function_map))
            .with("triz_solution", or_na(&session.triz_solution));
        let reply = self
            .pipeline
            .complete(TemplateId::ProblemSummary, &vars)
            .await?;
        store(&mut session.summary, &reply);
        Ok(ActionOutput::new().markdown(reply))
    }

    async fn visual_map(
        &self,
        inputs: &ActionInputs,
        session: &mut Session,
    ) -> Result<ActionOutput> {
        let problem = Self::problem(inputs, session)?;
        let summary = inputs
            .text("summary")
            .or(present(&session.summary))
            .unwrap_or(NOT_AVAILABLE)
            .to_string();
        let reply = self
            .pipeline
            .complete(
                TemplateId::VisualMap,
                &PromptVars::new()
                    .with("problem", &problem)
                    .with("summary", &summary),
            )
            .await?;
        store(&mut session.visual_map, &reply);
        Ok(ActionOutput::new().markdown(reply))
    }
}

fn report(session: &Session) -> Result<String> {
    if session.is_empty() {
        return Err(input_error("The session is empty; run some actions first."));
    }
    Ok(session.to_markdown_report())
}

fn download_analysis(inputs: &ActionInputs, session: &Session) -> Result<ActionOutput> {
    let path = inputs
        .text("path")
        .ok_or_else(|| input_error("Please enter a file path for the report."))?;
    let report = report(session)?;
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report)?;
    info!(path = %path.display(), "analysis written");
    Ok(ActionOutput::new().notice(format!("Analysis written to {}", path.display())))
}

fn share_analysis(session: &Session) -> Result<ActionOutput> {
    let report = report(session)?;
    Ok(ActionOutput::new()
        .notice("Copy the report below to share it.")
        .markdown(report))
}
