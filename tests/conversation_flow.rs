mod common;

use std::sync::Arc;

use common::{document, QueueLlmProvider, StaticSearchProvider};
use kreat::error::KreatError;
use kreat::menu::{find, ActionInputs, MenuAction, Page};
use kreat::render::OutputBlock;
use kreat::services::conversation::{ConversationService, MarketSearch};
use kreat::session::Session;

fn service(llm: &Arc<QueueLlmProvider>) -> ConversationService {
    ConversationService::new(llm.clone())
}

#[tokio::test]
async fn generate_title_extracts_then_titles_and_updates_session() {
    let llm = Arc::new(QueueLlmProvider::new([
        "Who: commuters. What: congestion.",
        "Cutting Peak-Hour Congestion for City Commuters",
    ]));
    let goal = "Urban traffic congestion wastes 54 hours per commuter per year";
    let mut session = Session::default();

    let output = service(&llm)
        .run(
            MenuAction::GenerateTitle,
            &ActionInputs::new().with("goal", goal),
            &mut session,
        )
        .await
        .expect("generate title");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains(goal));
    assert!(prompts[1].contains("Who: commuters. What: congestion."));
    assert_eq!(
        output.blocks,
        vec![OutputBlock::Markdown(
            "Cutting Peak-Hour Congestion for City Commuters".to_string()
        )]
    );
    assert_eq!(session.problem.as_deref(), Some(goal));
    assert_eq!(
        session.extracted_problem.as_deref(),
        Some("Who: commuters. What: congestion.")
    );
    assert_eq!(
        session.title.as_deref(),
        Some("Cutting Peak-Hour Congestion for City Commuters")
    );
}

#[tokio::test]
async fn classify_requires_a_problem_statement() {
    let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
    let action = find(Some(Page::SparkBlocks), "Classify").expect("action");
    let err = service(&llm)
        .run(
            action,
            &ActionInputs::new().with("problem", "  "),
            &mut Session::default(),
        )
        .await
        .expect_err("empty problem");
    match err {
        KreatError::Input(message) => assert_eq!(message, "Please enter a problem statement."),
        other => panic!("expected input error, got {other}"),
    }
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn classify_pages_use_their_own_prompt() {
    let llm = Arc::new(QueueLlmProvider::new(["spark reply", "build reply"]));
    let svc = service(&llm);
    let inputs = ActionInputs::new()
        .with("problem", "Farmers lose 30% of harvest");
    let mut session = Session::default();

    svc.run(MenuAction::SparkClassify, &inputs, &mut session)
        .await
        .expect("spark");
    svc.run(MenuAction::BuildClassify, &inputs, &mut session)
        .await
        .expect("build");

    let prompts = llm.prompts();
    assert_ne!(prompts[0], prompts[1]);
    assert!(prompts.iter().all(|p| p.contains("Farmers lose 30% of harvest")));
}

#[tokio::test]
async fn classify_with_a_new_problem_drops_the_old_extraction() {
    let llm = Arc::new(QueueLlmProvider::new([
        "classification",
        "extracted airports",
        "assumptions",
    ]));
    let svc = service(&llm);
    let mut session = Session {
        problem: Some("Old problem about rivers".to_string()),
        extracted_problem: Some("EXTRACTED OLD RIVERS".to_string()),
        ..Session::default()
    };

    let inputs = ActionInputs::new()
        .with("problem", "New problem about airports");
    svc.run(MenuAction::SparkClassify, &inputs, &mut session)
        .await
        .expect("classify");
    svc.run(
        MenuAction::GenerateAssumptions,
        &ActionInputs::new(),
        &mut session,
    )
    .await
    .expect("assumptions");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("New problem about airports"));
    assert!(prompts[2].contains("extracted airports"));
    assert!(prompts.iter().all(|p| !p.contains("EXTRACTED OLD RIVERS")));
    assert_eq!(
        session.problem.as_deref(),
        Some("New problem about airports")
    );
    assert_eq!(session.assumptions.as_deref(), Some("assumptions"));
}

#[tokio::test]
async fn assess_problem_type_produces_a_complete_table() {
    let reply = "Here you go.\n\
        PROBLEM_TYPE: \"Complex\"\n\
        COMPLEXITY_SCORE: \"8\"\n\
        NOVELTY_SCORE: \"6\"\n\
        URGENCY_SCORE: \"9\"\n\
        IMPACT_SCORE: \"7\"\n\
        RATIONALE: \"Many actors: cities, drivers\"\n\
        and transit agencies.";
    let llm = Arc::new(QueueLlmProvider::new([reply]));
    let mut session = Session {
        problem: Some("Traffic congestion".to_string()),
        ..Session::default()
    };

    let output = service(&llm)
        .run(
            MenuAction::AssessProblemType,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect("assess");

    assert!(output.warnings().is_empty());
    let rows = output.find_table("Problem Type Assessment").expect("table");
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], ("PROBLEM_TYPE".to_string(), "Complex".to_string()));
    assert_eq!(
        rows[5].1,
        "Many actors: cities, drivers and transit agencies."
    );
    assert_eq!(llm.options()[0].temperature, Some(0.2));
    assert!(session
        .assessment
        .as_deref()
        .unwrap_or_default()
        .contains("URGENCY_SCORE: 9"));
}

#[tokio::test]
async fn unparseable_assessment_is_not_kept_for_explanation() {
    let llm = Arc::new(QueueLlmProvider::new(["I cannot classify this."]));
    let svc = service(&llm);
    let mut session = Session {
        problem: Some("Traffic congestion".to_string()),
        ..Session::default()
    };

    let output = svc
        .run(
            MenuAction::AssessProblemType,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect("unparseable replies are not fatal");
    assert_eq!(output.warnings().len(), 6);
    assert_eq!(session.assessment, None);

    let err = svc
        .run(
            MenuAction::ExplainAssessment,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect_err("no assessment to explain");
    assert!(matches!(err, KreatError::Input(_)), "got {err}");
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn partial_reply_keeps_table_and_warns_per_missing_field() {
    let llm = Arc::new(QueueLlmProvider::new([
        "KEY_FINDINGS: \"Sensors are cheap\"\nOPPORTUNITIES: \"Municipal pilots\"",
    ]));
    let mut session = Session {
        problem: Some("Basement flooding".to_string()),
        description: Some("Homes flood every spring.".to_string()),
        ..Session::default()
    };

    let output = service(&llm)
        .run(
            MenuAction::SummarizeKeyFindings,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect("partial replies are not fatal");

    assert_eq!(
        output.warnings(),
        vec![
            "could not extract field GAPS",
            "could not extract field RECOMMENDATION",
        ]
    );
    let rows = output.find_table("Key Findings").expect("table");
    assert_eq!(rows[0].1, "Sensors are cheap");
    assert_eq!(rows[1].1, "");
    assert!(output
        .blocks
        .iter()
        .any(|b| matches!(b, OutputBlock::Markdown(raw) if raw.contains("Municipal pilots"))));
    assert!(llm.prompts()[0].contains("Homes flood every spring."));
}

#[tokio::test]
async fn generate_abstract_extracts_on_the_fly_when_needed() {
    let llm = Arc::new(QueueLlmProvider::new(["extracted facts", "An abstract."]));
    let mut session = Session {
        problem: Some("Noise pollution near airports".to_string()),
        title: Some("Quieter Skies".to_string()),
        ..Session::default()
    };

    service(&llm)
        .run(
            MenuAction::GenerateAbstract,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect("abstract");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Quieter Skies"));
    assert!(prompts[1].contains("extracted facts"));
    assert_eq!(session.abstract_text.as_deref(), Some("An abstract."));
}

#[tokio::test]
async fn update_title_stores_the_new_title() {
    let llm = Arc::new(QueueLlmProvider::new([
        "Okay here's an updated Title:\nQuieter Skies for Airport Neighbours",
    ]));
    let mut session = Session {
        title: Some("Quieter Skies".to_string()),
        ..Session::default()
    };

    service(&llm)
        .run(
            MenuAction::UpdateTitle,
            &ActionInputs::new().with("feedback", "mention who benefits"),
            &mut session,
        )
        .await
        .expect("update");

    assert_eq!(
        session.title.as_deref(),
        Some("Quieter Skies for Airport Neighbours")
    );
    assert!(llm.prompts()[0].contains("mention who benefits"));
}

#[tokio::test]
async fn sliders_validate_range_before_calling_the_model() {
    let llm = Arc::new(QueueLlmProvider::new(["interpretation"]));
    let svc = service(&llm);
    let mut session = Session {
        problem: Some("Water scarcity".to_string()),
        ..Session::default()
    };

    let err = svc
        .run(
            MenuAction::VisualizeSliders,
            &ActionInputs::new().with("urgency", "12"),
            &mut session,
        )
        .await
        .expect_err("out of range");
    assert!(matches!(err, KreatError::Input(_)));
    assert!(llm.prompts().is_empty());

    let output = svc
        .run(
            MenuAction::VisualizeSliders,
            &ActionInputs::new().with("urgency", "9"),
            &mut session,
        )
        .await
        .expect("sliders");
    let rows = output.find_table("Problem Profile").expect("table");
    assert_eq!(rows.len(), 4);
    assert!(rows[1].1.starts_with(" 9/10"));
    assert!(llm.prompts()[0].contains("Urgency: 9"));
    assert!(llm.prompts()[0].contains("Complexity: 5"));
}

#[tokio::test]
async fn market_analysis_respects_word_guard_and_result_count() {
    let search = Arc::new(StaticSearchProvider::new(vec![
        document("first", 40),
        document("second", 40),
        document("third", 40),
    ]));
    let llm = Arc::new(QueueLlmProvider::new(["Market looks promising."]));
    let svc = service(&llm).with_market_search(MarketSearch {
        provider: search.clone(),
        num_results: 3,
        max_words: 60,
    });
    let mut session = Session::default();

    let output = svc
        .run(
            MenuAction::AccessDataSources,
            &ActionInputs::new().with("problem", "Flood sensors"),
            &mut session,
        )
        .await
        .expect("market analysis");

    assert_eq!(
        search.queries.lock().unwrap().as_slice(),
        &[("Flood sensors".to_string(), 3)]
    );
    let market_data = session.market_data.clone().expect("market data stored");
    assert!(market_data.split_whitespace().count() <= 60);
    assert!(market_data.contains("Title: first"));
    assert!(!market_data.contains("Title: second"));
    assert!(llm.prompts()[0].contains(&market_data));
    assert_eq!(output.find_table("Sources").map(|rows| rows.len()), Some(3));
}

#[tokio::test]
async fn unusable_search_results_clear_previous_market_data() {
    for docs in [Vec::new(), vec![document("huge", 500)]] {
        let search = Arc::new(StaticSearchProvider::new(docs));
        let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
        let svc = service(&llm).with_market_search(MarketSearch {
            provider: search,
            num_results: 3,
            max_words: 60,
        });
        let mut session = Session {
            problem: Some("Flood sensors for homes".to_string()),
            market_data: Some("old market data".to_string()),
            ..Session::default()
        };

        let output = svc
            .run(
                MenuAction::AccessDataSources,
                &ActionInputs::new(),
                &mut session,
            )
            .await
            .expect("warnings are not fatal");
        assert_eq!(output.warnings().len(), 1);
        assert_eq!(session.market_data, None);

        let err = svc
            .run(
                MenuAction::SummarizeKeyFindings,
                &ActionInputs::new(),
                &mut session,
            )
            .await
            .expect_err("stale market data must not be reused");
        assert!(matches!(err, KreatError::Input(_)), "got {err}");
        assert!(llm.prompts().is_empty());
    }
}

#[tokio::test]
async fn market_analysis_without_search_is_a_config_error() {
    let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
    let err = service(&llm)
        .run(
            MenuAction::AccessDataSources,
            &ActionInputs::new().with("problem", "anything"),
            &mut Session::default(),
        )
        .await
        .expect_err("no search provider");
    assert!(matches!(err, KreatError::Config(_)), "got {err}");
}

#[tokio::test]
async fn breadth_and_depth_draws_the_quadrant() {
    let llm = Arc::new(QueueLlmProvider::new([
        "BREADTH_SCORE: 8\nDEPTH_SCORE: 3\nBREADTH_FACTORS: many regions\nDEPTH_FACTORS: known fixes\nQUADRANT: \"Broad and Shallow\"",
    ]));
    let mut session = Session {
        problem: Some("Litter".to_string()),
        ..Session::default()
    };
    let output = service(&llm)
        .run(
            MenuAction::AnalyzeBreadthDepth,
            &ActionInputs::new(),
            &mut session,
        )
        .await
        .expect("breadth depth");

    let matrix = output
        .blocks
        .iter()
        .find_map(|block| match block {
            OutputBlock::Matrix { rows, .. } => Some(rows.clone()),
            _ => None,
        })
        .expect("matrix");
    assert_eq!(
        matrix[1],
        vec!["Broad".to_string(), "X".to_string(), String::new()]
    );
    assert!(session
        .breadth_depth
        .as_deref()
        .unwrap_or_default()
        .contains("QUADRANT: Broad and Shallow"));
}

#[tokio::test]
async fn download_analysis_writes_report_without_model_call() {
    let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("reports").join("analysis.md");
    let mut session = Session {
        problem: Some("Plastic in rivers".to_string()),
        title: Some("Cleaner Rivers".to_string()),
        risks: Some("Funding gaps".to_string()),
        ..Session::default()
    };

    let output = service(&llm)
        .run(
            MenuAction::DownloadAnalysis,
            &ActionInputs::new().with("path", path.to_string_lossy()),
            &mut session,
        )
        .await
        .expect("download");

    let report = std::fs::read_to_string(&path).expect("report written");
    assert!(report.starts_with("# Cleaner Rivers"));
    assert!(report.contains("## Risks\n\nFunding gaps"));
    assert!(llm.prompts().is_empty());
    assert!(matches!(&output.blocks[0], OutputBlock::Notice(text) if text.contains("analysis.md")));
}

#[tokio::test]
async fn share_analysis_of_empty_session_is_an_input_error() {
    let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
    let err = service(&llm)
        .run(
            MenuAction::ShareAnalysis,
            &ActionInputs::new(),
            &mut Session::default(),
        )
        .await
        .expect_err("empty session");
    assert!(matches!(err, KreatError::Input(_)));
}

#[tokio::test]
async fn undeclared_input_is_rejected() {
    let llm = Arc::new(QueueLlmProvider::new(["unused"]));
    let err = service(&llm)
        .run(
            MenuAction::CheckTitle,
            &ActionInputs::new().with("goal", "wrong field"),
            &mut Session::default(),
        )
        .await
        .expect_err("undeclared input");
    assert!(matches!(err, KreatError::Input(_)));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn problem_summary_needs_earlier_work_and_fills_gaps() {
    let llm = Arc::new(QueueLlmProvider::new(["A summary."]));
    let svc = service(&llm);

    let err = svc
        .run(
            MenuAction::ProblemSummary,
            &ActionInputs::new(),
            &mut Session::default(),
        )
        .await
        .expect_err("nothing to summarise");
    assert!(matches!(err, KreatError::Input(_)));

    let mut session = Session {
        title: Some("Cleaner Rivers".to_string()),
        ..Session::default()
    };
    svc.run(
        MenuAction::ProblemSummary,
        &ActionInputs::new(),
        &mut session,
    )
    .await
    .expect("summary");
    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("Cleaner Rivers"));
    assert!(prompt.contains("Not available yet."));
    assert_eq!(session.summary.as_deref(), Some("A summary."));
}
