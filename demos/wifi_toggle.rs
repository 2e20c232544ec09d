use std::sync::Arc;

use rusqa::{
    Orchestrator, RunOutcome,
    driver::MockDriver,
    judgment::{JudgmentStrategy, LlmJudgment, RuleBasedJudgment},
    multi_agent::run_all,
    shared::{QaConfig, ReportSink, RunHistory, TracingReportSink},
    ui::{ScreenSize, UiElement, UiSnapshot},
};
use tracing::{Level, info, warn};

fn settings_screen() -> UiSnapshot {
    UiSnapshot::new(
        vec![
            UiElement::with_text("Settings").id("android:id/title"),
            UiElement::with_text("WiFi").id("com.android.settings:id/wifi_pref"),
            UiElement::with_text("Bluetooth")
                .id("com.android.settings:id/bluetooth_pref")
                .bounds(0, 460, 1080, 560),
            UiElement::with_text("Toggle")
                .class("android.widget.Switch")
                .bounds(300, 100, 400, 150)
                .clickable(),
        ],
        ScreenSize::default(),
        "com.android.settings/.Settings",
    )
}

/// Uses an OpenAI-compatible endpoint when `RUSQA_LLM_URL` is set.
fn judgment() -> Arc<dyn JudgmentStrategy> {
    let Ok(url) = std::env::var("RUSQA_LLM_URL") else {
        return Arc::new(RuleBasedJudgment);
    };
    let key = std::env::var("RUSQA_LLM_KEY").unwrap_or_default();
    let model = std::env::var("RUSQA_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    match LlmJudgment::openai(&key, &url, &model) {
        Ok(llm) => Arc::new(llm),
        Err(e) => {
            warn!("falling back to rule-based judgment: {}", e);
            Arc::new(RuleBasedJudgment)
        }
    }
}

#[tokio::main]
async fn main() -> rusqa::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = match std::env::var("RUSQA_CONFIG") {
        Ok(path) => QaConfig::from_file(path)?,
        Err(_) => QaConfig {
            settle_time_ms: 100,
            ..QaConfig::default()
        },
    };
    let history = Arc::new(RunHistory::new());
    let sink: Arc<dyn ReportSink> = Arc::new(TracingReportSink);
    let judgment = judgment();

    let mut orchestrator = Orchestrator::standard(
        Box::new(MockDriver::new(settings_screen()).with_toggles()),
        judgment.clone(),
        history.clone(),
        config.clone(),
    )
    .with_sink(sink.clone());

    match orchestrator.run("Test turning WiFi on and off").await? {
        RunOutcome::Completed(report) => {
            for outcome in &report.report.outcomes {
                info!(
                    "step {}: {} ({:.2}) {}",
                    outcome.step_id, outcome.status, outcome.confidence, outcome.reason
                );
            }
            for improvement in &report.improvements {
                info!("suggestion [{:?}]: {}", improvement.priority, improvement.suggestion);
            }
        }
        RunOutcome::BudgetExhausted {
            iterations,
            last_message_type,
            ..
        } => warn!("run inconclusive after {} iterations ({})", iterations, last_message_type),
    }

    // a stuck toggle and a goal with no template, side by side
    let runs = vec![
        (
            Orchestrator::standard(
                Box::new(MockDriver::new(settings_screen())),
                judgment.clone(),
                history.clone(),
                config.clone(),
            )
            .with_sink(sink.clone()),
            "Test turning Bluetooth on and off".to_string(),
        ),
        (
            Orchestrator::standard(
                Box::new(MockDriver::new(settings_screen())),
                judgment,
                history.clone(),
                config,
            )
            .with_sink(sink.clone()),
            "Check the settings screen".to_string(),
        ),
    ];
    for (orchestrator, outcome) in run_all(runs).await {
        let label = outcome.map(|o| o.status_label()).unwrap_or_else(|e| e.to_string());
        info!("{} transitions, result {}", orchestrator.transitions().len(), label);
    }

    history.publish(sink.as_ref()).await?;
    Ok(())
}
