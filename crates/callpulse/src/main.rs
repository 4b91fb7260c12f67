use callpulse::state::{ConversationRegistry, ConversationStore};
use callpulse::utils::tracing::init_logging;
use common::configuration::{AnalysisSettings, Configuration};
use common::consts::{AGENT_LINE_PREFIX, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, REPORT_FORMAT_ENV};
use common::errors::AnalysisError;
use common::labels::Speaker;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

enum ReportFormat {
    Text,
    Json,
    Rows,
}

impl ReportFormat {
    fn from_env() -> Self {
        match env::var(REPORT_FORMAT_ENV).as_deref() {
            Ok("json") => ReportFormat::Json,
            Ok("rows") => ReportFormat::Rows,
            _ => ReportFormat::Text,
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn load_configuration(path: &str) -> Result<Configuration, BoxError> {
    if !Path::new(path).exists() {
        eprintln!("no configuration at {}, using defaults", path);
        return Ok(Configuration::default());
    }
    eprintln!("loading configuration from {}", path);
    Ok(Configuration::load(path)?)
}

/// Rejected lines are logged and skipped so the final report still prints;
/// any other error ends the run.
fn skip_invalid_input<T>(
    result: Result<T, AnalysisError>,
    speaker: Speaker,
) -> Result<Option<T>, AnalysisError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::InvalidInput(reason)) => {
            warn!(%speaker, reason = %reason, "skipping message");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // config is read before logging so the configured level applies
    let config_path =
        env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_configuration(&config_path)?;

    init_logging(config.log_level());
    let settings = AnalysisSettings::try_from(&config)?;
    info!(
        path = %config_path,
        escalation_threshold = settings.escalation_threshold,
        "configuration loaded"
    );

    let store: Arc<dyn ConversationStore> = Arc::new(ConversationRegistry::new(settings));
    let id = store.start().await;
    let report_format = ReportFormat::from_env();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(agent_text) = line.strip_prefix(AGENT_LINE_PREFIX) {
            let recorded = store.ingest(id, agent_text.trim(), Speaker::Agent).await;
            skip_invalid_input(recorded.map(|_| ()), Speaker::Agent)?;
            continue;
        }

        let turn = store.respond(id, line).await;
        if let Some(outcome) = skip_invalid_input(turn, Speaker::User)? {
            println!("{}", serde_json::to_string(&outcome)?);
        }
    }

    let rows = store.export_rows(id).await?;
    let summary = store.close(id).await?;
    match report_format {
        ReportFormat::Text => println!("{}", summary.render_text_report()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        ReportFormat::Rows => {
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callpulse::conversation::ConversationAnalyzer;

    fn rejecting_analyzer() -> ConversationAnalyzer {
        ConversationAnalyzer::new(&AnalysisSettings {
            reject_blank_messages: true,
            response_seed: Some(9),
            ..AnalysisSettings::default()
        })
    }

    #[test]
    fn test_blank_agent_line_is_skipped() {
        let mut analyzer = rejecting_analyzer();
        let recorded = analyzer.ingest("", Speaker::Agent).map(|_| ());
        assert!(matches!(
            skip_invalid_input(recorded, Speaker::Agent),
            Ok(None)
        ));
        // the conversation can still be closed and reported
        assert_eq!(analyzer.close().unwrap().total_messages, 0);
    }

    #[test]
    fn test_blank_user_line_is_skipped() {
        let mut analyzer = rejecting_analyzer();
        let turn = analyzer.respond("   ");
        assert!(matches!(skip_invalid_input(turn, Speaker::User), Ok(None)));

        let turn = analyzer.respond("My package is late");
        assert!(matches!(
            skip_invalid_input(turn, Speaker::User),
            Ok(Some(_))
        ));
    }

    #[test]
    fn test_invalid_state_still_aborts() {
        let mut analyzer = rejecting_analyzer();
        analyzer.close().unwrap();
        let recorded = analyzer.ingest("hello", Speaker::Agent).map(|_| ());
        assert!(matches!(
            skip_invalid_input(recorded, Speaker::Agent),
            Err(AnalysisError::InvalidState(_))
        ));
    }
}
