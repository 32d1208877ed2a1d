//! Challenge Evidence CLI
//!
//! Command-line front-end for daily challenge evidence:
//! - Log in / out against the auth service
//! - Check today's submission status for a challenge
//! - Submit photo evidence from a given position
//! - Browse evidence history and success rates

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use challenge_evidence::api::{ApiClient, ApiError, EvidenceRecord, EvidenceRegistry};
use challenge_evidence::config::ClientConfig;
use challenge_evidence::device::{CachedGeolocation, CapturedImage, FixedGeolocation, HttpImageStore};
use challenge_evidence::error::EvidenceError;
use challenge_evidence::evidence::{
    EvidenceStatistics, EvidenceWorkflow, SubmissionLedger, SystemClock, WorkflowDeps, WorkflowState,
};
use challenge_evidence::session::{Session, SessionStore};
use challenge_evidence::utils::{init_tracing, truncate};
use geo_core::GeoPosition;

// ──────────────────────────────────────────────────────────────────────────────
// COMMAND LINE
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "challenge-evidence", version, about = "Submit and review daily challenge evidence")]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EVIDENCE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show today's submission status for a challenge
    Status { challenge_id: i64 },
    /// Submit today's evidence for a challenge
    Submit(SubmitArgs),
    /// List your evidence, optionally for one challenge
    Evidences {
        #[arg(long)]
        challenge: Option<i64>,
    },
    /// Show one evidence record
    Evidence { evidence_id: i64 },
    /// Success rates over your evidence history
    Stats {
        /// Compute from the raw records instead of asking the server
        #[arg(long)]
        local: bool,
    },
    /// Check that the evidence service is up
    Health,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    challenge_id: i64,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
    /// URL of an already hosted image
    #[arg(long, conflicts_with = "image_file", required_unless_present = "image_file")]
    image_url: Option<String>,
    /// Local image to upload first
    #[arg(long)]
    image_file: Option<PathBuf>,
    #[arg(long)]
    description: Option<String>,
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let store = SessionStore::new(config.session_file.clone());

    let result = run(cli.command, &config, &store).await;

    if let Err(e) = &result {
        if let Some(ApiError::Unauthorized) = api_error(e) {
            warn!("Session rejected by server, clearing {}", store.path().display());
            store.clear().await?;
        }
    }
    result
}

fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.downcast_ref::<ApiError>().or_else(|| match err.downcast_ref::<EvidenceError>() {
        Some(EvidenceError::NetworkOrServer(api)) => Some(api),
        _ => None,
    })
}

async fn authenticated(config: &ClientConfig, store: &SessionStore) -> Result<ApiClient> {
    let session: Session = store
        .load()
        .await?
        .ok_or_else(|| anyhow!("Not logged in. Run `challenge-evidence login` first."))?;
    Ok(ApiClient::new(config)?.with_session(session))
}

async fn run(command: Command, config: &ClientConfig, store: &SessionStore) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let client = ApiClient::new(config)?;
            let session = client.login(&email, &password).await?;
            store.save(&session).await?;
            println!("✅ Logged in as {}", session.user_email);
        }
        Command::Logout => {
            store.clear().await?;
            println!("👋 Logged out");
        }
        Command::Status { challenge_id } => {
            let client = authenticated(config, store).await?;
            let mut workflow = EvidenceWorkflow::new(deps(config, &client, None), config.geolocation);
            let state = workflow.enter(challenge_id).await?.clone();

            println!("Challenge {}: {}", challenge_id, workflow.message());
            if let Some(location) = workflow.challenge_location() {
                println!(
                    "📍 {} ({}, {}) within {}m",
                    location.location_name, location.latitude, location.longitude,
                    location.tolerance_radius_meters
                );
            }
            if !workflow.gate().submission_window().is_empty() {
                println!("🕒 Window: {}", workflow.gate().submission_window());
            }
            if let WorkflowState::Failed(e) = state {
                return Err(e.into());
            }
        }
        Command::Submit(args) => submit(args, config, store).await?,
        Command::Evidences { challenge } => {
            let client = authenticated(config, store).await?;
            let records = match challenge {
                Some(id) => client.evidences_by_challenge(id).await?,
                None => client.my_evidences().await?,
            };
            if records.is_empty() {
                println!("No evidence yet.");
            }
            for record in &records {
                print_record_line(record);
            }
        }
        Command::Evidence { evidence_id } => {
            let client = authenticated(config, store).await?;
            let record = client.evidence_by_id(evidence_id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("Status: {}", record.status());
        }
        Command::Stats { local } => {
            let client = authenticated(config, store).await?;
            if local {
                let records = client.my_evidences().await?;
                let stats = EvidenceStatistics::from_records(&records);
                println!("Total evidence: {}", stats.total_evidences);
                println!("  AI validated:       {} ({}%)", stats.ai_validated, stats.success_rates.ai);
                println!("  Location valid:     {} ({}%)", stats.location_valid, stats.success_rates.location);
                println!("  Fully valid:        {} ({}%)", stats.both_valid, stats.success_rates.overall);
                println!("  Approved/Partial/Rejected: {}/{}/{}", stats.approved, stats.partial, stats.rejected);
            } else {
                let response = client.my_stats().await?;
                let s = &response.statistics;
                println!("Stats for {}", response.user_name);
                println!("  AI validated:   {} ({}%) - {}", s.ai_validated, s.success_rates.ai, response.interpretation.ai);
                println!("  Location valid: {} ({}%) - {}", s.location_valid, s.success_rates.location, response.interpretation.location);
                println!("  Fully valid:    {} ({}%) - {}", s.both_valid, s.success_rates.overall, response.interpretation.overall);
            }
        }
        Command::Health => {
            let client = ApiClient::new(config)?;
            let body = client.health().await?;
            println!("{}", body);
        }
    }
    Ok(())
}

fn deps(config: &ClientConfig, client: &ApiClient, position: Option<GeoPosition>) -> WorkflowDeps {
    let device = match position {
        Some(p) => FixedGeolocation::new(p),
        None => FixedGeolocation::unavailable(),
    };
    let mut images = HttpImageStore::new(client.http().clone(), config.upload_url.clone());
    if let Some(session) = client.session() {
        images = images.with_token(session.token.clone());
    }
    let client = Arc::new(client.clone());

    WorkflowDeps {
        registry: client.clone(),
        directory: client,
        geolocation: Arc::new(CachedGeolocation::new(Arc::new(device))),
        images: Arc::new(images),
        ledger: SubmissionLedger::new(),
        clock: Arc::new(SystemClock),
    }
}

async fn submit(args: SubmitArgs, config: &ClientConfig, store: &SessionStore) -> Result<()> {
    let client = authenticated(config, store).await?;
    let position = GeoPosition::new(args.lat, args.lon)?;
    let image = match (args.image_url, args.image_file) {
        (Some(url), _) => CapturedImage::hosted(url),
        (None, Some(path)) => CapturedImage::from_file(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide --image-url or --image-file"),
    };

    let mut workflow = EvidenceWorkflow::new(deps(config, &client, Some(position)), config.geolocation);
    info!("Starting evidence workflow {}", workflow.id());

    if workflow.enter(args.challenge_id).await?.is_terminal() {
        return finish(&workflow);
    }
    workflow.select_image(image)?;
    if let Some(description) = args.description {
        workflow.set_description(description);
    }
    if workflow.acquire_location().await?.is_terminal() {
        return finish(&workflow);
    }
    workflow.submit().await?;
    finish(&workflow)
}

fn finish(workflow: &EvidenceWorkflow) -> Result<()> {
    match workflow.state() {
        WorkflowState::Submitted(receipt) => {
            println!("✅ {}", workflow.message());
            println!(
                "   Location: {:.0}m within {:.0}m | AI: {} | Location check: {}",
                receipt.local_check.distance_meters,
                receipt.local_check.tolerance_radius_meters,
                if receipt.validation.ai_validated { "passed" } else { "failed" },
                if receipt.validation.location_valid { "passed" } else { "failed" },
            );
            if let Some(next) = &receipt.next_submission {
                println!("   Next submission: {}", next);
            }
            Ok(())
        }
        WorkflowState::Closed(_) => {
            println!("⏸  {}", workflow.message());
            Ok(())
        }
        WorkflowState::Rejected(e) | WorkflowState::Failed(e) => {
            println!("❌ {}", workflow.message());
            if e.is_retryable() {
                println!("   You can try again.");
            }
            Err(e.clone().into())
        }
        other => Err(anyhow!("Workflow stopped in state {}", other.name())),
    }
}

fn print_record_line(record: &EvidenceRecord) {
    println!(
        "#{:<6} challenge {:<5} {:<9} {}  {}",
        record.id,
        record.challenge_id,
        record.status().to_string(),
        record.submitted_at.format("%Y-%m-%d %H:%M"),
        truncate(record.description.as_deref().unwrap_or(""), 50),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "challenge-evidence", "submit", "7", "--lat", "-12.0464", "--lon", "-77.0428",
            "--image-url", "https://cdn.test/a.jpg",
        ])
        .unwrap();
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.challenge_id, 7);
        assert_eq!(args.lat, -12.0464);
        assert_eq!(args.lon, -77.0428);
        assert_eq!(args.image_url.as_deref(), Some("https://cdn.test/a.jpg"));
    }

    #[test]
    fn test_submit_needs_exactly_one_image_source() {
        let base = ["challenge-evidence", "submit", "7", "--lat", "1", "--lon", "2"];
        assert!(Cli::try_parse_from(base).is_err());

        let both = [&base[..], &["--image-url", "u", "--image-file", "f.jpg"]].concat();
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn test_stats_local_flag() {
        let cli = Cli::try_parse_from(["challenge-evidence", "-v", "stats", "--local"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Stats { local: true }));
    }
}
