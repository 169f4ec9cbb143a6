mod cli;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use smarttraffic::config::FlowConfig;
use smarttraffic::service::{DocumentClient, DocumentService, OfflineService, SelectedDocument};
use smarttraffic::session::{FlowSession, SessionSettings};
use smarttraffic::ui::{self, CallProgress};
use smarttraffic::workflow::validation::missing_required;
use smarttraffic::workflow::{ResultSource, Step, WorkflowState};

// Smallest valid PNG header, enough for the offline backend.
const DEMO_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = FlowConfig::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Command::Run {
            file,
            set,
            state_out,
        } => {
            let client = DocumentClient::new(&config.api_base_url, config.request_timeout())?;
            let mut session = FlowSession::new(client, SessionSettings::from(&config));
            session.select_file(&file)?;
            walk(session, &set, state_out.as_deref()).await
        }
        Command::Ping => ping(&config).await,
        Command::Demo { fine } => {
            let mut session = FlowSession::new(OfflineService, SessionSettings::from(&config));
            session.select_document(SelectedDocument {
                file_name: "demo-ticket.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: DEMO_PNG.to_vec(),
            })?;
            walk(session, &[("fineAmount".to_string(), fine)], None).await
        }
        Command::Inspect { path } => inspect(&path),
    }
}

// Logs go to stderr; stdout is reserved for the step rendering.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Drive a session with a selected file from upload through export.
async fn walk<S: DocumentService>(
    mut session: FlowSession<S>,
    edits: &[(String, String)],
    state_out: Option<&Path>,
) -> Result<()> {
    ui::render_progress(session.state());

    let progress = CallProgress::start("Uploading document...");
    if let Err(e) = session.submit_upload().await {
        progress.fail("Upload failed");
        return Err(e.into());
    }
    progress.succeed("Document uploaded");

    for (field, value) in edits {
        session.edit_field(field.clone(), value.clone());
    }
    ui::render_fields(session.state());
    if !session.next() {
        save(&session, state_out)?;
        let missing = missing_required(&session.state().step_data().ocr.extracted_fields);
        bail!(
            "cannot continue, required fields missing: {} (use --set FIELD=VALUE)",
            missing.join(", ")
        );
    }

    let progress = CallProgress::start("Analyzing report...");
    match session.run_analysis().await {
        Ok(ResultSource::Service) => progress.succeed("Analysis complete"),
        Ok(ResultSource::Fallback) => {
            progress.fail("Analysis failed, continuing with a placeholder result");
            session.next();
        }
        Err(e) => {
            progress.fail("Analysis could not start");
            save(&session, state_out)?;
            return Err(e.into());
        }
    }

    ui::render_progress(session.state());
    ui::render_results(session.state());

    session.next();
    let path = session.export_report()?;
    println!();
    println!("Report written to {}", path.display());
    save(&session, state_out)
}

fn save<S: DocumentService>(session: &FlowSession<S>, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        session
            .save_state(path)
            .with_context(|| format!("failed to save state to {}", path.display()))?;
    }
    Ok(())
}

async fn ping(config: &FlowConfig) -> Result<()> {
    let client = DocumentClient::new(&config.api_base_url, config.request_timeout())?;
    let progress = CallProgress::start(&format!("Contacting {}", client.base_url()));
    match client.test_connection().await {
        Ok(payload) => {
            progress.succeed("Backend reachable");
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(e) => {
            progress.fail("Backend unreachable");
            Err(e).context("connection test failed")
        }
    }
}

fn inspect(path: &Path) -> Result<()> {
    let state = WorkflowState::load(path)
        .with_context(|| format!("failed to load state from {}", path.display()))?;
    ui::render_progress(&state);
    if state.step() >= Step::Edit {
        ui::render_fields(&state);
    }
    if state.step_data().analysis.results.is_some() {
        ui::render_results(&state);
    }
    if let Some(url) = &state.step_data().pdf.download_url {
        println!();
        println!("Exported report: {url}");
    }
    Ok(())
}
