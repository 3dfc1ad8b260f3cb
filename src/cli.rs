use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::analysis::SummaryEngine;
use crate::model::{ApplicationSelection, ExitReason, SessionEvent, SessionView};
use crate::profiles::{Profile, ProfileType};
use crate::runner::ProcessRunner;
use crate::session::SessionController;
use crate::storage::FilePrefsStore;
use crate::text_summary::build_text_summary;
use crate::trace::DirTraceLoader;

/// Profile variant selectable from the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProfileArg {
    #[value(name = "3g")]
    ThreeG,
    Lte,
}

impl From<ProfileArg> for ProfileType {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::ThreeG => ProfileType::ThreeG,
            ProfileArg::Lte => ProfileType::Lte,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "trace-workbench",
    version,
    about = "Analyze captured device network traces under a selectable network profile"
)]
pub struct Cli {
    /// Trace directory to open (collector output)
    #[arg(long, value_name = "DIR", conflicts_with = "capture")]
    pub trace: Option<PathBuf>,

    /// Raw capture file to open (.cap/.pcap)
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Force a profile variant instead of the reconciled/persisted one
    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Restrict analysis to this application (repeatable)
    #[arg(long = "app", value_name = "NAME")]
    pub apps: Vec<String>,

    /// Print the resulting session view as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Resolve the PID of a running process by name and exit
    #[arg(long, value_name = "NAME")]
    pub resolve_pid: Option<String>,

    /// Run a diagnostic shell command, print its combined output, and exit
    #[arg(long, value_name = "CMDLINE")]
    pub run_command: Option<String>,

    /// Timeout for diagnostic command execution (default: none)
    #[arg(long)]
    pub command_timeout: Option<humantime::Duration>,
}

pub async fn run(args: Cli) -> Result<()> {
    let runner = match args.command_timeout {
        Some(timeout) => ProcessRunner::with_timeout(timeout.into()),
        None => ProcessRunner::new(),
    };

    if let Some(name) = args.resolve_pid.as_deref() {
        let pid = runner
            .resolve_process_id(name)
            .await
            .with_context(|| format!("could not resolve a PID for {name}"))?;
        println!("{pid}");
        return Ok(());
    }

    if let Some(command_line) = args.run_command.as_deref() {
        let result = runner.run(command_line).await;
        print!("{}", result.combined_output());
        return match result.exit_reason {
            ExitReason::Completed => Ok(()),
            ExitReason::IoFailure => bail!("command could not be launched"),
            ExitReason::Interrupted => bail!("command was interrupted"),
        };
    }

    if args.trace.is_none() && args.capture.is_none() {
        bail!("nothing to do: pass --trace, --capture, --resolve-pid, or --run-command");
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let controller = SessionController::new(
        DirTraceLoader::new(),
        SummaryEngine::new(),
        FilePrefsStore::default_location(),
        event_tx,
    );

    let missing = if let Some(dir) = args.trace.as_deref() {
        controller
            .open_trace(dir)
            .await
            .with_context(|| format!("failed to open trace {}", dir.display()))?
    } else if let Some(file) = args.capture.as_deref() {
        controller
            .open_capture(file)
            .await
            .with_context(|| format!("failed to open capture {}", file.display()))?
    } else {
        unreachable!("argument validation above")
    };
    for name in &missing {
        eprintln!("warning: trace is missing {name}");
    }

    if !args.apps.is_empty() {
        let selections: Vec<ApplicationSelection> = args
            .apps
            .iter()
            .map(ApplicationSelection::selected)
            .collect();
        controller
            .set_application_filters(selections)
            .await
            .context("failed to apply application filters")?;
    }

    if let Some(forced) = args.profile {
        controller
            .set_profile(Profile::default_for(forced.into()))
            .await
            .context("failed to apply forced profile")?;
    }

    // Render from the notifier channel: the last published view is what a
    // host application would be showing.
    let mut last_view: Option<SessionView> = None;
    while let Ok(event) = event_rx.try_recv() {
        if let SessionEvent::SessionChanged { view } = event {
            last_view = Some(*view);
        }
    }
    let view = last_view.unwrap_or_else(|| controller.snapshot());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for line in build_text_summary(&view).lines {
            println!("{line}");
        }
    }
    Ok(())
}
