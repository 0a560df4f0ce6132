//! Memory dump analysis client

mod cases;
mod config;
mod constants;
mod logger;
mod render;
mod upload;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::file_utils::DEFAULT_PRIORITY;
use common::StatusFilter;
use config::ClientConfig;
use constants::DEFAULT_WATCH_INTERVAL_SECS;
use log::info;
use repository::CaseRepository;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use transport::HttpTransport;
use workflow::DEFAULT_ITEMS_PER_PAGE;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Submit memory dumps for analysis and follow their cases")]
struct Cli {
    /// Server URL (default: MEMFLOW_SERVER_URL env var, or http://127.0.0.1:5000)
    #[arg(short, long, global = true)]
    server: Option<String>,
    /// Request timeout in seconds (default: MEMFLOW_TIMEOUT_SECS env var, or none)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a memory dump and create a case
    Upload {
        /// Dump file (.raw, .mem, .vmem or .bin)
        #[arg(short, long)]
        file: PathBuf,
        /// Case name
        #[arg(short, long)]
        name: String,
        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
        /// Priority from 1 to 10
        #[arg(short, long, default_value_t = DEFAULT_PRIORITY)]
        priority: u8,
    },
    /// List cases one page at a time
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_ITEMS_PER_PAGE)]
        limit: u32,
        /// all, queued, processing, completed or failed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Filter the fetched page by name or id
        #[arg(long)]
        search: Option<String>,
    },
    /// Show case details
    Show { case_id: String },
    /// Show processing status and progress
    Status { case_id: String },
    /// Show the analysis report
    Report {
        case_id: String,
        /// Write the report JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Poll the status until the case completes or fails
    Watch {
        case_id: String,
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.server, cli.timeout_secs)?;
    let transport = HttpTransport::new(config.transport_config())
        .context("Failed to initialise HTTP client")?;
    info!("Using analysis server at {}", transport.base_url());
    let repository = Arc::new(CaseRepository::new(Arc::new(transport)));

    match cli.command {
        Commands::Upload {
            file,
            name,
            description,
            priority,
        } => {
            upload::upload_case(
                repository,
                config.max_upload_bytes,
                upload::UploadArgs {
                    file: &file,
                    name: &name,
                    description: description.as_deref(),
                    priority,
                },
            )
            .await?;
        }
        Commands::List {
            page,
            limit,
            status,
            search,
        } => {
            cases::list_cases(
                repository,
                cases::ListArgs {
                    page,
                    limit,
                    status,
                    search: search.as_deref(),
                },
            )
            .await?;
        }
        Commands::Show { case_id } => cases::show_case(repository, &case_id).await?,
        Commands::Status { case_id } => cases::show_status(repository, &case_id).await?,
        Commands::Report { case_id, output } => {
            cases::show_report(repository, &case_id, output.as_deref()).await?;
        }
        Commands::Watch {
            case_id,
            interval_secs,
        } => {
            cases::watch_case(repository, &case_id, Duration::from_secs(interval_secs)).await?;
        }
    }

    Ok(())
}
