//! scicat-ingest: stage, upload and fetch datasets in a SciCat catalog.
//!
//! A dataset is staged locally as a [`dataset::DatasetStage`]: a catalog
//! record, its scientific metadata and an ordered list of files. Uploading
//! copies the files to their storage location and registers the record and
//! its file manifest. Fetching rebuilds a stage from the catalog.
//!
//! # Modules
//!
//! - [`model`]: Catalog record and datablock types
//! - [`file`]: Single data files and their metadata
//! - [`dataset`]: The staging area and its lifecycle
//! - [`catalog`]: Catalog gateway trait and the SciCat HTTP client
//! - [`transfer`]: File transfer agents
//! - [`upload`]: The two-phase upload with rollback
//! - [`error`]: Error types for scicat-ingest operations

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod file;
pub mod logging;
pub mod model;
pub mod transfer;
pub mod upload;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};

use catalog::ScicatClient;
use dataset::{DatasetStage, FinalizeOptions};
use model::DatasetId;
use transfer::{FileTransfer, LocalCopyTransfer};

pub use error::IngestError;

/// The scicat-ingest CLI application.
#[derive(Parser)]
#[command(name = "scicat-ingest")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Upload local files as a new dataset.
    Upload(UploadArgs),
    /// Show a dataset and its files from the catalog.
    Fetch(FetchArgs),
}

/// Catalog connection settings, shared by all subcommands that talk to SciCat.
#[derive(clap::Args)]
struct CatalogArgs {
    /// Base URL of the SciCat API (e.g. http://localhost:3000/api/v3).
    #[arg(long, env = "SCICAT_URL")]
    url: Option<String>,

    /// Access token. Takes precedence over username and password.
    #[arg(long, env = "SCICAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Username for a functional account login.
    #[arg(long, env = "SCICAT_USERNAME")]
    username: Option<String>,

    /// Password for a functional account login.
    #[arg(long, env = "SCICAT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Timeout for each catalog request, in seconds.
    #[arg(long, env = "SCICAT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

/// Arguments for the upload subcommand.
#[derive(clap::Args)]
struct UploadArgs {
    /// Files or directories to upload. Directories are added recursively.
    files: Vec<PathBuf>,

    /// YAML or JSON file with dataset fields (owner, ownerGroup, ...).
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Override a dataset field. Values are parsed as JSON, falling back to a string.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_field)]
    fields: Vec<(String, Value)>,

    /// Directory inside the dataset under which files are stored.
    #[arg(long, default_value = "")]
    relative_to: String,

    /// Root directory into which files are copied, one sub directory per dataset.
    #[arg(long)]
    target_root: PathBuf,

    /// Compute SHA-256 checksums for all files.
    #[arg(long)]
    checksum: bool,

    /// Print the record and datablock that would be uploaded, without uploading.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    catalog: CatalogArgs,
}

/// Arguments for the fetch subcommand.
#[derive(clap::Args)]
struct FetchArgs {
    /// PID of the dataset.
    pid: String,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the scicat-ingest CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), IngestError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Upload(args)) => run_upload(args),
        Some(Commands::Fetch(args)) => run_fetch(args),
        None => {
            println!("scicat-ingest {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Stage, upload and fetch datasets in a SciCat catalog.");
            println!();
            println!("Run 'scicat-ingest --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the upload subcommand.
fn run_upload(args: UploadArgs) -> Result<(), IngestError> {
    let mut fields = match &args.dataset {
        Some(path) => model::io_json::read_dataset_fields(path)?,
        None => Map::new(),
    };
    fields.extend(args.fields);

    let mut stage = DatasetStage::from_fields(None, fields)?;
    for path in &args.files {
        if path.is_dir() {
            let added = stage.add_local_dir(path, &args.relative_to)?;
            tracing::info!(dir = %path.display(), files = added, "added directory");
        } else {
            stage.add_local_files([path], &args.relative_to)?;
        }
    }
    if args.checksum {
        stage.compute_checksums()?;
    }

    if args.dry_run {
        let id = DatasetId::generate();
        let planned = LocalCopyTransfer::planned(&args.target_root, &id)?;
        let options = FinalizeOptions::new().target_folder(planned.remote_base_path());
        let finalized = stage.finalize_as(id, &options)?;
        let report = json!({
            "dataset": finalized.record(),
            "datablock": finalized.manifest(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let client = connect(&args.catalog)?;
    let root = args.target_root;
    let factory = |id: &DatasetId| LocalCopyTransfer::for_dataset(&root, id);
    let uploaded = stage.upload(&client, &factory)?;

    if let Some(pid) = &uploaded.record().pid {
        println!("{pid}");
    }
    Ok(())
}

/// Execute the fetch subcommand.
fn run_fetch(args: FetchArgs) -> Result<(), IngestError> {
    let client = connect(&args.catalog)?;
    let stage = DatasetStage::fetch(&client, &DatasetId::from(args.pid))?;
    let remote_paths: Vec<String> = stage
        .files()
        .iter()
        .filter_map(|file| file.remote_access_path())
        .collect();

    match args.output {
        OutputFormat::Json => {
            let report = json!({
                "dataset": stage.record(),
                "datablock": stage.manifest(),
                "files": remote_paths,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let record = stage.record();
            if let Some(pid) = &record.pid {
                println!("pid:           {pid}");
            }
            if let Some(name) = &record.dataset_name {
                println!("name:          {name}");
            }
            println!("owner:         {}", record.owner);
            println!("source folder: {}", record.source_folder);
            if let Some(size) = record.size() {
                println!("size:          {size}");
            }
            println!("files:");
            for path in remote_paths {
                println!("  {path}");
            }
        }
    }
    Ok(())
}

/// Builds an authenticated client from the connection settings.
fn connect(args: &CatalogArgs) -> Result<ScicatClient, IngestError> {
    let url = args.url.as_deref().ok_or_else(|| {
        IngestError::Precondition("no catalog URL given (use --url or SCICAT_URL)".to_string())
    })?;
    let builder = ScicatClient::builder(url).timeout(Duration::from_secs(args.timeout_secs));

    match (&args.token, &args.username, &args.password) {
        (Some(token), _, _) => builder.with_token(token.as_str()),
        (None, Some(username), Some(password)) => builder.login(username, password),
        _ => Err(IngestError::Precondition(
            "no catalog credentials given (use --token, or --username and --password)"
                .to_string(),
        )),
    }
}

/// Parses a `key=value` override. The value is JSON if it parses, else a string.
fn parse_field(input: &str) -> Result<(String, Value), String> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{input}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
