///
/// This module implements the CLI interface for bucket-sync: command parsing,
/// argument validation and the async entrypoint shared by `main` and the integration tests.
///
/// All business logic (reconciliation, credential derivation, branch lookup) lives in
/// the [`bucket-sync-core`] crate. This module only wires configuration, HTTP clients
/// and output together.
///
/// ## Features
/// - Entry struct [`Cli`] with the `buckets` and `keys` subcommands.
/// - Async entrypoint ([`run`]) for programmatic invocation and integration testing.
/// - Structured tracing at CLI level; formatted output goes to stdout only.
///
/// [`bucket-sync-core`]: ../../bucket-sync-core/
use crate::load_config::load_config;
use crate::output::{encode_output, OutputFormat, OutputNames};
use crate::platform::PlatformClient;
use crate::storage::StorageClient;
use anyhow::{Context, Result};
use bucket_sync_core::branch::resolve_branch;
use bucket_sync_core::credentials::{
    default_expiry, fetch_signing_secret, generate_credentials, sign_token, SERVICE_ROLE,
};
use bucket_sync_core::reconcile::{upsert_buckets, BucketFilter};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

/// Lifetime of the service key minted for a `buckets` run.
const STORAGE_TOKEN_TTL: Duration = Duration::hours(1);

/// CLI for bucket-sync: reconcile storage buckets and print branch credentials.
#[derive(Parser)]
#[clap(
    name = "bucket-sync",
    version,
    about = "Reconcile storage buckets and derive deterministic branch credentials"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create missing storage buckets and update the properties of existing ones
    Buckets {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Project ref; overrides SUPABASE_PROJECT_ID and the config file
        #[clap(long)]
        project_ref: Option<String>,
        /// Remote bucket id to leave untouched (repeatable)
        #[clap(long = "exclude", value_name = "BUCKET_ID")]
        exclude: Vec<String>,
    },
    /// Print the database host, password and API keys for the current git branch
    Keys {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Project ref; overrides SUPABASE_PROJECT_ID and the config file
        #[clap(long)]
        project_ref: Option<String>,
        /// Output format
        #[clap(long, short = 'o', value_enum, default_value_t = OutputFormat::Env)]
        output: OutputFormat,
        /// Rename an output key, e.g. `db.host=DATABASE_HOST` (repeatable)
        #[clap(long = "override-name", value_name = "KEY=NAME")]
        override_name: Vec<String>,
        /// Directory used to look up the git branch (defaults to the current directory)
        #[clap(long)]
        workdir: Option<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Buckets {
            config,
            project_ref,
            exclude,
        } => {
            let config = load_config(config)?;
            let project_ref = config.resolve_project_ref(project_ref)?;
            let desired = config.bucket_config();
            tracing::info!(command = "buckets", project_ref = %project_ref, buckets = desired.len(), "Starting bucket reconciliation");

            let platform = PlatformClient::new_from_env(&config.api_url, config.request_timeout())
                .map_err(anyhow::Error::msg)?;
            let jwt_secret = fetch_signing_secret(&platform, &project_ref).await?;
            let service_key = sign_token(
                project_ref.as_str(),
                SERVICE_ROLE,
                OffsetDateTime::now_utc() + STORAGE_TOKEN_TTL,
                &jwt_secret,
            )?;
            let storage = StorageClient::new(
                config.storage_url(&project_ref),
                service_key,
                config.request_timeout(),
            )
            .map_err(anyhow::Error::msg)?;

            let not_excluded = move |bucket_id: &str| !exclude.iter().any(|id| id == bucket_id);
            let filters: [&BucketFilter; 1] = [&not_excluded];

            match upsert_buckets(&storage, &desired, &filters).await {
                Ok(report) => {
                    eprintln!("Finished reconciling storage buckets: {}", report.summary());
                    tracing::info!(command = "buckets", ?report, "Reconciliation complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "buckets", error = %e, "Reconciliation failed");
                    Err(anyhow::Error::new(e).context("Failed to reconcile storage buckets"))
                }
            }
        }
        Commands::Keys {
            config,
            project_ref,
            output,
            override_name,
            workdir,
        } => {
            let config = load_config(config)?;
            let project_ref = config.resolve_project_ref(project_ref)?;
            let names = OutputNames::default().with_overrides(&override_name)?;
            let workdir = match workdir {
                Some(dir) => dir,
                None => std::env::current_dir().context("Cannot determine current directory")?,
            };
            let branch = resolve_branch(&workdir);
            tracing::info!(command = "keys", project_ref = %project_ref, branch = %branch, "Generating branch credentials");

            let platform = PlatformClient::new_from_env(&config.api_url, config.request_timeout())
                .map_err(anyhow::Error::msg)?;
            let expiry = default_expiry(OffsetDateTime::now_utc())?;
            let creds = generate_credentials(
                &platform,
                &project_ref,
                &branch,
                &config.platform_domain,
                expiry,
            )
            .await?;

            let entries = names.entries(&creds)?;
            let stdout = std::io::stdout();
            encode_output(output, &mut stdout.lock(), &entries)?;
            tracing::info!(command = "keys", "Credentials written");
            Ok(())
        }
    }
}
