use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use validate_claims::cli::{Cli, Command, ListArgs, MigrateArgs, ValidateArgs};
use validate_claims::config::Config;
use validate_claims::discovery::CorpusDiscovery;
use validate_claims::doi::{BatchVerifier, HttpDoiLookup, LookupConfig, RetryPolicy};
use validate_claims::migrate::DosageMigration;
use validate_claims::output::Output;
use validate_claims::schema_registry::SchemaRegistry;
use validate_claims::validator::{EngineConfig, RunMode, ValidationEngine};
use validate_claims::vocabulary::VocabularyRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    match cli.command {
        Command::Validate(args) => run_validate(args).await,
        Command::MigrateDosage(args) => run_migrate(args).await,
        Command::List(args) => run_list(args).await,
    }
}

async fn run_validate(args: ValidateArgs) -> Result<()> {
    let config = Config::resolve(&args).context("invalid configuration")?;

    let schemas = Arc::new(
        SchemaRegistry::load(&config.schema_dir()).context("failed to load schemas")?,
    );
    let vocabularies = Arc::new(
        VocabularyRegistry::load(&config.vocabulary_dir())
            .context("failed to load vocabularies")?,
    );

    let lookup = HttpDoiLookup::new(LookupConfig {
        endpoint: config.network.lookup_url.clone(),
        timeout_seconds: config.network.timeout_seconds,
        ..LookupConfig::default()
    })?;
    let policy = RetryPolicy {
        max_attempts: config.network.retry_attempts,
        base_delay: Duration::from_millis(config.network.retry_delay_ms),
        ..RetryPolicy::default()
    };
    let verifier =
        BatchVerifier::new(lookup, policy).with_batch_capacity(config.network.batch_size);

    let engine = ValidationEngine::new(
        schemas,
        vocabularies,
        verifier,
        EngineConfig {
            max_concurrent_files: args.thread_count(),
        },
    );

    let discovery = CorpusDiscovery::new(config.corpus.root.clone());
    let mode = if args.files.is_empty() {
        RunMode::Full
    } else {
        RunMode::Selective(args.files.clone())
    };

    let report = engine.run(mode, &discovery).await?;

    let output = Output::new(args.verbosity());
    print!("{}", output.format_report(&report));

    if !report.is_success() {
        process::exit(1);
    }
    Ok(())
}

async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let migration = DosageMigration::new(args.root);
    let files = if args.files.is_empty() {
        None
    } else {
        Some(args.files)
    };
    let stats = migration.run(files).await?;

    println!("Migration Summary:");
    println!("  Total files processed: {}", stats.total_files);
    println!("  Migrated: {}", stats.migrated_files);
    println!("  Skipped: {}", stats.skipped_files);
    println!("  Errors: {}", stats.error_files.len());
    for path in &stats.error_files {
        println!("    {}", path.display());
    }

    if !stats.error_files.is_empty() {
        process::exit(1);
    }
    Ok(())
}

async fn run_list(args: ListArgs) -> Result<()> {
    let discovery = CorpusDiscovery::new(args.root);
    for name in discovery.collections().await? {
        println!("{name}");
    }
    Ok(())
}
