use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cost_sentinel::aws::{
    caller_account_id, load_sdk_config, AwsInventory, AwsPriceCatalog, CloudWatchMetrics,
};
use cost_sentinel::config::{init_config, Config};
use cost_sentinel::exit_codes::exit_code_for_anyhow;
use cost_sentinel::retry::ExponentialBackoffPolicy;
use cost_sentinel::types::Diagnostic;
use cost_sentinel::{run_scan, Providers, ScanReport, ScannerKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cost-sentinel")]
#[command(
    about = "Find idle and forgotten AWS resources and estimate what they cost",
    long_about = "cost-sentinel scans one AWS region for resources that are running but unused.\n\nScanners:\n  - ec2: running instances with low average CPU\n  - ebs: unattached or low I/O volumes\n  - rds: idle database instances and old manual snapshots\n  - s3:  buckets with few or no requests\n\nEach finding carries an estimated monthly cost from the AWS Price List API,\nfalling back to built-in on-demand rates."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the account and report potential savings
    Scan {
        /// AWS region to scan
        #[arg(short, long, env = "AWS_REGION")]
        region: Option<String>,
        /// Lookback window in days for every scanner
        #[arg(short, long)]
        days: Option<u32>,
        /// Run only these scanners (repeatable)
        #[arg(short, long, value_enum)]
        scanner: Vec<ScannerKind>,
        /// Use built-in prices only
        #[arg(long)]
        no_pricing_api: bool,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        output_file: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".cost-sentinel.toml")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn scan(config: &Config, use_pricing_api: bool) -> Result<ScanReport> {
    let sdk_config = load_sdk_config(&config.region).await;
    let retry = ExponentialBackoffPolicy::new(config.retry.max_attempts);

    let mut diagnostics = Vec::new();
    let account_id = match caller_account_id(&sdk_config).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Could not resolve account id: {}", e);
            diagnostics.push(Diagnostic::new("sts:get_caller_identity", e.to_string()));
            None
        }
    };

    let mut providers = Providers::new(
        Arc::new(AwsInventory::new(sdk_config.clone(), retry.clone())),
        Arc::new(CloudWatchMetrics::new(
            sdk_config.clone(),
            &config.region,
            retry.clone(),
        )),
    );
    if use_pricing_api {
        providers = providers.with_catalog(Arc::new(AwsPriceCatalog::new(&sdk_config, retry)));
    }
    providers.account_id = account_id;
    providers.diagnostics = diagnostics;

    Ok(run_scan(config, providers).await?)
}

fn write_report(report: &ScanReport, format: OutputFormat, file: Option<&PathBuf>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Text => report.render_text(),
    };
    match file {
        Some(path) => {
            let plain = console::strip_ansi_codes(&rendered);
            std::fs::write(path, plain.as_bytes())
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            region,
            days,
            scanner,
            no_pricing_api,
            output,
            output_file,
        } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(region) = region {
                config.region = region;
            }
            if let Some(days) = days {
                config.set_days(days);
            }
            if !scanner.is_empty() {
                config.select_scanners(&scanner);
            }
            if no_pricing_api {
                config.prefer_online_pricing = false;
            }
            config.validate()?;

            let report = scan(&config, config.prefer_online_pricing).await?;
            write_report(&report, output, output_file.as_ref())?;
        }
        Commands::Init { output } => {
            init_config(&output)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
}
