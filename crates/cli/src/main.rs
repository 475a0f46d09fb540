mod backend;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rendezvous_core::{Publisher, VerdictPoller};
use rendezvous_plugin::{
    AnalysisRun, DistributedAnalysisProvider, Measurement, Metric, MetricProvider, PluginConfig,
    PLUGIN_NAME,
};
use rendezvous_store::{RecordKey, StoreConnector};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use backend::Backend;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Cross-cluster analysis verdict handshake.
#[derive(Parser)]
#[command(
    name = "rendezvous",
    version,
    about = "Cross-cluster analysis verdict handshake"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct HandshakeArgs {
    /// Path to the plugin configuration JSON (bare block or whole metric)
    #[arg(long)]
    config: PathBuf,
    /// Analysis run UID identifying this attempt
    #[arg(long)]
    run_id: String,
    /// Use a process-local in-memory store instead of DynamoDB
    #[arg(long)]
    memory: bool,
    /// Verdict to pre-seed in the in-memory store
    #[arg(long, requires = "memory")]
    verdict: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish, wait for the verdict, and print the measurement
    Run(HandshakeArgs),

    /// Publish the coordination record and exit
    Publish(HandshakeArgs),

    /// Wait for the verdict on a published record and print it
    Await(HandshakeArgs),

    /// Print the metadata reported for a configuration
    Metadata {
        /// Path to the plugin configuration JSON
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let msg = format!("failed to create tokio runtime: {}", e);
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Run(args) => runtime.block_on(cmd_run(&args, cli.output, cli.quiet)),
        Commands::Publish(args) => runtime.block_on(cmd_publish(&args, cli.output, cli.quiet)),
        Commands::Await(args) => runtime.block_on(cmd_await(&args, cli.output, cli.quiet)),
        Commands::Metadata { config } => cmd_metadata(&config, cli.output, cli.quiet),
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides
/// the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: &Path, output: OutputFormat, quiet: bool) -> PluginConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match PluginConfig::from_json(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            let msg = format!("error in config '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Wrap `cfg` in a metric the way the host would hand it over.
fn plugin_metric(cfg: &PluginConfig, output: OutputFormat, quiet: bool) -> Metric {
    let block = match serde_json::to_value(cfg) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let mut metric = Metric::named("rendezvous");
    metric.provider.plugin.insert(PLUGIN_NAME.to_string(), block);
    metric
}

/// Play the external actor in `--memory` mode.
fn seed_verdict(backend: &Backend, cfg: &PluginConfig, args: &HandshakeArgs) {
    if let (Some(store), Some(verdict)) = (backend.memory(), args.verdict.as_deref()) {
        let key = RecordKey::new(args.run_id.clone(), &cfg.cluster_id);
        store.set_verdict(&key, Some(verdict));
    }
}

async fn cmd_run(args: &HandshakeArgs, output: OutputFormat, quiet: bool) {
    let cfg = load_config(&args.config, output, quiet);
    let backend = Backend::select(args.memory);
    seed_verdict(&backend, &cfg, args);

    let metric = plugin_metric(&cfg, output, quiet);
    let run = AnalysisRun {
        uid: args.run_id.clone(),
        ..AnalysisRun::default()
    };
    let measurement = DistributedAnalysisProvider::new(backend)
        .run(&run, &metric)
        .await;

    print_measurement(&measurement, output);
    if !measurement.is_successful() {
        process::exit(1);
    }
}

fn print_measurement(measurement: &Measurement, output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            if let Some(phase) = measurement.phase {
                println!("phase: {:?}", phase);
            }
            if !measurement.value.is_empty() {
                println!("value: {}", measurement.value);
            }
            if !measurement.message.is_empty() {
                println!("message: {}", measurement.message);
            }
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(measurement)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

async fn cmd_publish(args: &HandshakeArgs, output: OutputFormat, quiet: bool) {
    let cfg = load_config(&args.config, output, quiet).with_defaults();
    let backend = Backend::select(args.memory);
    seed_verdict(&backend, &cfg, args);

    let store = match backend.connect(&cfg.store_settings()).await {
        Ok(store) => store,
        Err(e) => {
            report_error(&format!("failed to connect to store: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let record = match Publisher::new(store)
        .publish(
            &args.run_id,
            &cfg.analysis_template,
            &cfg.cluster_id,
            &cfg.namespace,
        )
        .await
    {
        Ok(record) => record,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    if !quiet {
        match output {
            OutputFormat::Text => println!("published {} to {}", record.key(), cfg.table_name),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "published": true,
                    "table": cfg.table_name,
                    "run_id": record.run_id,
                    "cluster_id": record.origin_cluster_id,
                    "analysis_template": record.template_name,
                    "namespace": record.namespace,
                });
                println!("{}", json);
            }
        }
    }
}

async fn cmd_await(args: &HandshakeArgs, output: OutputFormat, quiet: bool) {
    let cfg = load_config(&args.config, output, quiet).with_defaults();
    let poll = match cfg.poll_settings() {
        Ok(poll) => poll,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let backend = Backend::select(args.memory);
    seed_verdict(&backend, &cfg, args);

    let store = match backend.connect(&cfg.store_settings()).await {
        Ok(store) => store,
        Err(e) => {
            report_error(&format!("failed to connect to store: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match VerdictPoller::new(store)
        .await_verdict(&args.run_id, &cfg.cluster_id, poll)
        .await
    {
        Ok(result) => match output {
            OutputFormat::Text => println!("{}", result),
            OutputFormat::Json => println!("{}", serde_json::json!({ "result": result })),
        },
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_metadata(config: &Path, output: OutputFormat, quiet: bool) {
    let cfg = load_config(config, output, quiet);
    let metric = plugin_metric(&cfg, output, quiet);
    let provider = DistributedAnalysisProvider::new(Backend::select(false));
    let metadata = provider.get_metadata(&metric);

    match output {
        OutputFormat::Text => {
            for (key, value) in &metadata {
                println!("{}: {}", key, value);
            }
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&metadata)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

/// Report an error message in the appropriate output format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
