use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use fraudscan::config::{default_config_path, load_config};
use fraudscan::pipeline::NoopProgress;
use fraudscan::worker::{Job, JobStatus, Pipelines};
use fraudscan::{
    AudioPipeline, AudioUpload, Config, DocumentPipeline, DocumentType, DocumentUpload,
    FraudscanError, TaskExecutor, TaskRunner, WorkerError, WorkerPool,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "fraudscan", version, about = "Run document and audio fraud checks")]
struct Cli {
    /// Config file (JSON). Built-in defaults are used when absent.
    #[arg(long, env = "FRAUDSCAN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score an identity document image
    Document {
        #[arg(long)]
        lead_id: String,
        #[arg(long)]
        agent_id: String,
        #[arg(long = "type")]
        document_type: DocumentType,
        file: PathBuf,
    },
    /// Extract and score a verification call recording
    Audio {
        #[arg(long)]
        lead_id: String,
        #[arg(long)]
        agent_id: String,
        /// Call id, used as the stored file name. Generated when omitted.
        #[arg(long)]
        id: Option<String>,
        file: PathBuf,
    },
    /// Score several documents for one lead through the worker pool
    Batch {
        #[arg(long)]
        lead_id: String,
        #[arg(long)]
        agent_id: String,
        #[arg(long = "type")]
        document_type: DocumentType,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_logging(json: bool) {
    // Route `log` records from the worker pool into tracing.
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fraudscan=info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        tracing::subscriber::set_global_default(registry.with(fmt_layer.json()))
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt_layer))
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<Config, FraudscanError> {
    if let Some(path) = path {
        info!("Loading config from {}", path.display());
        return Ok(load_config(&path)?);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            Ok(load_config(&path)?)
        }
        _ => {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>), FraudscanError> {
    let bytes = std::fs::read(path).map_err(|e| FraudscanError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((file_name, bytes))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), FraudscanError> {
    let text = serde_json::to_string_pretty(value).map_err(FraudscanError::Output)?;
    println!("{}", text);
    Ok(())
}

fn run(cli: Cli) -> Result<u8, FraudscanError> {
    let config = Arc::new(resolve_config(cli.config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(FraudscanError::Runtime)?;

    let executor: Arc<dyn TaskExecutor> = Arc::new(TaskRunner::from_config(&config));

    match cli.command {
        Command::Document {
            lead_id,
            agent_id,
            document_type,
            file,
        } => {
            let (file_name, bytes) = read_upload(&file)?;
            let upload = DocumentUpload {
                lead_id,
                agent_id,
                document_type,
                file_name,
                bytes,
            };
            let pipeline = DocumentPipeline::new(executor, Arc::clone(&config));
            let outcome = runtime.block_on(pipeline.ingest(&upload, &NoopProgress))?;

            print_json(&outcome)?;
            if outcome.is_forgery() {
                warn!(request_id = %outcome.request_id(), "Document rejected as forged");
                return Ok(EXIT_REJECTED);
            }
            Ok(0)
        }
        Command::Audio {
            lead_id,
            agent_id,
            id,
            file,
        } => {
            let (file_name, bytes) = read_upload(&file)?;
            let upload = AudioUpload {
                id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                lead_id,
                agent_id,
                file_name,
                bytes,
            };
            let pipeline = AudioPipeline::new(executor, Arc::clone(&config));
            let response = runtime.block_on(pipeline.ingest(&upload, &NoopProgress))?;

            print_json(&response)?;
            if response.is_error() {
                return Ok(EXIT_FAILURE);
            }
            Ok(0)
        }
        Command::Batch {
            lead_id,
            agent_id,
            document_type,
            files,
        } => {
            let pipelines = Pipelines {
                document: Arc::new(DocumentPipeline::new(
                    Arc::clone(&executor),
                    Arc::clone(&config),
                )),
                audio: Arc::new(AudioPipeline::new(executor, Arc::clone(&config))),
            };
            let pool = WorkerPool::new(
                pipelines,
                runtime.handle().clone(),
                config.workers.count.max(1),
            );

            let mut jobs = Vec::with_capacity(files.len());
            for path in &files {
                let (file_name, bytes) = read_upload(path)?;
                jobs.push(Job::document(DocumentUpload {
                    lead_id: lead_id.clone(),
                    agent_id: agent_id.clone(),
                    document_type,
                    file_name,
                    bytes,
                }));
            }
            let submitted = jobs.len();

            // Both queues are bounded, so results are drained while submitting.
            let (results, submit_result) = std::thread::scope(|scope| {
                let submitter = scope.spawn(|| {
                    for job in jobs {
                        pool.submit(job)?;
                    }
                    Ok::<(), WorkerError>(())
                });

                let mut results = Vec::with_capacity(submitted);
                while results.len() < submitted {
                    match pool.recv_result() {
                        Some(result) => results.push(result),
                        None => break,
                    }
                }
                let submit_result = submitter
                    .join()
                    .unwrap_or(Err(WorkerError::ChannelClosed));
                (results, submit_result)
            });
            pool.shutdown();
            pool.wait();
            submit_result?;

            print_json(&results)?;

            let code = if results.len() < submitted
                || results.iter().any(|r| r.status == JobStatus::Failed)
            {
                EXIT_FAILURE
            } else if results.iter().any(|r| r.status == JobStatus::Rejected) {
                EXIT_REJECTED
            } else {
                0
            };
            Ok(code)
        }
    }
}
