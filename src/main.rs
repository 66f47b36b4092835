use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use report_digitizer::api::serve_until_ctrl_c;
use report_digitizer::config::AppConfig;
use report_digitizer::core_state::CoreState;
use report_digitizer::export::export_csv;
use report_digitizer::pipeline::batch::{run_batch, BatchRunner, BatchStatusEvent};
use report_digitizer::pipeline::import::encode::BatchFile;
use report_digitizer::pipeline::structuring::gemini::{ExtractionClient, GeminiClient};
use report_digitizer::store::ReportStore;
use report_digitizer::{init_tracing, Cli, Command};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();
    init_tracing();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    // The blocking HTTP client must be built and dropped outside the tokio
    // runtime; `main` holds the last reference.
    let client = match GeminiClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    if !client.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; every extraction will fail");
    }

    match cli.command {
        Command::Serve { .. } => serve(config, client),
        Command::Digitize { files, csv, json, .. } => {
            digitize(&config, client, &files, csv.as_deref(), json)
        }
    }
}

fn serve(config: AppConfig, client: Arc<GeminiClient>) -> i32 {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return 1;
        }
    };

    let addr = config.bind_addr;
    let core = Arc::new(CoreState::new(config, client.clone() as Arc<dyn ExtractionClient>));
    let outcome = runtime.block_on(serve_until_ctrl_c(core, addr));
    drop(runtime);
    drop(client);

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn digitize(
    config: &AppConfig,
    client: Arc<GeminiClient>,
    paths: &[PathBuf],
    csv_path: Option<&Path>,
    json: bool,
) -> i32 {
    let store = ReportStore::new();
    let runner = BatchRunner::new(client);
    let files: Vec<BatchFile> = paths.iter().map(BatchFile::from_path).collect();

    let print_line = |event: BatchStatusEvent| {
        if json {
            return;
        }
        match event {
            BatchStatusEvent::ItemStarted { filename, index, total, .. } => {
                eprintln!("[{}/{}] {filename}", index + 1, total);
            }
            BatchStatusEvent::ItemFinished { record_id, status, error } => match error {
                Some(message) => println!("{record_id}  {status}  {message}"),
                None => println!("{record_id}  {status}"),
            },
            BatchStatusEvent::ItemDiscarded { record_id } => {
                println!("{record_id}  discarded");
            }
            _ => {}
        }
    };

    let result = match run_batch(&runner, &store, &files, config.default_variant, Some(&print_line)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    if json {
        let records = match store.list() {
            Ok(records) => records,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        };
        match serde_json::to_string_pretty(&records) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error: failed to serialize records: {e}");
                return 1;
            }
        }
    }

    if let Some(path) = csv_path {
        let completed = match store.completed() {
            Ok(records) => records,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        };
        let body = match export_csv(&completed) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        };
        if let Err(e) = std::fs::write(path, body) {
            eprintln!("Error: failed to write {}: {e}", path.display());
            return 1;
        }
        tracing::info!(path = %path.display(), rows = completed.len(), "CSV written");
    }

    eprintln!(
        "{} completed, {} failed in {} ms",
        result.completed, result.failed, result.duration_ms
    );

    if result.failed > 0 {
        2
    } else {
        0
    }
}
