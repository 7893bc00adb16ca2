use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use caption_summary_api::caption_fetcher::{CaptionFetcher, TranscriptSource};
use caption_summary_api::config::{defaults, FetcherConfig, GenerationConfig, MetricsConfig, ServerConfig};
use caption_summary_api::handlers::{configure, cors_headers, fallback, metrics_handler};
use caption_summary_api::metrics::{create_metrics_exporter, Metrics};
use caption_summary_api::summarizer::{SummarizationService, TextSummarizer};
use caption_summary_api::{config_loader, config_validator};

/// Local HTTP service extracting video captions and summarizing text
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Directory holding the T5 model (config.json, tokenizer.json and weights)
    #[arg(long = "model-path", alias = "model_path", env = "SUMMARIZER_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "CAPTION_SUMMARY_API_PORT", default_value_t = defaults::PORT)]
    port: u16,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // File values become env vars before clap and the config structs read them
    config_loader::load_config();
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", config_validator::generate_sample_config());
        return Ok(());
    }

    let validation = config_validator::validate_environment();
    validation.print_summary();
    if !validation.is_valid() {
        error!("Invalid configuration, aborting");
        std::process::exit(1);
    }

    let model_path = match cli.model_path {
        Some(path) => path,
        None => {
            error!("No model path given, use --model-path or SUMMARIZER_MODEL_PATH");
            std::process::exit(2);
        }
    };

    let fetcher_config = FetcherConfig::default();
    if let Err(e) = fetcher_config.ensure_temp_dir() {
        warn!(
            "Failed to create temp directory {}: {}",
            fetcher_config.temp_dir.display(),
            e
        );
    }
    let server_config = ServerConfig::with_port(cli.port);
    let metrics_config = MetricsConfig::default();

    let metrics = Metrics::new(create_metrics_exporter(&metrics_config.exporter_type));

    let service = SummarizationService::new(GenerationConfig::default());
    if let Err(e) = service.load_model(&model_path) {
        error!("Failed to load model from {}: {}", model_path.display(), e);
        metrics.set_model_loaded(false).await;
        std::process::exit(1);
    }
    metrics.set_model_loaded(true).await;

    info!("yt-dlp command: {}", fetcher_config.command);
    info!("Using temp directory: {}", fetcher_config.temp_dir.display());
    info!("Caption language: {}", fetcher_config.language);
    info!("Metrics exporter: {}", metrics_config.exporter_type);

    let fetcher = CaptionFetcher::new(fetcher_config);
    fetcher.sweep_leftovers();
    let source: Arc<dyn TranscriptSource> = Arc::new(fetcher);
    let summarizer: Arc<dyn TextSummarizer> = Arc::new(service);
    let metrics_enabled = metrics_config.is_enabled();

    info!(
        "Starting Caption Summary API server on http://{}",
        server_config.bind_address()
    );
    info!("Endpoints: POST /get_transcript, POST /summarize, GET /health");
    if metrics_enabled {
        info!("Metrics available on GET /metrics");
    }

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::default())
            .wrap(cors_headers())
            .app_data(web::Data::from(source.clone()))
            .app_data(web::Data::from(summarizer.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .configure(configure);
        if metrics_enabled {
            app = app.service(web::resource("/metrics").route(web::get().to(metrics_handler)));
        }
        app.default_service(web::route().to(fallback))
    })
    .bind(server_config.bind_address())?
    .workers(server_config.worker_count())
    .keep_alive(Duration::from_secs(server_config.keep_alive))
    .run()
    .await
}
