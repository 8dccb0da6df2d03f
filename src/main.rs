use acce_service::utils::hash::calculate_file_hash;
use acce_service::{AcceService, LocalArtifactStore, ServiceConfig, ServiceRequest};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Submit a sample to ACCE and print its results",
    long_about = None
)]
struct Args {
    /// Sample to analyze
    file: PathBuf,

    /// API key, overrides ACCE_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Ask ACCE for legacy (MWCP) formatted results
    #[arg(long)]
    legacy: bool,

    /// Download and extract the components ACCE carved out
    #[arg(long)]
    get_artifacts: bool,

    /// Where extracted components are written
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// ACCE base URL, overrides ACCE_BASE_URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acce_service=info,acce_submit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ServiceConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let service = AcceService::start(config)?;

    let file_digest = match calculate_file_hash(&args.file).await {
        Ok(digest) => digest,
        Err(e) => {
            error!("❌ Cannot read {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };
    info!("🔍 Sample {} sha256={}", args.file.display(), file_digest);

    let mut request = ServiceRequest::new(&args.file, file_digest, &args.work_dir)
        .with_mwcp_legacy(args.legacy)
        .with_artifacts(args.get_artifacts);
    if let Some(api_key) = args.api_key {
        request = request.with_api_key(api_key);
    }

    let store = LocalArtifactStore::new();
    let Some(outcome) = service.execute(&request, &store).await? else {
        error!("❌ ACCE produced no result");
        std::process::exit(1);
    };

    for artifact in store.artifacts().await {
        info!("📦 {} -> {}", artifact.name, artifact.path.display());
    }
    if !outcome.errors.is_empty() {
        info!("⚠️  Finished with {} error(s)", outcome.errors.len());
    }

    for section in &outcome.result.sections {
        println!("{}", section.body);
    }
    Ok(())
}
