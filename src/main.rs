use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::info;

use hotel_contract_search::{
    CatalogueClientConfig, ContractCatalogue, ContractService, HotelContractDto,
    HttpContractCatalogue, InMemoryCatalogue, RetryConfig, SearchConfig, SearchError,
    SearchRequestPayload, SearchService,
};

/// Searches hotel contracts for the cheapest room allocation of a stay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding the stay request
    #[arg(short, long)]
    request: PathBuf,

    /// JSON file holding an array of contracts to search
    #[arg(short, long, conflicts_with = "catalogue_url")]
    catalogue: Option<PathBuf>,

    /// Base URL of a remote contract catalogue
    #[arg(long)]
    catalogue_url: Option<String>,

    /// Accept check-in dates before today
    #[arg(long)]
    allow_past_check_in: bool,

    /// Remote catalogue request timeout
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Remote catalogue retries on transient failures
    #[arg(long, default_value_t = 3)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let payload: SearchRequestPayload = read_json(&args.request).await?;
    let catalogue = open_catalogue(&args).await?;
    let service = SearchService::new(
        catalogue,
        SearchConfig {
            reject_past_check_in: !args.allow_past_check_in,
        },
    );

    match service.search(payload).await {
        Ok(results) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(SearchError::Validation(failure)) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err).context("Search failed"),
    }
}

async fn open_catalogue(args: &Args) -> anyhow::Result<Arc<dyn ContractCatalogue>> {
    match (&args.catalogue, &args.catalogue_url) {
        (Some(path), _) => {
            let store: Arc<dyn ContractCatalogue> = load_catalogue_file(path).await?;
            Ok(store)
        }
        (None, Some(base_url)) => {
            let config = CatalogueClientConfig {
                base_url: base_url.clone(),
                timeout_ms: args.timeout_ms,
                retry_config: RetryConfig {
                    max_retries: args.max_retries,
                    ..RetryConfig::default()
                },
            };
            info!(base_url = %config.base_url, "Using remote contract catalogue");
            let client: Arc<dyn ContractCatalogue> = Arc::new(
                HttpContractCatalogue::new(config)
                    .context("Failed to set up the catalogue client")?,
            );
            Ok(client)
        }
        (None, None) => bail!("Either --catalogue or --catalogue-url is required"),
    }
}

// Every contract goes through the same validation as the management surface
async fn load_catalogue_file(path: &Path) -> anyhow::Result<Arc<InMemoryCatalogue>> {
    let contracts: Vec<HotelContractDto> = read_json(path).await?;
    let store = Arc::new(InMemoryCatalogue::new());
    let contract_service = ContractService::new(Arc::clone(&store));

    for (index, contract) in contracts.into_iter().enumerate() {
        let hotel_name = contract.hotel_name.clone();
        contract_service
            .add_contract(contract)
            .await
            .with_context(|| format!("Contract #{index} ({hotel_name}) is invalid"))?;
    }

    info!(path = %path.display(), contracts = store.len(), "Loaded contract catalogue");
    Ok(store)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
