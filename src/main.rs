//! njfare - collect NJ Transit bus fares between towns
//!
//! Runs a single fare lookup or a batch over a route file. A batch interrupted
//! with Ctrl-C still writes its report before exiting.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

use njfare::batch::BatchAggregator;
use njfare::cache::PageCache;
use njfare::cli::{Cli, Mode, RunConfig};
use njfare::data::{HttpTransport, StopDirectory, TripFetcher};
use njfare::logging;

/// Exit status after a batch was interrupted
const EXIT_INTERRUPTED: i32 = 130;

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    logging::init_logger(config.log_level)?;

    let stops = match &config.stops_file {
        Some(path) => StopDirectory::from_csv_path(path)?,
        None => StopDirectory::builtin(),
    };
    let cache = PageCache::new(&config.cache_dir)?;
    let fetcher = TripFetcher::new(HttpTransport::new(), cache, stops)
        .with_key_policy(config.key_policy)
        .with_endpoint(&config.endpoint);

    match &config.mode {
        Mode::Single {
            origin,
            destination,
        } => {
            info!("getting {} to {} at {}", origin, destination, config.when);
            let fare = fetcher
                .fetch_fare(origin, destination, config.when, config.use_cache)
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "fare lookup failed");
                    None
                });
            match fare {
                Some(fare) => println!("fare: ${}", fare),
                None => println!("fare: none"),
            }
        }
        Mode::Batch { route_file } => {
            info!("loading {}", route_file.display());
            let mut aggregator =
                BatchAggregator::new(fetcher, &config.output).with_cache_reads(config.use_cache);
            let summary = aggregator
                .run_route_file(route_file, config.when, interrupted())
                .await?;
            if summary.cancelled {
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
    }

    Ok(())
}
