//! Analytics CLI
//!
//! Query and batch interface for the dekadal raster analytics core.
//! Every subcommand prints one JSON document on stdout; taxonomy errors
//! are printed as a structured object on stderr with a nonzero exit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use climatology::{AnomalyEngine, AnomalyMode, BaselineBuilder, YearRange};
use dekad_common::{
    parse_iso_date, validate_range, AnalyticsError, AnalyticsResult, CancelToken, DekadSlot,
    ProductKind,
};
use raster_store::{RasterStore, StoreConfig};
use region_catalog::RegionCatalog;
use seasonal::{SeasonalEvent, SeasonalMetric};
use zonal_stats::ZonalAggregator;

mod logging;

/// Dekadal raster analytics
#[derive(Parser, Debug)]
#[command(name = "analytics")]
#[command(about = "Zonal, baseline, anomaly and seasonal queries over dekadal rasters")]
struct Cli {
    /// Root directory of the raster artifact store
    #[arg(long, default_value = "data", env = "DATA_ROOT")]
    data_root: PathBuf,

    /// Product prefix used in artifact filenames
    #[arg(long, default_value = "gsod", env = "PRODUCT_PREFIX")]
    product: String,

    /// Administrative polygon file (GeoJSON FeatureCollection)
    #[arg(long, default_value = "data/zim_admin1.geojson", env = "REGIONS_FILE")]
    regions: PathBuf,

    /// Feature property holding the region name
    #[arg(long, default_value = "NAME_1", env = "REGION_NAME_FIELD")]
    region_name_field: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List dates with a raw observation artifact
    Dates,

    /// Materialize cloud-optimized copies of raw rasters
    Cog {
        /// Date to materialize (ISO 8601); omit with --all
        date: Option<String>,
        /// Materialize every available date
        #[arg(long)]
        all: bool,
    },

    /// Zonal statistics for one region on one date
    Zonal {
        region: String,
        date: String,
        /// Product namespace to read (raw or cog)
        #[arg(long, default_value = "raw")]
        product: String,
    },

    /// Day-stepped zonal statistics over a date range
    ZonalRange {
        region: String,
        start: String,
        end: String,
        #[arg(long, default_value = "raw")]
        product: String,
    },

    /// Areal totals (sum of daily regional means) for every region
    Areal {
        start: String,
        end: String,
        #[arg(long, default_value = "raw")]
        product: String,
    },

    /// Build long-term-average baselines
    BuildLta {
        #[arg(long)]
        start_year: i32,
        #[arg(long)]
        end_year: i32,
        /// Single MMDD slot to build; omit to sweep all 36
        #[arg(long)]
        slot: Option<String>,
    },

    /// Compute the anomaly raster for an event date
    Anomaly {
        date: String,
        /// absolute or percentage
        #[arg(long, default_value = "absolute")]
        mode: String,
    },

    /// Dekad-stepped zonal anomaly series for one region
    AnomalySeries {
        region: String,
        start: String,
        end: String,
    },

    /// Seasonal aggregation of a tabular event log (JSON file)
    Seasonal {
        /// Path to a JSON array of {date, region?, value} rows
        events: PathBuf,
        start: String,
        end: String,
        #[arg(long)]
        region: Option<String>,
        /// sum or mean
        #[arg(long, default_value = "sum")]
        metric: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);
    info!(data_root = %cli.data_root.display(), product = %cli.product, "analytics starting");

    match run(&cli) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        Err(err) => {
            let failure = json!({
                "error": { "kind": error_kind(&err), "message": err.to_string() }
            });
            eprintln!("{}", serde_json::to_string_pretty(&failure).unwrap());
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> AnalyticsResult<serde_json::Value> {
    let mut config = StoreConfig::new(cli.data_root.clone());
    config.product = cli.product.clone();
    config
        .validate()
        .map_err(AnalyticsError::InvalidInput)?;
    let store = RasterStore::new(config);
    let cancel = CancelToken::new();

    match &cli.command {
        Command::Dates => {
            let dates = store.available_dates()?;
            Ok(json!({ "dates": dates }))
        }

        Command::Cog { date, all } => match (date.as_deref(), *all) {
            (Some(date), false) => {
                let path = store.ensure_cog(parse_iso_date(date)?)?;
                Ok(json!({ "path": path }))
            }
            (None, true) => {
                let sweep = store.ensure_all_cogs()?;
                Ok(serde_json::to_value(sweep)?)
            }
            _ => Err(AnalyticsError::invalid_input(
                "pass exactly one of a date or --all",
            )),
        },

        Command::Zonal {
            region,
            date,
            product,
        } => {
            let catalog = load_catalog(cli)?;
            let aggregator = ZonalAggregator::new(&store, &catalog);
            let outcome = aggregator.stats_for_date(
                ProductKind::parse(product)?,
                parse_iso_date(date)?,
                region,
            )?;
            Ok(serde_json::to_value(outcome)?)
        }

        Command::ZonalRange {
            region,
            start,
            end,
            product,
        } => {
            let catalog = load_catalog(cli)?;
            let aggregator = ZonalAggregator::new(&store, &catalog);
            let outcome = aggregator.stats_for_range(
                ProductKind::parse(product)?,
                parse_iso_date(start)?,
                parse_iso_date(end)?,
                region,
                &cancel,
            )?;
            Ok(serde_json::to_value(outcome)?)
        }

        Command::Areal {
            start,
            end,
            product,
        } => {
            let catalog = load_catalog(cli)?;
            let aggregator = ZonalAggregator::new(&store, &catalog);
            let totals = aggregator.areal_total_by_region(
                ProductKind::parse(product)?,
                parse_iso_date(start)?,
                parse_iso_date(end)?,
                &cancel,
            )?;
            Ok(json!({ "regions": totals }))
        }

        Command::BuildLta {
            start_year,
            end_year,
            slot,
        } => {
            let builder =
                BaselineBuilder::new(&store, YearRange::new(*start_year, *end_year)?);
            match slot {
                Some(slot) => {
                    let lta = builder.build_slot(DekadSlot::parse(slot)?)?;
                    Ok(json!({
                        "slot": slot,
                        "width": lta.width,
                        "height": lta.height,
                    }))
                }
                None => {
                    let report = builder.build_all()?;
                    Ok(serde_json::to_value(report)?)
                }
            }
        }

        Command::Anomaly { date, mode } => {
            let catalog = load_catalog(cli)?;
            let engine = AnomalyEngine::new(&store, &catalog);
            let anomaly =
                engine.compute(parse_iso_date(date)?, AnomalyMode::parse(mode)?)?;
            Ok(json!({
                "date": date,
                "width": anomaly.width,
                "height": anomaly.height,
            }))
        }

        Command::AnomalySeries { region, start, end } => {
            let catalog = load_catalog(cli)?;
            let engine = AnomalyEngine::new(&store, &catalog);
            let series = engine.zonal_series(
                parse_iso_date(start)?,
                parse_iso_date(end)?,
                region,
                &cancel,
            )?;
            Ok(json!({ "series": series }))
        }

        Command::Seasonal {
            events,
            start,
            end,
            region,
            metric,
        } => {
            let start = parse_iso_date(start)?;
            let end = parse_iso_date(end)?;
            validate_range(start, end)?;

            let file = std::fs::File::open(events).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AnalyticsError::not_found(events.display().to_string())
                } else {
                    AnalyticsError::Storage(e.to_string())
                }
            })?;
            let log: Vec<SeasonalEvent> = serde_json::from_reader(file)?;

            let values = seasonal::summarize(
                &log,
                start,
                end,
                region.as_deref(),
                SeasonalMetric::parse(metric)?,
            )?;
            Ok(json!({ "seasons": values }))
        }
    }
}

fn load_catalog(cli: &Cli) -> AnalyticsResult<RegionCatalog> {
    RegionCatalog::load_with_name_field(&cli.regions, &cli.region_name_field)
}

fn error_kind(err: &AnalyticsError) -> &'static str {
    match err {
        AnalyticsError::NotFound(_) => "not_found",
        AnalyticsError::InvalidInput(_) => "invalid_input",
        AnalyticsError::NoData(_) => "no_data",
        AnalyticsError::InsufficientData(_) => "insufficient_data",
        AnalyticsError::MissingInput(_) => "missing_input",
        AnalyticsError::CorruptArtifact { .. } => "corrupt_artifact",
        AnalyticsError::Storage(_) => "storage",
        AnalyticsError::Cancelled => "cancelled",
    }
}
