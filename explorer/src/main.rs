use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use clap::Parser;
use polars::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::overview_plot::plot_pathway_overview;
use crate::analysis::pathway_summary::{aggregate_pathways, apply_filters};
use crate::analysis::reaction_view::{reaction_detail, search_suggestions, select_reactions};
use crate::data_handling::all_datasets;
use crate::data_handling::cache::TableCache;
use crate::helper_functions::dataframe_to_csv;
use crate::models::{polars_err, DatasetSpec, FilterSpec};
use crate::report::{
    checkbox_label, log_reaction_detail, pathway_summary_frame, summary_statistics,
    write_json_report, DatasetReport,
};

mod analysis;
mod data_handling;
mod helper_functions;
mod models;
mod report;

/// Batch explorer for precomputed differential metabolic-flux results:
/// ranks pathways per dataset and writes CSV/JSON/PNG artifacts.
#[derive(Parser, Debug)]
#[command(name = "explorer", version, about)]
struct Cli {
    /// Directory holding the upstream CSV exports
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Directory the per-dataset artifacts are written to
    #[arg(long, default_value = "./explorer_results")]
    out_dir: PathBuf,

    /// Dataset id(s) to run; all registered datasets when omitted
    #[arg(long)]
    dataset: Vec<String>,

    /// Case-insensitive substring matched against pathway names and genes
    #[arg(long)]
    search: Option<String>,

    /// Exact direction / highest-group label to keep ("All" disables)
    #[arg(long)]
    direction: Option<String>,

    /// Keep only reactions significant at p < 0.05
    #[arg(long, default_value_t = false)]
    significant_only: bool,

    /// Keep only reactions with at least one associated gene
    #[arg(long, default_value_t = false)]
    genes_only: bool,

    /// Drop pathways whose |median effect| is below this
    #[arg(long, default_value_t = 0.0)]
    min_abs_effect: f64,

    /// Pathway name(s) for the reaction-level view; repeatable
    #[arg(long = "select-pathway")]
    select_pathway: Vec<String>,

    /// Drop each dataset's cached table once its run finishes
    #[arg(long, default_value_t = false)]
    clear_cache: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting the pathway explorer batch run");

    let filter = FilterSpec {
        search_term: cli.search.clone(),
        direction_filter: cli.direction.clone(),
        significant_only: cli.significant_only,
        genes_only: cli.genes_only,
        min_abs_effect: cli.min_abs_effect,
    };

    let mut cache = TableCache::new();
    let mut ran = 0usize;

    for spec in all_datasets() {
        if !cli.dataset.is_empty() && !cli.dataset.iter().any(|d| d == spec.id) {
            continue;
        }

        info!("=== {} ({}) ===", spec.title, spec.id);
        let df = match cache.get_or_load(&cli.data_dir, &spec) {
            Ok(Some(df)) => df,
            Ok(None) => {
                warn!("{}: data not found, dataset disabled for this run", spec.id);
                continue;
            }
            Err(e) => {
                error!("{}: failed to load: {}", spec.id, e);
                continue;
            }
        };

        if let Err(e) = run_dataset(&df, &spec, &filter, &cli.select_pathway, &cli.out_dir) {
            error!("{}: run failed: {}", spec.id, e);
        } else {
            ran += 1;
        }

        if cli.clear_cache {
            cache.clear(spec.id);
        }
    }

    info!("Finished: {} dataset(s) processed", ran);
    Ok(())
}

/// One full recomputation for one dataset: filter, aggregate, rank,
/// select, and write the artifacts under `<out_dir>/<dataset-id>/`.
fn run_dataset(
    df: &DataFrame,
    spec: &DatasetSpec,
    filter: &FilterSpec,
    selected_pathways: &[String],
    out_dir: &Path,
) -> PolarsResult<()> {
    let dataset_dir = out_dir.join(spec.id);
    create_dir_all(&dataset_dir).map_err(|e| polars_err(Box::new(e)))?;

    if let Some(wanted) = filter.active_direction() {
        if !spec.direction_vocabulary().iter().any(|l| *l == wanted) {
            warn!(
                "{}: direction '{}' is not in this dataset's vocabulary {:?}",
                spec.id,
                wanted,
                spec.direction_vocabulary()
            );
        }
    }

    let filtered = apply_filters(df, spec, filter)?;
    let summaries = aggregate_pathways(&filtered, spec, filter.min_abs_effect)?;
    info!("{} pathways match filters", summaries.len());

    if summaries.is_empty() {
        if let Some(term) = filter.active_search() {
            let hints = search_suggestions(df, term, 5);
            if hints.is_empty() {
                info!("No pathways match '{}'", term);
            } else {
                info!("No pathways match '{}'. Did you mean:", term);
                for hint in hints {
                    info!("  - {}", hint);
                }
            }
        }
    }

    for summary in summaries.iter().take(10) {
        info!("  {}", checkbox_label(summary));
    }

    let mut summary_df = pathway_summary_frame(&summaries)?;
    dataframe_to_csv(&mut summary_df, &dataset_dir.join("pathway_summary.csv"))?;

    let stats = summary_statistics(df);
    info!(
        "Summary: {} pathways, {} reactions, {} significant, {} with genes",
        stats.total_pathways,
        stats.total_reactions,
        stats.significant_reactions,
        stats.reactions_with_genes
    );
    let report = DatasetReport::new(spec, filter, stats, &summaries);
    write_json_report(&report, &dataset_dir.join("pathway_summary.json"))?;

    plot_pathway_overview(df, spec, &dataset_dir.join("pathway_overview.png"))?;

    if !selected_pathways.is_empty() {
        let mut reactions = select_reactions(&filtered, spec, selected_pathways)?;
        info!("{} reactions in selected pathway(s)", reactions.height());
        if reactions.height() > 0 {
            dataframe_to_csv(&mut reactions, &dataset_dir.join("selected_reactions.csv"))?;
            // Detail block for the top-ranked reaction.
            if let Some(detail) = reaction_detail(&reactions, spec, 0) {
                log_reaction_detail(&detail);
            }
        }
    }

    Ok(())
}
