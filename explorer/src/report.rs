use std::collections::HashSet;
use std::fs::{create_dir_all, File};
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::analysis::pathway_summary::PathwaySummary;
use crate::analysis::reaction_view::ReactionDetail;
use crate::helper_functions::{opt_bool_col, opt_i64_col, opt_str_col};
use crate::models::{polars_err, DatasetSpec, FilterSpec, COL_N_GENES, COL_PATHWAY, COL_SIGNIFICANT};

/// The dashboards' "Summary Statistics" block, computed over the full
/// (unfiltered) table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_pathways: usize,
    pub total_reactions: usize,
    pub significant_reactions: usize,
    pub reactions_with_genes: usize,
}

pub fn summary_statistics(df: &DataFrame) -> SummaryStats {
    let total_pathways = opt_str_col(df, COL_PATHWAY)
        .map(|ca| ca.into_iter().flatten().collect::<HashSet<_>>().len())
        .unwrap_or(0);
    let significant_reactions = opt_bool_col(df, COL_SIGNIFICANT)
        .map(|ca| ca.into_iter().filter(|b| b.unwrap_or(false)).count())
        .unwrap_or(0);
    let reactions_with_genes = opt_i64_col(df, COL_N_GENES)
        .map(|ca| ca.into_iter().filter(|n| n.unwrap_or(0) > 0).count())
        .unwrap_or(0);

    SummaryStats {
        total_pathways,
        total_reactions: df.height(),
        significant_reactions,
        reactions_with_genes,
    }
}

/// Everything one dataset's JSON artifact carries.
#[derive(Debug, Serialize)]
pub struct DatasetReport<'a> {
    pub dataset: &'a str,
    pub title: &'a str,
    pub effect_metric: String,
    pub filters: &'a FilterSpec,
    pub summary: SummaryStats,
    pub pathways_matching: usize,
    pub pathways: &'a [PathwaySummary],
}

impl<'a> DatasetReport<'a> {
    pub fn new(
        spec: &'a DatasetSpec,
        filters: &'a FilterSpec,
        summary: SummaryStats,
        pathways: &'a [PathwaySummary],
    ) -> Self {
        Self {
            dataset: spec.id,
            title: spec.title,
            effect_metric: spec.effect.to_string(),
            filters,
            summary,
            pathways_matching: pathways.len(),
            pathways,
        }
    }
}

pub fn write_json_report(report: &DatasetReport, path: &Path) -> PolarsResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }
    let file = File::create(path).map_err(|e| polars_err(Box::new(e)))?;
    serde_json::to_writer_pretty(file, report).map_err(|e| polars_err(Box::new(e)))?;
    info!("Report saved to: {}", path.display());
    Ok(())
}

/// The ranked summary as a frame, ready for the CSV writer.
pub fn pathway_summary_frame(summaries: &[PathwaySummary]) -> PolarsResult<DataFrame> {
    let pathway: Vec<&str> = summaries.iter().map(|s| s.pathway.as_str()).collect();
    let direction: Vec<&str> = summaries.iter().map(|s| s.direction.as_str()).collect();
    let median_d: Vec<f64> = summaries.iter().map(|s| s.median_d).collect();
    let n_significant: Vec<u32> = summaries.iter().map(|s| s.n_significant).collect();
    let n_total: Vec<u32> = summaries.iter().map(|s| s.n_total).collect();
    let pct: Vec<f64> = summaries.iter().map(|s| s.pct_significant).collect();

    DataFrame::new(vec![
        Column::from(Series::new("pathway".into(), pathway)),
        Column::from(Series::new("direction".into(), direction)),
        Column::from(Series::new("median_d".into(), median_d)),
        Column::from(Series::new("n_significant".into(), n_significant)),
        Column::from(Series::new("n_total".into(), n_total)),
        Column::from(Series::new("pct_significant".into(), pct)),
    ])
}

/// The dashboards' checkbox label: truncated name plus effect and
/// significance, e.g. `[CD5 hi] Glycolysis (d=+1.50, 67% sig)`.
pub fn checkbox_label(summary: &PathwaySummary) -> String {
    let short_name: String = if summary.pathway.chars().count() > 35 {
        let truncated: String = summary.pathway.chars().take(35).collect();
        format!("{truncated}...")
    } else {
        summary.pathway.clone()
    };
    format!(
        "[{}] {} (d={:+.2}, {:.0}% sig)",
        summary.direction, short_name, summary.median_d, summary.pct_significant
    )
}

/// Print the single-reaction detail block to the log, the way the
/// detail pane renders it.
pub fn log_reaction_detail(detail: &ReactionDetail) {
    info!("Reaction: {}", detail.reaction_id);
    info!("  Name: {}", detail.reaction_name);
    info!("  Pathway: {}", detail.pathway);
    info!("  Effect Size: {:+.2}", detail.effect);
    match detail.p_value {
        Some(p) => info!("  p-value: {:.2e}", p),
        None => info!("  p-value: n/a"),
    }
    info!("  Significant: {}", if detail.significant { "Yes" } else { "No" });
    if detail.genes.is_empty() {
        info!("  No genes associated");
    } else {
        info!("  Associated Genes ({}):", detail.genes.len());
        for gene in &detail.genes {
            info!("    - {}", gene);
        }
    }
    if let Some(ec) = &detail.ec_number {
        info!("  EC Number: {}", ec);
    }
    if let Some(trajectory) = &detail.trajectory {
        info!("  Trajectory: {}", trajectory);
    }
}
