use std::cmp::Ordering;
use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::helper_functions::{opt_bool_col, opt_f64_col, opt_i64_col, opt_str_col};
use crate::models::{
    DatasetSpec, FilterSpec, COL_GENES, COL_N_GENES, COL_PATHWAY, COL_PATHWAY_DIRECTION,
    COL_PATHWAY_MEDIAN_D, COL_SIGNIFICANT, UNKNOWN_LABEL,
};

/// One row of the ranked pathway table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathwaySummary {
    pub pathway: String,
    pub direction: String,
    pub median_d: f64,
    pub n_significant: u32,
    pub n_total: u32,
    pub pct_significant: f64,
}

/// Apply the four filter steps in order: search, direction, significance,
/// genes. A step whose backing column is missing is a no-op, never fatal.
/// Returns a new frame; the source table is untouched.
pub fn apply_filters(
    df: &DataFrame,
    spec: &DatasetSpec,
    filter: &FilterSpec,
) -> PolarsResult<DataFrame> {
    let mut rows: Vec<usize> = (0..df.height()).collect();

    // 1) case-insensitive substring search over pathway and gene strings
    if let Some(term) = filter.active_search() {
        let needle = term.to_lowercase();
        let pathway_ca = opt_str_col(df, COL_PATHWAY);
        let genes_ca = opt_str_col(df, COL_GENES);
        if pathway_ca.is_some() || genes_ca.is_some() {
            rows.retain(|&i| {
                let in_pathway = pathway_ca
                    .and_then(|ca| ca.get(i))
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false);
                let in_genes = genes_ca
                    .and_then(|ca| ca.get(i))
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false);
                in_pathway || in_genes
            });
        } else {
            debug!("search term set but neither pathway nor genes column exists, skipping");
        }
    }

    // 2) direction, exact equality against the pathway-level label.
    // Substring matching here was a bug in earlier dashboards.
    if let Some(wanted) = filter.active_direction() {
        match (opt_str_col(df, COL_PATHWAY), pathway_labels(df, spec, &rows)) {
            (Some(pathway_ca), Some(labels)) => {
                rows.retain(|&i| {
                    pathway_ca
                        .get(i)
                        .and_then(|p| labels.get(p))
                        .map(|label| label == wanted)
                        .unwrap_or(false)
                });
            }
            _ => debug!("direction filter set but no direction source exists, skipping"),
        }
    }

    // 3) significance
    if filter.significant_only {
        if let Some(ca) = opt_bool_col(df, COL_SIGNIFICANT) {
            rows.retain(|&i| ca.get(i).unwrap_or(false));
        } else {
            debug!("significant_only set but no significant column exists, skipping");
        }
    }

    // 4) known genes
    if filter.genes_only {
        if let Some(ca) = opt_i64_col(df, COL_N_GENES) {
            rows.retain(|&i| ca.get(i).unwrap_or(0) > 0);
        } else {
            debug!("genes_only set but no n_genes column exists, skipping");
        }
    }

    let idx = IdxCa::from_vec("rows".into(), rows.iter().map(|&i| i as IdxSize).collect());
    df.take(&idx)
}

/// Group the (already filtered) reaction table by pathway and rank the
/// summaries: descending |median effect|, then descending percent
/// significant, remaining ties in first-encountered pathway order.
pub fn aggregate_pathways(
    df: &DataFrame,
    spec: &DatasetSpec,
    min_abs_effect: f64,
) -> PolarsResult<Vec<PathwaySummary>> {
    let Some(pathway_ca) = opt_str_col(df, COL_PATHWAY) else {
        return Ok(Vec::new());
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for i in 0..df.height() {
        let Some(p) = pathway_ca.get(i) else { continue };
        if !groups.contains_key(p) {
            order.push(p.to_string());
        }
        groups.entry(p.to_string()).or_default().push(i);
    }

    let all_rows: Vec<usize> = (0..df.height()).collect();
    let labels = pathway_labels(df, spec, &all_rows);
    let median_src = opt_f64_col(df, COL_PATHWAY_MEDIAN_D);
    let effect_ca = opt_f64_col(df, spec.effect_col());
    let sig_ca = opt_bool_col(df, COL_SIGNIFICANT);

    let mut summaries = Vec::with_capacity(order.len());
    for pathway in order {
        let idxs = &groups[&pathway];
        let n_total = idxs.len() as u32;
        let n_significant = sig_ca
            .map(|ca| idxs.iter().filter(|&&i| ca.get(i).unwrap_or(false)).count() as u32)
            .unwrap_or(0);

        // The upstream per-pathway median when carried, otherwise the
        // median of the effect column over this pathway's reactions.
        let median_d = median_src
            .and_then(|ca| ca.get(idxs[0]))
            .or_else(|| {
                let mut vals: Vec<f64> = idxs
                    .iter()
                    .filter_map(|&i| effect_ca.and_then(|ca| ca.get(i)))
                    .collect();
                median(&mut vals)
            })
            .unwrap_or(0.0);

        let direction = labels
            .as_ref()
            .and_then(|m| m.get(&pathway).cloned())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let pct_significant = round1(n_significant as f64 / n_total as f64 * 100.0);

        summaries.push(PathwaySummary {
            pathway,
            direction,
            median_d,
            n_significant,
            n_total,
            pct_significant,
        });
    }

    summaries.retain(|s| s.median_d.abs() >= min_abs_effect);

    summaries.sort_by(|a, b| {
        b.median_d
            .abs()
            .partial_cmp(&a.median_d.abs())
            .unwrap_or(Ordering::Equal)
            .then(
                b.pct_significant
                    .partial_cmp(&a.pct_significant)
                    .unwrap_or(Ordering::Equal),
            )
    });

    Ok(summaries)
}

/// The pathway-level direction label for every pathway present in `rows`.
///
/// Multi-group variants with at least one group-mean column present get
/// the mode of their reactions' argmax labels; two-group variants take
/// each pathway's first `pathway_direction` value. `None` means the
/// table carries no direction source at all.
pub(crate) fn pathway_labels(
    df: &DataFrame,
    spec: &DatasetSpec,
    rows: &[usize],
) -> Option<HashMap<String, String>> {
    let pathway_ca = opt_str_col(df, COL_PATHWAY)?;

    if spec.has_group_means() {
        let group_cols: Vec<(&str, Option<&Float64Chunked>)> = spec
            .group_means
            .iter()
            .map(|g| (g.label, opt_f64_col(df, g.column)))
            .collect();

        if group_cols.iter().any(|(_, ca)| ca.is_some()) {
            let mut per_pathway: HashMap<String, Vec<String>> = HashMap::new();
            for &i in rows {
                let Some(p) = pathway_ca.get(i) else { continue };
                per_pathway
                    .entry(p.to_string())
                    .or_default()
                    .push(highest_group_label(&group_cols, i));
            }
            return Some(
                per_pathway
                    .into_iter()
                    .map(|(p, labels)| (p, mode_label(&labels)))
                    .collect(),
            );
        }
    }

    let dir_ca = opt_str_col(df, COL_PATHWAY_DIRECTION)?;
    let mut map = HashMap::new();
    for &i in rows {
        if let Some(p) = pathway_ca.get(i) {
            map.entry(p.to_string())
                .or_insert_with(|| dir_ca.get(i).unwrap_or(UNKNOWN_LABEL).to_string());
        }
    }
    Some(map)
}

/// Argmax over the declared group-mean columns. Strictly-greater scan,
/// so equal means resolve to the earliest declared column.
fn highest_group_label(group_cols: &[(&str, Option<&Float64Chunked>)], row: usize) -> String {
    let mut best: Option<(f64, &str)> = None;
    for &(label, ca) in group_cols {
        if let Some(v) = ca.and_then(|ca| ca.get(row)) {
            if best.map(|(b, _)| v > b).unwrap_or(true) {
                best = Some((v, label));
            }
        }
    }
    best.map(|(_, label)| label.to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Most frequent label; ties go to the label seen first.
fn mode_label(labels: &[String]) -> String {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(name, _)| *name == label) {
            Some((_, c)) => *c += 1,
            None => counts.push((label, 1)),
        }
    }
    let mut best: Option<(&str, u32)> = None;
    for &(name, c) in &counts {
        if best.map(|(_, bc)| c > bc).unwrap_or(true) {
            best = Some((name, c));
        }
    }
    best.map(|(name, _)| name.to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

fn median(values: &mut Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffectMetric, GroupMean};
    use polars::df;

    fn cd_spec() -> DatasetSpec {
        DatasetSpec {
            id: "test_cd",
            title: "Two-group test",
            candidates: &["x.csv"],
            effect: EffectMetric::CohensD,
            directions: &["CD5 hi", "CD5 lo"],
            group_means: &[],
            trajectory_col: None,
            aliases: &[],
        }
    }

    fn anova_spec() -> DatasetSpec {
        DatasetSpec {
            id: "test_anova",
            title: "Multi-group test",
            candidates: &["x.csv"],
            effect: EffectMetric::FStatistic,
            directions: &[],
            group_means: &[
                GroupMean { column: "early_mean", label: "Early" },
                GroupMean { column: "late_mean", label: "Late" },
                GroupMean { column: "mature_mean", label: "Mature" },
            ],
            trajectory_col: None,
            aliases: &[],
        }
    }

    fn two_pathway_df() -> DataFrame {
        df![
            "reaction_id" => &["R1", "R2", "R3", "R4", "R5"],
            "pathway" => &["P1", "P1", "P1", "P2", "P2"],
            "cohens_d" => &[1.6, 1.5, 1.4, -0.3, -0.2],
            "p_value" => &[0.01, 0.02, 0.30, 0.04, 0.90],
            "significant" => &[true, true, false, true, false],
            "genes" => &["Pfkm; Ldha", "", "Hk2", "Cpt1a", ""],
            "n_genes" => &[2i64, 0, 1, 1, 0],
            "pathway_direction" => &["CD5 hi", "CD5 hi", "CD5 hi", "CD5 lo", "CD5 lo"],
            "pathway_median_d" => &[1.5, 1.5, 1.5, -0.3, -0.3],
        ]
        .unwrap()
    }

    #[test]
    fn min_abs_effect_drops_weak_pathways() {
        let df = two_pathway_df();
        let summaries = aggregate_pathways(&df, &cd_spec(), 0.5).unwrap();
        assert_eq!(summaries.len(), 1);
        let p1 = &summaries[0];
        assert_eq!(p1.pathway, "P1");
        assert_eq!(p1.n_significant, 2);
        assert_eq!(p1.n_total, 3);
        assert_eq!(p1.pct_significant, 66.7);
        assert_eq!(p1.direction, "CD5 hi");
    }

    #[test]
    fn significant_counts_sum_to_filtered_total() {
        let df = two_pathway_df();
        let filtered = apply_filters(&df, &cd_spec(), &FilterSpec::default()).unwrap();
        let summaries = aggregate_pathways(&filtered, &cd_spec(), 0.0).unwrap();

        let summed: u32 = summaries.iter().map(|s| s.n_significant).sum();
        let in_table = filtered
            .column("significant")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .filter(|b| b.unwrap_or(false))
            .count() as u32;
        assert_eq!(summed, in_table);
        for s in &summaries {
            assert!(s.n_total >= 1);
            assert!((0.0..=100.0).contains(&s.pct_significant));
        }
    }

    #[test]
    fn ranking_is_by_abs_effect_then_pct_significant() {
        let df = df![
            "pathway" => &["A", "B", "B", "C", "C"],
            "cohens_d" => &[0.5, -2.0, -2.0, 2.0, 2.0],
            "significant" => &[true, true, false, true, true],
            "pathway_median_d" => &[0.5, -2.0, -2.0, 2.0, 2.0],
            "pathway_direction" => &["CD5 hi", "CD5 lo", "CD5 lo", "CD5 hi", "CD5 hi"],
        ]
        .unwrap();

        let summaries = aggregate_pathways(&df, &cd_spec(), 0.0).unwrap();
        let order: Vec<&str> = summaries.iter().map(|s| s.pathway.as_str()).collect();
        // C and B tie on |median_d| = 2.0; C wins on pct_significant.
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn full_ties_keep_input_order_and_rerun_is_identical() {
        let df = df![
            "pathway" => &["First", "Second", "Third"],
            "cohens_d" => &[1.0, 1.0, 1.0],
            "significant" => &[true, true, true],
            "pathway_median_d" => &[1.0, 1.0, 1.0],
            "pathway_direction" => &["CD5 hi", "CD5 hi", "CD5 hi"],
        ]
        .unwrap();

        let first = aggregate_pathways(&df, &cd_spec(), 0.0).unwrap();
        let order: Vec<&str> = first.iter().map(|s| s.pathway.as_str()).collect();
        assert_eq!(order, vec!["First", "Second", "Third"]);

        let second = aggregate_pathways(&df, &cd_spec(), 0.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn search_matches_pathway_or_genes_and_is_idempotent() {
        let df = two_pathway_df();
        let spec = cd_spec();
        let filter = FilterSpec {
            search_term: Some("LDHA".to_string()),
            ..Default::default()
        };

        let once = apply_filters(&df, &spec, &filter).unwrap();
        assert_eq!(once.height(), 1); // only R1 carries Ldha
        let twice = apply_filters(&once, &spec, &filter).unwrap();
        assert!(once.equals(&twice));

        let by_pathway = apply_filters(
            &df,
            &spec,
            &FilterSpec { search_term: Some("p2".to_string()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(by_pathway.height(), 2);
    }

    #[test]
    fn direction_filter_is_exact_match_only() {
        let df = two_pathway_df();
        let spec = cd_spec();

        let hi = apply_filters(
            &df,
            &spec,
            &FilterSpec { direction_filter: Some("CD5 hi".to_string()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(hi.height(), 3);

        // A bare "CD5" is not a substring filter; it matches nothing.
        let partial = apply_filters(
            &df,
            &spec,
            &FilterSpec { direction_filter: Some("CD5".to_string()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(partial.height(), 0);

        let all = apply_filters(
            &df,
            &spec,
            &FilterSpec { direction_filter: Some("All".to_string()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(all.height(), df.height());
    }

    #[test]
    fn significant_and_genes_toggles_stack() {
        let df = two_pathway_df();
        let spec = cd_spec();
        let filter = FilterSpec {
            significant_only: true,
            genes_only: true,
            ..Default::default()
        };
        let filtered = apply_filters(&df, &spec, &filter).unwrap();
        // R1 (sig, 2 genes) and R4 (sig, 1 gene) survive.
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn insignificant_pathway_still_appears_with_zero_pct() {
        let df = df![
            "pathway" => &["Quiet", "Quiet"],
            "cohens_d" => &[0.9, 0.8],
            "significant" => &[false, false],
            "pathway_median_d" => &[0.85, 0.85],
            "pathway_direction" => &["CD5 hi", "CD5 hi"],
        ]
        .unwrap();

        let summaries = aggregate_pathways(&df, &cd_spec(), 0.0).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].pct_significant, 0.0);
    }

    #[test]
    fn missing_significant_column_disables_the_toggle() {
        let df = df![
            "pathway" => &["P1", "P1"],
            "cohens_d" => &[1.0, 0.5],
            "pathway_median_d" => &[0.75, 0.75],
            "pathway_direction" => &["CD5 hi", "CD5 hi"],
        ]
        .unwrap();
        let spec = cd_spec();

        let filtered = apply_filters(
            &df,
            &spec,
            &FilterSpec { significant_only: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(filtered.height(), 2);

        let summaries = aggregate_pathways(&filtered, &spec, 0.0).unwrap();
        assert_eq!(summaries[0].n_significant, 0);
        assert_eq!(summaries[0].pct_significant, 0.0);
    }

    #[test]
    fn median_falls_back_to_effect_column() {
        let df = df![
            "pathway" => &["P1", "P1", "P1"],
            "cohens_d" => &[0.2, 1.0, 3.0],
            "significant" => &[true, true, true],
        ]
        .unwrap();

        let summaries = aggregate_pathways(&df, &cd_spec(), 0.0).unwrap();
        assert_eq!(summaries[0].median_d, 1.0);
        assert_eq!(summaries[0].direction, "Unknown");
    }

    #[test]
    fn highest_group_ties_resolve_to_first_declared_stage() {
        let df = df![
            "pathway" => &["P1"],
            "f_statistic" => &[4.0],
            "significant" => &[true],
            "early_mean" => &[2.0],
            "late_mean" => &[2.0],
            "mature_mean" => &[1.0],
        ]
        .unwrap();

        let summaries = aggregate_pathways(&df, &anova_spec(), 0.0).unwrap();
        assert_eq!(summaries[0].direction, "Early");
    }

    #[test]
    fn pathway_mode_ties_resolve_to_first_encountered_label() {
        let df = df![
            "pathway" => &["P1", "P1", "P1", "P1"],
            "f_statistic" => &[4.0, 3.0, 5.0, 2.0],
            "significant" => &[true, true, false, false],
            "early_mean" => &[1.0, 5.0, 1.0, 5.0],
            "late_mean" => &[3.0, 1.0, 3.0, 1.0],
            "mature_mean" => &[2.0, 2.0, 2.0, 2.0],
        ]
        .unwrap();

        // Two reactions peak Late, two peak Early; Late is seen first.
        let summaries = aggregate_pathways(&df, &anova_spec(), 0.0).unwrap();
        assert_eq!(summaries[0].direction, "Late");
    }

    #[test]
    fn empty_table_yields_empty_outputs() {
        let df = DataFrame::empty();
        let spec = cd_spec();
        let filtered = apply_filters(&df, &spec, &FilterSpec::default()).unwrap();
        assert_eq!(filtered.height(), 0);
        assert!(aggregate_pathways(&filtered, &spec, 0.0).unwrap().is_empty());
    }
}
