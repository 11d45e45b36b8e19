use std::cmp::Ordering;
use std::collections::HashSet;

use polars::prelude::*;
use serde::Serialize;

use crate::helper_functions::{opt_bool_col, opt_f64_col, opt_str_col};
use crate::models::{
    split_genes, DatasetSpec, COL_EC_NUMBER, COL_PATHWAY, COL_P_VALUE, COL_REACTION_ID,
    COL_REACTION_NAME, NO_EC_SENTINEL,
};

/// Keep the filtered table's rows for the selected pathways, sorted
/// descending by absolute effect size, ties in input order.
pub fn select_reactions(
    filtered: &DataFrame,
    spec: &DatasetSpec,
    selected_pathways: &[String],
) -> PolarsResult<DataFrame> {
    let Some(pathway_ca) = opt_str_col(filtered, COL_PATHWAY) else {
        return Ok(filtered.head(Some(0)));
    };
    if selected_pathways.is_empty() {
        return Ok(filtered.head(Some(0)));
    }

    let wanted: HashSet<&str> = selected_pathways.iter().map(String::as_str).collect();
    let mut rows: Vec<usize> = (0..filtered.height())
        .filter(|&i| pathway_ca.get(i).map(|p| wanted.contains(p)).unwrap_or(false))
        .collect();

    let effect_ca = opt_f64_col(filtered, spec.effect_col());
    let abs_effect = |i: usize| {
        effect_ca
            .and_then(|ca| ca.get(i))
            .map(f64::abs)
            .unwrap_or(0.0)
    };
    rows.sort_by(|&a, &b| {
        abs_effect(b)
            .partial_cmp(&abs_effect(a))
            .unwrap_or(Ordering::Equal)
    });

    let idx = IdxCa::from_vec("rows".into(), rows.iter().map(|&i| i as IdxSize).collect());
    filtered.take(&idx)
}

/// Everything the single-reaction detail view shows. The `"No EC"`
/// sentinel and empty strings are folded into `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionDetail {
    pub reaction_id: String,
    pub reaction_name: String,
    pub pathway: String,
    pub effect: f64,
    pub p_value: Option<f64>,
    pub significant: bool,
    pub genes: Vec<String>,
    pub ec_number: Option<String>,
    pub trajectory: Option<String>,
}

pub fn reaction_detail(df: &DataFrame, spec: &DatasetSpec, row: usize) -> Option<ReactionDetail> {
    if row >= df.height() {
        return None;
    }

    let get_str = |name: &str| {
        opt_str_col(df, name)
            .and_then(|ca| ca.get(row))
            .map(str::to_string)
    };

    let genes = get_str(crate::models::COL_GENES)
        .map(|g| split_genes(&g))
        .unwrap_or_default();

    let ec_number = get_str(COL_EC_NUMBER).filter(|ec| !ec.is_empty() && ec != NO_EC_SENTINEL);

    let trajectory = spec
        .trajectory_col
        .and_then(|col| get_str(col))
        .filter(|t| !t.is_empty());

    Some(ReactionDetail {
        reaction_id: get_str(COL_REACTION_ID).unwrap_or_default(),
        reaction_name: get_str(COL_REACTION_NAME).unwrap_or_default(),
        pathway: get_str(COL_PATHWAY).unwrap_or_default(),
        effect: opt_f64_col(df, spec.effect_col())
            .and_then(|ca| ca.get(row))
            .unwrap_or(0.0),
        p_value: opt_f64_col(df, COL_P_VALUE).and_then(|ca| ca.get(row)),
        significant: opt_bool_col(df, crate::models::COL_SIGNIFICANT)
            .and_then(|ca| ca.get(row))
            .unwrap_or(false),
        genes,
        ec_number,
        trajectory,
    })
}

/// Per-word pathway-name hints for a search that matched nothing.
pub fn search_suggestions(df: &DataFrame, term: &str, limit: usize) -> Vec<String> {
    let Some(pathway_ca) = opt_str_col(df, COL_PATHWAY) else {
        return Vec::new();
    };

    let mut unique: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for opt in pathway_ca.into_iter() {
        if let Some(p) = opt {
            if seen.insert(p) {
                unique.push(p);
            }
        }
    }

    let mut suggestions: Vec<String> = Vec::new();
    for word in term.split_whitespace() {
        let needle = word.to_lowercase();
        for name in &unique {
            if suggestions.len() >= limit {
                return suggestions;
            }
            if name.to_lowercase().contains(&needle)
                && !suggestions.iter().any(|s| s == name)
            {
                suggestions.push((*name).to_string());
            }
        }
    }
    suggestions
}
