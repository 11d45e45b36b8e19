use polars::prelude::*;
use serde::Serialize;

// Canonical column names every variant is normalized to at load time.
pub const COL_REACTION_ID: &str = "reaction_id";
pub const COL_REACTION_NAME: &str = "reaction_name";
pub const COL_PATHWAY: &str = "pathway";
pub const COL_COHENS_D: &str = "cohens_d";
pub const COL_F_STATISTIC: &str = "f_statistic";
pub const COL_P_VALUE: &str = "p_value";
pub const COL_SIGNIFICANT: &str = "significant";
pub const COL_GENES: &str = "genes";
pub const COL_N_GENES: &str = "n_genes";
pub const COL_EC_NUMBER: &str = "ec_number";
pub const COL_PATHWAY_DIRECTION: &str = "pathway_direction";
pub const COL_PATHWAY_MEDIAN_D: &str = "pathway_median_d";
pub const COL_TRAJECTORY: &str = "developmental_trajectory";

/// Separator used by the upstream pipeline when serializing gene sets.
pub const GENE_DELIMITER: &str = "; ";
/// Upstream writes this sentinel when a reaction has no EC annotation.
pub const NO_EC_SENTINEL: &str = "No EC";
/// Direction-filter value meaning "do not filter".
pub const DIRECTION_ALL: &str = "All";
/// Label used when no direction source exists for a pathway.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Upstream significance cutoff (p < 0.05), used only when a file
/// arrives without its `significant` column.
pub const SIG_P_THRESHOLD: f64 = 0.05;

/// Which effect-size statistic a dataset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectMetric {
    CohensD,
    FStatistic,
}

impl EffectMetric {
    pub fn column(&self) -> &'static str {
        match self {
            EffectMetric::CohensD => COL_COHENS_D,
            EffectMetric::FStatistic => COL_F_STATISTIC,
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            EffectMetric::CohensD => "Median Cohen's d",
            EffectMetric::FStatistic => "Median F-statistic",
        }
    }
}

impl std::fmt::Display for EffectMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EffectMetric::CohensD => "Cohen's d",
            EffectMetric::FStatistic => "F-statistic",
        };
        write!(f, "{s}")
    }
}

/// One group-mean column of a multi-group (ANOVA-style) dataset, in
/// declared order. Declaration order breaks ties when two means are equal.
#[derive(Debug, Clone, Copy)]
pub struct GroupMean {
    pub column: &'static str,
    pub label: &'static str,
}

/// Everything a dataset variant contributes: file candidates (in fallback
/// priority order), the effect metric, its label vocabulary, and legacy
/// header spellings. The aggregation code itself is variant-agnostic.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub candidates: &'static [&'static str],
    pub effect: EffectMetric,
    /// Direction labels carried in `pathway_direction` (two-group variants).
    pub directions: &'static [&'static str],
    /// Group-mean columns of multi-group variants; empty for two-group ones.
    pub group_means: &'static [GroupMean],
    pub trajectory_col: Option<&'static str>,
    /// Legacy CSV header -> canonical column name.
    pub aliases: &'static [(&'static str, &'static str)],
}

impl DatasetSpec {
    pub fn effect_col(&self) -> &'static str {
        self.effect.column()
    }

    pub fn has_group_means(&self) -> bool {
        !self.group_means.is_empty()
    }

    /// Labels a direction filter may legally take for this variant.
    pub fn direction_vocabulary(&self) -> Vec<&'static str> {
        if self.has_group_means() {
            self.group_means.iter().map(|g| g.label).collect()
        } else {
            self.directions.to_vec()
        }
    }
}

/// The user-adjustable filter state, one recomputation per change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterSpec {
    pub search_term: Option<String>,
    pub direction_filter: Option<String>,
    pub significant_only: bool,
    pub genes_only: bool,
    pub min_abs_effect: f64,
}

impl FilterSpec {
    /// The direction label to match exactly, if the filter is active.
    /// `"All"` (and unset) mean no direction filtering.
    pub fn active_direction(&self) -> Option<&str> {
        match self.direction_filter.as_deref() {
            Some(d) if d != DIRECTION_ALL => Some(d),
            _ => None,
        }
    }

    /// Trimmed search term, if one is set and non-empty.
    pub fn active_search(&self) -> Option<&str> {
        match self.search_term.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(t),
            _ => None,
        }
    }
}

/// Split a serialized gene set into its symbols. Empty input (or a
/// string of bare delimiters) yields an empty list, never `[""]`.
pub fn split_genes(raw: &str) -> Vec<String> {
    raw.split(GENE_DELIMITER)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn polars_err(e: Box<dyn std::error::Error>) -> PolarsError {
    PolarsError::ComputeError(e.to_string().into())
}
