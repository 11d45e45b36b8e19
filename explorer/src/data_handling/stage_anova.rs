use crate::models::{DatasetSpec, EffectMetric, GroupMean, COL_TRAJECTORY};

/// Three-way developmental ANOVA (Early / Late / Mature). The declared
/// order of the group-mean columns is the tie-break order when a
/// reaction's means are equal.
pub fn spec() -> DatasetSpec {
    DatasetSpec {
        id: "stage_anova",
        title: "Developmental Stages: Three-Way ANOVA",
        candidates: &[
            "stage_anova_all_pathways.csv",
            "stage_anova_pathways.csv",
        ],
        effect: EffectMetric::FStatistic,
        directions: &[],
        group_means: &[
            GroupMean { column: "early_mean", label: "Early" },
            GroupMean { column: "late_mean", label: "Late" },
            GroupMean { column: "mature_mean", label: "Mature" },
        ],
        trajectory_col: Some(COL_TRAJECTORY),
        aliases: &[
            ("f_stat", "f_statistic"),
            ("anova_p_value", "p_value"),
            ("subsystem", "pathway"),
            ("trajectory", "developmental_trajectory"),
        ],
    }
}
