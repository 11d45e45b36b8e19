use crate::models::{DatasetSpec, EffectMetric, GroupMean};

/// Mouse strain comparison (B6 / NOD / BALB/c), F-statistic based.
pub fn spec() -> DatasetSpec {
    DatasetSpec {
        id: "strain_anova",
        title: "Mouse Strain Metabolic Pathway Explorer",
        candidates: &[
            "strain_anova_all_pathways.csv",
            "strain_anova_pathways.csv",
        ],
        effect: EffectMetric::FStatistic,
        directions: &[],
        group_means: &[
            GroupMean { column: "b6_mean", label: "B6" },
            GroupMean { column: "nod_mean", label: "NOD" },
            GroupMean { column: "balbc_mean", label: "BALB/c" },
        ],
        trajectory_col: None,
        aliases: &[
            ("f_stat", "f_statistic"),
            ("anova_p_value", "p_value"),
            ("subsystem", "pathway"),
        ],
    }
}
