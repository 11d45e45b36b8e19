use crate::models::{DatasetSpec, EffectMetric};

const ALIASES: &[(&str, &str)] = &[
    ("cohen_d", "cohens_d"),
    ("subsystem", "pathway"),
    ("higher_stage", "pathway_direction"),
];

/// The three pairwise developmental-stage comparisons. Each is a
/// two-group Cohen's d dataset whose direction labels are the stage names.
pub fn specs() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec {
            id: "early_vs_late",
            title: "Developmental Stages: Early vs Late",
            candidates: &[
                "early_vs_late_all_pathways.csv",
                "early_vs_late_pathways.csv",
            ],
            effect: EffectMetric::CohensD,
            directions: &["Early", "Late"],
            group_means: &[],
            trajectory_col: None,
            aliases: ALIASES,
        },
        DatasetSpec {
            id: "late_vs_mature",
            title: "Developmental Stages: Late vs Mature",
            candidates: &[
                "late_vs_mature_all_pathways.csv",
                "late_vs_mature_pathways.csv",
            ],
            effect: EffectMetric::CohensD,
            directions: &["Late", "Mature"],
            group_means: &[],
            trajectory_col: None,
            aliases: ALIASES,
        },
        DatasetSpec {
            id: "early_vs_mature",
            title: "Developmental Stages: Early vs Mature",
            candidates: &[
                "early_vs_mature_all_pathways.csv",
                "early_vs_mature_pathways.csv",
            ],
            effect: EffectMetric::CohensD,
            directions: &["Early", "Mature"],
            group_means: &[],
            trajectory_col: None,
            aliases: ALIASES,
        },
    ]
}
