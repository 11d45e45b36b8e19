use crate::models::{DatasetSpec, EffectMetric};

/// CD8 CD5 hi/lo comparison, same file shape as the CD4 export with a
/// `cd8_` filename prefix.
pub fn spec() -> DatasetSpec {
    DatasetSpec {
        id: "cd8_cd5",
        title: "CD8 CD5 Hi/Lo Metabolic Pathway Explorer",
        candidates: &[
            "cd8_all_pathways_comprehensive.csv",
            "cd8_top_pathways_comprehensive.csv",
        ],
        effect: EffectMetric::CohensD,
        directions: &["CD5 hi", "CD5 lo"],
        group_means: &[],
        trajectory_col: None,
        aliases: &[
            ("cohen_d", "cohens_d"),
            ("subsystem", "pathway"),
            ("associated_genes", "genes"),
        ],
    }
}
