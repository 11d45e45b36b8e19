use crate::models::{DatasetSpec, EffectMetric};

/// CD4 CD5 hi/lo comparison. The comprehensive all-pathways export is
/// preferred; older runs only produced the top-pathways file.
pub fn spec() -> DatasetSpec {
    DatasetSpec {
        id: "cd4_cd5",
        title: "CD4 CD5 Hi/Lo Metabolic Pathway Explorer",
        candidates: &[
            "all_pathways_comprehensive.csv",
            "top_pathways_comprehensive.csv",
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
