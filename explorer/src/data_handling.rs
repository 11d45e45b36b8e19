pub mod cache;
pub mod loader;

pub mod cd4_cd5;
pub mod cd8_cd5;
pub mod stage_anova;
pub mod stage_pairwise;
pub mod strain_anova;

use crate::models::DatasetSpec;

/// Every registered dataset variant, in the order the batch run visits them.
pub fn all_datasets() -> Vec<DatasetSpec> {
    let mut specs = vec![cd4_cd5::spec(), cd8_cd5::spec()];
    specs.extend(stage_pairwise::specs());
    specs.push(stage_anova::spec());
    specs.push(strain_anova::spec());
    specs
}
