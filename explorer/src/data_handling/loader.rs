use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, error, info, warn};

use crate::helper_functions::{has_column, read_csv};
use crate::models::{
    split_genes, DatasetSpec, COL_GENES, COL_N_GENES, COL_PATHWAY, COL_PATHWAY_MEDIAN_D,
    COL_P_VALUE, COL_SIGNIFICANT, SIG_P_THRESHOLD,
};

/// Walk the dataset's candidate filenames in priority order and return
/// the first one that exists on disk.
pub fn resolve_data_file(data_dir: &Path, spec: &DatasetSpec) -> Option<PathBuf> {
    for candidate in spec.candidates {
        let path = data_dir.join(candidate);
        if path.is_file() {
            return Some(path);
        }
        debug!("{}: candidate '{}' not present", spec.id, candidate);
    }
    None
}

/// Load and normalize one dataset. `Ok(None)` means no candidate file
/// exists; the batch run reports it and moves on. Read or schema errors
/// on a file that does exist are real errors.
pub fn load_dataset(data_dir: &Path, spec: &DatasetSpec) -> PolarsResult<Option<DataFrame>> {
    let Some(path) = resolve_data_file(data_dir, spec) else {
        warn!(
            "{}: no data file found (tried {:?} under {})",
            spec.id,
            spec.candidates,
            data_dir.display()
        );
        return Ok(None);
    };

    info!("Reading {} data from {}", spec.id, path.display());
    let df = match read_csv(&path) {
        Ok(df) => df,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return Err(e);
        }
    };
    debug!("{}: loaded {} rows, {} cols", spec.id, df.height(), df.width());

    let df = normalize_schema(df, spec)?;
    Ok(Some(df))
}

/// Bring whatever the CSV actually has onto the canonical schema:
/// legacy headers renamed, numeric columns as Float64, `significant`
/// as a real boolean, `n_genes` present whenever `genes` is.
fn normalize_schema(mut df: DataFrame, spec: &DatasetSpec) -> PolarsResult<DataFrame> {
    for &(old, new) in spec.aliases {
        if has_column(&df, old) && !has_column(&df, new) {
            debug!("{}: renaming legacy column '{}' -> '{}'", spec.id, old, new);
            df.rename(old, PlSmallStr::from(new))?;
        }
    }

    let mut float_cols: Vec<&str> = vec![spec.effect_col(), COL_P_VALUE, COL_PATHWAY_MEDIAN_D];
    float_cols.extend(spec.group_means.iter().map(|g| g.column));
    for name in float_cols {
        if has_column(&df, name) && df.column(name)?.dtype() != &DataType::Float64 {
            let s = df.column(name)?.cast(&DataType::Float64)?;
            df.with_column(s)?;
        }
    }

    // Rows without a pathway cannot be grouped; drop them up front.
    if has_column(&df, COL_PATHWAY) {
        let before = df.height();
        df = df
            .lazy()
            .filter(col(COL_PATHWAY).is_not_null())
            .collect()?;
        if df.height() < before {
            warn!("{}: dropped {} row(s) with no pathway", spec.id, before - df.height());
        }
    }

    let df = coerce_significant(df, spec.id)?;
    let df = ensure_n_genes(df, spec.id)?;
    Ok(df)
}

fn truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// `significant` arrives as booleans, `True`/`False` strings, or 0/1
/// depending on which upstream run wrote the file. When the column is
/// missing entirely it is derived from `p_value < 0.05`; when that is
/// missing too the significance features simply stay inactive.
fn coerce_significant(mut df: DataFrame, dataset_id: &str) -> PolarsResult<DataFrame> {
    let replacement: Option<BooleanChunked> = match df.column(COL_SIGNIFICANT) {
        Ok(c) => match c.dtype() {
            DataType::Boolean => None,
            DataType::String => {
                debug!("{}: coercing string 'significant' column to boolean", dataset_id);
                let ca = c.str()?;
                Some(ca.into_iter().map(|opt| opt.map(truthy)).collect())
            }
            DataType::Int32
            | DataType::Int64
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {
                debug!("{}: coercing numeric 'significant' column to boolean", dataset_id);
                let casted = c.cast(&DataType::Float64)?;
                let ca = casted.f64()?;
                Some(ca.into_iter().map(|opt| opt.map(|v| v != 0.0)).collect())
            }
            dt => {
                warn!(
                    "{}: 'significant' has unusable dtype {:?}, significance features disabled",
                    dataset_id, dt
                );
                None
            }
        },
        Err(_) => match df.column(COL_P_VALUE) {
            Ok(p) => {
                warn!(
                    "{}: no 'significant' column, deriving it from p_value < {}",
                    dataset_id, SIG_P_THRESHOLD
                );
                let casted = p.cast(&DataType::Float64)?;
                let ca = casted.f64()?;
                Some(
                    ca.into_iter()
                        .map(|opt| opt.map(|p| p < SIG_P_THRESHOLD))
                        .collect(),
                )
            }
            Err(_) => {
                warn!(
                    "{}: neither 'significant' nor 'p_value' present, significance features disabled",
                    dataset_id
                );
                None
            }
        },
    };

    if let Some(ca) = replacement {
        df.with_column(ca.with_name(COL_SIGNIFICANT.into()).into_series())?;
    }
    Ok(df)
}

fn ensure_n_genes(mut df: DataFrame, dataset_id: &str) -> PolarsResult<DataFrame> {
    if has_column(&df, COL_N_GENES) {
        if df.column(COL_N_GENES)?.dtype() != &DataType::Int64 {
            let s = df.column(COL_N_GENES)?.cast(&DataType::Int64)?;
            df.with_column(s)?;
        }
        return Ok(df);
    }

    let counts: Option<Vec<i64>> = match df.column(COL_GENES) {
        Ok(c) => match c.str() {
            Ok(ca) => Some(
                ca.into_iter()
                    .map(|opt| opt.map(|g| split_genes(g).len() as i64).unwrap_or(0))
                    .collect(),
            ),
            Err(_) => None,
        },
        Err(_) => None,
    };

    if let Some(counts) = counts {
        debug!("{}: deriving n_genes from the genes column", dataset_id);
        df.with_column(Int64Chunked::from_vec(COL_N_GENES.into(), counts).into_series())?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffectMetric, COL_COHENS_D};
    use std::fs;

    fn test_spec() -> DatasetSpec {
        DatasetSpec {
            id: "test",
            title: "Test dataset",
            candidates: &["primary.csv", "fallback.csv"],
            effect: EffectMetric::CohensD,
            directions: &["CD5 hi", "CD5 lo"],
            group_means: &[],
            trajectory_col: None,
            aliases: &[("cohen_d", "cohens_d")],
        }
    }

    #[test]
    fn falls_back_to_secondary_candidate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("fallback.csv"),
            "reaction_id,pathway,cohens_d,p_value\nR1,Glycolysis,1.5,0.01\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn primary_candidate_wins_when_both_exist() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohens_d,p_value\nR1,FromPrimary,1.5,0.01\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("fallback.csv"),
            "reaction_id,pathway,cohens_d,p_value\nR1,FromFallback,1.5,0.01\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        let pathway = df.column("pathway").unwrap().str().unwrap().get(0).unwrap();
        assert_eq!(pathway, "FromPrimary");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dataset(dir.path(), &test_spec()).unwrap().is_none());
    }

    #[test]
    fn legacy_effect_header_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohen_d,p_value\nR1,Glycolysis,1.5,0.01\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        assert!(has_column(&df, COL_COHENS_D));
        assert!(!has_column(&df, "cohen_d"));
    }

    #[test]
    fn rows_without_a_pathway_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohens_d,p_value\n\
             R1,Glycolysis,1.5,0.01\n\
             R2,,0.2,0.80\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn string_significant_is_coerced_to_boolean() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohens_d,p_value,significant\n\
             R1,Glycolysis,1.5,0.01,yes\n\
             R2,Glycolysis,0.2,0.80,no\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        let sig = df.column(COL_SIGNIFICANT).unwrap().bool().unwrap();
        assert_eq!(sig.get(0), Some(true));
        assert_eq!(sig.get(1), Some(false));
    }

    #[test]
    fn significant_is_derived_from_p_value_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohens_d,p_value\n\
             R1,Glycolysis,1.5,0.01\n\
             R2,Glycolysis,0.2,0.50\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        let sig = df.column(COL_SIGNIFICANT).unwrap().bool().unwrap();
        assert_eq!(sig.get(0), Some(true));
        assert_eq!(sig.get(1), Some(false));
    }

    #[test]
    fn n_genes_is_derived_from_gene_strings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("primary.csv"),
            "reaction_id,pathway,cohens_d,p_value,genes\n\
             R1,Glycolysis,1.5,0.01,Pfkm; Ldha\n\
             R2,Glycolysis,0.2,0.50,\n",
        )
        .unwrap();

        let df = load_dataset(dir.path(), &test_spec()).unwrap().unwrap();
        let n = df.column(COL_N_GENES).unwrap().i64().unwrap();
        assert_eq!(n.get(0), Some(2));
        assert_eq!(n.get(1), Some(0));
    }
}
