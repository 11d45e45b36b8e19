use std::fs::{create_dir_all, File};
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

pub fn read_csv(file_path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()
}

pub fn dataframe_to_csv(df: &mut DataFrame, path: &Path) -> PolarsResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| crate::models::polars_err(Box::new(e)))?;
    }
    let mut file = File::create(path).map_err(|e| crate::models::polars_err(Box::new(e)))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

// Tolerant column accessors: a missing column (or one with an unusable
// dtype that slipped past the loader) deactivates the dependent feature
// instead of failing the whole recomputation.

pub fn opt_str_col<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    match df.column(name) {
        Ok(c) => match c.str() {
            Ok(ca) => Some(ca),
            Err(_) => {
                debug!("column '{}' is not utf8, treating it as absent", name);
                None
            }
        },
        Err(_) => None,
    }
}

pub fn opt_f64_col<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Float64Chunked> {
    match df.column(name) {
        Ok(c) => match c.f64() {
            Ok(ca) => Some(ca),
            Err(_) => {
                debug!("column '{}' is not f64, treating it as absent", name);
                None
            }
        },
        Err(_) => None,
    }
}

pub fn opt_bool_col<'a>(df: &'a DataFrame, name: &str) -> Option<&'a BooleanChunked> {
    match df.column(name) {
        Ok(c) => match c.bool() {
            Ok(ca) => Some(ca),
            Err(_) => {
                debug!("column '{}' is not boolean, treating it as absent", name);
                None
            }
        },
        Err(_) => None,
    }
}

pub fn opt_i64_col<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Int64Chunked> {
    match df.column(name) {
        Ok(c) => match c.i64() {
            Ok(ca) => Some(ca),
            Err(_) => {
                debug!("column '{}' is not i64, treating it as absent", name);
                None
            }
        },
        Err(_) => None,
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}
