use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::data_handling::loader::load_dataset;
use crate::models::DatasetSpec;

/// Keyed table cache: one parsed table per dataset id. Repeated loads
/// return the stored table without touching the file again; `clear`
/// discards an entry so the next access re-derives it from disk. There
/// is no staleness detection, clearing is the only invalidation.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<String, DataFrame>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for this dataset, loading it first when
    /// absent. `Ok(None)` propagates the loader's "no file found" outcome
    /// and is not cached, so a file dropped in later is picked up.
    pub fn get_or_load(
        &mut self,
        data_dir: &Path,
        spec: &DatasetSpec,
    ) -> PolarsResult<Option<DataFrame>> {
        if let Some(df) = self.entries.get(spec.id) {
            debug!("cache hit for {}", spec.id);
            return Ok(Some(df.clone()));
        }

        match load_dataset(data_dir, spec)? {
            Some(df) => {
                self.entries.insert(spec.id.to_string(), df.clone());
                Ok(Some(df))
            }
            None => Ok(None),
        }
    }

    pub fn clear(&mut self, dataset_id: &str) -> bool {
        let removed = self.entries.remove(dataset_id).is_some();
        if removed {
            info!("cleared cached table for {}", dataset_id);
        }
        removed
    }

    pub fn clear_all(&mut self) {
        let n = self.entries.len();
        self.entries.clear();
        info!("cleared {} cached table(s)", n);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
