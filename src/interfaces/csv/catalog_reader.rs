use crate::domain::catalog::Catalog;
use crate::error::{EconomyError, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const CLOTHES_FILE: &str = "clothes.csv";
pub const WORKERS_FILE: &str = "workers.csv";
pub const WORKER_TIERS_FILE: &str = "worker_tiers.csv";

/// Reads typed rows from a CSV source, trimming whitespace around fields.
fn read_rows<T: DeserializeOwned, R: Read>(source: R) -> Result<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
        .into_deserialize()
        .map(|result| result.map_err(EconomyError::from))
        .collect()
}

/// Loads `clothes.csv`, `workers.csv` and `worker_tiers.csv` from `dir`.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Catalog> {
    let dir = dir.as_ref();
    from_readers(
        File::open(dir.join(CLOTHES_FILE))?,
        File::open(dir.join(WORKERS_FILE))?,
        File::open(dir.join(WORKER_TIERS_FILE))?,
    )
}

/// Reads the three catalog tables and validates them together.
pub fn from_readers<C: Read, W: Read, T: Read>(clothes: C, workers: W, tiers: T) -> Result<Catalog> {
    let catalog = Catalog {
        clothes: read_rows(clothes)?,
        workers: read_rows(workers)?,
        tiers: read_rows(tiers)?,
    };
    catalog.validate()?;
    Ok(catalog)
}
