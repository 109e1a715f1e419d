//! Residences-per-zip reference table.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::DatasetError;
use crate::coerce;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopulationRow {
    zip_code: String,
    residences: String,
}

/// Reads the population table at `path`.
///
/// # Errors
///
/// * If the file cannot be opened
/// * If the table is malformed (see [`read_population`])
pub fn load_population(path: &Path) -> Result<BTreeMap<u32, u64>, DatasetError> {
    let file = crate::open(path)?;
    let population = read_population(file, &path.display().to_string())?;

    log::info!(
        "Read population for {} zip codes from {}",
        population.len(),
        path.display()
    );

    Ok(population)
}

/// Reads a `zipCode,residences` table. Rows whose residence count is a
/// missing-value sentinel are left out, so the zip's population is
/// unknown.
///
/// # Errors
///
/// * If the header lacks `zipCode` or `residences`
/// * If a zip code is missing or any present value does not parse
pub fn read_population(
    reader: impl Read,
    source: &str,
) -> Result<BTreeMap<u32, u64>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers().map_err(|e| DatasetError::Csv {
        path: source.to_string(),
        source: e,
    })?;
    for column in ["zipCode", "residences"] {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(DatasetError::MissingColumn {
                path: source.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut population = BTreeMap::new();
    for (row, result) in reader.deserialize::<PopulationRow>().enumerate() {
        let record = result.map_err(|e| DatasetError::Csv {
            path: source.to_string(),
            source: e,
        })?;

        let invalid = |column: &str, value: &str| DatasetError::InvalidValue {
            path: source.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        };

        let zip_code = coerce::count(&record.zip_code)
            .map_err(|_| invalid("zipCode", &record.zip_code))?
            .ok_or_else(|| DatasetError::MissingValue {
                path: source.to_string(),
                row,
                column: "zipCode".to_string(),
            })?;
        let residences = coerce::amount(&record.residences)
            .map_err(|_| invalid("residences", &record.residences))?;

        if let Some(residences) = residences {
            population.insert(zip_code, residences);
        }
    }

    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_population_and_skips_unknown_counts() {
        let table = "zipCode,residences\n5000,41250\n5700,unknown\n5800,8410.0\n";
        let population = read_population(table.as_bytes(), "population.csv").unwrap();
        assert_eq!(population.get(&5000), Some(&41_250));
        assert_eq!(population.get(&5700), None);
        assert_eq!(population.get(&5800), Some(&8_410));
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = read_population("zipCode,people\n5000,1\n".as_bytes(), "population.csv")
            .unwrap_err();
        assert!(
            matches!(err, DatasetError::MissingColumn { ref column, .. } if column == "residences")
        );
    }

    #[test]
    fn invalid_count_is_fatal() {
        let err = read_population("zipCode,residences\n5000,many\n".as_bytes(), "population.csv")
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidValue { row: 0, .. }));
    }
}
