//! File I/O around the feature pipeline and the tick exporter.
//!
//! Observations are read from and written to CSV, the fitted vocabulary is
//! stored as JSON, and snapshots are exported as a JSON array or JSON lines.
//! Every writer creates missing parent directories and flushes before
//! returning.

use crate::core::encoding::EncodingVocabulary;
use crate::core::features::EngineeredTable;
use crate::core::observation::Observation;
use crate::core::snapshot::TickSnapshot;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Columns every observation CSV must carry.
pub const OBSERVATION_COLUMNS: [&str; 10] = [
    "timestamp",
    "water_level",
    "rainfall_mm",
    "pet_mm",
    "avg_temp_c",
    "lat",
    "lon",
    "elevation",
    "soil_type",
    "land_use",
];

/// Errors from reading or writing dataset files.
#[derive(Debug)]
pub enum DatasetError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    Json(serde_json::Error),
    MissingColumn(&'static str),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io { path, source } => {
                write!(f, "I/O error on {}: {source}", path.display())
            }
            DatasetError::Csv(e) => write!(f, "CSV error: {e}"),
            DatasetError::Json(e) => write!(f, "JSON error: {e}"),
            DatasetError::MissingColumn(column) => {
                write!(f, "Missing required column '{column}'")
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io { source, .. } => Some(source),
            DatasetError::Csv(e) => Some(e),
            DatasetError::Json(e) => Some(e),
            DatasetError::MissingColumn(_) => None,
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        DatasetError::Csv(e)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        DatasetError::Json(e)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create_file(path: &Path) -> Result<File, DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(path))?;
    }
    File::create(path).map_err(io_error(path))
}

/// Snapshot export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One pretty-printed JSON array
    #[default]
    Json,
    /// One compact JSON object per line
    Jsonl,
}

/// Read observations from any CSV source with a header row.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    if let Some(missing) = OBSERVATION_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(DatasetError::MissingColumn(*missing));
    }

    let observations = reader
        .deserialize::<Observation>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(observations)
}

/// Load observations from a CSV file.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, DatasetError> {
    let file = File::open(path).map_err(io_error(path))?;
    let observations = read_observations(file)?;
    tracing::info!(path = %path.display(), rows = observations.len(), "observations loaded");
    Ok(observations)
}

/// Write observations as CSV with the standard header.
pub fn write_observations(path: &Path, observations: &[Observation]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_writer(create_file(path)?);
    for observation in observations {
        writer.serialize(observation)?;
    }
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Write an engineered table as CSV.
pub fn write_table(path: &Path, table: &EngineeredTable) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_writer(create_file(path)?);
    writer.write_record(table.header())?;
    for row in &table.rows {
        writer.write_record(EngineeredTable::record(row))?;
    }
    writer.flush().map_err(io_error(path))?;
    tracing::info!(path = %path.display(), rows = table.len(), "engineered table written");
    Ok(())
}

pub fn save_vocabulary(path: &Path, vocabulary: &EncodingVocabulary) -> Result<(), DatasetError> {
    let json = serde_json::to_string_pretty(vocabulary)?;
    let mut file = create_file(path)?;
    file.write_all(json.as_bytes()).map_err(io_error(path))?;
    Ok(())
}

pub fn load_vocabulary(path: &Path) -> Result<EncodingVocabulary, DatasetError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(serde_json::from_str(&content)?)
}

/// Export snapshots, returning how many were written.
pub fn export_snapshots(
    path: &Path,
    snapshots: &[TickSnapshot],
    format: ExportFormat,
) -> Result<usize, DatasetError> {
    let mut out = BufWriter::new(create_file(path)?);
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, snapshots)?;
            writeln!(out).map_err(io_error(path))?;
        }
        ExportFormat::Jsonl => {
            for snapshot in snapshots {
                serde_json::to_writer(&mut out, snapshot)?;
                writeln!(out).map_err(io_error(path))?;
            }
        }
    }
    out.flush().map_err(io_error(path))?;
    tracing::info!(path = %path.display(), count = snapshots.len(), "snapshots exported");
    Ok(snapshots.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::core::features::FeatureEngineer;

    const SAMPLE: &str = "\
timestamp,water_level,rainfall_mm,pet_mm,avg_temp_c,lat,lon,elevation,soil_type,land_use
2020-01-02,61.5,2.0,1.0,25.0,10.0,78.0,200,Sand,Urban
2020-01-01,60.0,0.0,1.5,24.0,10.0,78.0,200,Clay,Agri
";

    #[test]
    fn test_read_observations() {
        let observations = read_observations(SAMPLE.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].water_level, 61.5);
        assert_eq!(observations[1].soil_type, "Clay");
        assert_eq!(
            observations[1].timestamp.to_rfc3339(),
            "2020-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_column() {
        let csv = "timestamp,water_level\n2020-01-01,60.0\n";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("rainfall_mm")));
    }

    #[test]
    fn test_bad_timestamp_is_csv_error() {
        let csv = SAMPLE.replace("2020-01-02", "yesterday");
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_observation_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw").join("observations.csv");
        let observations = read_observations(SAMPLE.as_bytes()).unwrap();

        write_observations(&path, &observations).unwrap();
        let reloaded = load_observations(&path).unwrap();
        assert_eq!(reloaded, observations);
    }

    #[test]
    fn test_write_table_and_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let observations = read_observations(SAMPLE.as_bytes()).unwrap();
        let engineer = FeatureEngineer::new(FeatureConfig {
            lag: 1,
            short_window: 1,
            long_window: 1,
            horizon: 1,
        })
        .unwrap();
        let (table, vocabulary) = engineer.fit_transform(observations).unwrap();

        let table_path = dir.path().join("prepared.csv");
        write_table(&table_path, &table).unwrap();
        let content = fs::read_to_string(&table_path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("timestamp,water_level"));
        assert!(header.ends_with("land_use_Agri,land_use_Urban"));
        assert_eq!(lines.count(), table.len());

        let vocab_path = dir.path().join("vocabulary.json");
        save_vocabulary(&vocab_path, &vocabulary).unwrap();
        assert_eq!(load_vocabulary(&vocab_path).unwrap(), vocabulary);
    }

    #[test]
    fn test_load_unsorted_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        fs::write(
            &path,
            r#"{"features":[{"name":"soil_type","categories":["Sand","Clay","Loam"]}]}"#,
        )
        .unwrap();

        let vocabulary = load_vocabulary(&path).unwrap();
        let observations = read_observations(SAMPLE.as_bytes()).unwrap();
        let encoded = vocabulary.encode(&observations[0]);
        assert_eq!(encoded, vec![1.0, 0.0, 0.0]);
        assert_eq!(vocabulary.decode("soil_type", &encoded), Some("Sand"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_vocabulary(Path::new("/nonexistent/vocabulary.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/vocabulary.json"));
    }
}
