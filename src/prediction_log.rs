use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::types::{PredictionRecord, LOG_HEADERS};

/// Append-only CSV record of every successful prediction.
///
/// Appends go through a single lock so rows from concurrent requests never
/// interleave. Nothing here rewrites or deletes existing rows.
pub struct PredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Parsed contents of the log for the HTML view.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with a header-only body if it doesn't exist yet.
    /// Returns whether a new file was created.
    pub fn ensure_header(&self) -> Result<bool> {
        let _guard = self.lock.lock();
        self.write_header_if_missing()
    }

    fn write_header_if_missing(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let mut wtr = csv::Writer::from_path(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;
        wtr.write_record(LOG_HEADERS)?;
        wtr.flush()?;
        Ok(true)
    }

    /// Append one row and flush it before returning.
    pub fn append(&self, record: &PredictionRecord) -> Result<()> {
        let _guard = self.lock.lock();
        // the file may have been removed since startup
        self.write_header_if_missing()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {} for append", self.path.display()))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.serialize(record)
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        wtr.flush()?;
        Ok(())
    }

    /// Raw file bytes, `None` when nothing has been written yet.
    pub fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock();
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    pub fn read_table(&self) -> Result<Option<LogTable>> {
        let Some(bytes) = self.read_raw()? else {
            return Ok(None);
        };
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes.as_slice());
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let rows = rdr
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(LogTable { headers, rows }))
    }

    /// Typed rows, mostly useful for checking what was persisted.
    pub fn records(&self) -> Result<Vec<PredictionRecord>> {
        let Some(bytes) = self.read_raw()? else {
            return Ok(Vec::new());
        };
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let records = rdr
            .deserialize()
            .collect::<Result<Vec<PredictionRecord>, _>>()
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(weather: &str, y: f64) -> PredictionRecord {
        PredictionRecord {
            timestamp: "2024-07-04 12:00:00".into(),
            month: "July".into(),
            day: 4,
            year: 2024,
            day_of_week: "Thursday".into(),
            time_of_day: "Afternoon".into(),
            temperature: 30.0,
            weather: weather.into(),
            holiday: "Regular Day".into(),
            university_event: "Regular Day".into(),
            predicted_cups_sold: y,
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("out").join("predictions.csv"));
        assert!(log.ensure_header().unwrap());
        assert!(!log.ensure_header().unwrap());
        let raw = String::from_utf8(log.read_raw().unwrap().unwrap()).unwrap();
        assert_eq!(raw.trim_end(), LOG_HEADERS.join(","));
        let table = log.read_table().unwrap().unwrap();
        assert_eq!(table.headers.len(), 11);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn append_is_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("predictions.csv"));
        log.ensure_header().unwrap();
        log.append(&record("Sunny", 123.46)).unwrap();
        log.append(&record("Cloudy, windy", 80.0)).unwrap();

        let raw = String::from_utf8(log.read_raw().unwrap().unwrap()).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2024-07-04 12:00:00,July,4,2024,Thursday,Afternoon,30.0,Sunny,Regular Day,Regular Day,123.46"
        );
        assert!(lines[2].contains("\"Cloudy, windy\""));
        assert!(lines[2].ends_with(",80.0"));

        let records = log.records().unwrap();
        assert_eq!(records, vec![record("Sunny", 123.46), record("Cloudy, windy", 80.0)]);
    }

    #[test]
    fn append_recreates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("predictions.csv"));
        assert!(log.read_raw().unwrap().is_none());
        assert!(log.read_table().unwrap().is_none());
        log.append(&record("Rainy", 12.5)).unwrap();
        let table = log.read_table().unwrap().unwrap();
        assert_eq!(table.headers[0], "Timestamp");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][7], "Rainy");
    }
}
