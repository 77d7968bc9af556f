//! Append-only CSV persistence for metrics snapshots.

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};

use crate::collector::Metrics;

/// Writer over the benchmark's CSV record. The header row is written only
/// when the file is first created; reopening an existing file appends.
pub struct MetricsSink {
    writer: csv::Writer<File>,
}

impl MetricsSink {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {path:?}"))?;
        let fresh = file.metadata().context("reading file metadata")?.len() == 0;

        let mut writer = csv::WriterBuilder::new().from_writer(file);
        if fresh {
            writer
                .write_record(Metrics::headers())
                .context("writing CSV header")?;
            writer.flush().context("flushing CSV header")?;
        }
        Ok(Self { writer })
    }

    /// Append one row and flush it. A row that cannot be written or flushed
    /// is fatal to the run; a silently dropped row would corrupt the record.
    pub fn append(&mut self, metrics: &Metrics) -> Result<()> {
        self.writer
            .write_record(metrics.values())
            .context("writing CSV row")?;
        self.writer.flush().context("flushing CSV row")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_once_and_appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut sink = MetricsSink::open(&path).unwrap();
        sink.append(&Metrics::default()).unwrap();
        drop(sink);

        let mut sink = MetricsSink::open(&path).unwrap();
        sink.append(&Metrics::default()).unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,api_latency,file_count"));
        assert!(!lines[1].starts_with("timestamp"));
    }

    #[test]
    fn row_width_matches_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut sink = MetricsSink::open(&path).unwrap();
        sink.append(&Metrics::default()).unwrap();
        drop(sink);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().len();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), headers);
    }
}
