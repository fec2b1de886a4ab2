//! # Newline-delimited JSON
//!
//! One JSON value per line. Blank lines are skipped on read; every record is
//! written compact, followed by `\n`.
//!
//! Lines longer than `MAX_LINE_BYTES` are rejected before parsing.

use crate::MotelError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Maximum accepted length of one record line (64 MB).
pub const MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Read every record from a reader.
///
/// Errors carry the 1-based line number of the offending record.
pub fn read_jsonl<T: DeserializeOwned>(reader: impl BufRead) -> Result<Vec<T>, MotelError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MotelError::IoError(e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.len() > MAX_LINE_BYTES {
            return Err(MotelError::DeserializationError(format!(
                "line {}: record exceeds {} bytes",
                index + 1,
                MAX_LINE_BYTES
            )));
        }
        let record = serde_json::from_str(trimmed).map_err(|e| {
            MotelError::DeserializationError(format!("line {}: {}", index + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write records, one per line.
pub fn write_jsonl<'a, T: Serialize + 'a>(
    mut writer: impl Write,
    records: impl IntoIterator<Item = &'a T>,
) -> Result<(), MotelError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| MotelError::SerializationError(e.to_string()))?;
        writer
            .write_all(b"\n")
            .map_err(|e| MotelError::IoError(e.to_string()))?;
    }
    writer.flush().map_err(|e| MotelError::IoError(e.to_string()))
}

/// Read every record of a file.
pub fn read_jsonl_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, MotelError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| MotelError::IoError(format!("{}: {}", path.display(), e)))?;
    read_jsonl(BufReader::new(file))
}

/// Write records to a file, creating missing parent directories.
pub fn write_jsonl_file<'a, T: Serialize + 'a>(
    path: impl AsRef<Path>,
    records: impl IntoIterator<Item = &'a T>,
) -> Result<(), MotelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| MotelError::IoError(e.to_string()))?;
    }
    let file = File::create(path)
        .map_err(|e| MotelError::IoError(format!("{}: {}", path.display(), e)))?;
    write_jsonl(BufWriter::new(file), records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{Point, VertexId};

    #[test]
    fn blank_lines_are_skipped() {
        let text = "{\"file\":\"a\",\"identifier\":1}\n\n  \n{\"file\":\"b\",\"identifier\":2}\n";
        let points: Vec<Point> = read_jsonl(text.as_bytes()).expect("read");
        assert_eq!(
            points,
            vec![Point::new("a", VertexId(1)), Point::new("b", VertexId(2))]
        );
    }

    #[test]
    fn errors_report_line_numbers() {
        let text = "{\"file\":\"a\",\"identifier\":1}\n{\"file\":\"b\"}\n";
        let result: Result<Vec<Point>, _> = read_jsonl(text.as_bytes());
        match result {
            Err(MotelError::DeserializationError(message)) => {
                assert!(message.starts_with("line 2:"), "{}", message);
            }
            other => panic!("expected deserialization error, got {:?}", other),
        }
    }

    #[test]
    fn written_records_are_one_per_line() {
        let points = vec![Point::new("a", VertexId(1)), Point::new("b", VertexId(2))];
        let mut buffer = Vec::new();
        write_jsonl(&mut buffer, &points).expect("write");

        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn file_helpers_create_parents() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("out").join("points.jsonl");
        let points = vec![Point::new("doc", VertexId(3))];

        write_jsonl_file(&path, &points).expect("write");
        let back: Vec<Point> = read_jsonl_file(&path).expect("read");
        assert_eq!(back, points);
    }
}
