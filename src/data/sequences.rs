// sequences.rs - Sequence loading from FASTA or plain line files

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use bio::io::fasta;
use regex::Regex;
use tracing::debug;

/// One input sequence with its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Input layout, detected from the first non-blank line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Fasta,
    /// One sequence per line; ids are `seq_<n>` with `n` counting sequences from 1
    Lines,
}

pub fn detect_format(path: &Path) -> Result<InputFormat> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return Ok(if trimmed.starts_with('>') {
            InputFormat::Fasta
        } else {
            InputFormat::Lines
        });
    }
    Ok(InputFormat::Lines)
}

/// Load every sequence of `path`, in file order.
pub fn load_sequences(path: &Path) -> Result<Vec<SequenceRecord>> {
    let format = detect_format(path)?;
    let records = match format {
        InputFormat::Fasta => load_fasta(path)?,
        InputFormat::Lines => load_lines(path)?,
    };
    debug!(
        "Loaded {} sequences ({:?}) from {}",
        records.len(),
        format,
        path.display()
    );
    Ok(records)
}

fn load_fasta(path: &Path) -> Result<Vec<SequenceRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open FASTA file {}", path.display()))?;
    let reader = fasta::Reader::new(BufReader::new(file));

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Invalid FASTA record in {}", path.display()))?;
        records.push(SequenceRecord::new(record.id(), record.seq()));
    }
    Ok(records)
}

fn load_lines(path: &Path) -> Result<Vec<SequenceRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} of {}", line_num + 1, path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.contains(char::is_whitespace) {
            bail!(
                "Line {} of {} holds more than one token; expected one sequence per line",
                line_num + 1,
                path.display()
            );
        }
        let id = format!("seq_{}", records.len() + 1);
        records.push(SequenceRecord::new(id, trimmed.as_bytes()));
    }
    Ok(records)
}

/// Keep records whose id matches `include` (when given) and does not match
/// `exclude` (when given).
pub fn filter_records(
    records: Vec<SequenceRecord>,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Vec<SequenceRecord> {
    let before = records.len();
    let mut kept = records;
    if let Some(include_regex) = include {
        kept.retain(|r| include_regex.is_match(&r.id));
    }
    if let Some(exclude_regex) = exclude {
        kept.retain(|r| !exclude_regex.is_match(&r.id));
    }
    if kept.len() != before {
        debug!("Id filters kept {} of {} sequences", kept.len(), before);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_fasta() {
        let file = write_temp(">a first\nACGT\nAC\n>b\nTTTT\n");
        assert_eq!(detect_format(file.path()).unwrap(), InputFormat::Fasta);

        let records = load_sequences(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SequenceRecord::new("a", "ACGTAC"));
        assert_eq!(records[1].id, "b");
        assert_eq!(records[1].len(), 4);
    }

    #[test]
    fn test_load_plain_lines() {
        let file = write_temp("\nACGT\n# comment\n\nTTGA\nCC\n");
        assert_eq!(detect_format(file.path()).unwrap(), InputFormat::Lines);

        let records = load_sequences(file.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["seq_1", "seq_2", "seq_3"]);
        assert_eq!(records[2].seq, b"CC".to_vec());
    }

    #[test]
    fn test_plain_lines_reject_multiple_tokens() {
        let file = write_temp("ACGT TTGA\n");
        let err = load_sequences(file.path()).unwrap_err();
        assert!(err.to_string().contains("Line 1"));
    }

    #[test]
    fn test_empty_file_loads_nothing() {
        let file = write_temp("");
        assert!(load_sequences(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = load_sequences(Path::new("/nonexistent/seqs.fa")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_filter_records() {
        let records = vec![
            SequenceRecord::new("IGHV1-2", "A"),
            SequenceRecord::new("IGHV3-23", "C"),
            SequenceRecord::new("IGKV1-5", "G"),
        ];
        let include = Regex::new("^IGH").unwrap();
        let exclude = Regex::new("3-23").unwrap();

        let kept = filter_records(records.clone(), Some(&include), None);
        assert_eq!(kept.len(), 2);

        let kept = filter_records(records.clone(), Some(&include), Some(&exclude));
        assert_eq!(kept, vec![SequenceRecord::new("IGHV1-2", "A")]);

        assert_eq!(filter_records(records.clone(), None, None), records);
    }
}
