// mod.rs - Output formatters module

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::core::{DistanceMatrix, SparseMatrix};

/// Supported matrix file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Phylip,
    /// Upper triangle, one value per line
    Condensed,
    Json,
    /// Sparse `(i, j, value)` triplets of the upper triangle
    Coo,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 6] = ["tsv", "csv", "phylip", "condensed", "json", "coo"];

    /// Formats that only describe a symmetric self-distance matrix
    pub fn requires_square(&self) -> bool {
        matches!(self, OutputFormat::Phylip | OutputFormat::Condensed | OutputFormat::Coo)
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, OutputFormat::Coo)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "phylip" => Ok(OutputFormat::Phylip),
            "condensed" => Ok(OutputFormat::Condensed),
            "json" => Ok(OutputFormat::Json),
            "coo" => Ok(OutputFormat::Coo),
            _ => Err(format!(
                "Unsupported output format: {}. Use: {}",
                s,
                OutputFormat::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Phylip => "phylip",
            OutputFormat::Condensed => "condensed",
            OutputFormat::Json => "json",
            OutputFormat::Coo => "coo",
        };
        write!(f, "{}", name)
    }
}

/// Provenance written at the top (or bottom, for PHYLIP) of every file
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub command_line: String,
    pub generated: String,
    pub version: &'static str,
}

impl RunHeader {
    pub fn new(command_line: &str) -> Self {
        Self {
            command_line: command_line.to_string(),
            generated: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn write_comments<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "# Command: {}", self.command_line)?;
        writeln!(writer, "# Generated: {}", self.generated)?;
        writeln!(writer, "# pairdist v{}", self.version)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonMatrix<'a> {
    command: &'a str,
    generated: &'a str,
    version: &'a str,
    shape: [usize; 2],
    row_labels: &'a [String],
    col_labels: &'a [String],
    data: Vec<&'a [f64]>,
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory '{}'", parent.display()))?;
        }
    }
    Ok(())
}

fn create_output(file_path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create output file '{}'", file_path.display()))?;
    Ok(BufWriter::new(file))
}

fn check_labels(matrix: &DistanceMatrix, row_labels: &[String], col_labels: &[String]) -> Result<()> {
    if row_labels.len() != matrix.rows() || col_labels.len() != matrix.cols() {
        bail!(
            "{} x {} labels for a {} x {} matrix",
            row_labels.len(),
            col_labels.len(),
            matrix.rows(),
            matrix.cols()
        );
    }
    Ok(())
}

fn write_delimited<W: Write>(
    writer: &mut W,
    delimiter: char,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &DistanceMatrix,
    header: &RunHeader,
) -> Result<()> {
    header.write_comments(writer)?;

    write!(writer, "Sample")?;
    for label in col_labels {
        write!(writer, "{}{}", delimiter, label)?;
    }
    writeln!(writer)?;

    for (i, label) in row_labels.iter().enumerate() {
        write!(writer, "{}", label)?;
        for d in matrix.row(i) {
            write!(writer, "{}{}", delimiter, d)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_phylip<W: Write>(writer: &mut W, labels: &[String], matrix: &DistanceMatrix, header: &RunHeader) -> Result<()> {
    writeln!(writer, "    {}", labels.len())?;

    // Lower triangle, diagonal included
    for (i, label) in labels.iter().enumerate() {
        write!(writer, "{:<10}", label)?;
        for d in &matrix.row(i)[..=i] {
            write!(writer, "  {}", d)?;
        }
        writeln!(writer)?;
    }

    // PHYLIP has no comment syntax; most parsers stop after the last row
    writeln!(writer)?;
    header.write_comments(writer)
}

fn write_condensed<W: Write>(writer: &mut W, matrix: &DistanceMatrix, header: &RunHeader) -> Result<()> {
    header.write_comments(writer)?;
    writeln!(writer, "# n = {}", matrix.rows())?;
    for d in matrix.condensed()? {
        writeln!(writer, "{}", d)?;
    }
    Ok(())
}

fn write_json<W: Write>(
    writer: &mut W,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &DistanceMatrix,
    header: &RunHeader,
) -> Result<()> {
    let doc = JsonMatrix {
        command: &header.command_line,
        generated: &header.generated,
        version: header.version,
        shape: [matrix.rows(), matrix.cols()],
        row_labels,
        col_labels,
        data: (0..matrix.rows()).map(|i| matrix.row(i)).collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &doc).context("Failed to serialize matrix as JSON")?;
    writeln!(writer)?;
    Ok(())
}

fn write_coo<W: Write>(writer: &mut W, labels: &[String], matrix: &SparseMatrix, header: &RunHeader) -> Result<()> {
    header.write_comments(writer)?;
    let (n, _) = matrix.shape();
    writeln!(writer, "# shape: {} x {}, stored pairs: {}", n, n, matrix.nnz() / 2)?;
    writeln!(writer, "i\tj\tid_i\tid_j\tdistance")?;
    for (i, j, d) in matrix.upper_triplets() {
        writeln!(writer, "{}\t{}\t{}\t{}\t{}", i, j, labels[i], labels[j], d)?;
    }
    Ok(())
}

/// Write a dense matrix in any non-sparse format.
pub fn write_matrix_to<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &DistanceMatrix,
    header: &RunHeader,
) -> Result<()> {
    check_labels(matrix, row_labels, col_labels)?;
    if format.requires_square() && !matrix.is_square() {
        bail!(
            "{} output needs a square self-distance matrix, got {} x {}",
            format,
            matrix.rows(),
            matrix.cols()
        );
    }
    match format {
        OutputFormat::Tsv => write_delimited(writer, '\t', row_labels, col_labels, matrix, header),
        OutputFormat::Csv => write_delimited(writer, ',', row_labels, col_labels, matrix, header),
        OutputFormat::Phylip => write_phylip(writer, row_labels, matrix, header),
        OutputFormat::Condensed => write_condensed(writer, matrix, header),
        OutputFormat::Json => write_json(writer, row_labels, col_labels, matrix, header),
        OutputFormat::Coo => bail!("coo output is only available for sparse results"),
    }
}

/// Write a sparse matrix; non-sparse formats receive its dense expansion.
pub fn write_sparse_to<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    labels: &[String],
    matrix: &SparseMatrix,
    header: &RunHeader,
) -> Result<()> {
    let (n, _) = matrix.shape();
    if labels.len() != n {
        bail!("{} labels for a {} x {} matrix", labels.len(), n, n);
    }
    match format {
        OutputFormat::Coo => write_coo(writer, labels, matrix, header),
        _ => write_matrix_to(writer, format, labels, labels, &matrix.to_dense(), header),
    }
}

/// Write distance matrix to `file_path` in the specified format
pub fn write_matrix(
    file_path: &Path,
    format: OutputFormat,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_matrix_to(&mut writer, format, row_labels, col_labels, matrix, &RunHeader::new(command_line))
        .with_context(|| format!("Failed to write '{}'", file_path.display()))?;
    writer.flush().context("Flush error")?;
    println!("✅ Distance matrix written to: {} ({} format)", file_path.display(), format);
    Ok(())
}

/// Write a sparse distance matrix to `file_path`
pub fn write_sparse(
    file_path: &Path,
    format: OutputFormat,
    labels: &[String],
    matrix: &SparseMatrix,
    command_line: &str,
) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_sparse_to(&mut writer, format, labels, matrix, &RunHeader::new(command_line))
        .with_context(|| format!("Failed to write '{}'", file_path.display()))?;
    writer.flush().context("Flush error")?;
    println!(
        "✅ Sparse matrix written to: {} ({} format, {} stored entries)",
        file_path.display(),
        format,
        matrix.nnz()
    );
    Ok(())
}
