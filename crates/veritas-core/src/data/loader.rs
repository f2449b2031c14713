//! # Dataset Loader
//!
//! Reads a persisted news table, merges `title` and `text` into a single
//! text field and drops every other column.
//!
//! Supported formats are picked by file extension:
//! - `.csv` with a header row
//! - `.jsonl` / `.ndjson`, one JSON object per line
//! - `.json`, a single array of objects

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::data::record::{Corpus, Document, Label};
use crate::error::{Result, VeritasError};

/// Columns every dataset must provide. Anything else is dropped.
pub const REQUIRED_COLUMNS: [&str; 4] = ["title", "text", "date", "label"];

/// On-disk dataset encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    JsonLines,
    Json,
}

impl DatasetFormat {
    /// Infer the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("jsonl") | Some("ndjson") => Ok(Self::JsonLines),
            Some("json") => Ok(Self::Json),
            _ => Err(VeritasError::DataFormat(format!(
                "unsupported dataset format for {} (expected .csv, .jsonl, .ndjson or .json)",
                path.display()
            ))),
        }
    }
}

/// Load a dataset file into a [`Corpus`].
///
/// # Errors
/// Returns [`VeritasError::DataFormat`] when a required column is missing,
/// a label is not binary, or a merged text is blank.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let format = DatasetFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "loading dataset");

    let documents = match format {
        DatasetFormat::Csv => read_csv(path)?,
        DatasetFormat::JsonLines => read_json_lines(path)?,
        DatasetFormat::Json => read_json_array(path)?,
    };

    let corpus = Corpus::new(documents);
    info!(
        path = %path.display(),
        "loaded dataset: {}",
        corpus.label_distribution()
    );
    Ok(corpus)
}

/// Combine title and body the way the classifier expects to see them.
pub fn merge_text(title: &str, text: &str) -> String {
    format!("{} {}", title, text)
}

fn build_document(row: usize, title: &str, text: &str, label: Label) -> Result<Document> {
    let merged = merge_text(title, text);
    if merged.trim().is_empty() {
        return Err(VeritasError::DataFormat(format!(
            "row {}: title and text are both empty",
            row
        )));
    }
    Ok(Document::new(merged, label))
}

fn parse_label_str(row: usize, raw: &str) -> Result<Label> {
    let raw = raw.trim();
    let value: u8 = raw.parse().map_err(|_| {
        VeritasError::DataFormat(format!("row {}: label {:?} is not 0 or 1", row, raw))
    })?;
    Label::try_from(value)
        .map_err(|_| VeritasError::DataFormat(format!("row {}: label {} is not 0 or 1", row, value)))
}

fn read_csv(path: &Path) -> Result<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| VeritasError::DataFormat(format!("missing column `{}`", name)))
    };

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name)?;
    }
    let [title_idx, text_idx, _date_idx, label_idx] = indices;

    let mut documents = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record
            .map_err(|e| VeritasError::DataFormat(format!("row {}: malformed CSV record: {}", row, e)))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let label = parse_label_str(row, field(label_idx))?;
        documents.push(build_document(row, field(title_idx), field(text_idx), label)?);
    }

    Ok(documents)
}

fn read_json_lines(path: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();
    let mut row = 0usize;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        row += 1;

        let value: Value = serde_json::from_str(line).map_err(|e| {
            VeritasError::DataFormat(format!("row {}: invalid JSON: {}", row, e))
        })?;
        documents.push(document_from_value(row, &value)?);
    }

    Ok(documents)
}

fn read_json_array(path: &Path) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)
        .map_err(|e| VeritasError::DataFormat(format!("invalid JSON: {}", e)))?;

    let rows = value.as_array().ok_or_else(|| {
        VeritasError::DataFormat("expected a JSON array of row objects".to_string())
    })?;

    rows.iter()
        .enumerate()
        .map(|(i, v)| document_from_value(i + 1, v))
        .collect()
}

fn document_from_value(row: usize, value: &Value) -> Result<Document> {
    let obj = value.as_object().ok_or_else(|| {
        VeritasError::DataFormat(format!("row {}: expected a JSON object", row))
    })?;

    for name in REQUIRED_COLUMNS {
        if !obj.contains_key(name) {
            return Err(VeritasError::DataFormat(format!(
                "row {}: missing column `{}`",
                row, name
            )));
        }
    }

    let title = string_field(row, obj, "title")?;
    let text = string_field(row, obj, "text")?;
    let label = label_field(row, &obj["label"])?;
    build_document(row, title, text, label)
}

fn string_field<'a>(row: usize, obj: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    obj[name].as_str().ok_or_else(|| {
        VeritasError::DataFormat(format!("row {}: column `{}` is not a string", row, name))
    })
}

fn label_field(row: usize, value: &Value) -> Result<Label> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(Label::Real),
            Some(1) => Ok(Label::Fake),
            _ => Err(VeritasError::DataFormat(format!(
                "row {}: label {} is not 0 or 1",
                row, n
            ))),
        },
        Value::Bool(b) => Ok(if *b { Label::Fake } else { Label::Real }),
        Value::String(s) => parse_label_str(row, s),
        other => Err(VeritasError::DataFormat(format!(
            "row {}: label {} is not 0 or 1",
            row, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_and_merges_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "news.csv",
            "index,title,text,date,num_date,label\n\
             0,Breaking,Aliens landed,2017-01-01,1,1\n\
             1,Markets,Stocks rose,2017-01-02,2,0\n",
        );

        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents[0].text, "Breaking Aliens landed");
        assert_eq!(corpus.documents[0].label, Label::Fake);
        assert_eq!(corpus.documents[1].label, Label::Real);
    }

    #[test]
    fn csv_missing_column_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "news.csv", "title,text,label\nA,B,1\n");

        let err = load_corpus(&path).unwrap_err();
        assert!(matches!(err, VeritasError::DataFormat(ref m) if m.contains("`date`")));
    }

    #[test]
    fn ragged_csv_row_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "news.csv",
            "title,text,date,label\nA,B,d,1\nC,D,0\n",
        );

        let err = load_corpus(&path).unwrap_err();
        assert!(matches!(err, VeritasError::DataFormat(ref m) if m.starts_with("row 2")));
    }

    #[test]
    fn non_utf8_csv_row_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.csv");
        let mut bytes = b"title,text,date,label\nA,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b",d,1\n");
        std::fs::write(&path, bytes).unwrap();

        let err = load_corpus(&path).unwrap_err();
        assert!(matches!(err, VeritasError::DataFormat(ref m) if m.starts_with("row 1")));
    }

    #[test]
    fn loads_json_lines_and_drops_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "news.jsonl",
            r#"{"title":"T1","text":"body one","date":"d","label":0,"subject":"x"}

{"title":"T2","text":"body two","date":"d","label":true}
"#,
        );

        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents[1].text, "T2 body two");
        assert_eq!(corpus.documents[1].label, Label::Fake);
    }

    #[test]
    fn json_missing_label_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "news.json", r#"[{"title":"T","text":"b","date":"d"}]"#);

        let err = load_corpus(&path).unwrap_err();
        assert!(matches!(err, VeritasError::DataFormat(ref m) if m.contains("`label`")));
    }

    #[test]
    fn non_binary_label_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "news.jsonl",
            r#"{"title":"T","text":"b","date":"d","label":2}"#,
        );
        assert!(matches!(
            load_corpus(&path),
            Err(VeritasError::DataFormat(_))
        ));
    }

    #[test]
    fn blank_merged_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "news.csv", "title,text,date,label\n ,  ,d,0\n");
        assert!(matches!(
            load_corpus(&path),
            Err(VeritasError::DataFormat(ref m)) if m.contains("row 1")
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = DatasetFormat::from_path(Path::new("df.pkl")).unwrap_err();
        assert!(matches!(err, VeritasError::DataFormat(_)));
    }
}
