//! Flat result tables: one `key<TAB>value` line per entry, no header.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use csv::WriterBuilder;
use log::debug;

use crate::error::{AnalysisError, Result};
use crate::tagger::TaggedToken;

///Save `(key, count)` rows to `path` in the given order. Nothing is re-sorted.
///Keys holding a tab, newline or `"` are quoted so each entry stays one record.
pub fn save<K: AsRef<str>>(table: &[(K, usize)], path: &Path) -> Result<()> {
    write_rows(
        path,
        table
            .iter()
            .map(|(key, count)| [key.as_ref().to_string(), count.to_string()]),
    )?;
    debug!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

///Save part-of-speech results as `word<TAB>tag` rows.
pub fn save_tagged(tagged: &[TaggedToken], path: &Path) -> Result<()> {
    write_rows(
        path,
        tagged.iter().map(|t| [t.word.clone(), t.tag.clone()]),
    )
}

fn write_rows<I>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = [String; 2]>,
{
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AnalysisError::csv("Create", path, e))?;
    for row in rows {
        wtr.write_record(&row)
            .map_err(|e| AnalysisError::csv("Write", path, e))?;
    }
    wtr.flush().map_err(|e| AnalysisError::io("Write", path, e))
}

///Save a free-text result report to `dir`, named `<stem>_<timestamp>_<stage>.txt`. Returns the path.
pub fn save_report(text: &str, dir: &Path, stem: &str, stage: &str) -> Result<PathBuf> {
    let local: DateTime<Local> = Local::now();
    let filename = format!("{stem}_{}_{stage}.txt", local.format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    fs::write(&path, text).map_err(|e| AnalysisError::io("Write report", &path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_rows_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        save(&[("刘备", 3), ("关羽", 1)], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "刘备\t3\n关羽\t1\n");
    }

    #[test]
    fn does_not_resort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        save(&[("a".to_string(), 1), ("b".to_string(), 9)], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\t1\nb\t9\n");
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        let rows: Vec<(String, usize)> = Vec::new();
        save(&rows, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_path_propagates_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.txt");
        let err = save(&[("刘备", 3)], &path).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
        assert!(err.to_string().contains("out.txt"));
    }

    #[test]
    fn tagged_rows_use_tab() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.txt");
        save_tagged(
            &[TaggedToken::new("刘备", "nr"), TaggedToken::new("曰", "v")],
            &path,
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "刘备\tnr\n曰\tv\n");
    }
}
