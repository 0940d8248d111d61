use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::models::TranscriptRecord;

/// File extensions picked up when scanning a transcript directory
pub const TRANSCRIPT_EXTENSIONS: &[&str] = &["txt", "cha"];

/// What the `preprocess` command reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A directory of transcript files
    Directory(PathBuf),
    /// A record table previously written by the `parse` command
    RecordTable(PathBuf),
}

impl InputSource {
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            InputSource::Directory(path.to_path_buf())
        } else {
            InputSource::RecordTable(path.to_path_buf())
        }
    }
}

/// Recursively list transcript files under `dir`, sorted by path
pub fn discover_transcripts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TRANSCRIPT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Read a whole transcript file as UTF-8
pub fn read_transcript(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read transcript: {:?}", path))
}

/// Identifier stored in the `source_file` column
pub fn source_file_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read a record table written by the `parse` command
pub fn read_records_csv(path: &Path) -> Result<Vec<TranscriptRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open record table: {:?}", path))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(row, record)| {
            record.with_context(|| format!("Invalid record on row {} of {:?}", row + 2, path))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_transcripts_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("control");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.cha"), "").unwrap();
        std::fs::write(nested.join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let paths = discover_transcripts(dir.path()).unwrap();
        let names: Vec<String> = paths.iter().map(|p| source_file_id(p)).collect();

        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"b.cha".to_string()));
        assert!(paths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_discover_requires_directory() {
        assert!(discover_transcripts(Path::new("/nonexistent/transcripts")).is_err());
    }

    #[test]
    fn test_read_records_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(
            &path,
            "line_number,scenario,text,line_information,utterance_count,source_file\n\
             1,Speech,hello .,*PAR,1,a.txt\n\
             2,Speech,\"well, yes .\",*INV,2,a.txt\n",
        )
        .unwrap();

        let records = read_records_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "well, yes .");
        assert_eq!(records[1].line_information, "*INV");
        assert_eq!(records[1].line_group_id, 2);
    }

    #[test]
    fn test_input_source_detect() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            InputSource::detect(dir.path()),
            InputSource::Directory(dir.path().to_path_buf())
        );
        let file = dir.path().join("records.csv");
        assert_eq!(InputSource::detect(&file), InputSource::RecordTable(file.clone()));
    }
}
