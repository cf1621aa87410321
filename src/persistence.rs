// File: src/persistence.rs
use crate::core::dictionary::Dictionary;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Error};
use std::path::Path;
use tempfile::NamedTempFile;

/// Shape of a JSON word list: `{ "commonWords": ["the", "of", ...] }`, most frequent first.
#[derive(Deserialize)]
struct WordListFile {
    #[serde(rename = "commonWords")]
    common_words: Vec<String>,
}

/// Shape of a JSON key list: `{ "keys": ["LEMON", ...] }`.
#[derive(Deserialize)]
struct KeyListFile {
    keys: Vec<String>,
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

fn read_lines(path: &Path) -> Result<Vec<String>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

/// Reads a frequency-ordered word list, either JSON or one word per line.
pub fn load_word_list(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if is_json(path) {
        let file: WordListFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(file.common_words)
    } else {
        Ok(read_lines(path)?)
    }
}

/// Reads a list of candidate keys, either JSON or one key per line.
pub fn load_key_list(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if is_json(path) {
        let file: KeyListFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(file.keys)
    } else {
        Ok(read_lines(path)?)
    }
}

/// Loads a dictionary from either a word list or a compiled snapshot (`.bin`).
pub fn load_dictionary(path: &Path) -> Result<Dictionary, Box<dyn std::error::Error>> {
    let is_snapshot = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("bin"));
    if is_snapshot {
        load_dictionary_snapshot(path)
    } else {
        Ok(Dictionary::from_ranked_words(load_word_list(path)?))
    }
}

/// Writes a compiled dictionary next to `path` and renames it into place,
/// so readers never see a half-written file.
pub fn save_dictionary_snapshot(dictionary: &Dictionary, path: &Path) -> Result<(), Error> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    let writer = BufWriter::new(&temp_file);

    bincode::serialize_into(writer, dictionary)
        .map_err(|e| Error::new(std::io::ErrorKind::Other, e))?;

    temp_file.persist(path)?;
    Ok(())
}

pub fn load_dictionary_snapshot(path: &Path) -> Result<Dictionary, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let dictionary: Dictionary = bincode::deserialize_from(reader)?;
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_json_word_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Words.json");
        fs::write(&path, r#"{ "commonWords": ["the", "of", "and"] }"#).unwrap();
        assert_eq!(load_word_list(&path).unwrap(), vec!["the", "of", "and"]);
    }

    #[test]
    fn reads_plain_key_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "LEMON\n\n  KEY  \nSECRET").unwrap();
        assert_eq!(load_key_list(&path).unwrap(), vec!["LEMON", "KEY", "SECRET"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VK.json");
        fs::write(&path, r#"{ "not_keys": 3 }"#).unwrap();
        assert!(load_key_list(&path).is_err());
    }
}
