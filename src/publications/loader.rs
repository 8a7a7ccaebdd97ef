use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;
use biblatex::{Bibliography, ChunksExt, Entry};
use tracing::{debug, info};

use super::normalize::de_tex;
use crate::error::InputError;

/// One bibliography entry flattened to plain strings, keyed by lowercase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new<K, V>(key: &str, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Record {
            key: key.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    fn from_entry(entry: &Entry) -> Self {
        Record::new(
            &entry.key,
            entry
                .fields
                .iter()
                .map(|(name, chunks)| (name, chunks.format_verbatim())),
        )
    }

    /// Raw field value, exactly as loaded.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Read and parse the bibliography at `path`, applying the clean-up table to the raw text.
pub fn load(path: &Path, table: &[(String, String)]) -> anyhow::Result<Vec<Record>> {
    if !path.exists() {
        return Err(InputError::Missing {
            what: "BibTeX",
            path: path.to_path_buf(),
        }
        .into());
    }
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse(&src, path, table)?;
    info!(path = %path.display(), entries = records.len(), "loaded bibliography");
    Ok(records)
}

/// Parse bibliography text. `origin` is only used for error reporting.
///
/// The table runs over the source before parsing, while TeX markup is still literal.
pub fn parse(
    src: &str,
    origin: &Path,
    table: &[(String, String)],
) -> Result<Vec<Record>, InputError> {
    let src = de_tex(src, table);
    let bib = Bibliography::parse(&src).map_err(|e| InputError::Malformed {
        what: "BibTeX",
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;
    let records: Vec<Record> = bib.iter().map(Record::from_entry).collect();
    for r in &records {
        debug!(key = %r.key, fields = r.fields.len(), "parsed entry");
    }
    Ok(records)
}
