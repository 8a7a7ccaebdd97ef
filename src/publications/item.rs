use super::{
    loader::Record,
    normalize::{pick, split_authors},
};

/// A bibliography record reshaped for display.
///
/// Display fields are `None` when the source field is missing or blank; the renderer omits the
/// matching fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub pdf: Option<String>,
    /// Raw `year` field, used for sorting and bucketing.
    pub raw_year: Option<String>,
    /// Raw `title` field, used as the secondary sort key.
    pub raw_title: String,
}

impl Publication {
    pub fn from_record(record: &Record) -> Self {
        Publication {
            authors: pick(record, &["author"])
                .map(|a| split_authors(&a))
                .unwrap_or_default(),
            year: pick(record, &["year"]),
            title: pick(record, &["title"]),
            venue: pick(record, &["journal", "booktitle"]),
            doi: pick(record, &["doi"]),
            url: pick(record, &["url"]),
            pdf: pick(record, &["pdf"]),
            raw_year: record.get("year").map(str::to_string),
            raw_title: record.get("title").unwrap_or_default().to_string(),
        }
    }
}
