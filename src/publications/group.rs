use std::cmp::Reverse;

use super::item::Publication;

/// Bucket label for entries without a usable year.
pub const UNDATED: &str = "n.d.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup {
    pub year: String,
    pub entries: Vec<Publication>,
}

fn year_key(p: &Publication) -> i64 {
    p.raw_year
        .as_deref()
        .and_then(|y| y.trim().parse().ok())
        .unwrap_or(0)
}

/// Sort by (year, lowercase title), both descending.
///
/// One descending pass over the composite key puts titles within a year in reverse
/// alphabetical order. Output pages depend on that order, so it is kept. Ties keep their input
/// order.
pub fn sort_publications(pubs: &mut [Publication]) {
    pubs.sort_by_cached_key(|p| Reverse((year_key(p), p.raw_title.to_lowercase())));
}

fn bucket_label(p: &Publication) -> String {
    match p.raw_year.as_deref().map(str::trim) {
        Some(y) if !y.is_empty() => y.to_string(),
        _ => UNDATED.to_string(),
    }
}

/// Numeric rank of a bucket label; `None` for labels that are not plain digits.
fn bucket_rank(label: &str) -> Option<u64> {
    if !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()) {
        Some(label.parse().unwrap_or(u64::MAX))
    } else {
        None
    }
}

/// Sort, then bucket by literal year label. Buckets run latest first; non-numeric labels go
/// last in first-seen order.
pub fn group_by_year(mut pubs: Vec<Publication>) -> Vec<YearGroup> {
    sort_publications(&mut pubs);

    let mut groups: Vec<YearGroup> = Vec::new();
    for p in pubs {
        let label = bucket_label(&p);
        match groups.iter_mut().find(|g| g.year == label) {
            Some(g) => g.entries.push(p),
            None => groups.push(YearGroup {
                year: label,
                entries: vec![p],
            }),
        }
    }

    groups.sort_by_key(|g| Reverse(bucket_rank(&g.year)));
    groups
}
