//! Regex scanning over ETD result and detail pages.
//!
//! The pages are old server-rendered HTML, so a handful of tag patterns finds the interesting
//! elements. Text and attribute values go through `scraper`, which decodes the full HTML
//! character reference table.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::publications::normalize::normalize_space;

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());
static A_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>").unwrap());
static SPAN_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<span\b([^>]*)>").unwrap());
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").unwrap());
static DT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<dt\b[^>]*>(.*?)</dt>").unwrap());
static DD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<dd\b[^>]*>(.*?)</dd>").unwrap());
static TR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").unwrap());
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]>").unwrap());
static TD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").unwrap());

static NEXT_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(Successivo|Next)").unwrap());
static CURRENT_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)current|active").unwrap());
static DETAIL_HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)view|ETD-.*").unwrap());

static SPAN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());

pub static TITLE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Titolo|Title").unwrap());
pub static AUTHOR_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Autore|Author").unwrap());
pub static DEGREE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Corso di laurea|Degree|Laurea").unwrap());
pub static DATE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Anno|Year|Data di discussione|Discussione|Date").unwrap());
pub static ABSTRACT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Abstract|Riassunto").unwrap());

/// Visible text of an HTML fragment, with text nodes joined by single spaces.
pub fn text_of(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    normalize_space(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Decoded value of `key` from the attribute list of an opening tag.
fn attr(attrs: &str, key: &str) -> Option<String> {
    let doc = Html::parse_fragment(&format!("<span {attrs}></span>"));
    let el = doc.select(&SPAN_SEL).next()?;
    el.value().attr(key).map(str::to_string)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

pub fn first_h1(html: &str) -> Option<String> {
    H1_RE.captures(html).and_then(|c| non_empty(text_of(&c[1])))
}

pub fn page_title(html: &str) -> Option<String> {
    TITLE_RE.captures(html).map(|c| text_of(&c[1]))
}

/// Value next to a label, from a `<dt>`/`<dd>` pair or a table row whose first cell matches.
pub fn field_by_label(html: &str, label: &Regex) -> Option<String> {
    for dt in DT_RE.captures_iter(html) {
        if label.is_match(&text_of(&dt[1])) {
            let end = dt.get(0)?.end();
            if let Some(dd) = DD_RE.captures(&html[end..]) {
                return Some(text_of(&dd[1]));
            }
        }
    }

    for tr in TR_RE.captures_iter(html) {
        let row = tr.get(1)?;
        let Some(cell) = CELL_RE.captures(row.as_str()) else {
            continue;
        };
        if label.is_match(&text_of(&cell[1])) {
            let after = row.start() + cell.get(0)?.end();
            if let Some(td) = TD_RE.captures(&html[after..]) {
                return Some(text_of(&td[1]));
            }
        }
    }
    None
}

/// Links to thesis detail pages, absolutised against the site root, first occurrence kept.
pub fn result_links(html: &str, site: &Url) -> Vec<Url> {
    let mut out: Vec<Url> = Vec::new();
    for cap in ANCHOR_RE.captures_iter(html) {
        let Some(href) = attr(&cap[1], "href") else {
            continue;
        };
        if !href.contains("/ETD-db/") || !DETAIL_HREF_RE.is_match(&href) {
            continue;
        }
        let Ok(full) = site.join(&href) else {
            continue;
        };
        let absolute = full.as_str();
        if (absolute.contains("view") || absolute.contains("ETD-")) && !out.contains(&full) {
            out.push(full);
        }
    }
    out
}

/// Where the pager points after `current`, if anywhere.
///
/// A "Successivo"/"Next" link wins; otherwise the first link after the element marked as the
/// current page.
pub fn next_page(html: &str, current: &Url) -> Option<Url> {
    let labelled = ANCHOR_RE
        .captures_iter(html)
        .find(|c| NEXT_TEXT_RE.is_match(&text_of(&c[2])))
        .and_then(|a| attr(&a[1], "href"))
        .filter(|h| !h.is_empty());
    if let Some(href) = labelled {
        return current.join(&href).ok();
    }

    let marker = A_OPEN_RE
        .captures_iter(html)
        .find(|c| has_current_class(&c[1]))
        .or_else(|| {
            SPAN_OPEN_RE
                .captures_iter(html)
                .find(|c| has_current_class(&c[1]))
        })?;
    let after = marker.get(0)?.end();
    let next = A_OPEN_RE.captures(&html[after..])?;
    attr(&next[1], "href")
        .filter(|h| !h.is_empty())
        .and_then(|h| current.join(&h).ok())
}

fn has_current_class(attrs: &str) -> bool {
    attr(attrs, "class").is_some_and(|c| CURRENT_CLASS_RE.is_match(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Url {
        Url::parse("https://etd.example.org").unwrap()
    }

    #[test]
    fn text_of_strips_tags_and_entities() {
        assert_eq!(
            text_of("<b>Analisi</b>\n  dei <i>dati</i> &amp; modelli&nbsp;"),
            "Analisi dei dati & modelli"
        );
        assert_eq!(text_of("Universit&agrave; di Pisa"), "Università di Pisa");
        assert_eq!(text_of("&#233;t&#xE9;"), "été");
        assert_eq!(text_of("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn label_lookup_prefers_definition_lists() {
        let html = r#"
            <table><tr><th>Autore</th><td>Row Author</td></tr></table>
            <dl><dt>Autore</dt><dd> Mario   <b>Rossi</b> </dd></dl>
        "#;
        assert_eq!(field_by_label(html, &AUTHOR_LABEL).as_deref(), Some("Mario Rossi"));
    }

    #[test]
    fn label_lookup_falls_back_to_table_rows() {
        let html = r#"
            <table>
              <tr><td class="l">Corso di laurea</td><td>INFORMATICA</td></tr>
              <tr><th>Data di discussione</th><td>12/07/2023</td></tr>
            </table>
        "#;
        assert_eq!(field_by_label(html, &DEGREE_LABEL).as_deref(), Some("INFORMATICA"));
        assert_eq!(field_by_label(html, &DATE_LABEL).as_deref(), Some("12/07/2023"));
        assert_eq!(field_by_label(html, &ABSTRACT_LABEL), None);
    }

    // Every `/ETD-db/` path contains "ETD-", so in practice only links outside the ETD
    // application are dropped.
    #[test]
    fn result_links_filter_and_dedup() {
        let html = r#"
            <a href="/ETD-db/ETD-search/view_etd?URN=etd-01">Uno</a>
            <a href='/ETD-db/ETD-search/view_etd?URN=etd-02'>Due</a>
            <a href="/ETD-db/ETD-search/view_etd?URN=etd-01">Uno again</a>
            <a href="/ETD-db/ETD-browse/browse">Browse</a>
            <a href="/other/view">Elsewhere</a>
            <a href=/ETD-db/ETD-desc/describe?urn=ETD-03>Tre</a>
        "#;
        let links: Vec<String> = result_links(html, &site())
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-01",
                "https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-02",
                "https://etd.example.org/ETD-db/ETD-browse/browse",
                "https://etd.example.org/ETD-db/ETD-desc/describe?urn=ETD-03",
            ]
        );
    }

    #[test]
    fn href_entities_are_decoded() {
        let html = r#"<a href="/ETD-db/ETD-search/view_etd?a=1&amp;URN=etd-9">x</a>"#;
        let links = result_links(html, &site());
        assert_eq!(
            links[0].as_str(),
            "https://etd.example.org/ETD-db/ETD-search/view_etd?a=1&URN=etd-9"
        );
    }

    #[test]
    fn next_page_uses_labelled_link() {
        let current =
            Url::parse("https://etd.example.org/ETD-db/ETD-search/search?page=1").unwrap();
        let html = r#"
            <a href="?page=0">Precedente</a>
            <a href="?page=2"><b>Successivo</b> &raquo;</a>
        "#;
        assert_eq!(
            next_page(html, &current).map(String::from).as_deref(),
            Some("https://etd.example.org/ETD-db/ETD-search/search?page=2")
        );
    }

    #[test]
    fn next_page_follows_link_after_current_marker() {
        let current = Url::parse("https://etd.example.org/list?p=2").unwrap();
        let html = r#"
            <a href="list?p=1">1</a>
            <span class="page current">2</span>
            <a href="list?p=3">3</a>
        "#;
        assert_eq!(
            next_page(html, &current).map(String::from).as_deref(),
            Some("https://etd.example.org/list?p=3")
        );
    }

    #[test]
    fn next_page_none_on_last_page() {
        let current = Url::parse("https://etd.example.org/list?p=3").unwrap();
        let html = r#"<a href="list?p=2">2</a><a class="active">3</a>"#;
        assert_eq!(next_page(html, &current), None);
        assert_eq!(next_page("<p>no pager</p>", &current), None);
    }

    #[test]
    fn every_named_reference_is_decoded() {
        assert_eq!(text_of("M&uuml;ller &hellip; &euro;5"), "Müller … €5");
        assert_eq!(text_of("Citt&agrave; &ndash; Pisa&nbsp;"), "Città – Pisa");
    }

    #[test]
    fn unquoted_and_single_quoted_attributes() {
        assert_eq!(attr(" href=/a?b=1 class='x'", "href").as_deref(), Some("/a?b=1"));
        assert_eq!(attr(" href=/a?b=1 class='x'", "class").as_deref(), Some("x"));
        assert_eq!(attr(r#" HREF="q?a=1&amp;b=2""#, "href").as_deref(), Some("q?a=1&b=2"));
        assert_eq!(attr("", "href"), None);
    }

    #[test]
    fn text_of_never_leaves_double_spaces() {
        proptest::proptest!(|(s in "[a-z \t\n<>/&;]{0,40}")| {
            let out = text_of(&s);
            proptest::prop_assert!(!out.contains("  "));
            proptest::prop_assert_eq!(out.trim(), out.as_str());
        })
    }
}
