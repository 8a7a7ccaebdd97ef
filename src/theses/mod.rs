//! Thesis metadata harvested from the university ETD database.

pub mod extract;

use std::{collections::HashSet, thread, time::Duration};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ThesesConfig,
    output::{WriteOutcome, write_if_changed},
};

use self::extract::{
    ABSTRACT_LABEL, AUTHOR_LABEL, DATE_LABEL, DEGREE_LABEL, TITLE_LABEL, field_by_label, first_h1,
    next_page, page_title, result_links,
};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ThesisBot/1.0; +https://github.io)";
const ACCEPT_LANGUAGE: &str = "it,en;q=0.8";

/// Something that can hand back the HTML behind a URL.
pub trait PageSource {
    fn get(&self, url: &Url) -> anyhow::Result<String>;
}

/// Plain HTTP fetching with a fixed timeout and no retries.
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Self {
        let cfg = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        HttpSource {
            agent: ureq::Agent::new_with_config(cfg),
        }
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &Url) -> anyhow::Result<String> {
        let body = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .call()
            .with_context(|| format!("failed request for URL {url}"))?
            .into_body()
            .read_to_string()
            .context("read body")?;
        Ok(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thesis {
    pub title: Option<String>,
    pub author: Option<String>,
    pub degree: Option<String>,
    pub year_or_date: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ThesisItem {
    Parsed(Thesis),
    Failed { url: String, error: String },
}

impl ThesisItem {
    pub fn is_failed(&self) -> bool {
        matches!(self, ThesisItem::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct Payload {
    pub advisor: String,
    pub source: String,
    pub updated_at: String,
    pub count: usize,
    pub items: Vec<ThesisItem>,
}

/// Metadata from a single thesis page.
pub fn parse_thesis_page(html: &str, url: &Url) -> Thesis {
    let title = first_h1(html)
        .or_else(|| field_by_label(html, &TITLE_LABEL).filter(|t| !t.is_empty()))
        .or_else(|| {
            page_title(html).map(|t| t.split(" - ").next().unwrap_or_default().to_string())
        });

    Thesis {
        title,
        author: field_by_label(html, &AUTHOR_LABEL),
        degree: field_by_label(html, &DEGREE_LABEL),
        year_or_date: field_by_label(html, &DATE_LABEL),
        abstract_: field_by_label(html, &ABSTRACT_LABEL),
        url: url.to_string(),
    }
}

/// Walk the paginated search results and collect detail links in first-seen order.
///
/// Any result page that cannot be fetched aborts the crawl.
pub fn collect_thesis_links(
    source: &impl PageSource,
    start: &Url,
    site: &Url,
) -> anyhow::Result<Vec<Url>> {
    let mut seen = HashSet::new();
    let mut links: Vec<Url> = Vec::new();
    let mut next = Some(start.clone());

    while let Some(url) = next.take() {
        if !seen.insert(url.clone()) {
            debug!(%url, "result page already visited, stopping");
            break;
        }
        let html = source
            .get(&url)
            .with_context(|| format!("failed to fetch result page {url}"))?;
        let found = result_links(&html, site);
        debug!(%url, found = found.len(), "scanned result page");
        for link in found {
            if !links.contains(&link) {
                links.push(link);
            }
        }
        next = next_page(&html, &url);
    }

    info!(pages = seen.len(), theses = links.len(), "collected thesis links");
    Ok(links)
}

/// Fetch every thesis page. Failures are recorded per item and never stop the crawl.
pub fn fetch_theses(
    source: &impl PageSource,
    links: &[Url],
    delay: Duration,
    progress: &ProgressBar,
) -> Vec<ThesisItem> {
    let mut items = Vec::with_capacity(links.len());
    for url in links {
        progress.set_message(url.to_string());
        let item = match source.get(url) {
            Ok(html) => ThesisItem::Parsed(parse_thesis_page(&html, url)),
            Err(e) => {
                warn!(%url, error = %format!("{e:#}"), "thesis page failed");
                ThesisItem::Failed {
                    url: url.to_string(),
                    error: format!("{e:#}"),
                }
            }
        };
        items.push(item);
        progress.inc(1);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    items
}

/// Crawl, then assemble the JSON document.
pub fn harvest(
    source: &impl PageSource,
    cfg: &ThesesConfig,
    progress: &ProgressBar,
) -> anyhow::Result<Payload> {
    let start = cfg.start_url()?;
    let links = collect_thesis_links(source, &start, &cfg.base_url)?;

    progress.set_length(links.len() as u64);
    let items = fetch_theses(source, &links, cfg.delay, progress);
    progress.finish_and_clear();

    Ok(Payload {
        advisor: cfg.advisor.clone(),
        source: start.to_string(),
        updated_at: chrono::Utc::now().to_rfc3339(),
        count: items.len(),
        items,
    })
}

/// Outcome of a `theses` run, for the status line.
#[derive(Debug)]
pub struct Report {
    pub parsed: usize,
    pub failed: usize,
    pub outcome: WriteOutcome,
}

pub fn run(cfg: &ThesesConfig) -> anyhow::Result<Report> {
    let source = HttpSource::new(cfg.timeout);
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
            .map_err(|e| anyhow::anyhow!("invalid progress template: {e}"))?
            .progress_chars("=> "),
    );

    let payload = harvest(&source, cfg, &progress)?;
    let failed = payload.items.iter().filter(|i| i.is_failed()).count();
    let json = serde_json::to_string_pretty(&payload).context("failed to serialise theses")?;
    let outcome = write_if_changed(&cfg.out_path, &json)?;
    Ok(Report {
        parsed: payload.count - failed,
        failed,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves canned pages; anything else is a 404.
    struct FakeSite {
        pages: HashMap<String, String>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            FakeSite {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
            }
        }
    }

    impl PageSource for FakeSite {
        fn get(&self, url: &Url) -> anyhow::Result<String> {
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("http status: 404 for {url}"))
        }
    }

    const START: &str =
        "https://etd.example.org/ETD-db/ETD-search/search_by_advisor?advisor_name=Pollacci";

    fn config() -> ThesesConfig {
        ThesesConfig {
            base_url: Url::parse("https://etd.example.org").unwrap(),
            advisor: "Pollacci".into(),
            out_path: "theses.json".into(),
            delay: Duration::ZERO,
            timeout: Duration::from_secs(1),
        }
    }

    fn site() -> FakeSite {
        FakeSite::new(&[
            (
                START,
                r#"<a href="/ETD-db/ETD-search/view_etd?URN=etd-1">Tesi 1</a>
                   <a href="/ETD-db/ETD-search/view_etd?URN=etd-2">Tesi 2</a>
                   <a href="search_by_advisor?advisor_name=Pollacci&amp;page=2">Successivo</a>"#,
            ),
            (
                "https://etd.example.org/ETD-db/ETD-search/search_by_advisor?advisor_name=Pollacci&page=2",
                r#"<a href="/ETD-db/ETD-search/view_etd?URN=etd-2">Tesi 2</a>
                   <a href="/ETD-db/ETD-search/view_etd?URN=etd-3">Tesi 3</a>
                   <a href="search_by_advisor?advisor_name=Pollacci">Next</a>"#,
            ),
            (
                "https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-1",
                r#"<html><head><title>ignored - ETD</title></head><body>
                   <h1> Reti   neurali </h1>
                   <dl><dt>Autore</dt><dd>Mario Rossi</dd>
                       <dt>Corso di laurea</dt><dd>INFORMATICA</dd>
                       <dt>Data di discussione</dt><dd>12/07/2023</dd>
                       <dt>Riassunto</dt><dd>Uno <i>studio</i>.</dd></dl></body></html>"#,
            ),
            (
                "https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-3",
                r#"<html><head><title>Analisi dei dati - ETD UniPi</title></head>
                   <body><p>nothing labelled</p></body></html>"#,
            ),
        ])
    }

    #[test]
    fn pagination_stops_at_revisited_page() {
        let cfg = config();
        let links = collect_thesis_links(&site(), &cfg.start_url().unwrap(), &cfg.base_url)
            .expect("links");
        let ids: Vec<&str> = links.iter().filter_map(|u| u.query()).collect();
        assert_eq!(ids, vec!["URN=etd-1", "URN=etd-2", "URN=etd-3"]);
    }

    #[test]
    fn unreachable_result_page_is_fatal() {
        let cfg = config();
        let err = collect_thesis_links(
            &FakeSite::new(&[]),
            &cfg.start_url().unwrap(),
            &cfg.base_url,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to fetch result page"));
    }

    #[test]
    fn detail_page_fields() {
        let url =
            Url::parse("https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-1").unwrap();
        let site = site();
        let thesis = parse_thesis_page(&site.get(&url).unwrap(), &url);
        assert_eq!(thesis.title.as_deref(), Some("Reti neurali"));
        assert_eq!(thesis.author.as_deref(), Some("Mario Rossi"));
        assert_eq!(thesis.degree.as_deref(), Some("INFORMATICA"));
        assert_eq!(thesis.year_or_date.as_deref(), Some("12/07/2023"));
        assert_eq!(thesis.abstract_.as_deref(), Some("Uno studio ."));
    }

    #[test]
    fn title_falls_back_to_document_title() {
        let url =
            Url::parse("https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-3").unwrap();
        let site = site();
        let thesis = parse_thesis_page(&site.get(&url).unwrap(), &url);
        assert_eq!(thesis.title.as_deref(), Some("Analisi dei dati"));
        assert_eq!(thesis.author, None);
    }

    #[test]
    fn failing_detail_page_is_recorded_and_crawl_continues() {
        let cfg = config();
        let payload = harvest(&site(), &cfg, &ProgressBar::hidden()).expect("harvest");
        assert_eq!(payload.count, 3);
        assert_eq!(payload.advisor, "Pollacci");
        assert_eq!(payload.source, START);
        assert!(!payload.items[0].is_failed());
        assert!(payload.items[1].is_failed());
        assert!(!payload.items[2].is_failed());
    }

    #[test]
    fn payload_json_shape() {
        let cfg = config();
        let payload = harvest(&site(), &cfg, &ProgressBar::hidden()).expect("harvest");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&payload).unwrap()).unwrap();
        assert_eq!(json["count"], 3);
        assert!(chrono::DateTime::parse_from_rfc3339(json["updated_at"].as_str().unwrap()).is_ok());

        let ok = &json["items"][0];
        assert_eq!(ok["title"], "Reti neurali");
        assert_eq!(ok["abstract"], "Uno studio .");
        assert!(ok.get("error").is_none());

        let failed = &json["items"][1];
        assert_eq!(
            failed["url"],
            "https://etd.example.org/ETD-db/ETD-search/view_etd?URN=etd-2"
        );
        assert!(failed["error"].as_str().unwrap().contains("404"));
        assert!(failed.get("title").is_none());

        let bare = &json["items"][2];
        assert!(bare["author"].is_null());
    }
}
