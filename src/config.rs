use std::path::PathBuf;

use crate::cli::{PublicationsArgs, Replacement};

/// Exact substrings that survive bibliography parsing and need flattening to plain text.
///
/// Order matters: earlier pairs are applied first.
pub const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[(r"{\^\i}", "i"), (r"\^\i", "i")];

/// Everything the publication pipeline needs, gathered once at startup.
#[derive(Debug, Clone)]
pub struct PublicationsConfig {
    pub bib_path: PathBuf,
    pub out_path: PathBuf,
    pub title: String,
    pub template_path: PathBuf,
    /// Empty means nobody is highlighted.
    pub highlight: String,
    pub replacements: Vec<(String, String)>,
}

impl Default for PublicationsConfig {
    fn default() -> Self {
        PublicationsConfig {
            bib_path: PathBuf::from("publications.bib"),
            out_path: PathBuf::from("publications.html"),
            title: "Publications".to_string(),
            template_path: PathBuf::from("publications_template.html"),
            highlight: "Laura Pollacci".to_string(),
            replacements: default_replacements(),
        }
    }
}

impl From<PublicationsArgs> for PublicationsConfig {
    fn from(args: PublicationsArgs) -> Self {
        let mut replacements = default_replacements();
        replacements.extend(
            args.replacements
                .into_iter()
                .map(|Replacement { from, to }| (from, to)),
        );
        PublicationsConfig {
            bib_path: args.bib_path,
            out_path: args.out_path,
            title: args.title,
            template_path: args.template_path,
            highlight: args.highlight,
            replacements,
        }
    }
}

fn default_replacements() -> Vec<(String, String)> {
    DEFAULT_REPLACEMENTS
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Settings for the ETD thesis crawl.
#[derive(Debug, Clone)]
pub struct ThesesConfig {
    pub base_url: url::Url,
    pub advisor: String,
    pub out_path: PathBuf,
    pub delay: std::time::Duration,
    pub timeout: std::time::Duration,
}

impl ThesesConfig {
    /// Advisor search page the crawl starts from.
    pub fn start_url(&self) -> anyhow::Result<url::Url> {
        let mut url = self.base_url.join("/ETD-db/ETD-search/search_by_advisor")?;
        url.query_pairs_mut()
            .append_pair("advisor_name", &self.advisor);
        Ok(url)
    }
}

impl TryFrom<crate::cli::ThesesArgs> for ThesesConfig {
    type Error = anyhow::Error;
    fn try_from(args: crate::cli::ThesesArgs) -> anyhow::Result<Self> {
        let base_url = url::Url::parse(&args.base_url)
            .map_err(|e| anyhow::anyhow!("invalid ETD base URL `{}`: {e}", args.base_url))?;
        Ok(ThesesConfig {
            base_url,
            advisor: args.advisor,
            out_path: args.out_path,
            delay: std::time::Duration::from_millis(args.delay_ms),
            timeout: std::time::Duration::from_secs(20),
        })
    }
}

/// Settings for sitemap generation.
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    pub root: PathBuf,
    /// Without a trailing slash.
    pub base_url: String,
    pub out_path: PathBuf,
}

impl From<crate::cli::SitemapArgs> for SitemapConfig {
    fn from(args: crate::cli::SitemapArgs) -> Self {
        let out_path = args
            .out_path
            .unwrap_or_else(|| args.root.join("sitemap.xml"));
        SitemapConfig {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            root: args.root,
            out_path,
        }
    }
}
