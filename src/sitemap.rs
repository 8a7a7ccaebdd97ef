//! `sitemap.xml` for the static site tree.

use std::{
    fs,
    path::{Component, Path, PathBuf},
    process::Command,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use quick_xml::escape::escape;
use tracing::{debug, info};

use crate::{
    config::SitemapConfig,
    error::InputError,
    output::{WriteOutcome, write_if_changed},
};

/// Directory names that never contain public pages.
pub const EXCLUDE_DIRS: &[&str] = &[".git", ".github", "assets", "tools", "node_modules", "_site"];

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
}

fn is_excluded(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|n| EXCLUDE_DIRS.contains(&n)),
        _ => false,
    })
}

/// Every `.html` file under `root`, relative to it, skipping excluded directories.
pub fn collect_pages(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    let mut stack = vec![PathBuf::new()];
    while let Some(rel_dir) = stack.pop() {
        let dir = root.join(&rel_dir);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
            let rel = rel_dir.join(entry.file_name());
            if is_excluded(&rel) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(rel);
            } else if rel.extension().is_some_and(|e| e == "html") {
                pages.push(rel);
            }
        }
    }
    Ok(pages)
}

/// Public URL of a page: `index.html` collapses to its directory.
pub fn page_url(base_url: &str, rel: &Path) -> String {
    let segments: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let mut path = segments
        .iter()
        .map(|s| utf8_percent_encode(s, PATH_SEGMENT_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/");
    if let Some(stripped) = path.strip_suffix("index.html") {
        path = stripped.to_string();
    }
    format!("{base_url}/{path}")
}

/// Committer date of the last commit touching `rel`, or the file mtime when git has nothing.
pub fn lastmod(root: &Path, rel: &Path) -> anyhow::Result<String> {
    let from_git = Command::new("git")
        .args(["log", "-1", "--format=%cI", "--"])
        .arg(rel)
        .current_dir(root)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(date) = from_git {
        return Ok(date);
    }

    let path = root.join(rel);
    let modified = fs::metadata(&path)
        .and_then(|m| m.modified())
        .with_context(|| format!("failed to stat {}", path.display()))?;
    debug!(page = %rel.display(), "no git history, using mtime");
    Ok(DateTime::<Utc>::from(modified)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string())
}

/// Sitemap document with one `<url>` per entry, in the given order.
pub fn render(entries: &[SitemapEntry]) -> String {
    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#.to_string(),
    ];
    for e in entries {
        lines.push("  <url>".to_string());
        lines.push(format!("    <loc>{}</loc>", escape(e.loc.as_str())));
        lines.push(format!("    <lastmod>{}</lastmod>", escape(e.lastmod.as_str())));
        lines.push("    <changefreq>monthly</changefreq>".to_string());
        lines.push("  </url>".to_string());
    }
    lines.push("</urlset>\n".to_string());
    lines.join("\n")
}

/// Entries for every page under the configured root, sorted by URL.
pub fn build(cfg: &SitemapConfig) -> anyhow::Result<Vec<SitemapEntry>> {
    if !cfg.root.is_dir() {
        return Err(InputError::Missing {
            what: "site root",
            path: cfg.root.clone(),
        }
        .into());
    }
    let mut entries = collect_pages(&cfg.root)?
        .iter()
        .map(|rel| {
            Ok(SitemapEntry {
                loc: page_url(&cfg.base_url, rel),
                lastmod: lastmod(&cfg.root, rel)?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.loc.cmp(&b.loc));
    info!(urls = entries.len(), "collected sitemap entries");
    Ok(entries)
}

pub fn run(cfg: &SitemapConfig) -> anyhow::Result<(WriteOutcome, usize)> {
    let entries = build(cfg)?;
    let outcome = write_if_changed(&cfg.out_path, &render(&entries))?;
    Ok((outcome, entries.len()))
}
