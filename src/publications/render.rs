use std::fs;

use anyhow::Context;
use tracing::debug;

use super::{group::YearGroup, item::Publication};
use crate::config::PublicationsConfig;

/// Escape text for element content and double- or single-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_highlighted(name: &str, highlight: &str) -> bool {
    !highlight.is_empty() && name.to_lowercase().contains(&highlight.to_lowercase())
}

/// Escape, highlight and join author names ("A", "A and B", "A, B, and C").
pub fn format_authors(authors: &[String], highlight: &str) -> String {
    let out: Vec<String> = authors
        .iter()
        .map(|a| {
            let escaped = escape_html(a);
            if is_highlighted(a, highlight) {
                format!("<strong>{escaped}</strong>")
            } else {
                escaped
            }
        })
        .collect();

    match out.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// DOI as a resolvable link; values that are already http(s) URLs are kept as-is.
pub fn doi_url(doi: &str) -> String {
    let lower = doi.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        doi.to_string()
    } else {
        format!("https://doi.org/{doi}")
    }
}

fn link(href: &str, label: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener">{label}</a>"#,
        escape_html(href)
    )
}

/// One `<li>` for a publication. Missing fields drop their fragment entirely.
pub fn entry_to_html(p: &Publication, highlight: &str) -> String {
    let mut parts = String::from("<li>");
    if !p.authors.is_empty() {
        parts.push_str(&format!(
            r#"<span class="pub-authors">{}</span>"#,
            format_authors(&p.authors, highlight)
        ));
    }
    if let Some(year) = &p.year {
        parts.push_str(&format!(
            r#" (<span class="pub-year">{}</span>)"#,
            escape_html(year)
        ));
    }
    if let Some(title) = &p.title {
        parts.push_str(&format!(
            r#" <span class="pub-title">“{}”</span>."#,
            escape_html(title)
        ));
    }
    if let Some(venue) = &p.venue {
        parts.push_str(&format!(
            r#" <span class="pub-venue"><em>{}</em></span>."#,
            escape_html(venue)
        ));
    }

    let links: Vec<String> = [
        p.doi.as_deref().map(|d| link(&doi_url(d), "DOI")),
        p.url.as_deref().map(|u| link(u, "Link")),
        p.pdf.as_deref().map(|f| link(f, "PDF")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        parts.push_str(&format!(
            r#" <span class="pub-links">[{}]</span>"#,
            links.join(" · ")
        ));
    }

    parts.push_str("</li>");
    parts
}

/// Heading plus list for each year bucket, one element per line.
pub fn render_list(groups: &[YearGroup], highlight: &str) -> String {
    let mut lines = Vec::new();
    for g in groups {
        lines.push(format!("<h3>{}</h3>", escape_html(&g.year)));
        lines.push(r#"<ul class="pub-list" reversed>"#.to_string());
        lines.extend(g.entries.iter().map(|p| entry_to_html(p, highlight)));
        lines.push("</ul>".to_string());
    }
    lines.join("\n")
}

/// Wrap the list in the configured template, or in a standalone page when there is none.
pub fn render_page(list: &str, cfg: &PublicationsConfig) -> anyhow::Result<String> {
    let title = escape_html(&cfg.title);
    if cfg.template_path.exists() {
        debug!(template = %cfg.template_path.display(), "using page template");
        let tpl = fs::read_to_string(&cfg.template_path).with_context(|| {
            format!("failed to read template {}", cfg.template_path.display())
        })?;
        return Ok(tpl.replace("{{TITLE}}", &title).replace("{{LIST}}", list));
    }

    debug!(template = %cfg.template_path.display(), "no template, writing standalone page");
    Ok(standalone_page(&title, list))
}

fn standalone_page(title: &str, list: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body{{font:16px/1.6 system-ui,Segoe UI,Roboto,Helvetica,Arial,sans-serif;margin:2rem;}}
h1,h2,h3{{line-height:1.25;margin:1.2rem 0 .6rem}}
.pub-list{{margin:0 0 1.5rem 1.2rem;}}
.pub-list li{{margin:.3rem 0}}
.pub-authors strong{{font-weight:700}}
.pub-title{{font-weight:600}}
.pub-links a{{text-decoration:none;border-bottom:1px solid;}}
header a{{text-decoration:none;border-bottom:1px solid;}}
</style>
</head>
<body>
<header><h1>{title}</h1></header>
<main>
{list}
</main>
</body>
</html>"#
    )
}
