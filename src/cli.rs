use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a BibTeX file into an HTML publication list
    Publications(PublicationsArgs),
    /// Harvest thesis metadata for an advisor from the ETD database
    Theses(ThesesArgs),
    /// Build sitemap.xml for a static site tree
    Sitemap(SitemapArgs),
}

#[derive(Args, Debug)]
pub struct PublicationsArgs {
    /// Bibliography to read
    #[arg(long = "bib", env = "BIB_PATH", default_value = "publications.bib")]
    pub bib_path: PathBuf,

    /// HTML file to (re)write
    #[arg(long = "out", env = "OUT_PATH", default_value = "publications.html")]
    pub out_path: PathBuf,

    /// Page title, substituted for {{TITLE}}
    #[arg(long, env = "PAGE_TITLE", default_value = "Publications")]
    pub title: String,

    /// Template containing {{TITLE}} and {{LIST}}; a standalone page is produced if absent
    #[arg(
        long = "template",
        env = "TEMPLATE_PATH",
        default_value = "publications_template.html"
    )]
    pub template_path: PathBuf,

    /// Author name to emphasise (case-insensitive substring match)
    #[arg(long, env = "HIGHLIGHT_AUTHOR", default_value = "Laura Pollacci")]
    pub highlight: String,

    /// Extra exact-substring replacement applied to text fields, as FROM=TO
    #[arg(long = "replace", value_name = "FROM=TO")]
    pub replacements: Vec<Replacement>,
}

#[derive(Args, Debug)]
pub struct ThesesArgs {
    /// Root of the ETD site
    #[arg(long, env = "ETD_BASE_URL", default_value = "https://etd.adm.unipi.it")]
    pub base_url: String,

    /// Advisor name to search for
    #[arg(long, env = "ETD_ADVISOR", default_value = "Pollacci")]
    pub advisor: String,

    /// JSON file to write
    #[arg(long = "out", env = "THESES_OUT", default_value = "data/theses.json")]
    pub out_path: PathBuf,

    /// Pause between thesis page requests, in milliseconds
    #[arg(long = "delay-ms", default_value_t = 400)]
    pub delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct SitemapArgs {
    /// Root directory of the site
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Public URL the root is served from
    #[arg(long, env = "BASE_URL", default_value = "https://laurapollacci.github.io")]
    pub base_url: String,

    /// Where to write the sitemap (default: <ROOT>/sitemap.xml)
    #[arg(long = "out")]
    pub out_path: Option<PathBuf>,
}

/// One `FROM=TO` entry for the text clean-up table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl FromStr for Replacement {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the first '=' only; the replacement itself may contain '='.
        let (from, to) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FROM=TO, got `{s}`"))?;
        if from.is_empty() {
            return Err("replacement source must not be empty".to_string());
        }
        Ok(Replacement {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
