//! BibTeX to HTML publication list.
//!
//! The pipeline is load → normalise → sort/group → render → write-if-changed.

pub mod group;
pub mod item;
pub mod loader;
pub mod normalize;
pub mod render;

use tracing::info;

use crate::{
    config::PublicationsConfig,
    output::{WriteOutcome, write_if_changed},
};

use self::item::Publication;

/// Render the page for `cfg` without touching the output file.
pub fn build(cfg: &PublicationsConfig) -> anyhow::Result<String> {
    let records = loader::load(&cfg.bib_path, &cfg.replacements)?;
    let pubs: Vec<Publication> = records
        .iter()
        .map(Publication::from_record)
        .collect();
    let groups = group::group_by_year(pubs);
    info!(buckets = groups.len(), "grouped publications by year");
    let list = render::render_list(&groups, &cfg.highlight);
    render::render_page(&list, cfg)
}

/// Build the page and write it if it changed.
pub fn run(cfg: &PublicationsConfig) -> anyhow::Result<WriteOutcome> {
    let page = build(cfg)?;
    write_if_changed(&cfg.out_path, &page)
}
