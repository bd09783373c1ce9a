//! Recipe content to HTML: flatten hierarchical items into one markdown
//! document, point relative images at something loadable, then render.

mod images;
mod inline;
mod render;

pub use images::{resolve_image_paths, ImageResolution};
pub use inline::{inline_to_html, parse_inline, InlineSegment};
pub use render::{render_markdown_html, PLACEHOLDER_IMAGE};

use crate::model::HierarchicalItem;

/// Leading whitespace added per hierarchy level
pub const INDENT: &str = "  ";

/// Join items into a single markdown string, one paragraph per item
pub fn content_to_markdown(items: &[HierarchicalItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", INDENT.repeat(item.level as usize), item.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full section pipeline: flatten, resolve images, render
pub fn render_section(items: &[HierarchicalItem], base_url: &str, image_urls: &[String]) -> String {
    let markdown = content_to_markdown(items);
    let resolved = resolve_image_paths(&markdown, base_url, image_urls);
    render_markdown_html(&resolved)
}
