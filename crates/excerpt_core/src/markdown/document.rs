//! Document renderer: topics index followed by excerpts.

use crate::markdown::link::hyperlink;
use crate::model::{Paragraph, Tag, TagId};
use std::collections::BTreeSet;

pub const TOPICS_INDEX_HEADING: &str = "# 1. Topics Index";
pub const EXCERPTS_HEADING: &str = "# 2. Excerpts";

/// Renders paragraphs into a markdown document.
///
/// Layout:
/// - Topics index: one `##` heading per distinct tag (by id), in order of
///   first appearance, listing links to every paragraph carrying it.
/// - Excerpts: one `##` heading per paragraph in input order, its content
///   verbatim, then a `**Tags**:` line of tag links (omitted when untagged).
///
/// Tombstoned paragraphs and tags are skipped.
pub fn render_document(paragraphs: &[Paragraph]) -> String {
    let visible: Vec<&Paragraph> = paragraphs.iter().filter(|p| p.is_active()).collect();
    let mut out = String::new();

    out.push_str(TOPICS_INDEX_HEADING);
    out.push_str("\n\n");
    for tag in index_tags(&visible) {
        push_line(&mut out, &format!("## {}", tag.display_text()));
        for paragraph in visible.iter().filter(|p| carries_tag(p, tag.id)) {
            push_line(&mut out, &format!("- {}", hyperlink(&paragraph.title)));
        }
        out.push('\n');
    }

    out.push_str(EXCERPTS_HEADING);
    out.push('\n');
    for paragraph in &visible {
        out.push('\n');
        render_excerpt(&mut out, paragraph);
    }

    out
}

fn render_excerpt(out: &mut String, paragraph: &Paragraph) {
    push_line(out, &format!("## {}\n", paragraph.title));
    out.push_str(&paragraph.content);
    if !paragraph.content.ends_with('\n') {
        out.push('\n');
    }

    let links: Vec<String> = active_tags(paragraph)
        .map(|tag| hyperlink(tag.display_text()))
        .collect();
    if !links.is_empty() {
        push_line(out, &format!("\n**Tags**: {}", links.join(", ")));
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Distinct active tags in order of first appearance.
fn index_tags<'a>(paragraphs: &[&'a Paragraph]) -> Vec<&'a Tag> {
    let mut seen: BTreeSet<TagId> = BTreeSet::new();
    paragraphs
        .iter()
        .copied()
        .flat_map(active_tags)
        .filter(|tag| seen.insert(tag.id))
        .collect()
}

fn active_tags(paragraph: &Paragraph) -> impl Iterator<Item = &Tag> {
    paragraph.tags.iter().filter(|tag| tag.is_active())
}

fn carries_tag(paragraph: &Paragraph, tag_id: TagId) -> bool {
    active_tags(paragraph).any(|tag| tag.id == tag_id)
}
