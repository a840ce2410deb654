//! Markdown to HTML for the preview pane.

use pulldown_cmark::{html as md_html, Options, Parser};

use super::links::render_with_links;

/// Converts a CommonMark markdown string to an HTML string.
///
/// Enables strikethrough, tables and task lists. Inline HTML is passed through
/// unchanged, which is how wikilink anchors survive rendering; the preview
/// surface is responsible for any sanitisation beyond that.
pub fn render_markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(text, options);
    let mut html_output = String::new();
    md_html::push_html(&mut html_output, parser);
    html_output
}

/// Renders editor text for the preview: wikilinks become anchors, then the
/// whole text goes through the markdown renderer.
pub fn render_preview(text: &str) -> String {
    render_markdown_to_html(&render_with_links(text))
}
