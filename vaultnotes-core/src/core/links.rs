//! Wikilink parsing and preview substitution.
//!
//! A wikilink is `[[Target]]` or `[[Target|Label]]`; an embed is the same with
//! a leading `!`. The closing `]]` is the first one after the opening
//! brackets, so nested or overlapping brackets are not treated specially.
//!
//! In the preview each link becomes an anchor whose `href` uses the
//! [`LINK_SCHEME`] scheme. The host intercepts navigation to that scheme and
//! passes the href to [`target_from_href`] to learn which note was activated.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(.+?)\]\]").expect("valid wikilink regex"));

// Same as LINK_RE but swallows an embed marker so `![[X]]` renders as one anchor.
static RENDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[\[(.+?)\]\]").expect("valid wikilink regex"));

/// URL scheme of preview anchors, including the colon.
pub const LINK_SCHEME: &str = "note:";

/// One wikilink occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Name of the referenced note.
    pub target: String,
    /// Display text; equals `target` when the link has no `|label` part.
    pub label: String,
}

impl Link {
    /// Splits the inside of `[[...]]` on the first `|`.
    pub fn parse(inner: &str) -> Self {
        match inner.split_once('|') {
            Some((target, label)) => Self {
                target: target.to_string(),
                label: label.to_string(),
            },
            None => Self {
                target: inner.to_string(),
                label: inner.to_string(),
            },
        }
    }
}

/// Returns every wikilink in `text` in order of appearance. Embeds are included.
pub fn find_links(text: &str) -> Vec<Link> {
    LINK_RE
        .captures_iter(text)
        .map(|c| Link::parse(&c[1]))
        .collect()
}

/// Escapes HTML special characters in note text placed inside markup.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Backslash-escapes the characters the markdown renderer treats as inline
/// emphasis, code or link syntax.
fn markdown_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Builds the `href` for a link to `target`.
pub fn link_href(target: &str) -> String {
    format!("{LINK_SCHEME}{}", urlencoding::encode(target))
}

/// Replaces every wikilink and embed in `text` with an activatable anchor.
///
/// Everything outside the links is left untouched, so the result is still
/// markdown and can be fed to the renderer. Labels are escaped for both HTML
/// and markdown, so they render as the literal text between the brackets.
pub fn render_with_links(text: &str) -> String {
    RENDER_RE
        .replace_all(text, |c: &Captures| {
            let link = Link::parse(&c[1]);
            format!(
                "<a class=\"wikilink\" href=\"{}\">{}</a>",
                link_href(&link.target),
                markdown_escape(&html_escape(&link.label))
            )
        })
        .into_owned()
}

/// Points every wikilink targeting `old` at `new`, keeping labels and embed
/// markers. Returns `None` when no link targets `old`.
pub(crate) fn rewrite_link_targets(text: &str, old: &str, new: &str) -> Option<String> {
    let mut changed = false;
    let out = LINK_RE.replace_all(text, |c: &Captures| {
        let inner = &c[1];
        let (target, label) = match inner.split_once('|') {
            Some((target, label)) => (target, Some(label)),
            None => (inner, None),
        };
        if target != old {
            return c[0].to_string();
        }
        changed = true;
        match label {
            Some(label) => format!("[[{new}|{label}]]"),
            None => format!("[[{new}]]"),
        }
    });
    if changed {
        Some(out.into_owned())
    } else {
        None
    }
}

/// Recovers the activated note name from a preview anchor's `href`.
///
/// Returns `None` for any other kind of link (http, mailto, anchors), which
/// the host should handle or ignore on its own.
pub fn target_from_href(href: &str) -> Option<String> {
    let encoded = href.strip_prefix(LINK_SCHEME)?;
    let target = urlencoding::decode(encoded).ok()?.into_owned();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}
