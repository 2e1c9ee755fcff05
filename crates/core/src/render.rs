//! Markdown to HTML conversion for transcript messages.
//!
//! Message text comes from the user and from a remote service, so neither
//! is trusted. The output of [`render_markdown`] is safe to insert into a
//! document as is:
//!
//! - raw HTML blocks and inline tags in the source are escaped and shown
//!   as text,
//! - link and image targets with a scheme other than `http`, `https` or
//!   `mailto` are replaced by `#` (relative targets are kept),
//! - every link opens in a new browsing context without an opener.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];
const NEUTRALIZED_URL: &str = "#";
const LINK_OPEN_TAG: &str = "<a href=\"";
const EXTERNAL_LINK_OPEN_TAG: &str =
    "<a target=\"_blank\" rel=\"noopener noreferrer\" href=\"";

/// Converts Markdown `source` into sanitized HTML.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(source, options).map(sanitize_event);
    let mut output = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut output, parser);

    // Raw markup was turned into escaped text above, so every remaining
    // anchor tag was emitted by the renderer itself.
    output.replace(LINK_OPEN_TAG, EXTERNAL_LINK_OPEN_TAG)
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        debug!("neutralized unsafe url: {}", &*url);
        CowStr::Borrowed(NEUTRALIZED_URL)
    }
}

/// Returns `true` if `url` is relative or uses an allowed scheme.
///
/// Browsers ignore whitespace and control characters inside a scheme,
/// so they are dropped before looking at it.
pub fn is_safe_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = normalized.find(':');
    let path_start = normalized.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => true,
        (Some(colon), _) => {
            let scheme = &normalized[..colon];
            ALLOWED_SCHEMES.iter().any(|allowed| *allowed == scheme)
        }
        (None, _) => true,
    }
}
