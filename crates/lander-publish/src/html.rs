//! Targeted rewrites of HTML documents.
//!
//! These work on the raw markup with narrow patterns so attribute order and
//! unrelated markup come out byte-for-byte unchanged.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

static ROOT_ABSOLUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(href|src)="/([^/])"#).expect("valid regex"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title>").expect("valid regex"));

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").expect("valid regex"));

/// Turn root-absolute `href="/…"` and `src="/…"` references into
/// root-relative ones. Protocol-relative `//host` references are left alone.
pub fn rewrite_root_absolute(html: &str) -> Cow<'_, str> {
    ROOT_ABSOLUTE.replace_all(html, r#"${1}="${2}"#)
}

/// Replace the content of the first `<title>` element with `title`.
///
/// Documents without a title element are returned unchanged.
pub fn replace_title<'a>(html: &'a str, title: &str) -> Cow<'a, str> {
    let element = format!("<title>{}</title>", escape_text(title));
    TITLE.replacen(html, 1, NoExpand(&element))
}

/// Insert `fragment` immediately after the opening `<body>` tag.
///
/// Without a body tag the fragment is placed at the very start so it still
/// runs before any page script.
pub fn insert_after_body_open(html: &str, fragment: &str) -> String {
    let at = BODY_OPEN.find(html).map(|m| m.end()).unwrap_or(0);

    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..at]);
    out.push_str(fragment);
    out.push_str(&html[at..]);
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_root_absolute_references() {
        let html = r#"<link rel="stylesheet" href="/_next/app.css"><script async src="/_next/main.js" defer></script>"#;

        assert_eq!(
            rewrite_root_absolute(html),
            r#"<link rel="stylesheet" href="_next/app.css"><script async src="_next/main.js" defer></script>"#
        );
    }

    #[test]
    fn leaves_protocol_relative_and_external_references() {
        let html =
            r##"<img src="//cdn.test/a.png"><a href="https://x.test/">x</a><a href="#top">t</a>"##;
        assert_eq!(rewrite_root_absolute(html), html);
    }

    #[test]
    fn root_link_becomes_empty_relative_link() {
        assert_eq!(rewrite_root_absolute(r#"<a href="/">home</a>"#), r#"<a href="">home</a>"#);
    }

    #[test]
    fn replaces_title_content() {
        let html = "<head><title data-x=\"1\">Landing Page Editor</title></head>";
        assert_eq!(
            replace_title(html, "Landing Page"),
            "<head><title>Landing Page</title></head>"
        );
    }

    #[test]
    fn title_replacement_spans_lines_and_ignores_dollars() {
        let html = "<TITLE>\n  Editor\n</TITLE>";
        assert_eq!(replace_title(html, "$1 & co"), "<title>$1 &amp; co</title>");
    }

    #[test]
    fn missing_title_leaves_document_unchanged() {
        let html = "<head></head>";
        assert_eq!(replace_title(html, "Anything"), html);
    }

    #[test]
    fn inserts_after_body_tag_with_attributes() {
        let html = r#"<html><body class="dark"><main></main></body></html>"#;
        assert_eq!(
            insert_after_body_open(html, "<script>1</script>"),
            r#"<html><body class="dark"><script>1</script><main></main></body></html>"#
        );
    }

    #[test]
    fn inserts_at_start_without_body_tag() {
        assert_eq!(insert_after_body_open("<p>x</p>", "<s/>"), "<s/><p>x</p>");
    }
}
