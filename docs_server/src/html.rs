//! Branding injection for HTML artifact responses.
//!
//! Externally supplied markup goes immediately before the closing head tag
//! and immediately before the closing body tag. A missing anchor skips that
//! insertion silently; the artifact is served as stored.

const HEAD_ANCHOR: &str = "</head";
const BODY_ANCHOR: &str = "</body";

/// Insert `head_snippet` before `</head` and `body_snippet` before `</body`.
/// Empty snippets are no-ops.
pub fn inject_branding(html: &str, head_snippet: &str, body_snippet: &str) -> String {
    let mut output = html.to_string();

    if !body_snippet.is_empty() {
        if let Some(at) = output.find(BODY_ANCHOR) {
            output.insert_str(at, body_snippet);
        }
    }
    if !head_snippet.is_empty() {
        if let Some(at) = output.find(HEAD_ANCHOR) {
            output.insert_str(at, head_snippet);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><head><title>t</title></head><body><p>hi</p></body></html>";

    #[test]
    fn inserts_before_both_anchors() {
        let out = inject_branding(PAGE, "<link href=x>", "<script src=y></script>");
        assert_eq!(
            out,
            "<html><head><title>t</title><link href=x></head>\
             <body><p>hi</p><script src=y></script></body></html>"
        );
    }

    #[test]
    fn missing_head_anchor_skips_head_insertion_only() {
        let out = inject_branding("<body>x</body>", "<link>", "<script></script>");
        assert!(!out.contains("<link>"));
        assert_eq!(out, "<body>x<script></script></body>");
    }

    #[test]
    fn missing_body_anchor_skips_body_insertion_only() {
        let out = inject_branding("<head></head>x", "<link>", "<script></script>");
        assert_eq!(out, "<head><link></head>x");
    }

    #[test]
    fn no_anchors_returns_input_unchanged() {
        assert_eq!(inject_branding("plain text", "<link>", "<script>"), "plain text");
    }

    #[test]
    fn empty_snippets_are_noops() {
        assert_eq!(inject_branding(PAGE, "", ""), PAGE);
    }
}
