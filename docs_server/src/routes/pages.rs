//! Minimal server-rendered pages for non-artifact responses.

/// Placeholder while a build is pending. Refreshes itself so the reader
/// lands on the docs once generation finishes.
pub fn generating(full_name: &str, sha: &str) -> String {
    let full_name = escape_html(full_name);
    let sha = escape_html(sha);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="15">
  <title>Generating docs for {full_name}</title>
</head>
<body>
  <h1>Generating documentation</h1>
  <p>Documentation for <strong>{full_name}</strong> at <code>{sha}</code> is being generated.</p>
  <p>This page refreshes automatically.</p>
</body>
</html>
"#
    )
}

/// Error page for a failed build, with the persisted description and a
/// retry form.
pub fn build_error(
    full_name: &str,
    sha: &str,
    code: &str,
    description: Option<&str>,
    retry_path: &str,
) -> String {
    let full_name = escape_html(full_name);
    let sha = escape_html(sha);
    let code = escape_html(code);
    let description = escape_html(description.unwrap_or("No further detail was recorded."));
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Build failed for {full_name}</title>
</head>
<body>
  <h1>Documentation build failed</h1>
  <p><strong>{full_name}</strong> at <code>{sha}</code> failed with <code>{code}</code>.</p>
  <pre>{description}</pre>
  <form method="post" action="{retry_path}">
    <button type="submit">Retry build</button>
  </form>
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_escapes_untrusted_output() {
        let page = build_error(
            "acme/widgets",
            "abc123",
            "build_failed",
            Some("<script>alert(1)</script>"),
            "/github/acme/widgets/abc123/retry",
        );
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains(r#"action="/github/acme/widgets/abc123/retry""#));
    }

    #[test]
    fn generating_page_names_the_revision() {
        let page = generating("acme/widgets", "abc123");
        assert!(page.contains("acme/widgets"));
        assert!(page.contains("abc123"));
        assert!(page.contains("http-equiv=\"refresh\""));
    }
}
