//! Link harvesting from raw HTML without an HTML parser: a minimal scan
//! for `href=`/`src=` attribute markers. The scope is feeding the job
//! queue, not rendering, so malformed markup is skipped rather than
//! rejected.

use url::Url;

const LINK_MARKERS: [&str; 2] = ["href=", "src="];

pub(crate) fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// Extract same-host links from a page body, resolved against the page
/// URL. Off-host links are discarded to keep the scan scoped to its
/// target.
pub fn extract_links(base: &Url, html: &[u8]) -> Vec<Url> {
    let text = String::from_utf8_lossy(html);
    let mut rest: &str = &text;
    let mut found = Vec::new();

    loop {
        // earliest marker occurrence wins; href= is searched first
        let mut best: Option<(usize, usize)> = None;
        for marker in LINK_MARKERS {
            if let Some(idx) = rest.find(marker) {
                if best.map_or(true, |(b, _)| idx < b) {
                    best = Some((idx, marker.len()));
                }
            }
        }
        let Some((idx, marker_len)) = best else { break };
        rest = &rest[idx + marker_len..];

        let value = match rest.as_bytes().first().copied() {
            Some(quote @ (b'"' | b'\'')) => {
                rest = &rest[1..];
                match rest.find(quote as char) {
                    Some(end) => {
                        let value = &rest[..end];
                        rest = &rest[end + 1..];
                        value
                    }
                    // unterminated quote: nothing more to extract safely
                    None => continue,
                }
            }
            Some(_) => {
                let end = match (rest.find(' '), rest.find('>')) {
                    (Some(a), Some(b)) => a.min(b),
                    (Some(a), None) => a,
                    (None, Some(b)) => b,
                    (None, None) => continue,
                };
                let value = &rest[..end];
                rest = &rest[end..];
                value
            }
            None => break,
        };

        match base.join(value) {
            Ok(resolved) if same_host(&resolved, base) => found.push(resolved),
            _ => {}
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://target.eg/index.html").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(&base(), html.as_bytes())
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn extracts_quoted_href_and_src() {
        let html = r#"<a href="/admin/">x</a><img src='logo.png'>"#;
        assert_eq!(
            links(html),
            vec!["http://target.eg/admin/", "http://target.eg/logo.png"]
        );
    }

    #[test]
    fn extracts_unquoted_values() {
        let html = "<a href=/one >x</a><img src=/two.png>";
        assert_eq!(
            links(html),
            vec!["http://target.eg/one", "http://target.eg/two.png"]
        );
    }

    #[test]
    fn discards_offsite_links() {
        let html = r#"<a href="http://other.eg/page">x</a><a href="/local">y</a>"#;
        assert_eq!(links(html), vec!["http://target.eg/local"]);
    }

    #[test]
    fn resolves_relative_paths() {
        let html = r#"<a href="../up.html">x</a>"#;
        assert_eq!(links(html), vec!["http://target.eg/up.html"]);
    }

    #[test]
    fn survives_unterminated_quotes() {
        let html = r#"<a href="/ok"><a href="broken"#;
        assert_eq!(links(html), vec!["http://target.eg/ok"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(links("").is_empty());
        assert!(links("no links here").is_empty());
    }

    #[test]
    fn different_port_counts_as_offsite() {
        let html = r#"<a href="http://target.eg:8080/x">y</a>"#;
        assert!(links(html).is_empty());
    }
}
