//! Pagination link rendering
//!
//! Renders RFC 5988 style `Link` header values for the navigation pages
//! that apply to a result window. Each link replays the caller's own
//! request parameters with only the offset recomputed for the target page.

use atheneum_core::pagination::{offset_for_page, PageNumbers};

use crate::engine::SearchRequest;

/// Render `<url>; rel="..."` values for every applicable navigation page
///
/// `base_url` is the path the request arrived on, without a query string.
pub fn render(
    base_url: &str,
    request: &SearchRequest,
    limit: u64,
    pages: &PageNumbers,
) -> Vec<String> {
    let mut links = Vec::new();
    for (rel, page) in [
        ("first", pages.first),
        ("prev", pages.prev),
        ("next", pages.next),
        ("last", pages.last),
    ] {
        if let Some(page) = page {
            links.push(format!(
                "<{}?{}>; rel=\"{}\"",
                base_url,
                query_string(request, limit, offset_for_page(page, limit)),
                rel
            ));
        }
    }
    links
}

fn query_string(request: &SearchRequest, limit: u64, offset: u64) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    if let Some(filter) = &request.filter {
        pairs.push(("filter".to_string(), filter.clone()));
    }
    if let Some(fields) = &request.fields {
        pairs.push(("fields".to_string(), fields.join(",")));
    }
    if let Some(sort) = &request.sort {
        pairs.push(("sort".to_string(), sort.clone()));
    }
    if let Some(order_by) = &request.order_by {
        pairs.push(("orderBy".to_string(), order_by.clone()));
    }
    pairs.push(("limit".to_string(), limit.to_string()));
    pairs.push(("offset".to_string(), offset.to_string()));

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a query value, keeping RFC 3986 unreserved bytes
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", byte));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(filter: Option<&str>) -> SearchRequest {
        SearchRequest {
            filter: filter.map(str::to_string),
            fields: None,
            sort: None,
            order_by: None,
            limit: Some(2),
            offset: None,
            expand_objectives: false,
        }
    }

    #[test]
    fn test_encode_reserved_bytes() {
        assert_eq!(encode("name='a b'"), "name%3D%27a%20b%27");
        assert_eq!(encode("plain-value_1.0~x"), "plain-value_1.0~x");
    }

    #[test]
    fn test_first_page_renders_next_and_last() {
        let pages = PageNumbers::compute(2, 0, 4);
        let links = render("/resources", &request(None), 2, &pages);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "</resources?limit=2&offset=2>; rel=\"next\"");
        assert_eq!(links[1], "</resources?limit=2&offset=2>; rel=\"last\"");
    }

    #[test]
    fn test_last_page_renders_prev_and_first() {
        let pages = PageNumbers::compute(2, 2, 4);
        let links = render("/resources", &request(None), 2, &pages);
        assert_eq!(links.len(), 2);
        assert!(links[0].ends_with("rel=\"first\""));
        assert!(links[0].contains("offset=0"));
        assert!(links[1].ends_with("rel=\"prev\""));
    }

    #[test]
    fn test_links_replay_request_parameters() {
        let mut req = request(Some("name~'frac'"));
        req.sort = Some("rating".to_string());
        req.order_by = Some("desc".to_string());

        let pages = PageNumbers::compute(2, 0, 4);
        let links = render("/resources", &req, 2, &pages);
        let next = &links[0];
        assert!(next.contains("filter=name~%27frac%27"));
        assert!(next.contains("sort=rating"));
        assert!(next.contains("orderBy=desc"));
    }

    #[test]
    fn test_single_page_renders_nothing() {
        let pages = PageNumbers::compute(100, 0, 4);
        assert!(render("/resources", &request(None), 100, &pages).is_empty());
    }
}
