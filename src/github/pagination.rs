use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn link_entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<([^>]*)>\s*;\s*rel="([^"]+)""#).expect("valid link regex"))
}

fn page_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]page=([^&#]*)").expect("valid page regex"))
}

/// Total item count of a collection requested with `per_page=1`.
///
/// With one item per page the page number of the `rel="last"` link equals the
/// number of items. This leans on the host's pagination contract: a page size
/// other than 1 makes the result wrong, and a collection holding exactly one
/// item has no `Link` header at all, so it is reported as 0.
///
/// Absent header, missing `last` relation or an unparsable page all give 0.
pub fn count_from_link_header(link: Option<&str>) -> u64 {
    let Some(link) = link else {
        return 0;
    };

    match last_page(link) {
        Some(page) => page,
        None => {
            debug!("no usable rel=\"last\" page in Link header {:?}", link);
            0
        }
    }
}

fn last_page(link: &str) -> Option<u64> {
    let url = link_entry_regex()
        .captures_iter(link)
        .find(|caps| caps[2].split_whitespace().any(|rel| rel == "last"))
        .map(|caps| caps[1].to_string())?;

    page_param_regex()
        .captures(&url)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}
