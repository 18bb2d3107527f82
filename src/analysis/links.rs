//! Link mining over cleaned page text.
//!
//! Five categories are matched in a fixed precedence: linkedin, github,
//! stackoverflow, email, url. A match is dropped when its text span overlaps
//! a span already claimed by an earlier category, and generic URLs are also
//! dropped when their host belongs to one of the profile sites or they point
//! at a binary asset. Accepted links come out in text order.

use super::model::{Link, LinkCategory};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static LINKEDIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://)?(?:www\.)?linkedin\.com/(?:in|company|profile)/[^\s<>(),]+")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static GITHUB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://)?(?:www\.)?github\.com/[^\s<>(),]+").expect("valid regex")
});

#[allow(clippy::expect_used)]
static STACKOVERFLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://)?(?:www\.)?stackoverflow\.com/(?:users|questions|answers|a|q)/[^\s<>(),]+",
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.\-]+@[\w.\-]+\.[a-zA-Z]{2,}").expect("valid regex"));

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://)?(?:www\.)?(?:[a-z0-9-]+\.)+[a-z]{2,}(?:/[^\s<>(),]*)?")
        .expect("valid regex")
});

/// Hosts owned by the specific categories
const RESERVED_HOSTS: [(&str, LinkCategory); 3] = [
    ("linkedin.com", LinkCategory::Linkedin),
    ("github.com", LinkCategory::Github),
    ("stackoverflow.com", LinkCategory::Stackoverflow),
];

/// Extensions of asset files, not profile or contact links
const ASSET_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".pdf", ".doc", ".docx"];

const TRAILING_PUNCTUATION: [char; 5] = ['.', ',', ';', ':', ')'];
const BRACKETS: [char; 8] = ['(', ')', '[', ']', '{', '}', '<', '>'];

fn pattern(category: LinkCategory) -> Option<&'static Regex> {
    match category {
        LinkCategory::Linkedin => Some(&LINKEDIN),
        LinkCategory::Github => Some(&GITHUB),
        LinkCategory::Stackoverflow => Some(&STACKOVERFLOW),
        LinkCategory::Email => Some(&EMAIL),
        LinkCategory::Url => Some(&URL),
        LinkCategory::Annotation => None,
    }
}

/// Find all links in `text`, attributing them to `page`. Never fails.
pub fn mine_links(text: &str, page: u32) -> Vec<Link> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut accepted: Vec<(usize, LinkCategory, String)> = Vec::new();

    for category in LinkCategory::TEXT_PRECEDENCE {
        let Some(regex) = pattern(category) else {
            continue;
        };
        for m in regex.find_iter(text) {
            let span = m.range();
            if overlaps_claim(&claimed, &span) {
                continue;
            }
            let Some(uri) = accept(category, m.as_str()) else {
                continue;
            };
            accepted.push((span.start, category, uri));
            claimed.push(span);
        }
    }

    accepted.sort_by_key(|(start, category, _)| (*start, *category));
    accepted
        .into_iter()
        .map(|(_, category, uri)| Link::new(page, category, uri))
        .collect()
}

fn overlaps_claim(claimed: &[Range<usize>], span: &Range<usize>) -> bool {
    claimed
        .iter()
        .any(|c| c.start < span.end && span.start < c.end)
}

fn accept(category: LinkCategory, raw: &str) -> Option<String> {
    let cleaned = clean_url(raw);
    if cleaned.is_empty() {
        return None;
    }

    match category {
        LinkCategory::Email => cleaned
            .contains('@')
            .then(|| format!("mailto:{}", cleaned)),
        LinkCategory::Url => {
            if claimed_by(&cleaned).is_some() || is_asset(&cleaned) {
                None
            } else {
                Some(ensure_https(&cleaned))
            }
        }
        _ => Some(ensure_https(&cleaned)),
    }
}

/// The specific category that owns the host of `candidate`, if any.
///
/// `candidate` may carry a scheme, `www.` prefix and path.
pub fn claimed_by(candidate: &str) -> Option<LinkCategory> {
    let host = host_of(candidate);
    RESERVED_HOSTS
        .iter()
        .find(|(reserved, _)| {
            host == *reserved
                || host
                    .strip_suffix(reserved)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
        .map(|(_, category)| *category)
}

fn host_of(candidate: &str) -> String {
    let lower = candidate.to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// True when the link ends in a binary asset extension (query and fragment ignored)
fn is_asset(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Tidy a raw regex match into a single link token.
///
/// Trims whitespace, strips trailing `. , ; : )`, removes brackets anywhere
/// and keeps only the first whitespace-separated token.
pub fn clean_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let unbracketed: String = trimmed.chars().filter(|c| !BRACKETS.contains(c)).collect();
    unbracketed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Prefix `https://` unless the value already has an http(s) scheme.
/// Values without a dot are left alone.
pub fn ensure_https(value: &str) -> String {
    if value.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http")) {
        value.to_string()
    } else if value.contains('.') {
        format!("https://{}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn mined(text: &str) -> Vec<(LinkCategory, String)> {
        mine_links(text, 1)
            .into_iter()
            .map(|l| (l.category, l.uri))
            .collect()
    }

    #[test]
    fn test_clean_url_strips_trailing_comma_and_space() {
        assert_eq!(clean_url(" http://example.com/a, "), "http://example.com/a");
    }

    #[rstest]
    #[case("(example.com/x).", "example.com/x")]
    #[case("[www.example.com];", "www.example.com")]
    #[case("example.com:", "example.com")]
    #[case("example.com/a b", "example.com/a")]
    #[case(" ... ", "")]
    fn test_clean_url(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_url(raw), expected);
    }

    #[rstest]
    #[case("www.example.com", "https://www.example.com")]
    #[case("http://x.com", "http://x.com")]
    #[case("https://x.com", "https://x.com")]
    #[case("HTTPS://X.COM/JANE", "HTTPS://X.COM/JANE")]
    #[case("Http://x.com", "Http://x.com")]
    #[case("localtoken", "localtoken")]
    fn test_ensure_https(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(ensure_https(value), expected);
    }

    #[rstest]
    #[case("Site HTTPS://EXAMPLE.COM/JANE", LinkCategory::Url, "HTTPS://EXAMPLE.COM/JANE")]
    #[case("and Https://example.org/x", LinkCategory::Url, "Https://example.org/x")]
    #[case("HTTP://GitHub.com/jane", LinkCategory::Github, "HTTP://GitHub.com/jane")]
    fn test_mixed_case_scheme_is_kept(
        #[case] text: &str,
        #[case] category: LinkCategory,
        #[case] expected: &str,
    ) {
        assert_eq!(mined(text), vec![(category, expected.to_string())]);
    }

    #[test]
    fn test_email_and_github_in_text_order() {
        assert_eq!(
            mined("Contact me at jane@example.com or github.com/janedoe"),
            vec![
                (LinkCategory::Email, "mailto:jane@example.com".to_string()),
                (LinkCategory::Github, "https://github.com/janedoe".to_string()),
            ]
        );
    }

    #[test]
    fn test_linkedin_host_not_recounted_as_url() {
        assert_eq!(
            mined("linkedin.com/in/john-doe, see www.johndoe.dev"),
            vec![
                (
                    LinkCategory::Linkedin,
                    "https://linkedin.com/in/john-doe".to_string()
                ),
                (LinkCategory::Url, "https://www.johndoe.dev".to_string()),
            ]
        );
    }

    #[test]
    fn test_stackoverflow_profile() {
        assert_eq!(
            mined("answers at https://stackoverflow.com/users/12345/jane."),
            vec![(
                LinkCategory::Stackoverflow,
                "https://stackoverflow.com/users/12345/jane".to_string()
            )]
        );
    }

    #[test]
    fn test_scheme_is_preserved() {
        assert_eq!(
            mined("Blog: http://jane.example.org/posts"),
            vec![(LinkCategory::Url, "http://jane.example.org/posts".to_string())]
        );
    }

    #[test]
    fn test_reserved_hosts_without_profile_path_are_dropped() {
        assert!(mined("I love github.com and linkedin.com").is_empty());
    }

    #[test]
    fn test_asset_links_are_skipped() {
        assert_eq!(
            mined("see example.com/photo.PNG and resume.pdf or example.com/cv"),
            vec![(LinkCategory::Url, "https://example.com/cv".to_string())]
        );
    }

    #[test]
    fn test_email_local_part_not_mined_as_url() {
        assert_eq!(
            mined("mail john.doe@mail.example.co.uk today"),
            vec![(
                LinkCategory::Email,
                "mailto:john.doe@mail.example.co.uk".to_string()
            )]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let links = mined("github.com/a github.com/a");
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_links_carry_page() {
        let links = mine_links("x@y.io", 7);
        assert_eq!(links[0].page, 7);
        assert!(links[0].rect.is_none());
    }

    #[rstest]
    #[case("https://www.linkedin.com/in/x", Some(LinkCategory::Linkedin))]
    #[case("uk.linkedin.com", Some(LinkCategory::Linkedin))]
    #[case("GitHub.com/x", Some(LinkCategory::Github))]
    #[case("stackoverflow.com/q/1", Some(LinkCategory::Stackoverflow))]
    #[case("notgithub.com/x", None)]
    #[case("example.com/github.com", None)]
    fn test_claimed_by(#[case] candidate: &str, #[case] expected: Option<LinkCategory>) {
        assert_eq!(claimed_by(candidate), expected);
    }

    #[test]
    fn test_specific_categories_never_reemitted_as_url() {
        let text = "github.com/a linkedin.com/company/b stackoverflow.com/q/1 www.site.io";
        let links = mined(text);
        let urls: Vec<_> = links
            .iter()
            .filter(|(c, _)| *c == LinkCategory::Url)
            .collect();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].1, "https://www.site.io");
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_plain_prose_has_no_links() {
        assert!(mined("Nothing to see here. Version 12. 5 shipped").is_empty());
    }
}
