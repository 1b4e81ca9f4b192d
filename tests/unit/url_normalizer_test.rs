//! Unit tests for the URL normalizer's public functions.
//!
//! Each case is one address-bar input and the target the browser should
//! navigate to.

use rstest::rstest;

use suma::services::url_normalizer::{
    classify_input, display_host, host_of, is_blank, normalize, sanitize_for_storage, search_url,
    with_www_prefix, InputKind, BLANK_PAGE,
};

#[rstest]
#[case("openai.com", "https://openai.com")]
#[case("  docs.rs/serde  ", "https://docs.rs/serde")]
#[case("http://example.com", "http://example.com")]
#[case("https://example.com/path?q=1", "https://example.com/path?q=1")]
#[case("hello world", "https://www.google.com/search?q=hello%20world")]
#[case("rust", "https://www.google.com/search?q=rust")]
#[case("c++ & you", "https://www.google.com/search?q=c%2B%2B%20%26%20you")]
#[case("", BLANK_PAGE)]
#[case("about:blank", BLANK_PAGE)]
fn test_normalize(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize(input), expected);
}

#[rstest]
#[case("", InputKind::Blank)]
#[case("   ", InputKind::Blank)]
#[case("example.com", InputKind::LikelyUrl)]
#[case("ftp://files", InputKind::LikelyUrl)]
#[case("weather", InputKind::Ambiguous)]
fn test_classify_input(#[case] input: &str, #[case] expected: InputKind) {
    assert_eq!(classify_input(input), expected);
}

#[test]
fn test_dotted_query_with_space_is_search() {
    assert_eq!(normalize("what is 1.5"), search_url("what is 1.5"));
}

#[test]
fn test_blank_is_recognized_after_normalize() {
    assert!(is_blank(&normalize("   ")));
    assert!(!is_blank(&normalize("example.com")));
}

#[test]
fn test_sanitize_for_storage() {
    assert_eq!(sanitize_for_storage("https://Example.com"), "https://example.com/");
    assert_eq!(sanitize_for_storage("about:blank"), "");
    assert_eq!(sanitize_for_storage(""), "");
}

#[test]
fn test_host_helpers() {
    assert_eq!(host_of("https://WWW.Example.com/a").as_deref(), Some("www.example.com"));
    assert_eq!(display_host("https://www.example.com/a").as_deref(), Some("example.com"));
    assert_eq!(host_of("not a url"), None);
}

#[rstest]
#[case("https://example.com/", Some("https://www.example.com/"))]
#[case("https://www.example.com/", None)]
#[case("http://localhost:3000/", None)]
#[case("http://[::1]/", None)]
fn test_www_prefix(#[case] url: &str, #[case] expected: Option<&str>) {
    assert_eq!(with_www_prefix(url).as_deref(), expected);
}
