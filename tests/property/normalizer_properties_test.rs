//! Property-based tests for address-bar normalization.

use proptest::prelude::*;

use suma::services::url_normalizer::{
    classify_input, is_blank, normalize, search_url, InputKind, BLANK_PAGE, SEARCH_ENDPOINT,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn output_is_always_navigable(input in "\\PC{0,40}") {
        let out = normalize(&input);
        prop_assert!(
            out == BLANK_PAGE || out.starts_with("http://") || out.starts_with("https://"),
            "unexpected output {:?} for {:?}", out, input
        );
    }

    #[test]
    fn whitespace_padding_is_ignored(input in "[a-z.]{1,20}", pad in "[ \\t]{0,4}") {
        let padded = format!("{pad}{input}{pad}");
        prop_assert_eq!(normalize(&padded), normalize(&input));
    }

    #[test]
    fn explicit_http_urls_pass_through(host in "[a-z]{1,10}\\.[a-z]{2,4}", path in "(/[a-z0-9]{0,6}){0,3}", tls in any::<bool>()) {
        let scheme = if tls { "https" } else { "http" };
        let url = format!("{scheme}://{host}{path}");
        prop_assert_eq!(normalize(&url), url);
    }

    #[test]
    fn inner_whitespace_means_search(a in "[a-z.]{1,10}", b in "[a-z.]{1,10}") {
        let input = format!("{a} {b}");
        prop_assert!(normalize(&input).starts_with(SEARCH_ENDPOINT));
    }

    #[test]
    fn dotted_words_get_https(name in "[a-z]{1,10}", tld in "[a-z]{2,4}") {
        let input = format!("{name}.{tld}");
        prop_assert_eq!(classify_input(&input), InputKind::LikelyUrl);
        prop_assert_eq!(normalize(&input), format!("https://{input}"));
    }

    #[test]
    fn bare_words_are_searched(word in "[a-z0-9]{1,16}") {
        prop_assert_eq!(classify_input(&word), InputKind::Ambiguous);
        prop_assert_eq!(normalize(&word), search_url(&word));
    }

    #[test]
    fn blank_input_is_blank_page(spaces in "[ \\t\\n]{0,6}") {
        prop_assert!(is_blank(&spaces));
        prop_assert_eq!(normalize(&spaces), BLANK_PAGE);
    }
}
