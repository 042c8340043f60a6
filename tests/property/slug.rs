//! Property tests for image file-name slugs

use adcraft::image::safe_slug;
use proptest::prelude::*;

proptest! {
    #[test]
    fn slug_is_bounded_and_file_safe(text in ".{0,120}", max_len in 1usize..80) {
        let slug = safe_slug(&text, max_len);

        prop_assert!(!slug.is_empty());
        prop_assert!(slug.chars().count() <= max_len);
        prop_assert!(!slug.contains("--"));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(slug.chars().all(|c| c.is_alphanumeric() || c == '-'));
    }

    #[test]
    fn slug_is_deterministic(text in "[ -~]{0,80}", max_len in 1usize..80) {
        prop_assert_eq!(safe_slug(&text, max_len), safe_slug(&text, max_len));
    }

    #[test]
    fn ascii_words_keep_their_order(words in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let text = words.join(" ");
        prop_assert_eq!(safe_slug(&text, 200), words.join("-"));
    }
}
