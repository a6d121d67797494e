/*!
 * Tests for ISO language code utilities
 */

use dubsmith::language_utils::{get_language_name, language_codes_match, normalize_code};

#[test]
fn test_normalize_code_should_prefer_two_letter_form() {
    assert_eq!(normalize_code("ar").unwrap(), "ar");
    assert_eq!(normalize_code("ara").unwrap(), "ar");
    assert_eq!(normalize_code("FRE").unwrap(), "fr");
    assert!(normalize_code("zz").is_err());
}

#[test]
fn test_language_codes_match_should_cross_formats() {
    assert!(language_codes_match("ar", "ara"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("en", "ar"));
    // unknown codes fall back to a case-insensitive comparison
    assert!(language_codes_match("xx", "XX"));
}

#[test]
fn test_get_language_name_should_use_english_names() {
    assert_eq!(get_language_name("ar").unwrap(), "Arabic");
    assert!(get_language_name("xx").is_err());
}
