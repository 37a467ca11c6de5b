/*!
 * Tests for the inline formatting tag codec
 */

use docweave::formatting::{has_tags, merge_adjacent};
use docweave::{CodecError, FormattingRun, decode, encode, strip, validate};

#[test]
fn test_decode_encode_withSupportedAttributeSets_shouldPreserveRuns() {
    let runs = vec![
        FormattingRun::plain("plain "),
        FormattingRun::bold("bold "),
        FormattingRun::italic("italic "),
        FormattingRun::underline("underlined "),
        FormattingRun::new("both", true, true, false),
    ];

    let encoded = encode(&runs);
    let decoded = decode(&encoded).unwrap();

    assert_eq!(
        encoded,
        "plain <b>bold </b><i>italic </i><u>underlined </u><bi>both</bi>"
    );
    assert_eq!(merge_adjacent(decoded), merge_adjacent(runs));
}

#[test]
fn test_validate_withBalancedTags_shouldPass() {
    let result = validate("<b>bold</b> plain");
    assert!(result.ok);
    assert!(result.message.is_empty());
}

#[test]
fn test_validate_withUnclosedTag_shouldNameTag() {
    let result = validate("<b>bold");

    assert!(!result.ok);
    assert!(result.message.contains("<b>"));
    assert!(matches!(
        result.error,
        Some(CodecError::UnclosedTags { ref tags, .. }) if tags == &vec!["b".to_string()]
    ));
}

#[test]
fn test_validate_withMismatchedClose_shouldDescribeMismatch() {
    let result = validate("<b>x</i>");

    assert!(!result.ok);
    assert!(result.message.to_lowercase().contains("mismatched"));
}

#[test]
fn test_strip_withTaggedText_shouldLeavePlainText() {
    assert_eq!(strip("Say <b>hello</b> to <bi>them</bi>"), "Say hello to them");
    assert!(has_tags("<u>x</u>"));
    assert!(!has_tags("no tags here"));
}

#[test]
fn test_decode_withEditedTagPlacement_shouldFollowEdit() {
    let runs = decode("Das ist <b>wichtig</b>.").unwrap();

    assert_eq!(
        runs,
        vec![
            FormattingRun::plain("Das ist "),
            FormattingRun::bold("wichtig"),
            FormattingRun::plain("."),
        ]
    );
}
