//! Subject classification.
//!
//! Catalog entries tag their subjects with the vocabulary the value comes
//! from (`dcam:memberOf`). Two vocabularies are understood:
//! - [LCC](https://www.loc.gov/catdir/cpso/lcco/) codes, of which only the
//!   bare top-level class letters are resolved to their subject area, and
//! - LCSH subject headings, which are already human-readable.
//!
//! Anything else is dropped.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use tracing::instrument;

use crate::consts;
use crate::tree::Node;

/// Vocabulary a subject value belongs to, taken from the last path segment
/// of its `dcam:memberOf` resource (`http://purl.org/dc/terms/LCC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Library of Congress Classification.
    CallNumber,
    /// Library of Congress Subject Headings.
    SubjectHeading,
}
impl Scheme {
    /// Extracts the scheme code from a membership URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        uri.rsplit('/').next()?.parse().ok()
    }
}
impl FromStr for Scheme {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LCC" => Ok(Self::CallNumber),
            "LCSH" => Ok(Self::SubjectHeading),
            _ => Err(()),
        }
    }
}

/// LCC top-level classes. I, O, W, X and Y are unused by the scheme.
static CALL_NUMBER_CLASSES: LazyLock<HashMap<char, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ('A', "GENERAL WORKS"),
        ('B', "PHILOSOPHY. PSYCHOLOGY. RELIGION"),
        ('C', "AUXILIARY SCIENCES OF HISTORY"),
        ('D', "WORLD HISTORY AND HISTORY OF EUROPE, ASIA, AFRICA, AUSTRALIA, NEW ZEALAND, ETC."),
        ('E', "HISTORY OF THE AMERICAS"),
        ('F', "HISTORY OF THE AMERICAS"),
        ('G', "GEOGRAPHY. ANTHROPOLOGY. RECREATION"),
        ('H', "SOCIAL SCIENCES"),
        ('J', "POLITICAL SCIENCE"),
        ('K', "LAW"),
        ('L', "EDUCATION"),
        ('M', "MUSIC AND BOOKS ON MUSIC"),
        ('N', "FINE ARTS"),
        ('P', "LANGUAGE AND LITERATURE"),
        ('Q', "SCIENCE"),
        ('R', "MEDICINE"),
        ('S', "AGRICULTURE"),
        ('T', "TECHNOLOGY"),
        ('U', "MILITARY SCIENCE"),
        ('V', "NAVAL SCIENCE"),
        ('Z', "BIBLIOGRAPHY. LIBRARY SCIENCE. INFORMATION RESOURCES (GENERAL)"),
    ])
});

/// Returns the broad subject area for a top-level LCC class letter.
///
/// The whole code must be one class letter as written in the catalog.
/// Subclasses (`"PR"`, `"QA76"`) and lowercase letters have no entry.
///
/// # Examples
///
/// ```
/// use pgrdf_extract::subject::call_number_class;
/// assert_eq!(call_number_class("Q"), Some("SCIENCE"));
/// assert_eq!(call_number_class("PS"), None);
/// assert_eq!(call_number_class("X"), None);
/// ```
pub fn call_number_class(call_number: &str) -> Option<&'static str> {
    let mut chars = call_number.trim().chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    CALL_NUMBER_CLASSES.get(&letter).copied()
}

/// Resolves one `rdf:Description` subject node to its display text.
///
/// Returns `None` for unknown schemes, unknown class letters or a missing
/// value; a bad subject is never worth failing a whole record over.
#[instrument(level = "trace", ret)]
pub fn classify(subject: &Node) -> Option<String> {
    let scheme = subject.first_text(consts::SUBJECT_SCHEME_PATH).and_then(Scheme::from_uri)?;
    let value = subject.first_text(consts::SUBJECT_VALUE_PATH)?;
    match scheme {
        Scheme::CallNumber => call_number_class(value).map(str::to_string),
        Scheme::SubjectHeading => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn subject(member_of: &str, value: &str) -> Node {
        let xml = format!(
            r#"<rdf:Description rdf:nodeID="N1">
                <dcam:memberOf rdf:resource="{member_of}"/>
                <rdf:value>{value}</rdf:value>
            </rdf:Description>"#
        );
        let document: Node = xml.parse().unwrap();
        document.get("rdf:Description").unwrap().clone()
    }

    #[test]
    fn test_call_number_table_has_21_classes() {
        assert_eq!(CALL_NUMBER_CLASSES.len(), 21);
        for unused in ['I', 'O', 'W', 'X', 'Y'] {
            assert!(!CALL_NUMBER_CLASSES.contains_key(&unused));
        }
    }

    #[rstest]
    #[case::science("Q", Some("SCIENCE"))]
    #[case::literature("P", Some("LANGUAGE AND LITERATURE"))]
    #[case::padded(" Z ", Some("BIBLIOGRAPHY. LIBRARY SCIENCE. INFORMATION RESOURCES (GENERAL)"))]
    #[case::subclass("PR", None)]
    #[case::subclass_with_number("QA76", None)]
    #[case::lowercase("q", None)]
    #[case::unused_letter("X", None)]
    #[case::empty("", None)]
    fn test_call_number_class(#[case] call_number: &str, #[case] expected: Option<&str>) {
        assert_eq!(call_number_class(call_number), expected);
    }

    #[test]
    fn test_classify_call_number() {
        assert_eq!(classify(&subject("http://purl.org/dc/terms/LCC", "Q")), Some("SCIENCE".to_string()));
        assert_eq!(classify(&subject("http://purl.org/dc/terms/LCC", "Y")), None);
        assert_eq!(classify(&subject("http://purl.org/dc/terms/LCC", "PR")), None);
    }

    #[test]
    fn test_classify_subject_heading_is_returned_unchanged() {
        let node = subject("http://purl.org/dc/terms/LCSH", "Science fiction -- Fiction");
        assert_eq!(classify(&node), Some("Science fiction -- Fiction".to_string()));
    }

    #[rstest]
    #[case::unknown_scheme("http://purl.org/dc/terms/DDC")]
    #[case::scheme_as_substring("http://purl.org/dc/terms/LCCN")]
    #[case::empty_uri("")]
    fn test_classify_unknown_scheme(#[case] member_of: &str) {
        assert_eq!(classify(&subject(member_of, "Q")), None);
    }

    #[test]
    fn test_classify_missing_parts() {
        let no_member: Node = "<d><rdf:value>Q</rdf:value></d>".parse().unwrap();
        assert_eq!(classify(no_member.get("d").unwrap()), None);
        let no_value: Node = r#"<d><dcam:memberOf rdf:resource="x/LCSH"/></d>"#.parse().unwrap();
        assert_eq!(classify(no_value.get("d").unwrap()), None);
        assert_eq!(classify(&Node::Scalar("LCC".to_string())), None);
    }

    #[test]
    fn test_scheme_from_uri() {
        assert_eq!(Scheme::from_uri("http://purl.org/dc/terms/LCSH"), Some(Scheme::SubjectHeading));
        assert_eq!(Scheme::from_uri("LCC"), Some(Scheme::CallNumber));
        assert_eq!(Scheme::from_uri("http://purl.org/dc/terms/"), None);
    }
}
