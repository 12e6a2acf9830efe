use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

macro_rules! path {
    ($name:ident, [$($step:literal),+ $(,)?]) => {
        pub(crate) const $name: &[&str] = &[$($step),+];
    };
}

pub(crate) const ROOT_ELEMENT: &str = "rdf:RDF";
pub(crate) const EBOOK_ELEMENT: &str = "pgterms:ebook";

regex!(EBOOK_ABOUT_REGEX, r"^ebooks/(\d+)$");
regex!(DATE_REGEX, r"^(\d{4})-(\d{2})-(\d{2})(?:$|T)");

// Relative to the `pgterms:ebook` entry.
path!(ABOUT_PATH, ["$", "rdf:about"]);
path!(TITLE_PATH, ["dcterms:title"]);
path!(AUTHORS_PATH, ["dcterms:creator", "pgterms:agent", "pgterms:name"]);
path!(PUBLISHER_PATH, ["dcterms:publisher"]);
path!(ISSUED_PATH, ["dcterms:issued"]);
path!(LANGUAGE_PATH, ["dcterms:language", "rdf:Description", "rdf:value"]);
path!(SUBJECTS_PATH, ["dcterms:subject", "rdf:Description"]);
// Relative to the `rdf:RDF` root, licenses live outside the ebook entry.
path!(LICENSES_PATH, ["cc:Work", "cc:license", "$", "rdf:resource"]);
// Relative to a subject's `rdf:Description`.
path!(SUBJECT_SCHEME_PATH, ["dcam:memberOf", "$", "rdf:resource"]);
path!(SUBJECT_VALUE_PATH, ["rdf:value"]);
