use std::collections::HashMap;

/// Identity key of an author name.
///
/// Two names are the same author when they are equal after Unicode
/// lowercasing: `"Mark Twain"` and `"mark twain"` fold to the same key.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Author ids already known to exist in the database, keyed by folded name.
///
/// One cache belongs to one ingestion run. It only ever grows: entries are
/// added by batched lookups ([`Repository::resolve_authors`]) and after each
/// committed record ([`Repository::store_book`]), so a name is looked up or
/// created at most once per run.
///
/// [`Repository::resolve_authors`]: crate::Repository::resolve_authors
/// [`Repository::store_book`]: crate::Repository::store_book
#[derive(Debug, Clone, Default)]
pub struct AuthorCache {
    ids: HashMap<String, i64>,
}
impl AuthorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the author, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.ids.get(&fold_name(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Folded, deduplicated names not yet in the cache, in first-seen order.
    pub fn missing<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in names {
            let folded = fold_name(name);
            if !self.ids.contains_key(&folded) && !missing.contains(&folded) {
                missing.push(folded);
            }
        }
        missing
    }

    pub(crate) fn get_folded(&self, folded: &str) -> Option<i64> {
        self.ids.get(folded).copied()
    }

    pub(crate) fn insert_folded(&mut self, folded: String, id: i64) {
        self.ids.insert(folded, id);
    }
}
impl Extend<(String, i64)> for AuthorCache {
    /// Expects names that are already folded.
    fn extend<T: IntoIterator<Item = (String, i64)>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Mark Twain", "mark twain")]
    #[case("MARK TWAIN", "mark twain")]
    #[case("Dostoyevsky, Fyodor", "dostoyevsky, fyodor")]
    #[case("ÉMILE ZOLA", "émile zola")]
    #[case("Ἀριστοτέλης", "ἀριστοτέλης")]
    fn test_fold_name(#[case] name: &str, #[case] folded: &str) {
        assert_eq!(fold_name(name), folded);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut cache = AuthorCache::new();
        cache.insert_folded(fold_name("Mark Twain"), 7);
        assert_eq!(cache.get("mark twain"), Some(7));
        assert_eq!(cache.get("MARK TWAIN"), Some(7));
        assert!(!cache.contains("Samuel Clemens"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_is_folded_and_deduplicated() {
        let mut cache = AuthorCache::new();
        cache.extend([(fold_name("Known"), 1)]);
        let missing = cache.missing(["Twain, Mark", "known", "twain, mark", "Austen, Jane"]);
        assert_eq!(missing, vec!["twain, mark", "austen, jane"]);
        assert!(AuthorCache::new().missing(Vec::<&str>::new()).is_empty());
    }
}
