//! Channel keyword filter.

/// Anything with a title and a description that a keyword can match against.
pub trait Searchable {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
}

/// Keep the items that match at least one keyword.
///
/// `keywords` is a semicolon-delimited list. Terms are trimmed and empty terms
/// are ignored. Matching is a case-insensitive substring test against the
/// title or the description. A missing or blank keyword string keeps every
/// item. Order is preserved.
pub fn filter_by_keywords<T: Searchable>(items: Vec<T>, keywords: Option<&str>) -> Vec<T> {
    let terms: Vec<String> = keywords
        .unwrap_or_default()
        .split(';')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if terms.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            let title = item.title().to_lowercase();
            let description = item.description().to_lowercase();
            terms
                .iter()
                .any(|t| title.contains(t.as_str()) || description.contains(t.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, &'static str);

    impl Searchable for Item {
        fn title(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            self.1
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            Item("Election night special", "Live coverage"),
            Item("Morning show", "Guests discuss the budget"),
            Item("Cooking with Nino", ""),
        ]
    }

    #[test]
    fn blank_keywords_keep_everything() {
        assert_eq!(filter_by_keywords(sample(), None), sample());
        assert_eq!(filter_by_keywords(sample(), Some("")), sample());
        assert_eq!(filter_by_keywords(sample(), Some("   ")), sample());
        assert_eq!(filter_by_keywords(sample(), Some(" ; ;")), sample());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let kept = filter_by_keywords(sample(), Some("ELECTION"));
        assert_eq!(kept, vec![Item("Election night special", "Live coverage")]);
    }

    #[test]
    fn description_only_match_is_kept() {
        let kept = filter_by_keywords(sample(), Some("budget"));
        assert_eq!(kept, vec![Item("Morning show", "Guests discuss the budget")]);
    }

    #[test]
    fn multiple_terms_preserve_order() {
        let kept = filter_by_keywords(sample(), Some(" nino ; election "));
        assert_eq!(
            kept,
            vec![
                Item("Election night special", "Live coverage"),
                Item("Cooking with Nino", ""),
            ]
        );
    }

    #[test]
    fn no_match_yields_empty() {
        assert!(filter_by_keywords(sample(), Some("football")).is_empty());
    }
}
