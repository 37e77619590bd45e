//! URL slug derivation for catalog display names.

/// Derives a URL-safe slug from a display name.
///
/// Lowercases ASCII letters, keeps digits, and folds every run of other
/// characters (whitespace, punctuation, non-ASCII) into a single hyphen.
/// Leading and trailing separators are dropped, so the result is always
/// `[a-z0-9]` segments joined by single hyphens. The mapping is
/// deterministic: the same name always yields the same slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_spaces_and_punctuation_into_hyphens() {
        assert_eq!(slugify("Sci-Fi & Fantasy"), "sci-fi-fantasy");
        assert_eq!(slugify("Mystery, Thriller & Crime"), "mystery-thriller-crime");
    }

    #[test]
    fn lowercases_and_keeps_digits() {
        assert_eq!(slugify("Top 100 Picks"), "top-100-picks");
        assert_eq!(slugify("ABC"), "abc");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  History  "), "history");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn is_stable() {
        let name = "Sci-Fi & Fantasy";
        assert_eq!(slugify(name), slugify(name));
    }

    #[test]
    fn result_is_url_safe() {
        let slug = slugify("Children's Books (Ages 5–8)!");
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}
