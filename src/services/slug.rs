/// URL slug from free text: lowercase ASCII letters and digits joined by single hyphens.
///
/// Characters outside ASCII are dropped, so a title written entirely in another
/// script yields an empty slug and callers must supply a fallback.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' || c.is_ascii_punctuation() {
            pending_hyphen = true;
        }
    }

    slug.truncate(120);
    slug.trim_end_matches('-').to_string()
}

/// Whether `slug` is already in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Budget 2025:  the   numbers "), "budget-2025-the-numbers");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(slugify("Café crème"), "caf-crme");
        assert_eq!(slugify("Улаанбаатар"), "");
    }

    #[test]
    fn validates_canonical_form() {
        assert!(is_valid_slug("politics"));
        assert!(is_valid_slug("world-news-2"));
        assert!(!is_valid_slug("World News"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }
}
