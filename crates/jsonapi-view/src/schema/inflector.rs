//! Resource type naming for the default schema
//!
//! Entity names arrive in their registered form (`Article`, `BlogPost`) and
//! resource types leave as plural snake case (`articles`, `blog_posts`).

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("foot", "feet"),
    ("tooth", "teeth"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "money", "news", "series", "species"];

/// `BlogPost` -> `blog_posts`
pub fn resource_type(entity_name: &str) -> String {
    pluralize(&underscore(entity_name))
}

/// `BlogPost` -> `blog_post`, `HTMLPage` -> `html_page`
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    out
}

/// Pluralize the last word of an underscored name.
pub fn pluralize(word: &str) -> String {
    let (head, last) = match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    };

    if last.is_empty() || UNCOUNTABLE.contains(&last) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == last) {
        return format!("{head}{plural}");
    }

    let plural = if let Some(stem) = last.strip_suffix('y') {
        match stem.chars().last() {
            Some(c) if !"aeiou".contains(c) => format!("{stem}ies"),
            _ => format!("{last}s"),
        }
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| last.ends_with(*suffix)) {
        format!("{last}es")
    } else {
        format!("{last}s")
    };

    format!("{head}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("Article"), "article");
        assert_eq!(underscore("BlogPost"), "blog_post");
        assert_eq!(underscore("HTMLPage"), "html_page");
        assert_eq!(underscore("Version2Note"), "version2_note");
        assert_eq!(underscore("already_snake"), "already_snake");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("article"), "articles");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("news"), "news");
        assert_eq!(pluralize("blog_post"), "blog_posts");
        assert_eq!(pluralize("sales_person"), "sales_people");
    }

    #[test]
    fn test_resource_type() {
        assert_eq!(resource_type("Article"), "articles");
        assert_eq!(resource_type("BlogCategory"), "blog_categories");
        assert_eq!(resource_type("Person"), "people");
    }
}
