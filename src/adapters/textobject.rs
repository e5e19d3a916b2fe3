use crate::classify::{Category, ClassifiedCapture, Scope};

/// The smallest text object of `object`/`scope` containing `byte`.
///
/// Ranges are half-open, except that an object ending exactly at `byte` still
/// counts when nothing else contains it, so a cursor after the last character
/// selects the object it follows.
pub fn select<'a, 't>(
    captures: &'a [ClassifiedCapture<'t>],
    object: &str,
    scope: Scope,
    byte: usize,
) -> Option<&'a ClassifiedCapture<'t>> {
    let candidates = || {
        captures.iter().filter(move |c| match &c.category {
            Category::TextObject { object: o, scope: s } => o == object && *s == scope,
            _ => false,
        })
    };
    let smallest = |inclusive: bool| {
        candidates()
            .filter(|c| {
                let range = &c.range;
                range.start_byte <= byte && (byte < range.end_byte || (inclusive && byte == range.end_byte))
            })
            .min_by_key(|c| c.range.len())
    };
    smallest(false).or_else(|| smallest(true))
}

/// Text objects of one kind in document order, for next/previous motions.
pub fn all<'a, 't>(
    captures: &'a [ClassifiedCapture<'t>],
    object: &str,
    scope: Scope,
) -> Vec<&'a ClassifiedCapture<'t>> {
    let mut found: Vec<_> = captures
        .iter()
        .filter(|c| matches!(&c.category, Category::TextObject { object: o, scope: s } if o == object && *s == scope))
        .collect();
    found.sort_by_key(|c| (c.range.start_byte, std::cmp::Reverse(c.range.end_byte)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::{self, SHOP};

    const TEXTOBJECTS: &str = r#"
        (method body: (_)? @function.inside) @function.around
        (class body: (_)? @class.inside) @class.around
        (comment)+ @comment.around
    "#;

    #[test]
    fn selects_smallest_enclosing_object() {
        let tree = fixture::tree();
        let captures = fixture::classify(&tree, TEXTOBJECTS);

        let sum = SHOP.find("sum").unwrap();
        let inside = select(&captures, "function", Scope::Inside, sum).unwrap();
        assert_eq!(inside.text, "items.sum");
        let around = select(&captures, "function", Scope::Around, sum).unwrap();
        assert!(around.text.starts_with("def total"));

        let cart = SHOP.find("Cart").unwrap();
        let class = select(&captures, "class", Scope::Around, cart).unwrap();
        assert!(class.text.starts_with("class Cart"));

        let comment = select(&captures, "comment", Scope::Around, SHOP.find("Sum").unwrap()).unwrap();
        assert_eq!(comment.text, "# Sum of items");
    }

    #[test]
    fn cursor_outside_any_object() {
        let tree = fixture::tree();
        let captures = fixture::classify(&tree, TEXTOBJECTS);
        assert!(select(&captures, "function", Scope::Around, 0).is_none());
        assert!(select(&captures, "parameter", Scope::Inside, 20).is_none());
    }

    #[test]
    fn cursor_at_end_selects_preceding_object() {
        let tree = fixture::tree();
        let captures = fixture::classify(&tree, TEXTOBJECTS);
        let end = SHOP.find("items.sum").unwrap() + "items.sum".len();
        let inside = select(&captures, "function", Scope::Inside, end).unwrap();
        assert_eq!(inside.text, "items.sum");
    }

    #[test]
    fn lists_objects_in_document_order() {
        let tree = fixture::tree();
        let captures = fixture::classify(&tree, TEXTOBJECTS);
        let methods: Vec<_> = all(&captures, "function", Scope::Around).iter().map(|c| c.node.start_byte()).collect();
        assert_eq!(methods, vec![SHOP.find("def total").unwrap(), SHOP.find("def empty?").unwrap()]);
    }
}
