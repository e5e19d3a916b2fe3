//! Syntax tree of query source, before schema resolution.

use super::Quantifier;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    pub kind: ExprKind,
    pub quantifier: Quantifier,
    pub captures: Vec<Spanned>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprKind {
    /// `(kind ...)`; `kind` is `None` for `(_)`.
    Node {
        kind: Option<Spanned>,
        items: Vec<Item>,
        predicates: Vec<PredicateCall>,
    },
    /// `"token"`
    Token(String),
    /// `_`
    Wildcard,
    /// `[a b ...]`
    Alternation(Vec<Expr>),
    /// `(a b ...)`
    Group {
        items: Vec<Item>,
        predicates: Vec<PredicateCall>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Child { field: Option<Spanned>, expr: Expr },
    NegatedField(Spanned),
    Anchor(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PredicateCall {
    pub name: String,
    pub args: Vec<PredicateArg>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PredicateArg {
    Capture(Spanned),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub text: String,
    pub offset: usize,
}

impl Expr {
    /// Capture names in source order: nested captures come before the
    /// captures written after the closing paren.
    pub fn capture_names<'a>(&'a self, out: &mut Vec<&'a Spanned>) {
        match &self.kind {
            ExprKind::Node { items, .. } | ExprKind::Group { items, .. } => {
                for item in items {
                    if let Item::Child { expr, .. } = item {
                        expr.capture_names(out);
                    }
                }
            }
            ExprKind::Alternation(branches) => {
                for branch in branches {
                    branch.capture_names(out);
                }
            }
            ExprKind::Token(_) | ExprKind::Wildcard => {}
        }
        out.extend(self.captures.iter());
    }
}
