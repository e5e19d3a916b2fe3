use regex::Regex;

#[derive(Debug)]
pub(crate) enum Operand {
    Literal(String),
    Capture(u32),
}

#[derive(Debug)]
pub(crate) enum PredicateKind {
    Eq { operand: Operand, negate: bool, any: bool },
    Match { regex: Regex, negate: bool, any: bool },
    AnyOf { values: Vec<String>, negate: bool },
}

/// A text filter over the nodes bound to `capture`.
///
/// Captures bound to several nodes must all pass, unless the predicate is an
/// `any-` variant. A capture with no nodes passes.
#[derive(Debug)]
pub(crate) struct Predicate {
    pub capture: u32,
    pub kind: PredicateKind,
}

impl Predicate {
    pub(crate) fn referenced_captures(&self) -> Vec<u32> {
        match &self.kind {
            PredicateKind::Eq { operand: Operand::Capture(other), .. } => vec![self.capture, *other],
            _ => vec![self.capture],
        }
    }

    pub(crate) fn evaluate<'t, F>(&self, texts_for: F) -> bool
    where
        F: Fn(u32) -> Vec<&'t str>,
    {
        let texts = texts_for(self.capture);
        if texts.is_empty() {
            return true;
        }
        let (any, check): (bool, Box<dyn Fn(&str) -> bool + '_>) = match &self.kind {
            PredicateKind::Eq { operand, negate, any } => {
                let expected = match operand {
                    Operand::Literal(value) => value.clone(),
                    Operand::Capture(other) => match texts_for(*other).first() {
                        Some(text) => text.to_string(),
                        None => return true,
                    },
                };
                let negate = *negate;
                (*any, Box::new(move |t: &str| (t == expected) != negate))
            }
            PredicateKind::Match { regex, negate, any } => {
                let negate = *negate;
                (*any, Box::new(move |t: &str| regex.is_match(t) != negate))
            }
            PredicateKind::AnyOf { values, negate } => {
                let negate = *negate;
                (false, Box::new(move |t: &str| values.iter().any(|v| v == t) != negate))
            }
        };
        if any {
            texts.iter().any(|t| check(t))
        } else {
            texts.iter().all(|t| check(t))
        }
    }
}
