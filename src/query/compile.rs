use super::ast::{Expr, ExprKind, Item, PredicateArg, PredicateCall, Spanned};
use super::predicate::{Operand, Predicate, PredicateKind};
use super::{
    parser, ChildSlot, FieldSlot, KindMatch, Matcher, NodeStep, PatternInfo, Property, Query, Sequence, Step, StepId,
};
use crate::error::{CompileError, CompileErrorKind};
use crate::schema::Schema;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

type Result<T> = std::result::Result<T, CompileError>;

pub(super) fn compile(source: &str, schema: &Schema) -> Result<Query> {
    let exprs = parser::parse(source)?;
    let mut compiler = Compiler {
        source,
        schema,
        steps: Vec::new(),
        capture_names: Vec::new(),
        kinds: Vec::new(),
        fields: Vec::new(),
    };
    let mut patterns = Vec::with_capacity(exprs.len());
    for expr in &exprs {
        patterns.push(compiler.pattern(expr)?);
    }
    debug!(
        patterns = patterns.len(),
        steps = compiler.steps.len(),
        captures = compiler.capture_names.len(),
        "compiled query"
    );
    Ok(Query {
        steps: compiler.steps,
        patterns,
        capture_names: compiler.capture_names,
        kinds: compiler.kinds,
        fields: compiler.fields,
    })
}

struct Compiler<'a> {
    source: &'a str,
    schema: &'a Schema,
    steps: Vec<Step>,
    capture_names: Vec<String>,
    kinds: Vec<String>,
    fields: Vec<String>,
}

/// State for one top-level pattern.
struct Scope {
    declared: BTreeSet<String>,
    hoisted: Vec<Predicate>,
    properties: Vec<Property>,
}

struct Items {
    fields: Vec<FieldSlot>,
    negated: Vec<usize>,
    sequence: Sequence,
}

impl<'a> Compiler<'a> {
    fn error(&self, offset: usize, kind: CompileErrorKind) -> CompileError {
        CompileError::at(self.source, offset, kind)
    }

    fn pattern(&mut self, expr: &Expr) -> Result<PatternInfo> {
        if expr.quantifier.allows_zero() {
            return Err(self.error(
                expr.offset,
                CompileErrorKind::MalformedQuantifier("a top-level pattern must match at least one node".to_string()),
            ));
        }
        let mut names = Vec::new();
        expr.capture_names(&mut names);
        let mut declared = BTreeSet::new();
        for name in names {
            self.capture_id(&name.text);
            declared.insert(name.text.clone());
        }

        let mut scope = Scope { declared, hoisted: Vec::new(), properties: Vec::new() };
        let root = self.expr(expr, &mut scope)?;
        let hoisted = std::mem::take(&mut scope.hoisted);
        self.steps[root].predicates.extend(hoisted);
        let exclusive = scope.properties.iter().any(|p| p.key == "exclusive");
        Ok(PatternInfo { root, start_offset: expr.offset, properties: scope.properties, exclusive })
    }

    fn expr(&mut self, expr: &Expr, scope: &mut Scope) -> Result<StepId> {
        let (matcher, calls): (Matcher, &[PredicateCall]) = match &expr.kind {
            ExprKind::Node { kind, items, predicates } => {
                let kind_match = self.kind_match(kind.as_ref())?;
                let parent = kind.as_ref().map(|k| k.text.as_str());
                let items = self.items(items, parent, scope)?;
                let node = NodeStep {
                    kind: kind_match,
                    fields: items.fields,
                    negated_fields: items.negated,
                    children: items.sequence,
                };
                (Matcher::Node(node), predicates.as_slice())
            }
            ExprKind::Token(token) => {
                if !self.schema.has_token(token) {
                    return Err(self.error(expr.offset, CompileErrorKind::UnknownNodeKind(format!("\"{}\"", token))));
                }
                let kind = KindMatch::Token(self.kind_id(token));
                (Matcher::Node(leaf(kind)), &[][..])
            }
            ExprKind::Wildcard => (Matcher::Node(leaf(KindMatch::Any)), &[][..]),
            ExprKind::Alternation(branches) => {
                let mut ids = Vec::with_capacity(branches.len());
                for branch in branches {
                    ids.push(self.expr(branch, scope)?);
                }
                (Matcher::Alternation(ids), &[][..])
            }
            ExprKind::Group { items, predicates } => {
                if let Some(capture) = expr.captures.first() {
                    return Err(self.error(
                        capture.offset,
                        CompileErrorKind::SyntaxError("captures are not allowed on sibling groups".to_string()),
                    ));
                }
                let items = self.items(items, None, scope)?;
                (Matcher::Group(items.sequence), predicates.as_slice())
            }
        };

        let mut local = Vec::new();
        expr.capture_names(&mut local);
        let local: BTreeSet<u32> = local.iter().map(|n| self.capture_id(&n.text)).collect();
        let mut predicates = Vec::new();
        for call in calls {
            if let Some(predicate) = self.predicate(call, scope)? {
                if predicate.referenced_captures().iter().all(|c| local.contains(c)) {
                    predicates.push(predicate);
                } else {
                    scope.hoisted.push(predicate);
                }
            }
        }

        let captures = expr.captures.iter().map(|c| self.capture_id(&c.text)).collect();
        self.steps.push(Step { matcher, quantifier: expr.quantifier, captures, predicates });
        Ok(self.steps.len() - 1)
    }

    fn items(&mut self, items: &[Item], parent: Option<&str>, scope: &mut Scope) -> Result<Items> {
        let mut out = Items { fields: Vec::new(), negated: Vec::new(), sequence: Sequence::default() };
        let mut pending_anchor = None;
        for item in items {
            match item {
                Item::Anchor(offset) => pending_anchor = Some(*offset),
                Item::NegatedField(field) => {
                    self.check_field(parent, field)?;
                    out.negated.push(self.field_id(&field.text));
                }
                Item::Child { field: Some(field), expr } => {
                    if let Some(offset) = pending_anchor {
                        return Err(self.error(
                            offset,
                            CompileErrorKind::SyntaxError("anchors apply to child patterns, not fields".to_string()),
                        ));
                    }
                    self.check_field(parent, field)?;
                    let step = self.expr(expr, scope)?;
                    out.fields.push(FieldSlot { field: self.field_id(&field.text), step });
                }
                Item::Child { field: None, expr } => {
                    let step = self.expr(expr, scope)?;
                    let anchored = pending_anchor.take().is_some();
                    out.sequence.slots.push(ChildSlot { step, anchored });
                }
            }
        }
        out.sequence.anchor_end = pending_anchor.is_some();
        Ok(out)
    }

    fn kind_match(&mut self, kind: Option<&Spanned>) -> Result<KindMatch> {
        let Some(kind) = kind else {
            return Ok(KindMatch::AnyNamed);
        };
        if !self.schema.has_named_kind(&kind.text) {
            return Err(self.error(kind.offset, CompileErrorKind::UnknownNodeKind(kind.text.clone())));
        }
        let ids = self
            .schema
            .concrete_kinds(&kind.text)
            .iter()
            .map(|k| self.kind_id(k))
            .collect();
        Ok(KindMatch::Named(ids))
    }

    fn check_field(&self, parent: Option<&str>, field: &Spanned) -> Result<()> {
        if !self.schema.has_field(&field.text) {
            return Err(self.error(field.offset, CompileErrorKind::UnknownField(field.text.clone())));
        }
        if let Some(kind) = parent {
            if kind != "ERROR" && !self.schema.kind_has_field(kind, &field.text) {
                return Err(self.error(
                    field.offset,
                    CompileErrorKind::UnknownField(format!("{}.{}", kind, field.text)),
                ));
            }
        }
        Ok(())
    }

    fn predicate(&mut self, call: &PredicateCall, scope: &mut Scope) -> Result<Option<Predicate>> {
        let (source, offset) = (self.source, call.offset);
        let invalid = move |msg: String| CompileError::at(source, offset, CompileErrorKind::InvalidPredicate(msg));

        if call.name == "set!" {
            let mut words = Vec::new();
            for arg in &call.args {
                match arg {
                    PredicateArg::Literal(word) => words.push(word.clone()),
                    PredicateArg::Capture(_) => return Err(invalid("#set! takes a key and an optional value".into())),
                }
            }
            let mut words = words.into_iter();
            let (Some(key), value, None) = (words.next(), words.next(), words.next()) else {
                return Err(invalid("#set! takes a key and an optional value".into()));
            };
            scope.properties.push(Property { key, value });
            return Ok(None);
        }

        enum Base {
            Eq,
            Match,
            AnyOf,
        }
        let (base, negate, any) = match call.name.as_str() {
            "eq?" => (Base::Eq, false, false),
            "not-eq?" => (Base::Eq, true, false),
            "any-eq?" => (Base::Eq, false, true),
            "any-not-eq?" => (Base::Eq, true, true),
            "match?" => (Base::Match, false, false),
            "not-match?" => (Base::Match, true, false),
            "any-match?" => (Base::Match, false, true),
            "any-not-match?" => (Base::Match, true, true),
            "any-of?" => (Base::AnyOf, false, false),
            "not-any-of?" => (Base::AnyOf, true, false),
            other => return Err(invalid(format!("unknown predicate `#{}`", other))),
        };

        let capture = match call.args.first() {
            Some(PredicateArg::Capture(name)) => self.resolve_capture(name, scope)?,
            _ => return Err(invalid(format!("#{} expects a capture as its first argument", call.name))),
        };
        let rest = &call.args[1..];

        let kind = match base {
            Base::Eq => {
                let [operand] = rest else {
                    return Err(invalid(format!("#{} expects exactly two arguments", call.name)));
                };
                let operand = match operand {
                    PredicateArg::Capture(name) => Operand::Capture(self.resolve_capture(name, scope)?),
                    PredicateArg::Literal(value) => Operand::Literal(value.clone()),
                };
                PredicateKind::Eq { operand, negate, any }
            }
            Base::Match => {
                let [PredicateArg::Literal(pattern)] = rest else {
                    return Err(invalid(format!("#{} expects a capture and a regex string", call.name)));
                };
                let regex = Regex::new(pattern)
                    .map_err(|e| self.error(call.offset, CompileErrorKind::InvalidRegex(e.to_string())))?;
                PredicateKind::Match { regex, negate, any }
            }
            Base::AnyOf => {
                let mut values = Vec::with_capacity(rest.len());
                for arg in rest {
                    match arg {
                        PredicateArg::Literal(value) => values.push(value.clone()),
                        PredicateArg::Capture(_) => {
                            return Err(invalid(format!("#{} expects string values", call.name)))
                        }
                    }
                }
                if values.is_empty() {
                    return Err(invalid(format!("#{} expects at least one value", call.name)));
                }
                PredicateKind::AnyOf { values, negate }
            }
        };
        Ok(Some(Predicate { capture, kind }))
    }

    fn resolve_capture(&mut self, name: &Spanned, scope: &Scope) -> Result<u32> {
        if !scope.declared.contains(&name.text) {
            return Err(self.error(name.offset, CompileErrorKind::UnknownCapture(name.text.clone())));
        }
        Ok(self.capture_id(&name.text))
    }

    fn capture_id(&mut self, name: &str) -> u32 {
        intern(&mut self.capture_names, name) as u32
    }

    fn kind_id(&mut self, kind: &str) -> usize {
        intern(&mut self.kinds, kind)
    }

    fn field_id(&mut self, field: &str) -> usize {
        intern(&mut self.fields, field)
    }
}

fn intern(table: &mut Vec<String>, value: &str) -> usize {
    match table.iter().position(|v| v == value) {
        Some(i) => i,
        None => {
            table.push(value.to_string());
            table.len() - 1
        }
    }
}

fn leaf(kind: KindMatch) -> NodeStep {
    NodeStep { kind, fields: Vec::new(), negated_fields: Vec::new(), children: Sequence::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Quantifier;

    fn schema() -> Schema {
        Schema::builder()
            .kind("program", &[])
            .kind("method", &["name", "parameters", "body"])
            .kind("class", &["name", "superclass", "body"])
            .kind("call", &["receiver", "method", "arguments", "block"])
            .kind("identifier", &[])
            .kind("constant", &[])
            .kind("comment", &[])
            .supertype("_definition", &["method", "class"])
            .tokens(&["def", "end", "class"])
            .build()
    }

    fn error_kind(source: &str) -> CompileErrorKind {
        Query::new(source, &schema()).unwrap_err().kind
    }

    #[test]
    fn compiles_patterns_and_captures_in_source_order() {
        let query = Query::new(
            "(method name: (identifier) @name) @item\n(class name: (constant) @name) @item",
            &schema(),
        )
        .unwrap();
        assert_eq!(query.pattern_count(), 2);
        assert_eq!(query.capture_names(), &["name".to_string(), "item".to_string()]);
        assert_eq!(query.start_offset(1), Some(40));
    }

    #[test]
    fn unknown_kind_reports_position() {
        let err = Query::new("(method)\n(funktion)", &schema()).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnknownNodeKind("funktion".into()));
        assert_eq!((err.row, err.column), (2, 2));
    }

    #[test]
    fn unknown_token() {
        assert_eq!(error_kind(r#"(method "fn")"#), CompileErrorKind::UnknownNodeKind("\"fn\"".into()));
    }

    #[test]
    fn unknown_field() {
        assert_eq!(error_kind("(method nome: (identifier))"), CompileErrorKind::UnknownField("nome".into()));
        assert_eq!(
            error_kind("(method superclass: (constant))"),
            CompileErrorKind::UnknownField("method.superclass".into())
        );
        assert_eq!(error_kind("(method !receiver)"), CompileErrorKind::UnknownField("method.receiver".into()));
    }

    #[test]
    fn wildcard_parent_accepts_any_known_field() {
        assert!(Query::new("(_ name: (identifier))", &schema()).is_ok());
        assert!(Query::new("(_definition name: (_))", &schema()).is_ok());
    }

    #[test]
    fn top_level_optional_is_malformed() {
        assert!(matches!(error_kind("(method)?"), CompileErrorKind::MalformedQuantifier(_)));
        assert!(matches!(error_kind("(comment)*"), CompileErrorKind::MalformedQuantifier(_)));
        assert!(Query::new("(comment)+ @doc", &schema()).is_ok());
    }

    #[test]
    fn predicates_are_validated() {
        assert_eq!(
            error_kind(r#"((identifier) @a (#eq? @b "x"))"#),
            CompileErrorKind::UnknownCapture("b".into())
        );
        assert!(matches!(error_kind(r#"((identifier) @a (#frob? @a))"#), CompileErrorKind::InvalidPredicate(_)));
        assert!(matches!(error_kind(r#"((identifier) @a (#eq? @a))"#), CompileErrorKind::InvalidPredicate(_)));
        assert!(matches!(error_kind(r#"((identifier) @a (#any-of? @a))"#), CompileErrorKind::InvalidPredicate(_)));
        assert!(matches!(error_kind(r#"((identifier) @a (#match? @a "("))"#), CompileErrorKind::InvalidRegex(_)));
    }

    #[test]
    fn captures_do_not_leak_between_patterns() {
        let err = Query::new("(identifier) @a\n((constant) @c (#eq? @a \"x\"))", &schema()).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnknownCapture("a".into()));
    }

    #[test]
    fn set_directives_become_properties() {
        let query = Query::new(
            r#"((call) @run (#set! tag rspec-test) (#set! exclusive))"#,
            &schema(),
        )
        .unwrap();
        assert_eq!(query.property(0, "tag"), Some(Some("rspec-test")));
        assert_eq!(query.property(0, "exclusive"), Some(None));
        assert_eq!(query.property(0, "missing"), None);
        assert!(query.is_exclusive(0));
    }

    #[test]
    fn supertypes_expand_to_concrete_kinds() {
        let query = Query::new("(_definition) @def", &schema()).unwrap();
        let root = &query.steps[query.patterns[0].root];
        let Matcher::Node(node) = &root.matcher else { panic!("expected node step") };
        let KindMatch::Named(ids) = &node.kind else { panic!("expected named kinds") };
        let names: Vec<&str> = ids.iter().map(|&i| query.kinds[i].as_str()).collect();
        assert_eq!(names, vec!["method", "class"]);
    }

    #[test]
    fn anchors_mark_slots() {
        let query = Query::new("(class . (identifier) (comment) . (method) .)", &schema()).unwrap();
        let root = &query.steps[query.patterns[0].root];
        let Matcher::Node(node) = &root.matcher else { panic!() };
        let anchored: Vec<bool> = node.children.slots.iter().map(|s| s.anchored).collect();
        assert_eq!(anchored, vec![true, false, true]);
        assert!(node.children.anchor_end);
        assert!(matches!(error_kind("(method . name: (identifier))"), CompileErrorKind::SyntaxError(_)));
    }

    #[test]
    fn nested_predicates_stay_local_or_hoist() {
        let query = Query::new(
            r#"(call method: (identifier) @m (#eq? @m "it") arguments: (_) @args) @call"#,
            &schema(),
        )
        .unwrap();
        let root = &query.steps[query.patterns[0].root];
        assert_eq!(root.predicates.len(), 1);
        assert_eq!(root.quantifier, Quantifier::One);

        let query = Query::new(
            r#"(class name: (constant) @n (method name: (identifier) (#eq? @n "X"))) @c"#,
            &schema(),
        )
        .unwrap();
        let root = &query.steps[query.patterns[0].root];
        assert_eq!(root.predicates.len(), 1, "predicate on an outer capture hoists to the root");
    }

    #[test]
    fn captures_on_groups_are_rejected() {
        assert!(matches!(error_kind("((comment) (method)) @x"), CompileErrorKind::SyntaxError(_)));
    }

    #[test]
    fn independent_compilations_do_not_interfere() {
        let schema = schema();
        let bad = Query::new("(nope)", &schema);
        let good = Query::new("(method) @m", &schema).unwrap();
        assert!(bad.is_err());
        assert_eq!(good.capture_names(), &["m".to_string()]);
    }
}
