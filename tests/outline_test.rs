use codequery::adapters::outline::render;
use codequery::{outline, Language};
use std::fs;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[test]
fn ruby_outline_nests_definitions() {
    let nodes = outline(&fixture("card.rb"), Language::Ruby).unwrap();
    assert_eq!(
        render(&nodes),
        "class Card (L2)\n  \
         attr_reader :number (L3)\n  \
         def initialize (L5)\n  \
         def valid? (L10)\n  \
         class << self (L14)\n    \
         def test_card (L15)\n\
         module Billing (L21)\n  \
         def self charge (L22)\n"
    );
}

#[test]
fn ruby_outline_covers_declarations_and_dsls() {
    let nodes = outline(&fixture("ledger.rb"), Language::Ruby).unwrap();
    assert_eq!(
        render(&nodes),
        "API_VERSION (L1)\n\
         class Account (L3)\n  \
         include Comparable (L4)\n  \
         attr_reader :owner, :balance (L5)\n  \
         alias_method :to_s, :owner (L6)\n  \
         LIMIT (L7)\n  \
         def deposit (L9)\n  \
         private def audit (L12)\n  \
         private_class_method def self build (L15)\n\
         ActiveRecord::Schema define (L19)\n  \
         enable_extension pgcrypto (L20)\n  \
         create_table accounts (L21)\n  \
         add_foreign_key accounts (L24)\n\
         describe Account (L27)\n  \
         it_behaves_like a ledger (L28)\n  \
         include_context with owner (L29)\n  \
         fexample focused (L30)\n  \
         xspecify skipped (L32)\n  \
         skip later (L34)\n"
    );
}

#[test]
fn visibility_wrapped_method_is_listed_once() {
    let nodes = outline(&fixture("ledger.rb"), Language::Ruby).unwrap();
    let account = &nodes[1];
    let audits: Vec<_> = account.children.iter().filter(|c| c.name == "audit").collect();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].kind, "method");
    assert_eq!(audits[0].context, vec!["private", "def"]);
    assert!(audits[0].children.is_empty());
}

#[test]
fn outline_ranges_cover_definitions() {
    let source = fixture("card.rb");
    let nodes = outline(&source, Language::Ruby).unwrap();
    let card = &nodes[0];
    assert_eq!(card.kind, "class");
    let text = &source[card.range.start_byte..card.range.end_byte];
    assert!(text.starts_with("class Card"));
    assert!(text.ends_with("end"));
    for child in &card.children {
        assert!(card.range.contains(&child.range));
    }
}

#[test]
fn spec_files_outline_example_groups() {
    let nodes = outline(&fixture("card_spec.rb"), Language::Ruby).unwrap();
    let rendered = render(&nodes);
    assert!(rendered.starts_with("describe Card (L3)\n"), "{}", rendered);
    assert!(rendered.contains("    fit validates card number (L14)\n"), "{}", rendered);
}

#[test]
fn rust_outline() {
    let source = "struct Card;\n\nimpl Card {\n    fn charge(&self) {}\n}\n\nfn main() {}\n";
    let nodes = outline(source, Language::Rust).unwrap();
    let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
    assert!(names.contains(&"Card"));
    assert!(names.contains(&"main"));
}

#[test]
fn python_outline() {
    let source = "class Card:\n    def charge(self):\n        pass\n";
    let nodes = outline(source, Language::Python).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "Card");
    assert_eq!(nodes[0].children[0].name, "charge");
}

#[test]
fn empty_source_has_empty_outline() {
    assert!(outline("", Language::Ruby).unwrap().is_empty());
}
