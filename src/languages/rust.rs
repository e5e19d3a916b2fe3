// Rust built-in queries

pub const OUTLINE_QUERY: &str = r#"
(mod_item "mod" @context name: (identifier) @name) @item

(struct_item "struct" @context name: (type_identifier) @name) @item

(enum_item "enum" @context name: (type_identifier) @name) @item

(trait_item "trait" @context name: (type_identifier) @name) @item

;; Methods inside impl blocks nest under the impl through containment
(impl_item "impl" @context type: (_) @name) @item

(function_item "fn" @context name: (identifier) @name) @item

(type_item "type" @context name: (type_identifier) @name) @item

(const_item "const" @context name: (identifier) @name) @item

(static_item "static" @context name: (identifier) @name) @item

(macro_definition "macro_rules!" @context name: (identifier) @name) @item

((line_comment)+ @comment.doc . [(function_item) (struct_item) (enum_item) (trait_item)])
"#;
