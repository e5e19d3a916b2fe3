// Python built-in queries

pub const OUTLINE_QUERY: &str = r#"
(class_definition "class" @context name: (identifier) @name) @item

(function_definition "def" @context name: (identifier) @name) @item

(module
  (expression_statement
    (assignment left: (identifier) @name)) @item)
"#;
