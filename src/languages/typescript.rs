// TypeScript / TSX built-in queries

pub const OUTLINE_QUERY: &str = r#"
(class_declaration "class" @context name: (type_identifier) @name) @item

(abstract_class_declaration "class" @context name: (type_identifier) @name) @item

(interface_declaration "interface" @context name: (type_identifier) @name) @item

(type_alias_declaration "type" @context name: (type_identifier) @name) @item

(enum_declaration "enum" @context name: (identifier) @name) @item

(function_declaration "function" @context name: (identifier) @name) @item

(method_definition name: (property_identifier) @name) @item

(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function)) @item)
"#;
