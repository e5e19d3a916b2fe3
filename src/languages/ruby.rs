// Ruby built-in queries

/// Classes, modules, methods, constants, mixins and accessors, example groups,
/// Rake tasks and schema definitions, plus the doc comments directly above
/// definitions.
pub const OUTLINE_QUERY: &str = r#"
(class "class" @context name: (_) @name) @item

(singleton_class "class" @context "<<" @context value: (_) @name) @item

(module "module" @context name: (_) @name) @item

(method "def" @context name: (_) @name) @item

(singleton_method "def" @context object: (_) @context name: (_) @name) @item

;; `private def ...` and friends. This match comes first, so the plain method
;; item for the same node is dropped as a repeat.
(call
  !receiver
  method: (identifier) @context
  (#any-of? @context "private" "protected" "public" "private_class_method" "public_class_method" "module_function")
  arguments: (argument_list
    . [(method "def" @context name: (_) @name) @item
       (singleton_method "def" @context object: (_) @context name: (_) @name) @item]))

(assignment left: (constant) @name) @item

(call
  !receiver
  method: (identifier) @context
  (#any-of? @context
    "include" "extend" "prepend"
    "attr_reader" "attr_writer" "attr_accessor" "alias_method")
  arguments: (argument_list) @name) @item

;; RSpec / minitest-spec blocks
(call
  method: (identifier) @context
  (#any-of? @context
    "describe" "context" "feature" "shared_examples" "shared_context"
    "fdescribe" "fcontext" "xdescribe" "xcontext"
    "it" "specify" "example" "scenario" "its" "test"
    "fit" "fexample" "focus" "xit" "xexample" "xspecify" "skip" "pending"
    "it_behaves_like" "it_should_behave_like" "include_examples" "include_context")
  arguments: (argument_list . [(string (string_content) @name) (_) @name])?) @item

;; Rake
(call
  method: (identifier) @context (#any-of? @context "namespace" "task")
  arguments: (argument_list
    . [(simple_symbol) @name (string (string_content) @name) (pair key: (_) @name)])) @item

;; ActiveRecord schema
(call
  receiver: (scope_resolution) @context (#eq? @context "ActiveRecord::Schema")
  method: (identifier) @name (#eq? @name "define")) @item

(call
  !receiver
  method: (identifier) @context
  (#any-of? @context
    "create_table" "create_enum" "create_schema" "create_virtual_table"
    "enable_extension" "add_foreign_key")
  arguments: (argument_list . [(string (string_content) @name) (_) @name])) @item

((comment)+ @comment.doc . [(method) (singleton_method) (class) (module)])
"#;

/// Test suites, test cases and Rake tasks. Focused and skipped variants are
/// listed before the plain ones so they win.
pub const RUNNABLES_QUERY: &str = r#"
[
  (call
    method: (identifier) @test.suite.focused
    (#any-of? @test.suite.focused "fdescribe" "fcontext" "ffeature")
    arguments: (argument_list . [(string (string_content) @test.suite.name) (_) @test.suite.name]))
  (call
    method: (identifier) @test.suite.skipped
    (#any-of? @test.suite.skipped "xdescribe" "xcontext" "xfeature")
    arguments: (argument_list . [(string (string_content) @test.suite.name) (_) @test.suite.name]))
  (call
    receiver: (constant)? @_rspec (#eq? @_rspec "RSpec")
    method: (identifier) @_suite
    (#any-of? @_suite "describe" "context" "feature" "shared_examples" "shared_context")
    arguments: (argument_list . [(string (string_content) @test.suite.name) (_) @test.suite.name]))
] @test.suite

[
  (call
    method: (identifier) @test.call.focused
    (#any-of? @test.call.focused "fit" "fspecify" "fexample" "fscenario" "focus")
    arguments: (argument_list . [(string (string_content) @test.call.name) (_) @test.call.name])?)
  (call
    method: (identifier) @test.call.skipped
    (#any-of? @test.call.skipped "xit" "xspecify" "xexample" "xscenario" "skip" "pending")
    arguments: (argument_list . [(string (string_content) @test.call.name) (_) @test.call.name])?)
  (call
    method: (identifier) @_test
    (#any-of? @_test "it" "specify" "example" "scenario" "its" "test")
    arguments: (argument_list . [(string (string_content) @test.call.name) (_) @test.call.name])?)
] @test.call

;; Minitest and TLDR
(class
  name: (_) @test.suite.name
  superclass: (superclass) @_superclass (#match? @_superclass "(Test(Case)?|TLDR)$")) @test.suite

;; Only inside a suite class
((method
  name: (identifier) @test.call.name (#match? @test.call.name "^test_")) @test.call
  (#set! within test.suite))

;; Rake
((call
  method: (identifier) @_task (#eq? @_task "task")
  arguments: (argument_list
    . [(simple_symbol) @name (string (string_content) @name) (pair key: (_) @name)])) @run
  (#set! tag rake-task))
"#;

pub const TEXTOBJECTS_QUERY: &str = r#"
(method (body_statement)? @function.inside) @function.around

(singleton_method (body_statement)? @function.inside) @function.around

(class (body_statement)? @class.inside) @class.around

(module (body_statement)? @class.inside) @class.around

(singleton_class (body_statement)? @class.inside) @class.around

(comment)+ @comment.around

(do_block (body_statement)? @block.inside) @block.around

(block) @block.around

(method_parameters (_)+ @parameter.inside)

(block_parameters (_)+ @parameter.inside)

(call
  method: (identifier) @_test
  (#any-of? @_test "it" "specify" "example" "fit" "xit" "test" "describe" "context")
  block: (_) @test.inside) @test.around
"#;

/// Variables a debugger can show: assignment targets, parameters, instance
/// variables, receivers and bare arguments, plus the scopes holding them.
pub const DEBUGGER_QUERY: &str = r#"
(assignment left: (identifier) @debug-variable)

(operator_assignment left: (identifier) @debug-variable)

(left_assignment_list [(identifier) @debug-variable (_)]+)

(instance_variable) @debug-variable

(method_parameters
  [(identifier) @debug-variable
   (optional_parameter name: (identifier) @debug-variable)
   (keyword_parameter name: (identifier) @debug-variable)
   (splat_parameter name: (identifier) @debug-variable)
   (hash_splat_parameter name: (identifier) @debug-variable)
   (block_parameter name: (identifier) @debug-variable)
   (_)]+)

(block_parameters
  [(identifier) @debug-variable
   (optional_parameter name: (identifier) @debug-variable)
   (splat_parameter name: (identifier) @debug-variable)
   (_)]+)

(call receiver: (identifier) @debug-variable)

(argument_list [(identifier) @debug-variable (_)]+)

(method) @debug-scope

(singleton_method) @debug-scope

(do_block) @debug-scope

(block) @debug-scope
"#;

/// Embedded languages: inline RBS signatures in comments, regex literals and
/// heredocs, whose closing tag names the language.
pub const INJECTIONS_QUERY: &str = r#"
((comment) @injection.content
  (#match? @injection.content "^#(:| @rbs| \\|)")
  (#set! injection.language "rbs"))

((regex (string_content) @injection.content)
  (#set! injection.language "regex"))

(heredoc_body
  (heredoc_content) @injection.content
  (heredoc_end) @injection.language)
"#;
