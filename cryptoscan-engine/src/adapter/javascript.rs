//! JavaScript extraction
//!
//! Walks the tree-sitter CST and emits normalized nodes. Class and function
//! stacks provide the enclosing-scope context the matchers key their
//! heuristics on.

use tree_sitter::Node;

use super::{
    field_text, node_text, normalize_path, number_literal, snippet, string_literal, ArgValue,
    AstNode, BoundLiteral, LiteralValue, NodeKind, SourceUnit, Span,
};

pub(super) fn extract(unit: &mut SourceUnit, root: Node, source: &str) {
    let mut walker = Walker {
        unit,
        source,
        class_stack: Vec::new(),
        func_stack: Vec::new(),
        operand_depth: 0,
    };
    walker.visit(root);
}

struct Walker<'s, 'u> {
    unit: &'u mut SourceUnit,
    source: &'s str,
    class_stack: Vec<String>,
    func_stack: Vec<String>,
    /// Depth inside calls/assignments whose literals are already captured
    /// as operands; standalone literals are only emitted at depth zero.
    operand_depth: u32,
}

impl Walker<'_, '_> {
    fn visit(&mut self, node: Node) {
        let mut pop_class = false;
        let mut pop_func = false;
        let mut operand_scope = false;

        match node.kind() {
            "class_declaration" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.push(NodeKind::ClassDecl { name: name.clone() }, &node);
                    self.class_stack.push(name);
                    pop_class = true;
                }
            }
            "function_declaration" | "function_expression" | "generator_function_declaration" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.push(NodeKind::FunctionDecl { name: name.clone() }, &node);
                    self.func_stack.push(name);
                    pop_func = true;
                }
            }
            "method_definition" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.push(NodeKind::FunctionDecl { name: name.clone() }, &node);
                    self.func_stack.push(name);
                    pop_func = true;
                }
            }
            "call_expression" | "new_expression" => {
                let callee_field = if node.kind() == "new_expression" {
                    "constructor"
                } else {
                    "function"
                };
                if let Some(callee_node) = node.child_by_field_name(callee_field) {
                    let callee = normalize_path(node_text(&callee_node, self.source));
                    let args = node
                        .child_by_field_name("arguments")
                        .map(|list| self.arg_list(list))
                        .unwrap_or_default();
                    self.push(NodeKind::Call { callee, args }, &node);
                }
                operand_scope = true;
            }
            "variable_declarator" => {
                if let (Some(name), Some(value_node)) = (
                    field_text(&node, "name", self.source),
                    node.child_by_field_name("value"),
                ) {
                    let value = self.arg_value(value_node);
                    self.bind(&name, &value, &value_node);
                    self.push(
                        NodeKind::Assignment {
                            target: name,
                            value,
                        },
                        &node,
                    );
                }
                operand_scope = true;
            }
            "assignment_expression" => {
                if let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) {
                    let target = normalize_path(node_text(&left, self.source));
                    let value = self.arg_value(right);
                    self.bind(&target, &value, &right);
                    self.push(NodeKind::Assignment { target, value }, &node);
                }
                operand_scope = true;
            }
            "import_statement" => {
                let module = node
                    .child_by_field_name("source")
                    .map(|s| super::strip_quotes(node_text(&s, self.source)).to_string())
                    .unwrap_or_else(|| node_text(&node, self.source).to_string());
                self.push(NodeKind::Import { module }, &node);
            }
            "string" | "template_string" => {
                if self.operand_depth == 0 {
                    let literal = string_literal(&node, self.source);
                    self.push(NodeKind::Literal(literal), &node);
                }
            }
            _ => {}
        }

        if operand_scope {
            self.operand_depth += 1;
        }
        for child in node.children(&mut node.walk()) {
            self.visit(child);
        }
        if operand_scope {
            self.operand_depth -= 1;
        }
        if pop_class {
            self.class_stack.pop();
        }
        if pop_func {
            self.func_stack.pop();
        }
    }

    fn push(&mut self, kind: NodeKind, node: &Node) {
        self.unit.nodes.push(AstNode {
            kind,
            span: Span::of(node),
            text: snippet(node_text(node, self.source)),
            enclosing_class: self.class_stack.last().cloned(),
            enclosing_function: self.func_stack.last().cloned(),
        });
    }

    fn bind(&mut self, target: &str, value: &ArgValue, value_node: &Node) {
        if let Some(literal) = value.as_fixed_literal() {
            let key = target.rsplit('.').next().unwrap_or(target).to_string();
            self.unit.bindings.insert(
                key,
                BoundLiteral {
                    value: literal.clone(),
                    span: Span::of(value_node),
                },
            );
        }
    }

    fn arg_list(&self, list: Node) -> Vec<ArgValue> {
        let mut out = Vec::new();
        for child in list.children(&mut list.walk()) {
            if child.is_named() && child.kind() != "comment" {
                out.push(self.arg_value(child));
            }
        }
        out
    }

    fn arg_value(&self, node: Node) -> ArgValue {
        let raw = node_text(&node, self.source);
        match node.kind() {
            "string" | "template_string" => ArgValue::Literal(string_literal(&node, self.source)),
            "number" => number_literal(raw)
                .map(ArgValue::Literal)
                .unwrap_or_else(|| ArgValue::Other(raw.to_string())),
            "null" | "undefined" => ArgValue::Literal(LiteralValue::Null),
            "identifier" | "this" => ArgValue::Ident(raw.to_string()),
            "member_expression" => ArgValue::Ident(normalize_path(raw)),
            "call_expression" | "new_expression" => {
                let callee_field = if node.kind() == "new_expression" {
                    "constructor"
                } else {
                    "function"
                };
                let callee = node
                    .child_by_field_name(callee_field)
                    .map(|f| normalize_path(node_text(&f, self.source)))
                    .unwrap_or_default();
                let args = node
                    .child_by_field_name("arguments")
                    .map(|list| self.arg_list(list))
                    .unwrap_or_default();
                ArgValue::Call { callee, args }
            }
            "object" => ArgValue::Object(raw.to_string()),
            _ => ArgValue::Other(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{parse, ArgValue, Language, LiteralValue, NodeKind};

    #[test]
    fn test_extracts_calls_with_dotted_callee() {
        let source = "const crypto = require('crypto');\ncrypto.createHash('md5');\n";
        let unit = parse("a.js", source, Language::JavaScript).unwrap();
        let call = unit
            .calls()
            .find(|(_, callee, _)| *callee == "crypto.createHash")
            .expect("createHash call");
        assert_eq!(
            call.2.first(),
            Some(&ArgValue::Literal(LiteralValue::Str("md5".to_string())))
        );
    }

    #[test]
    fn test_records_class_and_method_context() {
        let source = r#"
class Vault {
    open(code) {
        check(code);
    }
}
"#;
        let unit = parse("b.js", source, Language::JavaScript).unwrap();
        let (node, _, _) = unit
            .calls()
            .find(|(_, callee, _)| *callee == "check")
            .unwrap();
        assert_eq!(node.enclosing_class.as_deref(), Some("Vault"));
        assert_eq!(node.enclosing_function.as_deref(), Some("open"));
    }

    #[test]
    fn test_wrapped_literal_is_bound_one_hop() {
        let source = "const iv = Buffer.from('1234567890123456');\n";
        let unit = parse("c.js", source, Language::JavaScript).unwrap();
        assert_eq!(
            unit.resolve("iv"),
            Some(&LiteralValue::Str("1234567890123456".to_string()))
        );
    }

    #[test]
    fn test_property_assignment_target_keeps_dotted_path() {
        let source = r#"
class C {
    constructor() {
        this.iv = Buffer.from('abcdefghijklmnop');
    }
}
"#;
        let unit = parse("d.js", source, Language::JavaScript).unwrap();
        let (_, target, value) = unit
            .assignments()
            .find(|(_, target, _)| *target == "this.iv")
            .expect("property assignment");
        assert_eq!(target, "this.iv");
        assert!(value.as_fixed_literal().is_some());
        assert!(unit.resolve("iv").is_some());
    }

    #[test]
    fn test_nested_calls_are_emitted_individually() {
        let source = "const x = outer(inner('deep'));\n";
        let unit = parse("e.js", source, Language::JavaScript).unwrap();
        assert!(unit.calls().any(|(_, callee, _)| callee == "outer"));
        assert!(unit.calls().any(|(_, callee, _)| callee == "inner"));
    }

    #[test]
    fn test_spans_are_one_based() {
        let source = "hit('now');\n";
        let unit = parse("f.js", source, Language::JavaScript).unwrap();
        let (node, _, _) = unit.calls().next().unwrap();
        assert_eq!(node.span.start_line, 1);
        assert_eq!(node.span.start_col, 1);
        assert_eq!(node.span.end_line, 1);
        assert!(matches!(node.kind, NodeKind::Call { .. }));
    }
}
