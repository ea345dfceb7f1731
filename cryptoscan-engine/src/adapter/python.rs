//! Python extraction
//!
//! Same shape as the JavaScript walker; the differences are the node kinds
//! of the grammar, byte-string prefixes and keyword arguments.

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
    operand_depth: u32,
}

impl Walker<'_, '_> {
    fn visit(&mut self, node: Node) {
        let mut pop_class = false;
        let mut pop_func = false;
        let mut operand_scope = false;

        match node.kind() {
            "class_definition" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.push(NodeKind::ClassDecl { name: name.clone() }, &node);
                    self.class_stack.push(name);
                    pop_class = true;
                }
            }
            "function_definition" => {
                if let Some(name) = field_text(&node, "name", self.source) {
                    self.push(NodeKind::FunctionDecl { name: name.clone() }, &node);
                    self.func_stack.push(name);
                    pop_func = true;
                }
            }
            "call" => {
                if let Some(callee_node) = node.child_by_field_name("function") {
                    let callee = normalize_path(node_text(&callee_node, self.source));
                    let args = node
                        .child_by_field_name("arguments")
                        .map(|list| self.arg_list(list))
                        .unwrap_or_default();
                    self.push(NodeKind::Call { callee, args }, &node);
                }
                operand_scope = true;
            }
            "assignment" => {
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
            "import_statement" | "import_from_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .or_else(|| node.named_child(0))
                    .map(|m| node_text(&m, self.source).to_string())
                    .unwrap_or_else(|| node_text(&node, self.source).to_string());
                self.push(NodeKind::Import { module }, &node);
            }
            "string" => {
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
            "string" | "concatenated_string" => {
                ArgValue::Literal(string_literal(&node, self.source))
            }
            "integer" | "float" => number_literal(raw)
                .map(ArgValue::Literal)
                .unwrap_or_else(|| ArgValue::Other(raw.to_string())),
            "none" => ArgValue::Literal(LiteralValue::Null),
            "identifier" => ArgValue::Ident(raw.to_string()),
            "attribute" => ArgValue::Ident(normalize_path(raw)),
            "call" => {
                let callee = node
                    .child_by_field_name("function")
                    .map(|f| normalize_path(node_text(&f, self.source)))
                    .unwrap_or_default();
                let args = node
                    .child_by_field_name("arguments")
                    .map(|list| self.arg_list(list))
                    .unwrap_or_default();
                ArgValue::Call { callee, args }
            }
            "dictionary" => ArgValue::Object(raw.to_string()),
            "keyword_argument" => {
                let name = field_text(&node, "name", self.source).unwrap_or_default();
                let value = node
                    .child_by_field_name("value")
                    .map(|v| self.arg_value(v))
                    .unwrap_or_else(|| ArgValue::Other(raw.to_string()));
                ArgValue::Keyword {
                    name,
                    value: Box::new(value),
                }
            }
            _ => ArgValue::Other(raw.to_string()),
        }
    }
}
