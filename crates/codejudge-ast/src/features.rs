//! Parse-tree feature extraction.
//!
//! [`extract_features`] performs one depth-first traversal and fills a
//! [`ParseFeatures`] bundle. The bundle is a fixed, statically typed record:
//! every sub-field has an explicit empty/zero form, and deserialization
//! defaults missing fields to that form, so comparison code never sees an
//! absent field.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tree::AstNode;

/// Counts of the four control-flow statement kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowCounts {
    #[serde(default)]
    pub if_statements: u32,
    #[serde(default)]
    pub for_loops: u32,
    #[serde(default)]
    pub while_loops: u32,
    #[serde(default)]
    pub switch_statements: u32,
}

impl ControlFlowCounts {
    pub fn total(&self) -> u32 {
        self.if_statements + self.for_loops + self.while_loops + self.switch_statements
    }

    /// Fixed key set for union-style comparison math.
    pub fn as_pairs(&self) -> [(&'static str, u32); 4] {
        [
            ("if_statements", self.if_statements),
            ("for_loops", self.for_loops),
            ("while_loops", self.while_loops),
            ("switch_statements", self.switch_statements),
        ]
    }
}

/// Counts of the four operator categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounts {
    #[serde(default)]
    pub arithmetic: u32,
    #[serde(default)]
    pub logical: u32,
    #[serde(default)]
    pub comparison: u32,
    #[serde(default)]
    pub assignment: u32,
}

impl OperationCounts {
    pub fn as_pairs(&self) -> [(&'static str, u32); 4] {
        [
            ("arithmetic", self.arithmetic),
            ("logical", self.logical),
            ("comparison", self.comparison),
            ("assignment", self.assignment),
        ]
    }
}

/// The feature bundle produced by one traversal of a parse tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseFeatures {
    #[serde(default)]
    pub total_nodes: u32,
    /// Maximum node depth reached; 0 for an empty tree.
    #[serde(default)]
    pub depth: u32,
    /// Declared function names in source order, duplicates preserved.
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub control_flow: ControlFlowCounts,
    #[serde(default)]
    pub operations: OperationCounts,
    /// Count per node kind, in traversal order.
    #[serde(default)]
    pub node_types: IndexMap<String, u32>,
    /// Call-target names in source order.
    #[serde(default)]
    pub function_calls: Vec<String>,
    /// Declared variable names in source order.
    #[serde(default)]
    pub variable_declarations: Vec<String>,
}

/// Walks the tree once and fills the bundle.
pub fn extract_features<N: AstNode>(root: &N) -> ParseFeatures {
    let mut features = ParseFeatures::default();
    visit(root, 0, &mut features);
    features
}

fn visit<N: AstNode>(node: &N, depth: u32, features: &mut ParseFeatures) {
    features.total_nodes += 1;
    features.depth = features.depth.max(depth);
    *features
        .node_types
        .entry(node.kind().to_string())
        .or_insert(0) += 1;

    match node.kind() {
        "if_statement" => features.control_flow.if_statements += 1,
        "for_statement" => features.control_flow.for_loops += 1,
        "while_statement" => features.control_flow.while_loops += 1,
        "switch_statement" => features.control_flow.switch_statements += 1,
        "binary_expression" | "unary_expression" => classify_operator(node, features),
        "assignment_expression" | "init_declarator" => features.operations.assignment += 1,
        "function_definition" => match declarator_identifier(node) {
            Some(name) => features.functions.push(name),
            None => tracing::warn!("function_definition without a declarator identifier"),
        },
        "call_expression" => {
            if let Some(target) = node.field("function") {
                features.function_calls.push(target.text().to_string());
            }
        }
        "declaration" => {
            if let Some(name) = declarator_identifier(node) {
                features.variable_declarations.push(name);
            }
        }
        _ => {}
    }

    for child in node.children() {
        visit(&child, depth + 1, features);
    }
}

/// Buckets a binary/unary operator by its token text.
fn classify_operator<N: AstNode>(node: &N, features: &mut ParseFeatures) {
    let Some(operator) = node.field("operator") else {
        return;
    };
    match operator.text() {
        "+" | "-" | "*" | "/" | "%" => features.operations.arithmetic += 1,
        "&&" | "||" | "!" => features.operations.logical += 1,
        "==" | "!=" | "<" | ">" | "<=" | ">=" => features.operations.comparison += 1,
        _ => {}
    }
}

/// Follows `declarator` fields inward until an identifier-like node.
fn declarator_identifier<N: AstNode>(node: &N) -> Option<String> {
    let mut declarator = node.field("declarator");
    while let Some(current) = declarator {
        if current.kind().ends_with("identifier") {
            return Some(current.text().to_string());
        }
        declarator = current.field("declarator");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-memory tree implementing the node capability set.
    #[derive(Clone)]
    struct MockNode {
        kind: &'static str,
        text: &'static str,
        children: Vec<MockNode>,
        fields: Vec<(&'static str, MockNode)>,
    }

    impl MockNode {
        fn leaf(kind: &'static str, text: &'static str) -> Self {
            MockNode {
                kind,
                text,
                children: Vec::new(),
                fields: Vec::new(),
            }
        }

        fn branch(kind: &'static str, children: Vec<MockNode>) -> Self {
            MockNode {
                kind,
                text: "",
                children,
                fields: Vec::new(),
            }
        }

        fn with_field(mut self, name: &'static str, node: MockNode) -> Self {
            self.fields.push((name, node));
            self
        }
    }

    impl AstNode for MockNode {
        fn kind(&self) -> &str {
            self.kind
        }

        fn text(&self) -> &str {
            self.text
        }

        fn children(&self) -> Vec<Self> {
            self.children.clone()
        }

        fn field(&self, name: &str) -> Option<Self> {
            self.fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, node)| node.clone())
        }
    }

    #[test]
    fn counts_nodes_and_depth() {
        let tree = MockNode::branch(
            "translation_unit",
            vec![MockNode::branch(
                "compound_statement",
                vec![MockNode::leaf("identifier", "x")],
            )],
        );
        let features = extract_features(&tree);
        assert_eq!(features.total_nodes, 3);
        assert_eq!(features.depth, 2);
        assert_eq!(features.node_types["identifier"], 1);
    }

    #[test]
    fn empty_tree_has_zero_depth() {
        let features = extract_features(&MockNode::leaf("translation_unit", ""));
        assert_eq!(features.total_nodes, 1);
        assert_eq!(features.depth, 0);
    }

    #[test]
    fn control_flow_counters() {
        let tree = MockNode::branch(
            "translation_unit",
            vec![
                MockNode::branch("if_statement", vec![]),
                MockNode::branch("for_statement", vec![]),
                MockNode::branch("for_statement", vec![]),
                MockNode::branch("while_statement", vec![]),
                MockNode::branch("switch_statement", vec![]),
            ],
        );
        let features = extract_features(&tree);
        assert_eq!(features.control_flow.if_statements, 1);
        assert_eq!(features.control_flow.for_loops, 2);
        assert_eq!(features.control_flow.while_loops, 1);
        assert_eq!(features.control_flow.switch_statements, 1);
        assert_eq!(features.control_flow.total(), 5);
    }

    #[test]
    fn operator_classification() {
        let binary = |op: &'static str| {
            MockNode::branch("binary_expression", vec![])
                .with_field("operator", MockNode::leaf("op", op))
        };
        let tree = MockNode::branch(
            "translation_unit",
            vec![
                binary("+"),
                binary("%"),
                binary("&&"),
                binary("=="),
                binary("<="),
                MockNode::branch("unary_expression", vec![])
                    .with_field("operator", MockNode::leaf("op", "!")),
                MockNode::branch("assignment_expression", vec![]),
                MockNode::branch("init_declarator", vec![]),
            ],
        );
        let features = extract_features(&tree);
        assert_eq!(features.operations.arithmetic, 2);
        assert_eq!(features.operations.logical, 2);
        assert_eq!(features.operations.comparison, 2);
        assert_eq!(features.operations.assignment, 2);
    }

    #[test]
    fn resolves_innermost_declarator() {
        let function = MockNode::branch("function_definition", vec![]).with_field(
            "declarator",
            MockNode::branch("function_declarator", vec![])
                .with_field("declarator", MockNode::leaf("identifier", "main")),
        );
        let declaration = MockNode::branch("declaration", vec![]).with_field(
            "declarator",
            MockNode::branch("init_declarator", vec![])
                .with_field("declarator", MockNode::leaf("identifier", "total")),
        );
        let call = MockNode::branch("call_expression", vec![])
            .with_field("function", MockNode::leaf("identifier", "helper"));
        let tree = MockNode::branch("translation_unit", vec![function, declaration, call]);

        let features = extract_features(&tree);
        assert_eq!(features.functions, vec!["main"]);
        assert_eq!(features.variable_declarations, vec!["total"]);
        assert_eq!(features.function_calls, vec!["helper"]);
    }

    #[test]
    fn missing_fields_deserialize_to_empty_forms() {
        let features: ParseFeatures = serde_json::from_str("{\"total_nodes\": 4}").unwrap();
        assert_eq!(features.total_nodes, 4);
        assert_eq!(features.depth, 0);
        assert!(features.functions.is_empty());
        assert_eq!(features.control_flow, ControlFlowCounts::default());
        assert_eq!(features.operations, OperationCounts::default());
        assert!(features.node_types.is_empty());
    }
}
