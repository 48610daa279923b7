//! Go language parser using tree-sitter

use crate::language::parser::{SourceParser, SyntaxError};
use crate::language::tree_sitter_utils::{find_child_by_kind, first_error_node, node_text};
use tree_sitter::{Node, Parser, Tree};

/// Go parser using tree-sitter
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParser;

impl GoParser {
    pub fn new() -> Self {
        GoParser
    }
}

impl SourceParser for GoParser {
    type Module = GoModule;

    fn parse(&self, source: &str) -> Result<GoModule, SyntaxError> {
        // tree-sitter parsers are stateful, so build one per file
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| SyntaxError::new(1, 1, format!("failed to load Go grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| SyntaxError::new(1, 1, "parser produced no tree"))?;

        if let Some(bad) = first_error_node(tree.root_node()) {
            return Err(describe_error(bad, source));
        }

        if find_child_by_kind(tree.root_node(), "package_clause").is_none() {
            return Err(SyntaxError::new(1, 1, "expected package clause"));
        }

        Ok(GoModule {
            tree,
            source: source.to_string(),
        })
    }
}

fn describe_error(node: Node<'_>, source: &str) -> SyntaxError {
    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let text = node_text(node, source);
        let snippet: String = text.lines().next().unwrap_or("").chars().take(40).collect();
        if snippet.is_empty() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected `{}`", snippet)
        }
    };
    SyntaxError::new(pos.row as u32 + 1, pos.column as u32 + 1, message)
}

/// A single `import` spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name (`foo`, `_` or `.`), if any
    pub name: Option<String>,
    /// Import path without quotes
    pub path: String,
}

/// Parsed Go file
pub struct GoModule {
    tree: Tree,
    source: String,
}

impl GoModule {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    fn package_identifier(&self) -> Option<Node<'_>> {
        let clause = find_child_by_kind(self.root(), "package_clause")?;
        find_child_by_kind(clause, "package_identifier")
    }

    /// Name declared by the package clause
    pub fn package_name(&self) -> Option<&str> {
        self.package_identifier()
            .map(|ident| node_text(ident, &self.source))
    }

    /// Offset of the newline ending the package clause's line
    ///
    /// Comments starting on that line belong to it, including a block comment
    /// that runs onto later lines. Returns the end of the source when the
    /// line is the last one.
    pub fn package_line_end(&self) -> Option<usize> {
        let clause = find_child_by_kind(self.root(), "package_clause")?;
        let mut end = clause.end_byte();
        let mut row = clause.end_position().row;

        let mut next = clause.next_named_sibling();
        while let Some(node) = next {
            if node.kind() != "comment" || node.start_position().row != row {
                break;
            }
            end = node.end_byte();
            row = node.end_position().row;
            next = node.next_named_sibling();
        }

        let rest = &self.source[end..];
        Some(end + rest.find('\n').unwrap_or(rest.len()))
    }

    /// Every import spec in the file, in source order
    pub fn imports(&self) -> Vec<ImportSpec> {
        let mut specs = Vec::new();
        let mut cursor = self.root().walk();
        for decl in self.root().children(&mut cursor) {
            if decl.kind() == "import_declaration" {
                collect_import_specs(decl, &self.source, &mut specs);
            }
        }
        specs
    }

    /// Top-level function and method declarations, in source order
    pub fn function_declarations(&self) -> Vec<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let decls = root
            .children(&mut cursor)
            .filter(|n| n.kind() == "function_declaration" || n.kind() == "method_declaration")
            .collect();
        decls
    }
}

fn collect_import_specs(node: Node<'_>, source: &str, specs: &mut Vec<ImportSpec>) {
    if node.kind() == "import_spec" {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, source).to_string());
        let path = node
            .child_by_field_name("path")
            .map(|n| node_text(n, source).trim_matches(|c| c == '"' || c == '`').to_string())
            .unwrap_or_default();
        specs.push(ImportSpec { name, path });
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_import_specs(child, source, specs);
    }
}
