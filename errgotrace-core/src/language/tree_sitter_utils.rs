use tree_sitter::Node;

pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .find(|child| child.kind() == kind);
    result
}

/// Collect every child stored under `field`, in source order
pub fn children_by_field<'a>(node: Node<'a>, field: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children_by_field_name(field, &mut cursor).collect();
    result
}

/// Slice the source text covered by `node`
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Depth-first search for the first ERROR or MISSING node
///
/// Only descends into subtrees that report `has_error`, so clean files cost a
/// single flag check at the root.
pub fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }

    // has_error with no offending descendant; report the node itself
    Some(node)
}

/// Collect the byte ranges of every node of `kind` under `node`
pub fn collect_ranges_of_kind(node: Node<'_>, kind: &str, ranges: &mut Vec<(usize, usize)>) {
    if node.kind() == kind {
        ranges.push((node.start_byte(), node.end_byte()));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_ranges_of_kind(child, kind, ranges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Parser, Tree};

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_find_child_by_kind() {
        let source = "package demo\n";
        let tree = parse(source);
        let clause = find_child_by_kind(tree.root_node(), "package_clause").unwrap();
        let ident = find_child_by_kind(clause, "package_identifier").unwrap();
        assert_eq!(node_text(ident, source), "demo");
    }

    #[test]
    fn test_children_by_field_keeps_source_order() {
        let source = "package p\n\nfunc f(a, b, c int) {}\n";
        let tree = parse(source);
        let func = find_child_by_kind(tree.root_node(), "function_declaration").unwrap();
        let params = func.child_by_field_name("parameters").unwrap();
        let decl = params.named_child(0).unwrap();
        let names: Vec<&str> = children_by_field(decl, "name")
            .into_iter()
            .map(|n| node_text(n, source))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_error_node_clean_tree() {
        let tree = parse("package p\n\nfunc f() int { return 1 }\n");
        assert!(first_error_node(tree.root_node()).is_none());
    }

    #[test]
    fn test_first_error_node_broken_tree() {
        let tree = parse("package p\n\nfunc f() { invalid syntax }}}}\n");
        let err = first_error_node(tree.root_node()).expect("should locate an error");
        assert!(err.start_position().row >= 2);
    }

    #[test]
    fn test_collect_raw_string_ranges() {
        let source = "package p\n\nvar s = `a\nb`\nvar t = \"c\"\n";
        let tree = parse(source);
        let mut ranges = Vec::new();
        collect_ranges_of_kind(tree.root_node(), "raw_string_literal", &mut ranges);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&source[ranges[0].0..ranges[0].1], "`a\nb`");
    }
}
