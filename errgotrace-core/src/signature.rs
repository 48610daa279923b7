//! Signature extraction for instrumentable Go functions
//!
//! Global invariants enforced:
//! - A `FunctionSignature` only exists for declarations with a body and at
//!   least one result slot
//! - Exclusion always wins over inclusion
//! - Extraction is a pure function of (declaration, source, package, filter)

use crate::error::Error;
use crate::language::tree_sitter_utils::{children_by_field, node_text};
use crate::language::SourceSpan;
use regex::Regex;
use tree_sitter::Node;

/// The blank identifier; parameters with this name are never forwarded
pub const DISCARD: &str = "_";

/// One forwarded parameter of the renamed implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// Element type text; for variadic parameters this excludes the `...`
    pub type_text: String,
    pub is_variadic: bool,
}

/// Structural description of a function that will be wrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// `package[.receiverType].name`, used for filtering and logging
    pub qualified_name: String,
    /// Declared identifier
    pub name: String,
    /// Verbatim receiver list of a named receiver, e.g. `(s *Server)`
    pub receiver_text: String,
    /// Receiver identifier used to call the renamed method
    pub receiver_name: Option<String>,
    /// Identifier-safe rendering of an unnamed receiver's type
    pub synthetic_name_prefix: String,
    /// Verbatim type parameter list, e.g. `[K comparable, V any]`
    pub type_params_text: String,
    pub type_param_names: Vec<String>,
    pub params: Vec<Param>,
    pub result_count: usize,
    /// Verbatim result list, e.g. `(int, error)` or `error`
    pub results_text: String,
    /// Offset just past the body's opening brace
    pub body_offset: usize,
    pub span: SourceSpan,
}

impl FunctionSignature {
    /// Name used for every generated identifier derived from this function
    pub fn working_name(&self) -> String {
        if self.synthetic_name_prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.synthetic_name_prefix, self.name)
        }
    }

    /// Name the original body is moved to
    pub fn impl_name(&self) -> String {
        format!("__{}", self.working_name())
    }
}

/// Why a declaration was not turned into a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAFunction,
    NoBody,
    NoResults,
    NotIncluded,
    Excluded,
    NotExported,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotAFunction => "not a function declaration",
            SkipReason::NoBody => "no body",
            SkipReason::NoResults => "no results",
            SkipReason::NotIncluded => "does not match filter",
            SkipReason::Excluded => "matches exclude",
            SkipReason::NotExported => "not exported",
        }
    }
}

/// Name-based selection of functions to instrument
#[derive(Debug, Clone)]
pub struct FunctionFilter {
    include: Regex,
    exclude: Option<Regex>,
    exported_only: bool,
}

impl FunctionFilter {
    /// Compile the filter; an empty `exclude` means "exclude nothing"
    pub fn new(include: &str, exclude: &str, exported_only: bool) -> Result<Self, Error> {
        let include = Regex::new(include).map_err(|source| Error::Pattern {
            kind: "filter",
            pattern: include.to_string(),
            source,
        })?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(Regex::new(exclude).map_err(|source| Error::Pattern {
                kind: "exclude",
                pattern: exclude.to_string(),
                source,
            })?)
        };
        Ok(FunctionFilter {
            include,
            exclude,
            exported_only,
        })
    }

    /// Apply inclusion, exclusion and export rules, in that order
    pub fn check(&self, qualified_name: &str, name: &str) -> Result<(), SkipReason> {
        if !self.include.is_match(qualified_name) {
            return Err(SkipReason::NotIncluded);
        }
        if self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(qualified_name))
        {
            return Err(SkipReason::Excluded);
        }
        if self.exported_only && !is_exported(name) {
            return Err(SkipReason::NotExported);
        }
        Ok(())
    }
}

impl Default for FunctionFilter {
    fn default() -> Self {
        FunctionFilter {
            include: Regex::new(".").expect("static pattern"),
            exclude: None,
            exported_only: false,
        }
    }
}

/// Go's export rule: the identifier starts with an upper-case letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Render a receiver type as an identifier fragment
///
/// `*T` → `T`, `Pair[K, V]` → `Pair_oK_V_c`. Pointer markers are dropped since
/// Go rejects the same method name on both `T` and `*T`.
pub fn synthetic_prefix(type_text: &str) -> String {
    let mut out = String::with_capacity(type_text.len());
    for c in type_text.chars() {
        match c {
            '*' | '(' | ')' => {}
            '[' => out.push_str("_o"),
            ']' => out.push_str("_c"),
            ',' | '.' => out.push('_'),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Build a signature for `decl`, or report why it is not instrumented
pub fn extract_signature(
    decl: Node<'_>,
    source: &str,
    package: &str,
    filter: &FunctionFilter,
) -> Result<FunctionSignature, SkipReason> {
    if decl.kind() != "function_declaration" && decl.kind() != "method_declaration" {
        return Err(SkipReason::NotAFunction);
    }

    let body = decl.child_by_field_name("body").ok_or(SkipReason::NoBody)?;
    let name_node = decl
        .child_by_field_name("name")
        .ok_or(SkipReason::NotAFunction)?;
    let name = node_text(name_node, source).to_string();

    let (result_count, results_text) = match decl.child_by_field_name("result") {
        Some(result) => (count_results(result), node_text(result, source).to_string()),
        None => (0, String::new()),
    };
    if result_count == 0 {
        return Err(SkipReason::NoResults);
    }

    let receiver = decl
        .child_by_field_name("receiver")
        .and_then(|list| receiver_parts(list, source));

    let qualified_name = match &receiver {
        Some(recv) => format!("{}.{}.{}", package, recv.type_text, name),
        None => format!("{}.{}", package, name),
    };

    filter.check(&qualified_name, &name)?;

    let (receiver_text, receiver_name, synthetic_name_prefix) = match receiver {
        Some(ReceiverParts {
            name: Some(recv_name),
            list_text,
            ..
        }) => (list_text, Some(recv_name), String::new()),
        Some(ReceiverParts { type_text, .. }) => {
            (String::new(), None, synthetic_prefix(&type_text))
        }
        None => (String::new(), None, String::new()),
    };

    let (type_params_text, type_param_names) = match decl.child_by_field_name("type_parameters") {
        Some(list) => (
            node_text(list, source).to_string(),
            type_parameter_names(list, source),
        ),
        None => (String::new(), Vec::new()),
    };

    let params = decl
        .child_by_field_name("parameters")
        .map(|list| forwarded_params(list, source))
        .unwrap_or_default();

    Ok(FunctionSignature {
        qualified_name,
        name,
        receiver_text,
        receiver_name,
        synthetic_name_prefix,
        type_params_text,
        type_param_names,
        params,
        result_count,
        results_text,
        body_offset: body.start_byte() + 1,
        span: SourceSpan::from(decl),
    })
}

struct ReceiverParts {
    name: Option<String>,
    type_text: String,
    list_text: String,
}

fn receiver_parts(list: Node<'_>, source: &str) -> Option<ReceiverParts> {
    let mut cursor = list.walk();
    let decl = list
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let type_text = node_text(decl.child_by_field_name("type")?, source).to_string();
    let name = decl
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .filter(|n| n != DISCARD);
    Some(ReceiverParts {
        name,
        type_text,
        list_text: node_text(list, source).to_string(),
    })
}

/// Count result slots; `(a, b int, err error)` has three
fn count_results(result: Node<'_>) -> usize {
    if result.kind() != "parameter_list" {
        return 1;
    }
    let mut cursor = result.walk();
    let count = result
        .named_children(&mut cursor)
        .filter(|n| {
            n.kind() == "parameter_declaration" || n.kind() == "variadic_parameter_declaration"
        })
        .map(|n| children_by_field(n, "name").len().max(1))
        .sum();
    count
}

fn forwarded_params(list: Node<'_>, source: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        let is_variadic = match decl.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };
        let Some(type_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let type_text = node_text(type_node, source);
        for name_node in children_by_field(decl, "name") {
            let name = node_text(name_node, source);
            if name == DISCARD {
                continue;
            }
            params.push(Param {
                name: name.to_string(),
                type_text: type_text.to_string(),
                is_variadic,
            });
        }
    }
    params
}

fn type_parameter_names(list: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if decl.kind() != "type_parameter_declaration" {
            continue;
        }
        for name_node in children_by_field(decl, "name") {
            names.push(node_text(name_node, source).to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{GoParser, SourceParser};

    fn extract_all(source: &str, filter: &FunctionFilter) -> Vec<Result<FunctionSignature, SkipReason>> {
        let module = GoParser::new().parse(source).unwrap();
        let package = module.package_name().unwrap().to_string();
        module
            .function_declarations()
            .into_iter()
            .map(|decl| extract_signature(decl, source, &package, filter))
            .collect()
    }

    fn extract_one(source: &str) -> FunctionSignature {
        extract_all(source, &FunctionFilter::default())
            .into_iter()
            .next()
            .expect("one declaration")
            .expect("eligible declaration")
    }

    #[test]
    fn test_plain_function() {
        let sig = extract_one("package calc\n\nfunc F(a int, b int) (int, error) {\n\treturn a + b, nil\n}\n");
        assert_eq!(sig.qualified_name, "calc.F");
        assert_eq!(sig.name, "F");
        assert_eq!(sig.receiver_text, "");
        assert_eq!(sig.receiver_name, None);
        assert_eq!(sig.synthetic_name_prefix, "");
        assert_eq!(sig.result_count, 2);
        assert_eq!(sig.results_text, "(int, error)");
        let names: Vec<&str> = sig.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(sig.params.iter().all(|p| !p.is_variadic && p.type_text == "int"));
        assert_eq!(sig.impl_name(), "__F");
    }

    #[test]
    fn test_variadic_parameter() {
        let sig = extract_one("package calc\n\nfunc Sum(nums ...int) (int, error) {\n\treturn 0, nil\n}\n");
        assert_eq!(
            sig.params,
            vec![Param {
                name: "nums".into(),
                type_text: "int".into(),
                is_variadic: true
            }]
        );
    }

    #[test]
    fn test_discard_parameters_are_not_forwarded() {
        let sig = extract_one("package p\n\nfunc G(_ int, b string) (string, error) {\n\treturn b, nil\n}\n");
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.params[0].name, "b");
        assert_eq!(sig.params[0].type_text, "string");
    }

    #[test]
    fn test_grouped_names_share_type() {
        let sig = extract_one("package p\n\nfunc H(a, _, c float64) error {\n\treturn nil\n}\n");
        let names: Vec<&str> = sig.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(sig.params.iter().all(|p| p.type_text == "float64"));
        assert_eq!(sig.result_count, 1);
        assert_eq!(sig.results_text, "error");
    }

    #[test]
    fn test_named_results_count_each_slot() {
        let sig = extract_one("package p\n\nfunc N() (x, y int, err error) {\n\treturn\n}\n");
        assert_eq!(sig.result_count, 3);
        assert_eq!(sig.results_text, "(x, y int, err error)");
    }

    #[test]
    fn test_named_receiver() {
        let sig = extract_one("package srv\n\nfunc (s *Server) Start(port int) error {\n\treturn nil\n}\n");
        assert_eq!(sig.qualified_name, "srv.*Server.Start");
        assert_eq!(sig.receiver_text, "(s *Server)");
        assert_eq!(sig.receiver_name.as_deref(), Some("s"));
        assert_eq!(sig.synthetic_name_prefix, "");
        assert_eq!(sig.impl_name(), "__Start");
    }

    #[test]
    fn test_unnamed_pointer_receiver() {
        let sig = extract_one("package pkg\n\nfunc (*T) Method() (int, error) {\n\treturn 0, nil\n}\n");
        assert_eq!(sig.qualified_name, "pkg.*T.Method");
        assert_eq!(sig.receiver_text, "");
        assert_eq!(sig.receiver_name, None);
        assert_eq!(sig.synthetic_name_prefix, "T");
        assert_eq!(sig.working_name(), "T_Method");
        assert_eq!(sig.impl_name(), "__T_Method");
    }

    #[test]
    fn test_blank_receiver_is_treated_as_unnamed() {
        let sig = extract_one("package pkg\n\nfunc (_ Pair[K, V]) Get() (V, error) {\n\tvar v V\n\treturn v, nil\n}\n");
        assert_eq!(sig.qualified_name, "pkg.Pair[K, V].Get");
        assert_eq!(sig.receiver_name, None);
        assert_eq!(sig.synthetic_name_prefix, "Pair_oK_V_c");
    }

    #[test]
    fn test_type_parameters() {
        let sig = extract_one("package p\n\nfunc Map[T any, U comparable](xs []T) ([]U, error) {\n\treturn nil, nil\n}\n");
        assert_eq!(sig.type_params_text, "[T any, U comparable]");
        assert_eq!(sig.type_param_names, vec!["T", "U"]);
    }

    #[test]
    fn test_zero_results_are_skipped() {
        let results = extract_all(
            "package p\n\nfunc f() {\n}\n\nfunc g() () {\n}\n",
            &FunctionFilter::default(),
        );
        assert_eq!(results, vec![Err(SkipReason::NoResults), Err(SkipReason::NoResults)]);
    }

    #[test]
    fn test_bodyless_declaration_is_skipped() {
        let results = extract_all("package p\n\nfunc asm(x int) int\n", &FunctionFilter::default());
        assert_eq!(results, vec![Err(SkipReason::NoBody)]);
    }

    #[test]
    fn test_exclusion_takes_precedence() {
        let filter = FunctionFilter::new(".", r"^p\.Skip$", false).unwrap();
        let results = extract_all(
            "package p\n\nfunc Skip() error {\n\treturn nil\n}\n\nfunc Keep() error {\n\treturn nil\n}\n",
            &filter,
        );
        assert_eq!(results[0], Err(SkipReason::Excluded));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_inclusion_filter() {
        let filter = FunctionFilter::new(r"\.Load", "", false).unwrap();
        let results = extract_all(
            "package cfg\n\nfunc Load() error {\n\treturn nil\n}\n\nfunc Save() error {\n\treturn nil\n}\n",
            &filter,
        );
        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(SkipReason::NotIncluded));
    }

    #[test]
    fn test_exported_only_uses_identifier() {
        let filter = FunctionFilter::new(".", "", true).unwrap();
        let results = extract_all(
            "package main\n\nfunc helper() error {\n\treturn nil\n}\n\nfunc Public() error {\n\treturn nil\n}\n",
            &filter,
        );
        assert_eq!(results[0], Err(SkipReason::NotExported));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = FunctionFilter::new("(", "", false).unwrap_err();
        assert!(matches!(err, Error::Pattern { kind: "filter", .. }));
        let err = FunctionFilter::new(".", "[", false).unwrap_err();
        assert!(matches!(err, Error::Pattern { kind: "exclude", .. }));
    }

    #[test]
    fn test_body_offset_points_past_brace() {
        let source = "package p\n\nfunc F() error {\n\treturn nil\n}\n";
        let sig = extract_one(source);
        assert_eq!(&source[sig.body_offset - 1..sig.body_offset], "{");
        assert_eq!(sig.span.start_line, 3);
    }

    #[test]
    fn test_synthetic_prefix() {
        assert_eq!(synthetic_prefix("*T"), "T");
        assert_eq!(synthetic_prefix("T"), "T");
        assert_eq!(synthetic_prefix("*List[T]"), "List_oT_c");
        assert_eq!(synthetic_prefix("Map[K, V]"), "Map_oK_V_c");
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Open"));
        assert!(is_exported("Ärger"));
        assert!(!is_exported("open"));
        assert!(!is_exported("_Open"));
        assert!(!is_exported(""));
    }
}
