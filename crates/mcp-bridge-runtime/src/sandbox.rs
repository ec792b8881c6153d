//! Dynamic-code sandbox (C9, §4.9).
//!
//! **Rust-native reinterpretation.** The original policy walks a C#
//! semantic model over host-editor and BCL types. A sandbox policy for
//! ad-hoc compiled snippets is a language-level problem, not a
//! language-specific one, so this walks *Rust* source with
//! `syn::visit::Visit` and flags a closed set of dangerous paths and
//! constructs in place of the original's dangerous-types table. Levels,
//! allow/deny precedence, and violation shape are unchanged.

use mcp_bridge_config::SandboxLevel;
use serde::{Deserialize, Serialize};
use syn::visit::{self, Visit};
use syn::spanned::Spanned;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    DangerousTypeReference,
    DangerousApiCall,
    DangerousObjectCreation,
    DangerousInheritance,
    UnsafeBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub api_name: String,
    pub source_location: String,
}

/// Closed deny-list: `(type_path, method_name)` pairs treated as dangerous
/// API calls regardless of allow-list admission (§4.9 "Restricted
/// deny-list prefixes", invariant 7 "strict dominance").
const DANGEROUS_CALLS: &[(&str, &str)] = &[
    ("std::fs", "remove_file"),
    ("std::fs", "remove_dir_all"),
    ("std::fs", "write"),
    ("fs", "remove_file"),
    ("fs", "remove_dir_all"),
    ("std::process::Command", "new"),
    ("Command", "new"),
    ("std::env", "set_var"),
    ("std::env", "remove_var"),
    ("std::env", "exit"),
    ("env", "set_var"),
    ("env", "remove_var"),
    ("env", "exit"),
    ("std::mem", "transmute"),
    ("mem", "transmute"),
];

/// Closed deny-list of module prefixes; any path starting with one of
/// these is dangerous even if it would otherwise be admitted under the
/// base-runtime allow-list (§4.9).
const DANGEROUS_PATH_PREFIXES: &[&str] = &[
    "std::fs",
    "std::net",
    "std::process",
    "std::thread",
    "std::os",
    "std::any",
    "tokio::fs",
    "tokio::net",
    "tokio::process",
];

fn path_to_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

fn location(span: proc_macro2::Span) -> String {
    let start = span.start();
    format!("{}:{}", start.line, start.column)
}

struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn flag(&mut self, kind: ViolationKind, api_name: String, span: proc_macro2::Span) {
        self.violations.push(Violation {
            kind,
            api_name,
            source_location: location(span),
        });
    }

    fn check_path(&mut self, path: &syn::Path, kind: ViolationKind) {
        let joined = path_to_string(path);
        if DANGEROUS_PATH_PREFIXES
            .iter()
            .any(|prefix| joined == *prefix || joined.starts_with(&format!("{}::", prefix)))
        {
            self.flag(kind, joined, path.span());
        }
    }
}

impl<'ast> Visit<'ast> for Walker {
    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if let syn::Expr::Path(expr_path) = node.func.as_ref() {
            let full = path_to_string(&expr_path.path);
            let segments: Vec<_> = expr_path.path.segments.iter().collect();
            if let Some(last) = segments.last() {
                let method = last.ident.to_string();
                let type_path = segments[..segments.len() - 1]
                    .iter()
                    .map(|s| s.ident.to_string())
                    .collect::<Vec<_>>()
                    .join("::");

                let matches_dangerous = DANGEROUS_CALLS.iter().any(|(t, m)| {
                    *m == method && (type_path == *t || type_path.ends_with(t) || type_path.is_empty())
                });

                if matches_dangerous {
                    self.flag(ViolationKind::DangerousApiCall, full.clone(), node.span());
                }
            }
            self.check_path(&expr_path.path, ViolationKind::DangerousApiCall);
        }
        visit::visit_expr_call(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        let method = node.method.to_string();
        let dangerous_methods = ["spawn", "exec", "output", "status"];
        if dangerous_methods.contains(&method.as_str()) {
            if let syn::Expr::Path(p) = node.receiver.as_ref() {
                let recv = path_to_string(&p.path);
                if recv.to_lowercase().contains("command") {
                    self.flag(
                        ViolationKind::DangerousApiCall,
                        format!("{}.{}", recv, method),
                        node.span(),
                    );
                }
            }
        }
        visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_path(&mut self, node: &'ast syn::ExprPath) {
        self.check_path(&node.path, ViolationKind::DangerousTypeReference);
        visit::visit_expr_path(self, node);
    }

    fn visit_type_path(&mut self, node: &'ast syn::TypePath) {
        self.check_path(&node.path, ViolationKind::DangerousTypeReference);
        visit::visit_type_path(self, node);
    }

    fn visit_expr_struct(&mut self, node: &'ast syn::ExprStruct) {
        self.check_path(&node.path, ViolationKind::DangerousObjectCreation);
        visit::visit_expr_struct(self, node);
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        if let Some((_, trait_path, _)) = &node.trait_ {
            self.check_path(trait_path, ViolationKind::DangerousInheritance);
        }
        visit::visit_item_impl(self, node);
    }

    fn visit_expr_unsafe(&mut self, node: &'ast syn::ExprUnsafe) {
        self.flag(
            ViolationKind::UnsafeBlock,
            "unsafe".to_string(),
            node.span(),
        );
        visit::visit_expr_unsafe(self, node);
    }
}

/// Run the AST walker over `source` at the given sandbox level (§4.9
/// decision table). `Disabled` and `FullAccess` never walk; only
/// `Restricted` does.
pub fn check_source(source: &str, level: SandboxLevel) -> Result<Vec<Violation>> {
    match level {
        SandboxLevel::Disabled | SandboxLevel::FullAccess => Ok(Vec::new()),
        SandboxLevel::Restricted => {
            let file = syn::parse_file(source)
                .map_err(|e| Error::InvalidParams(format!("invalid Rust source: {}", e)))?;
            let mut walker = Walker::new();
            walker.visit_file(&file);
            Ok(walker.violations)
        }
    }
}

/// Whether code may even be compiled at this level (§4.9: compilation is
/// always allowed; only execution is gated at `Disabled`).
pub fn can_compile(_level: SandboxLevel) -> bool {
    true
}

pub fn can_execute(level: SandboxLevel) -> bool {
    !matches!(level, SandboxLevel::Disabled)
}
