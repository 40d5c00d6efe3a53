//! Duplicate-aware union of the import sections of the edited and new files.
//!
//! Only tool-managed imports (those carrying a `plasmic-import: …` trailing
//! comment) are unioned; developer imports stay exactly where they are.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::ast::{ImportDecl, ImportSpecifier, Module, ModuleItem};

/// Trailing comment identifying a tool-managed import: an id, optionally
/// followed by the kind of artifact the import binds.
static MANAGED_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"plasmic-import:\s+([\w-]+)(?:/(component|css|render|globalVariant|projectcss|defaultcss))?")
        .unwrap()
});

/// The sort/identity key of a managed import: `(id, type)`, ordered with an
/// absent type before any present type.
pub(crate) fn managed_import_key(decl: &ImportDecl) -> Option<(String, Option<String>)> {
    let comment = decl.trailing_comment.as_deref()?;
    let caps = MANAGED_IMPORT_RE.captures(comment)?;
    Some((
        caps[1].to_owned(),
        caps.get(2).map(|m| m.as_str().to_owned()),
    ))
}

/// Replaces the managed imports of `edited` with the stabilized union of the
/// managed imports of both files. The merged run is inserted where the first
/// managed import stood (failing that, before the first import; failing
/// that, at the start of the file).
pub(crate) fn merge_imports(edited: &mut Module, new: &Module) {
    let new_managed: Vec<ImportDecl> = new
        .imports()
        .filter(|decl| managed_import_key(decl).is_some())
        .cloned()
        .collect();

    let mut managed_at = None;
    let mut first_import_at = None;
    let mut combined = Vec::new();
    let mut retained = Vec::new();
    for item in edited.items.drain(..) {
        match item {
            ModuleItem::Import(decl) if managed_import_key(&decl).is_some() => {
                managed_at.get_or_insert(retained.len());
                combined.push(decl);
            }
            item => {
                if matches!(item, ModuleItem::Import(_)) {
                    first_import_at.get_or_insert(retained.len());
                }
                retained.push(item);
            }
        }
    }
    combined.extend(new_managed);
    combined.sort_by_cached_key(|decl| {
        managed_import_key(decl).expect("only managed imports are collected")
    });
    for decl in &mut combined {
        // leading comments were attached to these declarations from both
        // surrounding sides; dropping them prevents double emission
        decl.leading_comments.clear();
    }

    let mut merged: Vec<ImportDecl> = Vec::new();
    for decl in combined {
        match merged.last_mut() {
            Some(last) if managed_import_key(last) == managed_import_key(&decl) => {
                merge_specifiers(last, decl);
            }
            _ => merged.push(decl),
        }
    }
    debug!("merged import section carries {} managed imports", merged.len());

    let at = managed_at.or(first_import_at).unwrap_or(0);
    retained.splice(at..at, merged.into_iter().map(ModuleItem::Import));
    edited.items = retained;
}

/// Unions the specifier list of `b` into `a`, skipping duplicates.
fn merge_specifiers(a: &mut ImportDecl, b: ImportDecl) {
    for spec in b.specifiers {
        let duplicate = match &spec {
            ImportSpecifier::Default { local } => a.specifiers.iter().any(|s| {
                matches!(s, ImportSpecifier::Default { local: l } if l == local)
            }),
            ImportSpecifier::Named { imported, local } => a.specifiers.iter().any(|s| {
                matches!(
                    s,
                    ImportSpecifier::Named { imported: i, local: l }
                        if i == imported && l == local
                )
            }),
            // namespace imports only come from developers; keep them all
            ImportSpecifier::Namespace { .. } => false,
        };
        if !duplicate {
            a.specifiers.push(spec);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse_module;
    use crate::printer::print_module;

    fn merged(edited: &str, new: &str) -> String {
        let mut edited = parse_module(edited).unwrap();
        let new = parse_module(new).unwrap();
        merge_imports(&mut edited, &new);
        print_module(&edited)
    }

    #[test]
    fn specifier_union_dedups_named_imports() {
        let out = merged(
            "import { A, B } from \"m\"; // plasmic-import: 7\nconst x = 1;\n",
            "import { B, C } from \"m\"; // plasmic-import: 7\n",
        );
        assert_eq!(
            out,
            "import { A, B, C } from \"m\"; // plasmic-import: 7\nconst x = 1;\n"
        );
    }

    #[test]
    fn managed_imports_are_sorted_by_id_then_type() {
        let out = merged(
            "import { Z } from \"z\"; // plasmic-import: b/css\nimport { Y } from \"y\"; // plasmic-import: b\n",
            "import { X } from \"x\"; // plasmic-import: a/component\n",
        );
        assert_eq!(
            out,
            "import { X } from \"x\"; // plasmic-import: a/component\n\
             import { Y } from \"y\"; // plasmic-import: b\n\
             import { Z } from \"z\"; // plasmic-import: b/css\n"
        );
    }

    #[test]
    fn developer_imports_keep_their_place() {
        let out = merged(
            "import React from \"react\";\nimport { A } from \"m\"; // plasmic-import: 7/component\nimport util from \"./util\";\n",
            "import { A, B } from \"m\"; // plasmic-import: 7/component\n",
        );
        assert_eq!(
            out,
            "import React from \"react\";\nimport { A, B } from \"m\"; // plasmic-import: 7/component\nimport util from \"./util\";\n"
        );
    }

    #[test]
    fn managed_imports_land_before_the_first_import_when_none_existed() {
        let out = merged(
            "import React from \"react\";\nconst x = 1;\n",
            "import { A } from \"m\"; // plasmic-import: 9/render\n",
        );
        assert_eq!(
            out,
            "import { A } from \"m\"; // plasmic-import: 9/render\nimport React from \"react\";\nconst x = 1;\n"
        );
    }

    #[test]
    fn unmanaged_new_imports_are_ignored(){
        let out = merged(
            "const x = 1;\n",
            "import helperOnly from \"internal\";\n",
        );
        assert_eq!(out, "const x = 1;\n");
    }
}
