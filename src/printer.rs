//! Reference printer for [`Module`] trees.
//!
//! The inverse of [`parser`](crate::parser): raw chunks and managed-statement
//! heads are reproduced verbatim, while expressions are printed in a compact
//! normalized form. Deployments that need source-faithful output substitute
//! their own toolchain-backed [`SourceSyntax`](crate::syntax::SourceSyntax)
//! implementation.

use itertools::Itertools;

use crate::ast::{
    AttrValue, Expr, ImportDecl, ImportSpecifier, JsxAttr, JsxChild, JsxElement, Module,
    ModuleItem,
};

pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for item in &module.items {
        match item {
            ModuleItem::Import(decl) => print_import(&mut out, decl),
            ModuleItem::Managed(m) => {
                out.push_str(&m.head);
                out.push_str(&format!("/* plasmic-managed-jsx/{} */ ", m.revision));
                out.push_str(&print_expr(&m.expr));
            }
            ModuleItem::Raw(raw) => out.push_str(&raw.text),
        }
    }
    out
}

fn print_import(out: &mut String, decl: &ImportDecl) {
    for comment in &decl.leading_comments {
        out.push_str(comment);
        out.push('\n');
    }
    out.push_str("import ");
    if decl.specifiers.is_empty() {
        out.push_str(&format!("\"{}\";", decl.source));
    } else {
        let mut parts: Vec<String> = Vec::new();
        let named = decl
            .specifiers
            .iter()
            .filter_map(|spec| match spec {
                ImportSpecifier::Named { imported, local } if imported == local => {
                    Some(imported.clone())
                }
                ImportSpecifier::Named { imported, local } => {
                    Some(format!("{imported} as {local}"))
                }
                _ => None,
            })
            .collect_vec();
        for spec in &decl.specifiers {
            match spec {
                ImportSpecifier::Default { local } => parts.push(local.clone()),
                ImportSpecifier::Namespace { local } => parts.push(format!("* as {local}")),
                ImportSpecifier::Named { .. } => {}
            }
        }
        if !named.is_empty() {
            parts.push(format!("{{ {} }}", named.join(", ")));
        }
        out.push_str(&format!("{} from \"{}\";", parts.join(", "), decl.source));
    }
    if let Some(comment) = &decl.trailing_comment {
        out.push_str(&format!(" // {comment}"));
    }
    out.push('\n');
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(i) => i.name.clone(),
        Expr::Member(m) => format!("{}.{}", print_expr(&m.object), m.property),
        Expr::Call(c) => format!(
            "{}({})",
            print_expr(&c.callee),
            c.args.iter().map(print_expr).join(", ")
        ),
        Expr::Str(s) => quote(&s.value),
        Expr::Bool(b) => b.value.to_string(),
        Expr::Null(_) => "null".to_owned(),
        Expr::Logical(l) => format!(
            "{} {} {}",
            print_expr(&l.left),
            l.op.as_str(),
            print_expr(&l.right)
        ),
        Expr::Jsx(el) => print_element(el),
        Expr::Opaque(o) => o.text.clone(),
    }
}

fn print_element(el: &JsxElement) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attrs {
        out.push(' ');
        match attr {
            JsxAttr::Named(a) => {
                out.push_str(&a.name);
                match &a.value {
                    None => {}
                    Some(AttrValue::Str(s)) => out.push_str(&format!("={}", quote(&s.value))),
                    Some(AttrValue::Expr(c)) => {
                        out.push_str(&format!("={{{}}}", print_expr(&c.expr)));
                    }
                }
            }
            JsxAttr::Spread(s) => out.push_str(&format!("{{...{}}}", print_expr(&s.expr))),
        }
    }
    if el.self_closing {
        out.push_str(" />");
        return out;
    }
    out.push('>');
    for child in &el.children {
        match child {
            JsxChild::Text(t) => out.push_str(&t.value),
            JsxChild::Element(child_el) => out.push_str(&print_element(child_el)),
            JsxChild::Expr(c) => out.push_str(&format!("{{{}}}", print_expr(&c.expr))),
        }
    }
    out.push_str(&format!("</{}>", el.name));
    out
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::ExprParser;

    fn roundtrip(source: &str) -> String {
        print_expr(&ExprParser::new(source).parse_expr(&[]).unwrap())
    }

    #[test]
    fn element_roundtrip() {
        let source = r#"<div className={rh.clsRoot()} title="a">hello<span {...rh.propsInner()} /></div>"#;
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn visibility_gate_roundtrip() {
        let source = "rh.showRow() && <tr className={rh.clsRow()}>{rh.childStrRow()}</tr>";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn import_printing() {
        let module = crate::parser::parse_module(
            "// keep\nimport d, { A, B as C } from \"m\"; // plasmic-import: 7/component\n",
        )
        .unwrap();
        assert_eq!(
            print_module(&module),
            "// keep\nimport d, { A, B as C } from \"m\"; // plasmic-import: 7/component\n"
        );
    }
}
