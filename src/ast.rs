//! The typed JS/JSX syntax tree the merge operates on.
//!
//! This is the interchange format between the merge engine and its
//! collaborators: a parser produces a [`Module`] per source file, the engine
//! assembles a fresh tree out of cloned pieces of the inputs, and a printer
//! turns the result back into source text. The engine never mutates an input
//! tree.
//!
//! Developer-owned expressions the engine has no business inspecting are kept
//! as [`Expr::Opaque`], carrying their source text verbatim.
//!
//! Every node records the byte [`Span`] it was parsed from. Spans are
//! preserved through cloning and serve as stable node identity when a subtree
//! has to be located again inside a fresh clone.

use std::fmt;

/// Byte range of a node in the source it was parsed from.
///
/// Synthesized nodes (built by the merge rather than by a parser) carry
/// [`Span::SYNTHETIC`], which is never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const SYNTHETIC: Span = Span {
        start: usize::MAX,
        end: usize::MAX,
    };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// An expression, restricted to the shapes the merge engine needs to tell
/// apart. Anything else is [`Expr::Opaque`].
#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    Member(Box<MemberExpr>),
    Call(Box<CallExpr>),
    Str(StrLit),
    Bool(BoolLit),
    Null(Span),
    Logical(Box<LogicalExpr>),
    Jsx(Box<JsxElement>),
    Opaque(OpaqueExpr),
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// `object.property`. Only single-identifier properties occur in the
/// managed helper calls this engine rewrites.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: Expr,
    pub property: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StrLit {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BoolLit {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogicalExpr {
    pub op: LogicalOp,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

/// Verbatim source text of an expression the engine must not inspect.
#[derive(Debug, Clone)]
pub struct OpaqueExpr {
    pub text: String,
    pub span: Span,
}

/// A JSX element (host tag or component).
#[derive(Debug, Clone)]
pub struct JsxElement {
    pub name: String,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum JsxAttr {
    Named(NamedAttr),
    Spread(SpreadAttr),
}

impl JsxAttr {
    /// The attribute name, for named attributes.
    pub fn name(&self) -> Option<&str> {
        match self {
            JsxAttr::Named(a) => Some(&a.name),
            JsxAttr::Spread(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamedAttr {
    pub name: String,
    pub value: Option<AttrValue>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    /// `name="literal"`
    Str(StrLit),
    /// `name={expr}`
    Expr(JsxExprContainer),
}

impl AttrValue {
    /// The contained expression, when the value is an expression container.
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            AttrValue::Str(_) => None,
            AttrValue::Expr(c) => Some(&c.expr),
        }
    }
}

/// `{...expr}` in attribute position.
#[derive(Debug, Clone)]
pub struct SpreadAttr {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum JsxChild {
    Text(JsxText),
    Element(Box<JsxElement>),
    Expr(JsxExprContainer),
}

#[derive(Debug, Clone)]
pub struct JsxText {
    pub value: String,
    pub span: Span,
}

/// `{expr}` in child or attribute-value position.
#[derive(Debug, Clone)]
pub struct JsxExprContainer {
    pub expr: Expr,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Modules and imports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    /// `import local from "…"`
    Default { local: String },
    /// `import { imported as local } from "…"` (`local == imported` when no
    /// alias is given)
    Named { imported: String, local: String },
    /// `import * as local from "…"`
    Namespace { local: String },
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    /// Full-line comments directly above the declaration, without newlines.
    pub leading_comments: Vec<String>,
    /// Content of a `// …` comment on the same line, after the semicolon.
    pub trailing_comment: Option<String>,
    pub span: Span,
}

/// A parsed source file, reduced to what the merge needs: import
/// declarations, the single managed-markup statement, and verbatim chunks for
/// everything else.
#[derive(Debug, Clone)]
pub struct Module {
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Clone)]
pub enum ModuleItem {
    Import(ImportDecl),
    Managed(ManagedStmt),
    Raw(RawChunk),
}

/// The statement whose right-hand side carries the
/// `plasmic-managed-jsx/<rev>` marker comment and the managed markup
/// expression.
#[derive(Debug, Clone)]
pub struct ManagedStmt {
    /// Verbatim text from the end of the previous item up to the marker
    /// comment (e.g. `"  return (\n    "`).
    pub head: String,
    /// Revision number carried by the marker comment.
    pub revision: u64,
    pub expr: Expr,
    pub span: Span,
}

/// Verbatim source text the merge leaves untouched.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub text: String,
}

impl Module {
    pub fn managed(&self) -> Option<&ManagedStmt> {
        self.items.iter().find_map(|item| match item {
            ModuleItem::Managed(m) => Some(m),
            _ => None,
        })
    }

    pub fn managed_mut(&mut self) -> Option<&mut ManagedStmt> {
        self.items.iter_mut().find_map(|item| match item {
            ModuleItem::Managed(m) => Some(m),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Import(decl) => Some(decl),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Construction helpers for synthesized nodes
// ---------------------------------------------------------------------------

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(Ident {
            name: name.into(),
            span: Span::SYNTHETIC,
        })
    }

    /// `object.property`
    pub fn member(object: Expr, property: impl Into<String>) -> Expr {
        Expr::Member(Box::new(MemberExpr {
            object,
            property: property.into(),
            span: Span::SYNTHETIC,
        }))
    }

    /// `helper.method()`, the shape of every managed helper call.
    pub fn helper_call(helper: &str, method: impl Into<String>) -> Expr {
        Expr::Call(Box::new(CallExpr {
            callee: Expr::member(Expr::ident(helper), method),
            args: Vec::new(),
            span: Span::SYNTHETIC,
        }))
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::Logical(Box::new(LogicalExpr {
            op: LogicalOp::And,
            left,
            right,
            span: Span::SYNTHETIC,
        }))
    }

    pub fn bool_lit(value: bool) -> Expr {
        Expr::Bool(BoolLit {
            value,
            span: Span::SYNTHETIC,
        })
    }

    pub fn null() -> Expr {
        Expr::Null(Span::SYNTHETIC)
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(i) => i.span,
            Expr::Member(m) => m.span,
            Expr::Call(c) => c.span,
            Expr::Str(s) => s.span,
            Expr::Bool(b) => b.span,
            Expr::Null(span) => *span,
            Expr::Logical(l) => l.span,
            Expr::Jsx(el) => el.span,
            Expr::Opaque(o) => o.span,
        }
    }

    /// When this expression is a call on a member of `helper` (e.g.
    /// `rh.clsRoot(…)`), returns the member name and the call.
    pub fn as_helper_call<'e>(&'e self, helper: &str) -> Option<(&'e str, &'e CallExpr)> {
        let Expr::Call(call) = self else { return None };
        let Expr::Member(member) = &call.callee else {
            return None;
        };
        let Expr::Ident(object) = &member.object else {
            return None;
        };
        (object.name == helper).then_some((member.property.as_str(), &**call))
    }
}

// ---------------------------------------------------------------------------
// Cloning with a substitution hook
// ---------------------------------------------------------------------------

/// A node offered to a [clone hook](Expr::clone_with): either an expression
/// or a JSX element (elements are probed both in expression and in child
/// position).
#[derive(Debug, Clone, Copy)]
pub enum Probe<'a> {
    Expr(&'a Expr),
    Element(&'a JsxElement),
}

/// The single substitution primitive every rewrite in this crate composes
/// with: deep-clone a subtree, but if the hook returns a replacement for a
/// node, use the replacement verbatim and do not descend into it.
pub type CloneHook<'h> = dyn FnMut(Probe<'_>) -> Option<Expr> + 'h;

impl Expr {
    pub fn clone_with(&self, hook: &mut CloneHook) -> Expr {
        if let Some(replacement) = hook(Probe::Expr(self)) {
            return replacement;
        }
        match self {
            Expr::Ident(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null(_) | Expr::Opaque(_) => {
                self.clone()
            }
            Expr::Member(m) => Expr::Member(Box::new(MemberExpr {
                object: m.object.clone_with(hook),
                property: m.property.clone(),
                span: m.span,
            })),
            Expr::Call(c) => Expr::Call(Box::new(CallExpr {
                callee: c.callee.clone_with(hook),
                args: c.args.iter().map(|arg| arg.clone_with(hook)).collect(),
                span: c.span,
            })),
            Expr::Logical(l) => Expr::Logical(Box::new(LogicalExpr {
                op: l.op,
                left: l.left.clone_with(hook),
                right: l.right.clone_with(hook),
                span: l.span,
            })),
            Expr::Jsx(el) => el.clone_with(hook),
        }
    }
}

impl JsxElement {
    /// Clones this element through the hook. The result is an [`Expr`]
    /// because the hook may substitute the element with an arbitrary
    /// expression.
    pub fn clone_with(&self, hook: &mut CloneHook) -> Expr {
        if let Some(replacement) = hook(Probe::Element(self)) {
            return replacement;
        }
        Expr::Jsx(Box::new(JsxElement {
            name: self.name.clone(),
            attrs: self.attrs.iter().map(|attr| attr.clone_with(hook)).collect(),
            children: self
                .children
                .iter()
                .map(|child| child.clone_with(hook))
                .collect(),
            self_closing: self.self_closing,
            span: self.span,
        }))
    }
}

impl JsxAttr {
    pub fn clone_with(&self, hook: &mut CloneHook) -> JsxAttr {
        match self {
            JsxAttr::Named(a) => JsxAttr::Named(NamedAttr {
                name: a.name.clone(),
                value: a.value.as_ref().map(|value| value.clone_with(hook)),
                span: a.span,
            }),
            JsxAttr::Spread(s) => JsxAttr::Spread(SpreadAttr {
                expr: s.expr.clone_with(hook),
                span: s.span,
            }),
        }
    }
}

impl AttrValue {
    pub fn clone_with(&self, hook: &mut CloneHook) -> AttrValue {
        match self {
            AttrValue::Str(s) => AttrValue::Str(s.clone()),
            AttrValue::Expr(c) => AttrValue::Expr(JsxExprContainer {
                expr: c.expr.clone_with(hook),
                span: c.span,
            }),
        }
    }
}

impl JsxChild {
    pub fn clone_with(&self, hook: &mut CloneHook) -> JsxChild {
        match self {
            JsxChild::Text(t) => JsxChild::Text(t.clone()),
            JsxChild::Element(el) => match el.clone_with(hook) {
                Expr::Jsx(replacement) => JsxChild::Element(replacement),
                // the substitute is not markup, so it needs an expression
                // container to stay a legal child
                other => JsxChild::Expr(JsxExprContainer {
                    expr: other,
                    span: el.span,
                }),
            },
            JsxChild::Expr(c) => JsxChild::Expr(JsxExprContainer {
                expr: c.expr.clone_with(hook),
                span: c.span,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

impl Expr {
    /// Pre-order traversal of every expression and element in this subtree.
    pub fn walk(&self, visit: &mut dyn FnMut(Probe<'_>)) {
        visit(Probe::Expr(self));
        match self {
            Expr::Ident(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null(_) | Expr::Opaque(_) => {}
            Expr::Member(m) => m.object.walk(visit),
            Expr::Call(c) => {
                c.callee.walk(visit);
                for arg in &c.args {
                    arg.walk(visit);
                }
            }
            Expr::Logical(l) => {
                l.left.walk(visit);
                l.right.walk(visit);
            }
            Expr::Jsx(el) => el.walk(visit),
        }
    }
}

impl JsxElement {
    pub fn walk(&self, visit: &mut dyn FnMut(Probe<'_>)) {
        visit(Probe::Element(self));
        for attr in &self.attrs {
            match attr {
                JsxAttr::Named(a) => {
                    if let Some(AttrValue::Expr(c)) = &a.value {
                        c.expr.walk(visit);
                    }
                }
                JsxAttr::Spread(s) => s.expr.walk(visit),
            }
        }
        for child in &self.children {
            match child {
                JsxChild::Text(_) => {}
                JsxChild::Element(el) => el.walk(visit),
                JsxChild::Expr(c) => c.expr.walk(visit),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Comment- and span-insensitive equality
// ---------------------------------------------------------------------------

impl Expr {
    /// Structural equality ignoring spans (and therefore ignoring comments
    /// and formatting, which never make it into the tree).
    pub fn syntax_eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Ident(a), Expr::Ident(b)) => a.name == b.name,
            (Expr::Member(a), Expr::Member(b)) => {
                a.property == b.property && a.object.syntax_eq(&b.object)
            }
            (Expr::Call(a), Expr::Call(b)) => {
                a.callee.syntax_eq(&b.callee)
                    && a.args.len() == b.args.len()
                    && a.args.iter().zip(&b.args).all(|(x, y)| x.syntax_eq(y))
            }
            (Expr::Str(a), Expr::Str(b)) => a.value == b.value,
            (Expr::Bool(a), Expr::Bool(b)) => a.value == b.value,
            (Expr::Null(_), Expr::Null(_)) => true,
            (Expr::Logical(a), Expr::Logical(b)) => {
                a.op == b.op && a.left.syntax_eq(&b.left) && a.right.syntax_eq(&b.right)
            }
            (Expr::Jsx(a), Expr::Jsx(b)) => a.syntax_eq(b),
            (Expr::Opaque(a), Expr::Opaque(b)) => a.text == b.text,
            _ => false,
        }
    }
}

impl JsxElement {
    pub fn syntax_eq(&self, other: &JsxElement) -> bool {
        self.name == other.name
            && self.self_closing == other.self_closing
            && self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .zip(&other.attrs)
                .all(|(a, b)| a.syntax_eq(b))
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.syntax_eq(b))
    }
}

impl JsxAttr {
    pub fn syntax_eq(&self, other: &JsxAttr) -> bool {
        match (self, other) {
            (JsxAttr::Named(a), JsxAttr::Named(b)) => {
                a.name == b.name
                    && match (&a.value, &b.value) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.syntax_eq(y),
                        _ => false,
                    }
            }
            (JsxAttr::Spread(a), JsxAttr::Spread(b)) => a.expr.syntax_eq(&b.expr),
            _ => false,
        }
    }
}

impl AttrValue {
    pub fn syntax_eq(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Str(a), AttrValue::Str(b)) => a.value == b.value,
            (AttrValue::Expr(a), AttrValue::Expr(b)) => a.expr.syntax_eq(&b.expr),
            _ => false,
        }
    }
}

impl JsxChild {
    pub fn syntax_eq(&self, other: &JsxChild) -> bool {
        match (self, other) {
            (JsxChild::Text(a), JsxChild::Text(b)) => a.value == b.value,
            (JsxChild::Element(a), JsxChild::Element(b)) => a.syntax_eq(b),
            (JsxChild::Expr(a), JsxChild::Expr(b)) => a.expr.syntax_eq(&b.expr),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Common rewrites, all expressed through the clone hook
// ---------------------------------------------------------------------------

/// Clones `expr`, renaming every member access `helper.<property>` for which
/// `rename` returns a new property name.
pub fn rename_helper_members(
    expr: &Expr,
    helper: &str,
    rename: &dyn Fn(&str) -> Option<String>,
) -> Expr {
    expr.clone_with(&mut |probe| {
        let Probe::Expr(Expr::Member(m)) = probe else {
            return None;
        };
        let Expr::Ident(object) = &m.object else {
            return None;
        };
        if object.name != helper {
            return None;
        }
        rename(&m.property).map(|property| {
            Expr::Member(Box::new(MemberExpr {
                object: m.object.clone(),
                property,
                span: m.span,
            }))
        })
    })
}

/// Clones `expr`, substituting the element whose span equals `target` with
/// `replacement`.
pub fn replace_element_by_span(expr: &Expr, target: Span, replacement: Expr) -> Expr {
    let mut replacement = Some(replacement);
    expr.clone_with(&mut |probe| match probe {
        Probe::Element(el) if el.span == target => replacement.take(),
        _ => None,
    })
}

/// Whether the subtree contains a call `helper.method(…)`.
pub fn contains_helper_call(expr: &Expr, helper: &str, method: &str) -> bool {
    let mut found = false;
    expr.walk(&mut |probe| {
        if let Probe::Expr(e) = probe
            && let Some((name, _)) = e.as_helper_call(helper)
            && name == method
        {
            found = true;
        }
    });
    found
}
