//! Classification of a parsed markup expression into the node kinds the
//! merge distinguishes.
//!
//! Every node in the managed expression is sorted into a closed set of
//! variants ([`PlasmicNode`]) so that each merge walker can handle them
//! exhaustively: markup owned by the design tool, argument slots, managed
//! conditional-string calls, literal children, and developer-owned opaque
//! expressions.

use std::rc::Rc;

use crate::ast::{
    AttrValue, Expr, JsxAttr, JsxChild, JsxElement, JsxExprContainer, JsxText, NamedAttr, Probe,
    SpreadAttr, contains_helper_call,
};
use crate::error::MergeError;

/// The two mutually exclusive forms a managed node's class/props declaration
/// may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedShape {
    /// `className={rh.clsX()}`
    ClassAttr,
    /// `{...rh.propsX()}`
    PropsSpread,
}

/// A markup element owned by the design tool, together with the wrapper
/// expression it appeared under (for instance a `rh.showX() && <…>`
/// visibility gate).
#[derive(Debug, Clone)]
pub struct PlasmicTagOrComponent {
    /// The expression this node occupies in its parent: the element itself,
    /// or the element under one or more logical wrappers.
    pub wrapper: Expr,
    pub jsx: PlasmicJsxElement,
    pub shape: ManagedShape,
    /// Whether the wrapper contains a `rh.showX()` visibility gate.
    pub show_wrapped: bool,
}

/// The classified view of a managed markup element.
#[derive(Debug, Clone)]
pub struct PlasmicJsxElement {
    /// The stable identifier embedded in the managed helper calls
    /// (`X` in `rh.clsX`).
    pub name_in_id: String,
    /// The raw element, kept for cloning.
    pub element: JsxElement,
    pub attrs: Vec<ClassifiedAttr>,
    pub children: Vec<PlasmicNode>,
}

#[derive(Debug, Clone)]
pub enum ClassifiedAttr {
    Spread {
        raw: SpreadAttr,
        /// `Some(X)` when the spread is the managed `{...rh.propsX(…)}`.
        props_name_in_id: Option<String>,
    },
    Named {
        raw: NamedAttr,
        /// Classified expression-container value, when there is one.
        value: Option<PlasmicNode>,
    },
}

#[derive(Debug, Clone)]
pub enum PlasmicNode {
    TagOrComponent(Rc<PlasmicTagOrComponent>),
    /// A slot passed as a named argument, containing managed markup.
    Arg(PlasmicArg),
    /// A tool-managed call yielding a conditional string (e.g. a dynamic
    /// child string).
    CondStrCall { raw: Expr },
    /// A string literal in an expression container.
    StringLit { value: String, raw: Expr },
    /// A raw text child.
    Text { raw: JsxText },
    /// A developer-owned expression the merge must not inspect.
    Opaque { raw: Expr },
}

#[derive(Debug, Clone)]
pub struct PlasmicArg {
    pub arg_name: String,
    /// The managed markup contained in the slot, outermost first.
    pub tags: Vec<Rc<PlasmicTagOrComponent>>,
    pub raw: Expr,
}

impl PlasmicNode {
    /// The raw expression this node re-emits as, when it has one (text
    /// children do not).
    pub fn raw_expr(&self) -> Option<&Expr> {
        match self {
            PlasmicNode::TagOrComponent(tag) => Some(&tag.wrapper),
            PlasmicNode::Arg(arg) => Some(&arg.raw),
            PlasmicNode::CondStrCall { raw }
            | PlasmicNode::StringLit { raw, .. }
            | PlasmicNode::Opaque { raw } => Some(raw),
            PlasmicNode::Text { .. } => None,
        }
    }
}

/// Re-emits an expression in JSX child position.
pub(crate) fn expr_into_child(expr: Expr) -> JsxChild {
    let span = expr.span();
    match expr {
        Expr::Jsx(el) => JsxChild::Element(el),
        other => JsxChild::Expr(JsxExprContainer { expr: other, span }),
    }
}

/// The helper-object name is the same across all versions of a project; it
/// is discovered from the first managed call in the markup expression.
pub(crate) fn discover_helper(expr: &Expr) -> Option<String> {
    let mut helper = None;
    expr.walk(&mut |probe| {
        if helper.is_some() {
            return;
        }
        let Probe::Expr(Expr::Call(call)) = probe else {
            return;
        };
        let Expr::Member(member) = &call.callee else {
            return;
        };
        let Expr::Ident(object) = &member.object else {
            return;
        };
        if managed_method_name_in_id(&member.property).is_some() {
            helper = Some(object.name.clone());
        }
    });
    helper
}

fn managed_method_name_in_id(property: &str) -> Option<&str> {
    for prefix in ["cls", "props", "show"] {
        if let Some(rest) = property.strip_prefix(prefix)
            && !rest.is_empty()
        {
            return Some(rest);
        }
    }
    None
}

/// `X` from a managed `className={rh.clsX(…)}` attribute.
pub(crate) fn class_attr_name_in_id(attr: &NamedAttr, helper: &str) -> Option<String> {
    if attr.name != "className" {
        return None;
    }
    let expr = attr.value.as_ref()?.as_expr()?;
    let (method, _) = expr.as_helper_call(helper)?;
    let rest = method.strip_prefix("cls")?;
    (!rest.is_empty()).then(|| rest.to_owned())
}

/// `X` from a managed `{...rh.propsX(…)}` spread.
pub(crate) fn props_spread_name_in_id(spread: &SpreadAttr, helper: &str) -> Option<String> {
    let (method, _) = spread.expr.as_helper_call(helper)?;
    let rest = method.strip_prefix("props")?;
    (!rest.is_empty()).then(|| rest.to_owned())
}

pub(crate) struct Classifier<'a> {
    helper: &'a str,
}

pub(crate) fn classify_root(expr: &Expr, helper: &str) -> Result<PlasmicNode, MergeError> {
    Classifier { helper }.classify_expr_slot(expr)
}

impl Classifier<'_> {
    fn classify_expr_slot(&self, expr: &Expr) -> Result<PlasmicNode, MergeError> {
        if let Some(el) = self.managed_element_in(expr)? {
            let tag = self.classify_tag(expr, el)?;
            return Ok(PlasmicNode::TagOrComponent(Rc::new(tag)));
        }
        if expr.as_helper_call(self.helper).is_some() {
            return Ok(PlasmicNode::CondStrCall { raw: expr.clone() });
        }
        if let Expr::Str(s) = expr {
            return Ok(PlasmicNode::StringLit {
                value: s.value.clone(),
                raw: expr.clone(),
            });
        }
        Ok(PlasmicNode::Opaque { raw: expr.clone() })
    }

    /// The managed element carried by this expression, peeling logical
    /// wrappers (visibility gates and developer conditions keep the markup
    /// as their right operand).
    fn managed_element_in<'e>(&self, expr: &'e Expr) -> Result<Option<&'e JsxElement>, MergeError> {
        match expr {
            Expr::Jsx(el) => Ok(self.managed_name_in_id(el)?.map(|_| &**el)),
            Expr::Logical(l) => self.managed_element_in(&l.right),
            _ => Ok(None),
        }
    }

    /// The `nameInId` and shape of a managed element, or `None` for
    /// developer markup. Carrying both shapes at once violates the generator
    /// contract.
    fn managed_name_in_id(
        &self,
        el: &JsxElement,
    ) -> Result<Option<(String, ManagedShape)>, MergeError> {
        let mut class_name = None;
        let mut props_name = None;
        for attr in &el.attrs {
            match attr {
                JsxAttr::Named(a) if a.name == "className" => {
                    if let Some(name) = self.class_call_name_in_id(a) {
                        class_name = Some(name);
                    }
                }
                JsxAttr::Spread(s) => {
                    if let Some(name) = self.props_spread_name_in_id(s) {
                        props_name = Some(name);
                    }
                }
                JsxAttr::Named(_) => {}
            }
        }
        match (class_name, props_name) {
            (Some(_), Some(_)) => Err(MergeError::InvariantViolation(format!(
                "markup node <{}> carries both a managed class attribute and a managed props spread",
                el.name
            ))),
            (Some(name), None) => Ok(Some((name, ManagedShape::ClassAttr))),
            (None, Some(name)) => Ok(Some((name, ManagedShape::PropsSpread))),
            (None, None) => Ok(None),
        }
    }

    fn class_call_name_in_id(&self, attr: &NamedAttr) -> Option<String> {
        class_attr_name_in_id(attr, self.helper)
    }

    fn props_spread_name_in_id(&self, spread: &SpreadAttr) -> Option<String> {
        props_spread_name_in_id(spread, self.helper)
    }

    fn classify_tag(
        &self,
        wrapper: &Expr,
        el: &JsxElement,
    ) -> Result<PlasmicTagOrComponent, MergeError> {
        let (name_in_id, shape) = self
            .managed_name_in_id(el)?
            .expect("classify_tag is only called on managed elements");
        let show_wrapped = contains_helper_call(wrapper, self.helper, &format!("show{name_in_id}"));
        let attrs = el
            .attrs
            .iter()
            .map(|attr| self.classify_attr(attr))
            .collect::<Result<Vec<_>, _>>()?;
        let children = el
            .children
            .iter()
            .map(|child| self.classify_child(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PlasmicTagOrComponent {
            wrapper: wrapper.clone(),
            jsx: PlasmicJsxElement {
                name_in_id,
                element: el.clone(),
                attrs,
                children,
            },
            shape,
            show_wrapped,
        })
    }

    fn classify_attr(&self, attr: &JsxAttr) -> Result<ClassifiedAttr, MergeError> {
        match attr {
            JsxAttr::Spread(s) => Ok(ClassifiedAttr::Spread {
                raw: s.clone(),
                props_name_in_id: self.props_spread_name_in_id(s),
            }),
            JsxAttr::Named(a) => {
                let value = match &a.value {
                    None => None,
                    Some(AttrValue::Str(s)) => Some(PlasmicNode::StringLit {
                        value: s.value.clone(),
                        raw: Expr::Str(s.clone()),
                    }),
                    Some(AttrValue::Expr(c)) => {
                        let tags = self.collect_managed_tags(&c.expr)?;
                        if !tags.is_empty() {
                            Some(PlasmicNode::Arg(PlasmicArg {
                                arg_name: a.name.clone(),
                                tags,
                                raw: c.expr.clone(),
                            }))
                        } else {
                            Some(self.classify_expr_slot(&c.expr)?)
                        }
                    }
                };
                Ok(ClassifiedAttr::Named {
                    raw: a.clone(),
                    value,
                })
            }
        }
    }

    fn classify_child(&self, child: &JsxChild) -> Result<PlasmicNode, MergeError> {
        match child {
            JsxChild::Text(t) => Ok(PlasmicNode::Text { raw: t.clone() }),
            JsxChild::Element(el) => self.classify_expr_slot(&Expr::Jsx(el.clone())),
            JsxChild::Expr(c) => self.classify_expr_slot(&c.expr),
        }
    }

    /// Collects the outermost managed markup nodes inside an argument slot,
    /// without descending into them (their own contents are classified
    /// recursively as part of the tag).
    fn collect_managed_tags(
        &self,
        expr: &Expr,
    ) -> Result<Vec<Rc<PlasmicTagOrComponent>>, MergeError> {
        let mut tags = Vec::new();
        self.collect_in_expr(expr, &mut tags)?;
        Ok(tags)
    }

    fn collect_in_expr(
        &self,
        expr: &Expr,
        out: &mut Vec<Rc<PlasmicTagOrComponent>>,
    ) -> Result<(), MergeError> {
        if let Some(el) = self.managed_element_in(expr)? {
            out.push(Rc::new(self.classify_tag(expr, el)?));
            return Ok(());
        }
        match expr {
            Expr::Jsx(el) => {
                for attr in &el.attrs {
                    match attr {
                        JsxAttr::Named(a) => {
                            if let Some(AttrValue::Expr(c)) = &a.value {
                                self.collect_in_expr(&c.expr, out)?;
                            }
                        }
                        JsxAttr::Spread(s) => self.collect_in_expr(&s.expr, out)?,
                    }
                }
                for child in &el.children {
                    match child {
                        JsxChild::Text(_) => {}
                        JsxChild::Element(child_el) => {
                            self.collect_in_expr(&Expr::Jsx(child_el.clone()), out)?;
                        }
                        JsxChild::Expr(c) => self.collect_in_expr(&c.expr, out)?,
                    }
                }
            }
            Expr::Call(c) => {
                self.collect_in_expr(&c.callee, out)?;
                for arg in &c.args {
                    self.collect_in_expr(arg, out)?;
                }
            }
            Expr::Logical(l) => {
                self.collect_in_expr(&l.left, out)?;
                self.collect_in_expr(&l.right, out)?;
            }
            Expr::Member(m) => self.collect_in_expr(&m.object, out)?,
            _ => {}
        }
        Ok(())
    }
}

/// Collects every tag in a classified tree, outermost first, for index
/// building.
pub(crate) fn collect_tags(node: &PlasmicNode, out: &mut Vec<Rc<PlasmicTagOrComponent>>) {
    match node {
        PlasmicNode::TagOrComponent(tag) => visit_tag(tag, out),
        PlasmicNode::Arg(arg) => {
            for tag in &arg.tags {
                visit_tag(tag, out);
            }
        }
        PlasmicNode::CondStrCall { .. }
        | PlasmicNode::StringLit { .. }
        | PlasmicNode::Text { .. }
        | PlasmicNode::Opaque { .. } => {}
    }
}

fn visit_tag(tag: &Rc<PlasmicTagOrComponent>, out: &mut Vec<Rc<PlasmicTagOrComponent>>) {
    out.push(Rc::clone(tag));
    for attr in &tag.jsx.attrs {
        if let ClassifiedAttr::Named {
            value: Some(value), ..
        } = attr
        {
            collect_tags(value, out);
        }
    }
    for child in &tag.jsx.children {
        collect_tags(child, out);
    }
}
