//! Reconciliation of the attribute list of a paired markup node across the
//! three versions.
//!
//! The output order is: attributes that only the new version contributes
//! (including one side of deliberate conflicts), then the edited attributes
//! in their original order, rewritten as needed. Duplicate attribute names
//! are acceptable output: a conflict both sides touched is surfaced to the
//! toolchain that compiles the merged file, not resolved interactively.

use log::{debug, warn};

use crate::ast::{
    AttrValue, Expr, JsxAttr, JsxExprContainer, NamedAttr, SpreadAttr, Span, rename_helper_members,
};
use crate::classify::{
    ClassifiedAttr, ManagedShape, PlasmicNode, PlasmicTagOrComponent, class_attr_name_in_id,
};
use crate::node_merge::{MergeCtx, serialize_node};

/// Outcome of the conflict table for one named attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrResolution {
    EmitEdited,
    EmitNew,
    /// Emit both sides and let the compile error surface the conflict.
    EmitBoth,
}

/// The conflict table for a named attribute present in both the new and the
/// edited version.
pub(crate) fn resolve_attr_conflict(
    name: &str,
    base: Option<&NamedAttr>,
    edited: &NamedAttr,
    new: &NamedAttr,
) -> AttrResolution {
    if attr_value_eq(&edited.value, &new.value) {
        return AttrResolution::EmitEdited;
    }
    let Some(base) = base else {
        return AttrResolution::EmitBoth;
    };
    if attr_value_eq(&base.value, &edited.value) {
        // developer left it untouched, tool changed it
        return AttrResolution::EmitNew;
    }
    if name.starts_with("on") || attr_value_eq(&base.value, &new.value) {
        // event handlers keep the developer's wiring (identifier renames are
        // handled separately); same for values the tool did not change
        return AttrResolution::EmitEdited;
    }
    AttrResolution::EmitBoth
}

fn attr_value_eq(a: &Option<AttrValue>, b: &Option<AttrValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.syntax_eq(b),
        _ => false,
    }
}

fn named_attr<'t>(tag: &'t PlasmicTagOrComponent, name: &str) -> Option<&'t NamedAttr> {
    tag.jsx.element.attrs.iter().find_map(|attr| match attr {
        JsxAttr::Named(a) if a.name == name => Some(a),
        _ => None,
    })
}

/// Merges the attributes of a node present in both the new and the edited
/// version (`base_tag` is absent for nodes the tool introduced after the
/// base revision).
pub(crate) fn merge_attrs(
    ctx: &MergeCtx,
    new_tag: &PlasmicTagOrComponent,
    edited_tag: &PlasmicTagOrComponent,
    base_tag: Option<&PlasmicTagOrComponent>,
) -> Vec<JsxAttr> {
    let mut out = Vec::new();
    let new_name = &new_tag.jsx.name_in_id;
    let edited_name = &edited_tag.jsx.name_in_id;

    // 1. attributes the new version contributes
    for attr in &new_tag.jsx.attrs {
        let ClassifiedAttr::Named { raw: new_attr, value } = attr else {
            continue;
        };
        if class_attr_name_in_id(new_attr, ctx.helper).is_some() {
            // the managed class attribute is reconciled by the shape logic
            // below
            continue;
        }
        match named_attr(edited_tag, &new_attr.name) {
            Some(edited_attr) => {
                let base_attr = base_tag.and_then(|b| named_attr(b, &new_attr.name));
                match resolve_attr_conflict(&new_attr.name, base_attr, edited_attr, new_attr) {
                    AttrResolution::EmitNew => out.push(JsxAttr::Named(new_attr.clone())),
                    AttrResolution::EmitBoth => {
                        warn!(
                            "attribute {} of {new_name} changed on both sides, emitting both",
                            new_attr.name
                        );
                        out.push(JsxAttr::Named(new_attr.clone()));
                    }
                    AttrResolution::EmitEdited => {}
                }
            }
            None if base_tag.is_some_and(|b| named_attr(b, &new_attr.name).is_some()) => {
                debug!(
                    "attribute {} of {new_name} was deleted by the developer, dropping it",
                    new_attr.name
                );
            }
            None => out.push(emit_new_attr(ctx, new_attr, value.as_ref())),
        }
    }

    // 2. the edited attributes, in order
    for attr in &edited_tag.jsx.attrs {
        match attr {
            ClassifiedAttr::Spread { raw, props_name_in_id } => {
                match props_name_in_id.as_deref() {
                    Some(name) if name == edited_name => {
                        emit_managed_spread(ctx, &mut out, raw, new_tag, edited_name, new_name);
                    }
                    // a developer spread (or a stray managed spread of some
                    // other node) is preserved as-is
                    _ => out.push(JsxAttr::Spread(raw.clone())),
                }
            }
            ClassifiedAttr::Named { raw, .. } => {
                if class_attr_name_in_id(raw, ctx.helper).as_deref() == Some(edited_name) {
                    emit_managed_class(ctx, &mut out, raw, new_tag, edited_name, new_name);
                } else {
                    emit_attr_in_edited_node(
                        ctx, &mut out, raw, new_tag, base_tag, edited_name, new_name,
                    );
                }
            }
        }
    }

    out
}

/// A named attribute only the new version has: recursively serialize slot
/// contents, emit anything else verbatim.
fn emit_new_attr(
    ctx: &MergeCtx,
    new_attr: &NamedAttr,
    value: Option<&PlasmicNode>,
) -> JsxAttr {
    match value {
        Some(node @ (PlasmicNode::Arg(_) | PlasmicNode::TagOrComponent(_))) => {
            let expr = serialize_node(ctx, node).unwrap_or_else(Expr::null);
            JsxAttr::Named(NamedAttr {
                name: new_attr.name.clone(),
                value: Some(AttrValue::Expr(JsxExprContainer {
                    expr,
                    span: Span::SYNTHETIC,
                })),
                span: new_attr.span,
            })
        }
        _ => JsxAttr::Named(new_attr.clone()),
    }
}

/// The edited node uses the managed props spread (`{...rh.propsX(…)}`).
fn emit_managed_spread(
    ctx: &MergeCtx,
    out: &mut Vec<JsxAttr>,
    spread: &SpreadAttr,
    new_tag: &PlasmicTagOrComponent,
    edited_name: &str,
    new_name: &str,
) {
    match new_tag.shape {
        ManagedShape::PropsSpread => {
            // keep the spread (and any developer-injected arguments),
            // renaming the helper member to the new stable name
            let from = format!("props{edited_name}");
            let to = format!("props{new_name}");
            out.push(JsxAttr::Spread(SpreadAttr {
                expr: rename_helper_members(&spread.expr, ctx.helper, &|prop| {
                    (prop == from).then(|| to.clone())
                }),
                span: spread.span,
            }));
        }
        ManagedShape::ClassAttr => {
            out.push(managed_class_attr(ctx.helper, new_name));
            let dev_args = spread
                .expr
                .as_helper_call(ctx.helper)
                .is_some_and(|(_, call)| !call.args.is_empty());
            if dev_args {
                // the developer injected arguments that the class shape
                // cannot carry; keep the old spread so the compile error
                // forces a human to look at it
                warn!(
                    "node {new_name} was downgraded to the class shape but its spread carries developer arguments; keeping both"
                );
                out.push(JsxAttr::Spread(spread.clone()));
            }
        }
    }
}

/// The edited node uses the managed class attribute (`className={rh.clsX()}`).
fn emit_managed_class(
    ctx: &MergeCtx,
    out: &mut Vec<JsxAttr>,
    attr: &NamedAttr,
    new_tag: &PlasmicTagOrComponent,
    edited_name: &str,
    new_name: &str,
) {
    match new_tag.shape {
        ManagedShape::PropsSpread => out.push(JsxAttr::Spread(SpreadAttr {
            expr: Expr::helper_call(ctx.helper, format!("props{new_name}")),
            span: Span::SYNTHETIC,
        })),
        ManagedShape::ClassAttr => {
            // keep the edited value (the developer may have tweaked the
            // call), renaming the helper member
            let from = format!("cls{edited_name}");
            let to = format!("cls{new_name}");
            out.push(JsxAttr::Named(NamedAttr {
                name: attr.name.clone(),
                value: attr.value.as_ref().map(|value| {
                    rename_attr_value(value, ctx.helper, &|prop| {
                        (prop == from).then(|| to.clone())
                    })
                }),
                span: attr.span,
            }));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_attr_in_edited_node(
    ctx: &MergeCtx,
    out: &mut Vec<JsxAttr>,
    attr: &NamedAttr,
    new_tag: &PlasmicTagOrComponent,
    base_tag: Option<&PlasmicTagOrComponent>,
    edited_name: &str,
    new_name: &str,
) {
    let base_attr = base_tag.and_then(|b| named_attr(b, &attr.name));
    let keep = match named_attr(new_tag, &attr.name) {
        Some(new_attr) => {
            match resolve_attr_conflict(&attr.name, base_attr, attr, new_attr) {
                AttrResolution::EmitEdited | AttrResolution::EmitBoth => true,
                AttrResolution::EmitNew => {
                    debug!(
                        "attribute {} of {new_name} follows the new version",
                        attr.name
                    );
                    false
                }
            }
        }
        None => {
            if base_attr.is_none() {
                true // developer-added
            } else {
                debug!(
                    "attribute {} of {new_name} was deleted by the tool, dropping it",
                    attr.name
                );
                false
            }
        }
    };
    if !keep {
        return;
    }
    let mut emitted = attr.clone();
    if attr.name.starts_with("on") && edited_name != new_name {
        // event handler references follow the stable-name rename:
        // rh.on<Old><Event> becomes rh.on<New><Event>
        let from = format!("on{edited_name}");
        let to = format!("on{new_name}");
        emitted.value = attr.value.as_ref().map(|value| {
            rename_attr_value(value, ctx.helper, &|prop| {
                prop.strip_prefix(&from).map(|rest| format!("{to}{rest}"))
            })
        });
    }
    out.push(JsxAttr::Named(emitted));
}

fn managed_class_attr(helper: &str, name_in_id: &str) -> JsxAttr {
    JsxAttr::Named(NamedAttr {
        name: "className".to_owned(),
        value: Some(AttrValue::Expr(JsxExprContainer {
            expr: Expr::helper_call(helper, format!("cls{name_in_id}")),
            span: Span::SYNTHETIC,
        })),
        span: Span::SYNTHETIC,
    })
}

fn rename_attr_value(
    value: &AttrValue,
    helper: &str,
    rename: &dyn Fn(&str) -> Option<String>,
) -> AttrValue {
    match value {
        AttrValue::Str(_) => value.clone(),
        AttrValue::Expr(c) => AttrValue::Expr(JsxExprContainer {
            expr: rename_helper_members(&c.expr, helper, rename),
            span: c.span,
        }),
    }
}
