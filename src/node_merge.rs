//! Per-node serialization: the orchestrator that walks the new version's
//! classified tree and decides, node by node, whether to emit the new
//! version verbatim, the edited version (transformed), a merged hybrid, or
//! nothing at all.

use log::debug;
use rustc_hash::FxHashMap;

use crate::ast::{Expr, Probe, Span, replace_element_by_span};
use crate::attr_merge::merge_attrs;
use crate::child_merge::merge_children;
use crate::classify::{PlasmicArg, PlasmicNode, PlasmicTagOrComponent};
use crate::code_version::CodeVersion;
use crate::visibility::reconcile_visibility;

/// The three read-only versions a merge works over, plus the helper-object
/// name shared by all of them.
pub(crate) struct MergeCtx<'a> {
    pub new: &'a CodeVersion,
    pub edited: &'a CodeVersion,
    pub base: &'a CodeVersion,
    pub helper: &'a str,
}

/// Merges the whole markup expression, starting from the new version's root.
pub(crate) fn merge_markup(ctx: &MergeCtx) -> Expr {
    serialize_node(ctx, ctx.new.root()).unwrap_or_else(Expr::null)
}

/// Serializes one classified node of the new version into the merged output.
/// `None` means the node was deleted by the developer.
pub(crate) fn serialize_node(ctx: &MergeCtx, node: &PlasmicNode) -> Option<Expr> {
    match node {
        PlasmicNode::Opaque { raw }
        | PlasmicNode::StringLit { raw, .. }
        | PlasmicNode::CondStrCall { raw } => Some(raw.clone()),
        PlasmicNode::Text { .. } => {
            unreachable!("text nodes are emitted as children, never as expressions")
        }
        PlasmicNode::Arg(arg) => Some(serialize_arg(ctx, arg)),
        PlasmicNode::TagOrComponent(tag) => serialize_tag(ctx, tag),
    }
}

/// Clones the argument slot, substituting each contained markup node with
/// its serialization. Deleted nodes become a null literal so the slot keeps
/// its arity.
fn serialize_arg(ctx: &MergeCtx, arg: &PlasmicArg) -> Expr {
    let substitutions: FxHashMap<Span, Option<Expr>> = arg
        .tags
        .iter()
        .map(|tag| (tag.wrapper.span(), serialize_tag(ctx, tag)))
        .collect();
    arg.raw.clone_with(&mut |probe| {
        // contained markup may sit in expression position (under a gate) or
        // directly in child position, so match the wrapper span either way
        let span = match probe {
            Probe::Expr(expr) => expr.span(),
            Probe::Element(el) => el.span,
        };
        substitutions
            .get(&span)
            .map(|serialized| serialized.clone().unwrap_or_else(Expr::null))
    })
}

pub(crate) fn serialize_tag(ctx: &MergeCtx, new_tag: &PlasmicTagOrComponent) -> Option<Expr> {
    let name = &new_tag.jsx.name_in_id;
    let uuid = ctx.new.uuid_of(name);
    let edited_tag = ctx.edited.find_tag(name, uuid);
    let base_tag = ctx.base.find_tag(name, uuid);
    match (edited_tag, base_tag) {
        (None, Some(_)) => {
            debug!("node {name} was deleted by the developer, dropping it");
            None
        }
        // brand new node from the tool
        (None, None) => Some(new_tag.wrapper.clone()),
        (Some(edited_tag), base_tag) => {
            let attrs = merge_attrs(ctx, new_tag, edited_tag, base_tag.map(|t| &**t));
            let children = merge_children(
                ctx,
                &new_tag.jsx,
                &edited_tag.jsx,
                base_tag.map(|t| &t.jsx),
            );
            let mut element = edited_tag.jsx.element.clone();
            element.attrs = attrs;
            if element.self_closing && !children.is_empty() {
                element.self_closing = false;
            }
            element.children = children;
            let element_span = element.span;
            let spliced = replace_element_by_span(
                &edited_tag.wrapper,
                element_span,
                Expr::Jsx(Box::new(element)),
            );
            Some(reconcile_visibility(
                ctx, spliced, element_span, edited_tag, new_tag,
            ))
        }
    }
}
