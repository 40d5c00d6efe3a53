//! Reconciliation of the children list of a paired markup node.
//!
//! The new version's children are the backbone, copied positionally, so
//! tool-side insertions and deletions hold by default. The edited children
//! are then replayed over that backbone: literal children the tool deleted
//! stay deleted, developer-introduced children are re-inserted anchored to
//! their original predecessor, and markup children flow through the
//! recursive node serialization of their new-version counterpart.

use log::debug;

use crate::ast::JsxChild;
use crate::classify::{PlasmicJsxElement, PlasmicNode, expr_into_child};
use crate::matching::{NodeMatch, find_match};
use crate::node_merge::{MergeCtx, serialize_node};

struct Entry<'a> {
    node: &'a PlasmicNode,
    from_edited: bool,
}

pub(crate) fn merge_children(
    ctx: &MergeCtx,
    new_jsx: &PlasmicJsxElement,
    edited_jsx: &PlasmicJsxElement,
    base_jsx: Option<&PlasmicJsxElement>,
) -> Vec<JsxChild> {
    // candidates in the merged list come from either remaining version, so
    // resolve uuids through whichever side knows the name
    let any_uuid = |name: &str| {
        ctx.new
            .uuid_of(name)
            .or_else(|| ctx.edited.uuid_of(name))
    };
    let equiv = |candidate: &str, probe: &str| {
        candidate == probe
            || matches!(
                (any_uuid(candidate), ctx.edited.uuid_of(probe)),
                (Some(a), Some(b)) if a == b
            )
    };
    let base_equiv_fn = ctx.base.equiv_with(ctx.edited);
    let base_equiv = |candidate: &str, probe: &str| base_equiv_fn(candidate, probe);

    let mut merged: Vec<Entry> = new_jsx
        .children
        .iter()
        .map(|node| Entry {
            node,
            from_edited: false,
        })
        .collect();
    let mut cursor = 0usize;

    for (i, child) in edited_jsx.children.iter().enumerate() {
        let prev = if i > 0 {
            Some(&edited_jsx.children[i - 1])
        } else {
            None
        };
        match child {
            PlasmicNode::Text { .. } | PlasmicNode::StringLit { .. } => {
                if let NodeMatch::Perfect(at) =
                    find_match(&merged, cursor, |e| e.node, &equiv, child)
                {
                    // already present in the backbone
                    cursor = at + 1;
                } else if base_jsx.is_some_and(|base| {
                    matches!(
                        find_match(&base.children, 0, |n| n, &base_equiv, child),
                        NodeMatch::Perfect(_)
                    )
                }) {
                    debug!("literal child was deleted by the tool, honoring the deletion");
                } else {
                    insert_anchored(child, prev, &mut merged, &mut cursor, &equiv);
                }
            }
            PlasmicNode::Opaque { .. } => {
                insert_anchored(child, prev, &mut merged, &mut cursor, &equiv);
            }
            // markup, slots and managed calls flow through the recursive
            // serialization of their new-version counterpart
            PlasmicNode::TagOrComponent(_)
            | PlasmicNode::Arg(_)
            | PlasmicNode::CondStrCall { .. } => {}
        }
    }

    merged
        .iter()
        .filter_map(|entry| emit_child(ctx, entry))
        .collect()
}

/// Inserts a developer child next to the merged position of its original
/// predecessor.
fn insert_anchored<'a>(
    node: &'a PlasmicNode,
    prev: Option<&PlasmicNode>,
    merged: &mut Vec<Entry<'a>>,
    cursor: &mut usize,
    equiv: &dyn Fn(&str, &str) -> bool,
) {
    let entry = Entry {
        node,
        from_edited: true,
    };
    let Some(prev) = prev else {
        merged.insert(0, entry);
        *cursor = 1;
        return;
    };
    match find_match(merged, *cursor, |e| e.node, equiv, prev) {
        NodeMatch::Perfect(at) | NodeMatch::SameVariant(at) => {
            merged.insert(at + 1, entry);
            *cursor = at + 2;
        }
        NodeMatch::None => {
            merged.insert(*cursor, entry);
            *cursor += 1;
        }
    }
}

fn emit_child(ctx: &MergeCtx, entry: &Entry) -> Option<JsxChild> {
    if entry.from_edited {
        return Some(match entry.node {
            PlasmicNode::Text { raw } => JsxChild::Text(raw.clone()),
            node => expr_into_child(
                node.raw_expr()
                    .expect("non-text nodes carry a raw expression")
                    .clone(),
            ),
        });
    }
    match entry.node {
        PlasmicNode::Text { raw } => Some(JsxChild::Text(raw.clone())),
        PlasmicNode::Opaque { raw } => Some(expr_into_child(raw.clone())),
        node => serialize_node(ctx, node).map(expr_into_child),
    }
}
