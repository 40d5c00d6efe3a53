//! Reconciliation of the managed visibility gate (`rh.showX() && <markup>`)
//! around a merged node.

use crate::ast::{Expr, Probe, Span, contains_helper_call, rename_helper_members};
use crate::classify::PlasmicTagOrComponent;
use crate::node_merge::MergeCtx;

/// Adjusts the visibility gate of the merged wrapper expression.
///
/// `wrapper` is a clone of the edited wrapper with the merged element already
/// spliced in at `element_span` (the edited element's source position, which
/// cloning preserves).
pub(crate) fn reconcile_visibility(
    ctx: &MergeCtx,
    wrapper: Expr,
    element_span: Span,
    edited_tag: &PlasmicTagOrComponent,
    new_tag: &PlasmicTagOrComponent,
) -> Expr {
    let edited_show = format!("show{}", edited_tag.jsx.name_in_id);
    let new_show = format!("show{}", new_tag.jsx.name_in_id);
    let edited_gated = contains_helper_call(&wrapper, ctx.helper, &edited_show);
    match (edited_gated, new_tag.show_wrapped) {
        (true, true) => rename_helper_members(&wrapper, ctx.helper, &|prop| {
            (prop == edited_show).then(|| new_show.clone())
        }),
        (true, false) => {
            // the tool dropped the gate; substituting `true` keeps the
            // developer's surrounding logic intact and leaves the cleanup to
            // downstream optimization
            wrapper.clone_with(&mut |probe| {
                let Probe::Expr(expr) = probe else {
                    return None;
                };
                let (method, _) = expr.as_helper_call(ctx.helper)?;
                (method == edited_show).then(|| Expr::bool_lit(true))
            })
        }
        (false, true) => wrapper.clone_with(&mut |probe| match probe {
            Probe::Element(el) if el.span == element_span => Some(Expr::and(
                Expr::helper_call(ctx.helper, new_show.clone()),
                Expr::Jsx(Box::new(el.clone())),
            )),
            _ => None,
        }),
        (false, false) => wrapper,
    }
}
