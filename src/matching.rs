//! Pairing of classified nodes across sibling lists.

use crate::classify::PlasmicNode;

/// Result of probing a sibling list for a counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeMatch {
    /// Same variant and same identity (value, argument name, or equivalent
    /// stable name).
    Perfect(usize),
    /// First node of the same variant, with a different identity.
    SameVariant(usize),
    None,
}

/// Finds the counterpart of `probe` in `nodes`, scanning from `start`.
///
/// `view` projects a list item to its classified node (the children merger
/// keeps bookkeeping alongside each entry). `equiv` decides whether two
/// stable names refer to the same entity; callers pass the uuid lookup pair
/// for the two versions involved.
pub(crate) fn find_match<T>(
    nodes: &[T],
    start: usize,
    view: impl Fn(&T) -> &PlasmicNode,
    equiv: &dyn Fn(&str, &str) -> bool,
    probe: &PlasmicNode,
) -> NodeMatch {
    let mut same_variant = None;
    for (i, item) in nodes.iter().enumerate().skip(start) {
        let node = view(item);
        let perfect = match (node, probe) {
            (PlasmicNode::Text { raw: a }, PlasmicNode::Text { raw: b }) => a.value == b.value,
            (PlasmicNode::StringLit { value: a, .. }, PlasmicNode::StringLit { value: b, .. }) => {
                a == b
            }
            (PlasmicNode::Arg(a), PlasmicNode::Arg(b)) => a.arg_name == b.arg_name,
            // at most one conditional-string call is expected per sibling
            // list, so the first one is its counterpart
            (PlasmicNode::CondStrCall { .. }, PlasmicNode::CondStrCall { .. }) => true,
            (PlasmicNode::TagOrComponent(a), PlasmicNode::TagOrComponent(b)) => {
                equiv(&a.jsx.name_in_id, &b.jsx.name_in_id)
            }
            (PlasmicNode::Opaque { raw: a }, PlasmicNode::Opaque { raw: b }) => a.syntax_eq(b),
            _ => continue,
        };
        if perfect {
            return NodeMatch::Perfect(i);
        }
        if same_variant.is_none() {
            same_variant = Some(i);
        }
    }
    match same_variant {
        Some(i) => NodeMatch::SameVariant(i),
        None => NodeMatch::None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::classify::{PlasmicNode, classify_root};
    use crate::parser::ExprParser;

    fn children(source: &str) -> Vec<PlasmicNode> {
        let expr = ExprParser::new(source).parse_expr(&[]).unwrap();
        let PlasmicNode::TagOrComponent(tag) = classify_root(&expr, "rh").unwrap() else {
            panic!("expected managed markup");
        };
        tag.jsx.children.clone()
    }

    fn name_eq(a: &str, b: &str) -> bool {
        a == b
    }

    #[rstest]
    #[case("world", NodeMatch::Perfect(2))]
    #[case("mars", NodeMatch::SameVariant(0))]
    fn text_matching(#[case] probe_text: &str, #[case] expected: NodeMatch) {
        let nodes = children(r#"<div className={rh.clsRoot()}>hello<br/>world</div>"#);
        let probe = children(&format!(
            r#"<div className={{rh.clsRoot()}}>{probe_text}</div>"#
        ))
        .remove(0);
        assert_eq!(
            find_match(&nodes, 0, |n| n, &|a, b| name_eq(a, b), &probe),
            expected
        );
    }

    #[test]
    fn matching_respects_the_start_offset() {
        let nodes = children(r#"<div className={rh.clsRoot()}>a<br/>a</div>"#);
        let probe = nodes[0].clone();
        assert_eq!(
            find_match(&nodes, 1, |n| n, &|a, b| name_eq(a, b), &probe),
            NodeMatch::Perfect(2)
        );
    }

    #[test]
    fn tags_match_through_equiv() {
        let nodes = children(
            r#"<div className={rh.clsRoot()}><a className={rh.clsLink2()} /></div>"#,
        );
        let probe = children(
            r#"<div className={rh.clsRoot()}><a className={rh.clsLink()} /></div>"#,
        )
        .remove(0);
        let renamed = |a: &str, b: &str| (a == "Link2" && b == "Link") || a == b;
        assert_eq!(
            find_match(&nodes, 0, |n| n, &renamed, &probe),
            NodeMatch::Perfect(0)
        );
        assert_eq!(
            find_match(&nodes, 0, |n| n, &|a, b| name_eq(a, b), &probe),
            NodeMatch::SameVariant(0)
        );
    }

    #[test]
    fn no_match_across_variants() {
        let nodes = children(r#"<div className={rh.clsRoot()}>{rh.childStrRoot()}</div>"#);
        let probe = children(r#"<div className={rh.clsRoot()}>hello</div>"#).remove(0);
        assert_eq!(
            find_match(&nodes, 0, |n| n, &|a, b| name_eq(a, b), &probe),
            NodeMatch::None
        );
    }
}
