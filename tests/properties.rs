//! Invariants of the merge, checked over complete files.

mod common;

use common::*;
use plasmic_merge::parser;
use plasmic_merge::printer::print_module;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(r#"<div className={rh.clsRoot()}>hello</div>"#)]
#[case(
    r#"rh.showRoot() && <div {...rh.propsRoot()}>{rh.childStrRoot()}{"lit"}text<span className={rh.clsInner()} /></div>"#
)]
#[case(
    r#"<Card className={rh.clsCard()} content={<div className={rh.clsBody()}>b</div>}>x</Card>"#
)]
fn merging_a_version_with_itself_is_the_identity(#[case] markup: &str) {
    let uuids = &[
        ("Root", "u1"),
        ("Inner", "u2"),
        ("Card", "u3"),
        ("Body", "u4"),
    ];
    let merged = merge_markup(markup, markup, markup, uuids, uuids);
    assert_eq!(merged, normalize_markup(markup));

    // the whole file round-trips, not just the markup expression
    let file = simple_file(markup, BASE_REVISION);
    let out = run_merge(&file, &file, &file, uuids, uuids).unwrap();
    assert_eq!(
        out[UUID],
        print_module(&parser::parse_module(&file).unwrap())
    );
}

#[test]
fn untouched_tool_side_preserves_every_developer_edit() {
    // new ≡ base: the merge must reproduce the edited markup exactly,
    // including the developer's own visibility logic, attributes and
    // children
    let generated = r#"<div className={rh.clsRoot()}><span className={rh.clsLabel()}>text</span></div>"#;
    let edited = r#"open && <div className={rh.clsRoot()} id="x" onClick={handler}><span className={rh.clsLabel()}>text</span>{extra}<br /></div>"#;
    let uuids = &[("Root", "u1"), ("Label", "u2")];
    let merged = merge_markup(generated, edited, generated, uuids, uuids);
    assert_eq!(merged, normalize_markup(edited));
}

#[test]
fn untouched_developer_side_follows_the_tool() {
    // edited ≡ base: structural tool changes (children, gates, deletions)
    // come through verbatim
    let old = r#"<div className={rh.clsRoot()}><span className={rh.clsA()}>a</span>old</div>"#;
    let new = r#"rh.showRoot() && <div className={rh.clsRoot()}><b className={rh.clsB()}>b</b>fresh</div>"#;
    let uuids_old = &[("Root", "u1"), ("A", "u2")];
    let uuids_new = &[("Root", "u1"), ("B", "u3")];
    let merged = merge_markup(new, old, old, uuids_old, uuids_new);
    assert_eq!(merged, normalize_markup(new));
}

#[test]
fn merging_twice_yields_identical_bytes() {
    let new = simple_file(
        r#"rh.showRoot2() && <div {...rh.propsRoot2()}>fresh</div>"#,
        NEW_REVISION,
    );
    let edited = simple_file(
        r#"rh.showRoot() && <div {...rh.propsRoot()} onClick={rh.onRootClick}>old</div>"#,
        BASE_REVISION,
    );
    let base = simple_file(
        r#"rh.showRoot() && <div {...rh.propsRoot()}>old</div>"#,
        BASE_REVISION,
    );
    let base_uuids = &[("Root", "u1")];
    let new_uuids = &[("Root2", "u1")];
    let first = run_merge(&new, &edited, &base, base_uuids, new_uuids).unwrap();
    let second = run_merge(&new, &edited, &base, base_uuids, new_uuids).unwrap();
    assert_eq!(first[UUID], second[UUID]);
}

#[test]
fn renames_leave_no_stale_helper_references() {
    let merged = merge_markup(
        r#"rh.showRoot2() && <div {...rh.propsRoot2()}>hi</div>"#,
        r#"rh.showRoot() && <div {...rh.propsRoot()} onClick={rh.onRootClick}>hi</div>"#,
        r#"rh.showRoot() && <div {...rh.propsRoot()}>hi</div>"#,
        &[("Root", "u1")],
        &[("Root2", "u1")],
    );
    assert_eq!(
        merged,
        r#"rh.showRoot2() && <div {...rh.propsRoot2()} onClick={rh.onRoot2Click}>hi</div>"#
    );
    for stale in ["showRoot()", "propsRoot(", "onRootClick"] {
        assert!(!merged.contains(stale), "stale reference {stale} in {merged}");
    }
}

#[test]
fn managed_imports_end_up_sorted_and_deduplicated() {
    let markup = r#"<div className={rh.clsRoot()} />"#;
    let imports_edited = "import { B1 } from \"lib-b\"; // plasmic-import: b/component\n\
                          import { A1 } from \"lib-a\"; // plasmic-import: a/component\n";
    let imports_new = "import { C1 } from \"lib-c\"; // plasmic-import: c/css\n\
                       import { A1, A2 } from \"lib-a\"; // plasmic-import: a/component\n";
    let out = run_merge(
        &component_file(markup, NEW_REVISION, imports_new, "const helpers = {};"),
        &component_file(markup, BASE_REVISION, imports_edited, "const helpers = {};"),
        &component_file(markup, BASE_REVISION, imports_edited, "const helpers = {};"),
        &[("Root", "u1")],
        &[("Root", "u1")],
    )
    .unwrap();
    let expected = "import * as React from \"react\";\n\
                    import { A1, A2 } from \"lib-a\"; // plasmic-import: a/component\n\
                    import { B1 } from \"lib-b\"; // plasmic-import: b/component\n\
                    import { C1 } from \"lib-c\"; // plasmic-import: c/css\n";
    assert!(out[UUID].starts_with(expected), "{}", out[UUID]);
}
