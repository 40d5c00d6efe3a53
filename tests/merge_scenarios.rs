//! End-to-end merge scenarios over complete component files.

mod common;

use std::collections::HashMap;

use common::*;
use plasmic_merge::{
    ComponentUpdate, MergeError, ReferenceSyntax, merge_files,
};
use pretty_assertions::assert_eq;

#[test]
fn rename_only() {
    let merged = merge_markup(
        r#"<div className={rh.clsRoot2()}>hello</div>"#,
        r#"<div className={rh.clsRoot()}>hello</div>"#,
        r#"<div className={rh.clsRoot()}>hello</div>"#,
        &[("Root", "u-root")],
        &[("Root2", "u-root")],
    );
    assert_eq!(merged, r#"<div className={rh.clsRoot2()}>hello</div>"#);
}

#[test]
fn shape_upgrade_to_props_spread() {
    let merged = merge_markup(
        r#"<div {...rh.propsBox()}>hi</div>"#,
        r#"<div className={rh.clsBox()} data-test="1">hi</div>"#,
        r#"<div className={rh.clsBox()} data-test="1">hi</div>"#,
        &[("Box", "u-box")],
        &[("Box", "u-box")],
    );
    assert_eq!(merged, r#"<div {...rh.propsBox()} data-test="1">hi</div>"#);
}

#[test]
fn shape_downgrade_keeps_developer_arguments_for_review() {
    let merged = merge_markup(
        r#"<div className={rh.clsBox()}>hi</div>"#,
        r#"<div {...rh.propsBox(extraProps)}>hi</div>"#,
        r#"<div {...rh.propsBox()}>hi</div>"#,
        &[("Box", "u-box")],
        &[("Box", "u-box")],
    );
    // the old spread is kept after the class attribute so the duplicate
    // surfaces at compile time
    assert_eq!(
        merged,
        r#"<div className={rh.clsBox()} {...rh.propsBox(extraProps)}>hi</div>"#
    );
}

#[test]
fn developer_added_handler_is_preserved() {
    let merged = merge_markup(
        r#"<div className={rh.clsRoot()}><button className={rh.clsBtn()}>go</button></div>"#,
        r#"<div className={rh.clsRoot()}><button className={rh.clsBtn()} onClick={handler}>go</button></div>"#,
        r#"<div className={rh.clsRoot()}><button className={rh.clsBtn()}>go</button></div>"#,
        &[("Root", "u-r"), ("Btn", "u-b")],
        &[("Root", "u-r"), ("Btn", "u-b")],
    );
    assert_eq!(
        merged,
        r#"<div className={rh.clsRoot()}><button className={rh.clsBtn()} onClick={handler}>go</button></div>"#
    );
}

#[test]
fn conflicting_attribute_is_emitted_twice() {
    let merged = merge_markup(
        r#"<div className={rh.clsRoot()} title="c">hello</div>"#,
        r#"<div className={rh.clsRoot()} title="b">hello</div>"#,
        r#"<div className={rh.clsRoot()} title="a">hello</div>"#,
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    );
    assert_eq!(
        merged,
        r#"<div title="c" className={rh.clsRoot()} title="b">hello</div>"#
    );
}

#[test]
fn visibility_gate_added_by_tool_wraps_edited_markup() {
    let merged = merge_markup(
        r#"rh.showRoot() && <div className={rh.clsRoot()} />"#,
        r#"<div className={rh.clsRoot()} id="dev" />"#,
        r#"<div className={rh.clsRoot()} />"#,
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    );
    assert_eq!(
        merged,
        r#"rh.showRoot() && <div className={rh.clsRoot()} id="dev" />"#
    );
}

#[test]
fn text_deleted_by_tool_stays_deleted() {
    let merged = merge_markup(
        r#"<p className={rh.clsP()}>hello</p>"#,
        r#"<p className={rh.clsP()}>hello world</p>"#,
        r#"<p className={rh.clsP()}>hello world</p>"#,
        &[("P", "u-p")],
        &[("P", "u-p")],
    );
    assert_eq!(merged, r#"<p className={rh.clsP()}>hello</p>"#);
}

#[test]
fn managed_imports_are_unioned() {
    let imports_edited =
        "import { A, B } from \"m\"; // plasmic-import: 7/component\n";
    let imports_new = "import { B, C } from \"m\"; // plasmic-import: 7/component\n";
    let markup = r#"<div className={rh.clsRoot()} />"#;
    let out = run_merge(
        &component_file(markup, NEW_REVISION, imports_new, "const helpers = {};"),
        &component_file(markup, BASE_REVISION, imports_edited, "const helpers = {};"),
        &component_file(markup, BASE_REVISION, imports_edited, "const helpers = {};"),
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    )
    .unwrap();
    assert!(
        out[UUID].contains("import { A, B, C } from \"m\"; // plasmic-import: 7/component\n"),
        "{}",
        out[UUID]
    );
}

#[test]
fn managed_region_and_revision_follow_the_new_file() {
    let markup = r#"<div className={rh.clsRoot()} />"#;
    let out = run_merge(
        &component_file(
            markup,
            NEW_REVISION,
            "",
            "const helpers = { regenerated: true };",
        ),
        &component_file(markup, BASE_REVISION, "", "const helpers = {};"),
        &component_file(markup, BASE_REVISION, "", "const helpers = {};"),
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    )
    .unwrap();
    let merged = &out[UUID];
    assert!(merged.contains("plasmic-managed-jsx/2"), "{merged}");
    assert!(
        merged.contains("const helpers = { regenerated: true };"),
        "{merged}"
    );
    assert!(!merged.contains("const helpers = {};"), "{merged}");
}

#[test]
fn component_without_managed_marker_is_skipped() {
    let mut components = HashMap::new();
    components.insert(
        UUID.to_owned(),
        ComponentUpdate {
            edited_file: "export const x = 1;\n".to_owned(),
            new_file: simple_file(r#"<div className={rh.clsRoot()} />"#, NEW_REVISION),
            new_name_in_id_to_uuid: uuid_map(&[("Root", "u-r")]),
        },
    );
    let mut provider = InMemoryProvider {
        by_revision: HashMap::new(),
    };
    let out = merge_files(&components, PROJECT, &mut provider, &ReferenceSyntax).unwrap();
    assert!(out.is_empty());
}

#[test]
fn missing_base_metadata_is_fatal() {
    let markup = r#"<div className={rh.clsRoot()} />"#;
    let mut components = HashMap::new();
    components.insert(
        UUID.to_owned(),
        ComponentUpdate {
            edited_file: simple_file(markup, BASE_REVISION),
            new_file: simple_file(markup, NEW_REVISION),
            new_name_in_id_to_uuid: uuid_map(&[("Root", "u-r")]),
        },
    );
    let mut provider = InMemoryProvider {
        by_revision: HashMap::from([(BASE_REVISION, Default::default())]),
    };
    let err = merge_files(&components, PROJECT, &mut provider, &ReferenceSyntax).unwrap_err();
    assert_eq!(
        err,
        MergeError::MissingBaseMetadata {
            uuid: UUID.to_owned(),
            revision: BASE_REVISION,
        }
    );
}

#[test]
fn missing_managed_region_in_the_new_file_is_fatal() {
    let markup = r#"<div className={rh.clsRoot()} />"#;
    let new_file = format!(
        "function render(rh) {{\n  return (\n    /* plasmic-managed-jsx/2 */\n    {markup}\n  );\n}}\n"
    );
    let err = run_merge(
        &new_file,
        &simple_file(markup, BASE_REVISION),
        &simple_file(markup, BASE_REVISION),
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    )
    .unwrap_err();
    assert_eq!(err, MergeError::MissingManagedRegion);
}

#[test]
fn carrying_both_managed_shapes_is_fatal() {
    let err = run_merge(
        &simple_file(
            r#"<div className={rh.clsRoot()} {...rh.propsRoot()} />"#,
            NEW_REVISION,
        ),
        &simple_file(r#"<div className={rh.clsRoot()} />"#, BASE_REVISION),
        &simple_file(r#"<div className={rh.clsRoot()} />"#, BASE_REVISION),
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::InvariantViolation(_)), "{err}");
}

#[test]
fn unparsable_markup_is_fatal() {
    let err = run_merge(
        &simple_file(r#"<div className={rh.clsRoot()}>x</span>"#, NEW_REVISION),
        &simple_file(r#"<div className={rh.clsRoot()} />"#, BASE_REVISION),
        &simple_file(r#"<div className={rh.clsRoot()} />"#, BASE_REVISION),
        &[("Root", "u-r")],
        &[("Root", "u-r")],
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::Parse { role: "new", .. }), "{err}");
}
