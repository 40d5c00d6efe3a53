//! Shared fixtures for the end-to-end merge tests.

use std::collections::HashMap;

use plasmic_merge::{
    BaseProvider, ComponentSkeleton, ComponentUpdate, MergeError, ProjectSyncMetadata,
    ReferenceSyntax, merge_files, parser, printer,
};

pub const UUID: &str = "comp-0001";
pub const PROJECT: &str = "proj-42";
pub const BASE_REVISION: u64 = 1;
pub const NEW_REVISION: u64 = 2;

/// Renders a complete component file around a managed markup expression.
pub fn component_file(
    markup: &str,
    revision: u64,
    managed_imports: &str,
    region_body: &str,
) -> String {
    format!(
        "import * as React from \"react\";\n\
         {managed_imports}\
         \n\
         // plasmic-managed-start\n\
         {region_body}\n\
         // plasmic-managed-end\n\
         \n\
         function render(rh, args) {{\n\
           return (\n\
             /* plasmic-managed-jsx/{revision} */\n\
             {markup}\n\
           );\n\
         }}\n"
    )
}

pub fn simple_file(markup: &str, revision: u64) -> String {
    component_file(
        markup,
        revision,
        "import { classNames } from \"@plasmicapp/react-web\"; // plasmic-import: proj-42/projectcss\n",
        "const helpers = {};",
    )
}

pub fn uuid_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

pub struct InMemoryProvider {
    pub by_revision: HashMap<u64, ProjectSyncMetadata>,
}

impl BaseProvider for InMemoryProvider {
    fn project_sync_metadata(
        &mut self,
        _project_id: &str,
        revision: u64,
    ) -> Result<ProjectSyncMetadata, MergeError> {
        self.by_revision
            .get(&revision)
            .cloned()
            .ok_or_else(|| MergeError::Provider(format!("no metadata at revision {revision}")))
    }
}

/// Runs a single-component merge over complete files.
pub fn run_merge(
    new_file: &str,
    edited_file: &str,
    base_file: &str,
    base_uuids: &[(&str, &str)],
    new_uuids: &[(&str, &str)],
) -> Result<HashMap<String, String>, MergeError> {
    let mut components = HashMap::new();
    components.insert(
        UUID.to_owned(),
        ComponentUpdate {
            edited_file: edited_file.to_owned(),
            new_file: new_file.to_owned(),
            new_name_in_id_to_uuid: uuid_map(new_uuids),
        },
    );
    let mut provider = InMemoryProvider {
        by_revision: HashMap::from([(
            BASE_REVISION,
            ProjectSyncMetadata {
                components: vec![ComponentSkeleton {
                    uuid: UUID.to_owned(),
                    name_in_id_to_uuid: uuid_map(base_uuids),
                    file_content: base_file.to_owned(),
                }],
            },
        )]),
    };
    merge_files(&components, PROJECT, &mut provider, &ReferenceSyntax)
}

/// Merges three markup expressions (wrapped in identical plain files) and
/// returns the merged markup expression text.
pub fn merge_markup(
    new_markup: &str,
    edited_markup: &str,
    base_markup: &str,
    base_uuids: &[(&str, &str)],
    new_uuids: &[(&str, &str)],
) -> String {
    let out = run_merge(
        &simple_file(new_markup, NEW_REVISION),
        &simple_file(edited_markup, BASE_REVISION),
        &simple_file(base_markup, BASE_REVISION),
        base_uuids,
        new_uuids,
    )
    .expect("merge should succeed");
    extract_markup(&out[UUID])
}

/// The markup expression on the managed-marker line of a merged file.
pub fn extract_markup(file: &str) -> String {
    let at = file
        .find("plasmic-managed-jsx/")
        .expect("merged file carries the managed marker");
    let rest = &file[at..];
    let expr_start = rest.find("*/").expect("marker comment is closed") + 2;
    rest[expr_start..]
        .lines()
        .next()
        .unwrap()
        .trim()
        .to_owned()
}

/// Normalizes a markup expression through the reference parser and printer.
pub fn normalize_markup(markup: &str) -> String {
    let module = parser::parse_module(&simple_file(markup, BASE_REVISION)).unwrap();
    printer::print_expr(&module.managed().unwrap().expr)
}
