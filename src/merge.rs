//! The merge entry point and its metadata collaborators.

use std::collections::HashMap;

use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::assemble::assemble_file;
use crate::code_version::CodeVersion;
use crate::error::MergeError;
use crate::node_merge::{MergeCtx, merge_markup};
use crate::syntax::{SourceSyntax, parse_as};

/// Everything the caller knows about one component to merge: the working
/// copy on disk, the freshly generated file, and the stable-name map of the
/// new generation.
#[derive(Debug, Clone)]
pub struct ComponentUpdate {
    pub edited_file: String,
    pub new_file: String,
    pub new_name_in_id_to_uuid: HashMap<String, String>,
}

/// The generated state of one component at some revision, as recorded by the
/// sync metadata.
#[derive(Debug, Clone)]
pub struct ComponentSkeleton {
    pub uuid: String,
    pub name_in_id_to_uuid: HashMap<String, String>,
    pub file_content: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectSyncMetadata {
    pub components: Vec<ComponentSkeleton>,
}

/// Source of base-revision metadata. Implementations typically fetch from
/// the sync service; fetching may block, the merge itself never does.
pub trait BaseProvider {
    fn project_sync_metadata(
        &mut self,
        project_id: &str,
        revision: u64,
    ) -> Result<ProjectSyncMetadata, MergeError>;
}

/// Memoizing wrapper around a [`BaseProvider`]. Revisions are immutable, so
/// entries are never invalidated. The merge engine is the only reader, so no
/// synchronization is needed.
pub struct CachedBaseProvider<P> {
    inner: P,
    cache: FxHashMap<(String, u64), ProjectSyncMetadata>,
}

impl<P: BaseProvider> CachedBaseProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: FxHashMap::default(),
        }
    }
}

impl<P: BaseProvider> BaseProvider for CachedBaseProvider<P> {
    fn project_sync_metadata(
        &mut self,
        project_id: &str,
        revision: u64,
    ) -> Result<ProjectSyncMetadata, MergeError> {
        let key = (project_id.to_owned(), revision);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let metadata = self.inner.project_sync_metadata(project_id, revision)?;
        self.cache.insert(key, metadata.clone());
        Ok(metadata)
    }
}

/// Merges every component in `components`, returning the merged file text by
/// component uuid.
///
/// Components whose edited file carries no managed markup marker are skipped
/// silently. Any parse failure, missing base metadata, or invariant
/// violation aborts the whole merge: a partial result would be worse than
/// none, since the caller writes the output back to disk.
///
/// Components are processed in uuid order, and each individual merge is a
/// pure function of its inputs, so the output is deterministic.
pub fn merge_files(
    components: &HashMap<String, ComponentUpdate>,
    project_id: &str,
    base_provider: &mut dyn BaseProvider,
    syntax: &dyn SourceSyntax,
) -> Result<HashMap<String, String>, MergeError> {
    let mut merged = HashMap::new();
    for uuid in components.keys().sorted() {
        let update = &components[uuid];
        let edited_module = parse_as(syntax, &update.edited_file, "edited")?;
        if edited_module.managed().is_none() {
            debug!("component {uuid} carries no managed markup, skipping");
            continue;
        }
        let revision = edited_module.managed().unwrap().revision;
        debug!("merging component {uuid} against base revision {revision}");

        let metadata = base_provider.project_sync_metadata(project_id, revision)?;
        let skeleton = metadata
            .components
            .iter()
            .find(|c| c.uuid == *uuid)
            .ok_or_else(|| MergeError::MissingBaseMetadata {
                uuid: uuid.clone(),
                revision,
            })?;

        let base_module = parse_as(syntax, &skeleton.file_content, "base")?;
        let new_module = parse_as(syntax, &update.new_file, "new")?;

        // the edited file is a developer-modified copy of the base
        // generation, so it shares the base stable-name map
        let edited = CodeVersion::new(edited_module, skeleton.name_in_id_to_uuid.clone())?;
        let base = CodeVersion::new(base_module, skeleton.name_in_id_to_uuid.clone())?;
        let new = CodeVersion::new(new_module, update.new_name_in_id_to_uuid.clone())?;
        if new.helper() != edited.helper() {
            warn!(
                "helper object differs between versions ({} vs {}), following the new version",
                new.helper(),
                edited.helper()
            );
        }

        let helper = new.helper().to_owned();
        let ctx = MergeCtx {
            new: &new,
            edited: &edited,
            base: &base,
            helper: &helper,
        };
        let markup = merge_markup(&ctx);
        let text = assemble_file(
            syntax,
            edited.module(),
            new.module(),
            &update.new_file,
            markup,
            new.revision(),
        )?;
        merged.insert(uuid.clone(), text);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct CountingProvider {
        calls: usize,
    }

    impl BaseProvider for CountingProvider {
        fn project_sync_metadata(
            &mut self,
            _project_id: &str,
            _revision: u64,
        ) -> Result<ProjectSyncMetadata, MergeError> {
            self.calls += 1;
            Ok(ProjectSyncMetadata::default())
        }
    }

    #[test]
    fn cached_provider_fetches_each_revision_once() {
        let mut provider = CachedBaseProvider::new(CountingProvider { calls: 0 });
        provider.project_sync_metadata("p", 3).unwrap();
        provider.project_sync_metadata("p", 3).unwrap();
        provider.project_sync_metadata("p", 4).unwrap();
        assert_eq!(provider.inner.calls, 2);
    }

    #[test]
    fn empty_input_merges_to_an_empty_map() {
        let mut provider = CachedBaseProvider::new(CountingProvider { calls: 0 });
        let out = merge_files(
            &HashMap::new(),
            "p",
            &mut provider,
            &crate::syntax::ReferenceSyntax,
        )
        .unwrap();
        assert!(out.is_empty());
    }
}
