//! Per-version view of a parsed component file.
//!
//! A [`CodeVersion`] ties together the parsed module, the classified markup
//! tree, the `nameInId → uuid` map supplied by the sync metadata, and the
//! indices used to pair nodes across versions. All three versions of a
//! component are read-only for the whole merge; the indices hold shared
//! handles ([`Rc`]) into the classified tree.

use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use rustc_hash::FxHashMap;

use crate::ast::Module;
use crate::classify::{PlasmicNode, PlasmicTagOrComponent, classify_root, collect_tags, discover_helper};
use crate::error::MergeError;

pub struct CodeVersion {
    module: Module,
    revision: u64,
    helper: String,
    root: PlasmicNode,
    name_in_id_to_uuid: FxHashMap<String, String>,
    tags_by_name_in_id: FxHashMap<String, Rc<PlasmicTagOrComponent>>,
    tags_by_uuid: FxHashMap<String, Rc<PlasmicTagOrComponent>>,
}

impl CodeVersion {
    /// Classifies and indexes a parsed module. Fails when the module has no
    /// managed markup statement or when the markup violates a generator
    /// invariant.
    pub fn new(
        module: Module,
        name_in_id_to_uuid: HashMap<String, String>,
    ) -> Result<Self, MergeError> {
        let managed = module.managed().ok_or_else(|| {
            MergeError::InvariantViolation("module has no managed markup statement".to_owned())
        })?;
        let revision = managed.revision;
        let helper = discover_helper(&managed.expr).unwrap_or_else(|| "rh".to_owned());
        let root = classify_root(&managed.expr, &helper)?;

        let mut tags = Vec::new();
        collect_tags(&root, &mut tags);
        let name_in_id_to_uuid: FxHashMap<String, String> =
            name_in_id_to_uuid.into_iter().collect();
        let mut tags_by_name_in_id = FxHashMap::default();
        let mut tags_by_uuid = FxHashMap::default();
        for tag in tags {
            let name = tag.jsx.name_in_id.clone();
            if let Some(uuid) = name_in_id_to_uuid.get(&name) {
                tags_by_uuid.insert(uuid.clone(), Rc::clone(&tag));
            }
            if tags_by_name_in_id.insert(name, Rc::clone(&tag)).is_some() {
                warn!(
                    "duplicate stable identifier {} in one version, keeping the last occurrence",
                    tag.jsx.name_in_id
                );
            }
        }

        Ok(Self {
            module,
            revision,
            helper,
            root,
            name_in_id_to_uuid,
            tags_by_name_in_id,
            tags_by_uuid,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The base revision recorded in the managed marker comment.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The helper-object name discovered from the managed calls (`rh` by
    /// convention).
    pub fn helper(&self) -> &str {
        &self.helper
    }

    pub fn root(&self) -> &PlasmicNode {
        &self.root
    }

    /// The cross-version entity identifier of a stable name, when the sync
    /// metadata knows it.
    pub fn uuid_of(&self, name_in_id: &str) -> Option<&str> {
        self.name_in_id_to_uuid.get(name_in_id).map(String::as_str)
    }

    pub fn find_by_name_in_id(&self, name_in_id: &str) -> Option<&Rc<PlasmicTagOrComponent>> {
        self.tags_by_name_in_id.get(name_in_id)
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<&Rc<PlasmicTagOrComponent>> {
        self.tags_by_uuid.get(uuid)
    }

    /// Resolves a node of another version in this one: first by the stable
    /// name itself, then through the entity identifier (which survives
    /// renames).
    pub fn find_tag(
        &self,
        name_in_id: &str,
        uuid: Option<&str>,
    ) -> Option<&Rc<PlasmicTagOrComponent>> {
        self.find_by_name_in_id(name_in_id)
            .or_else(|| uuid.and_then(|u| self.find_by_uuid(u)))
    }

    /// Pairing predicate between a candidate name of this version and a
    /// probe name of `probe_version`: equal names match outright, otherwise
    /// both sides must resolve to the same entity identifier.
    pub fn equiv_with<'a>(
        &'a self,
        probe_version: &'a CodeVersion,
    ) -> impl Fn(&str, &str) -> bool + 'a {
        move |candidate, probe| {
            candidate == probe
                || match (self.uuid_of(candidate), probe_version.uuid_of(probe)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
        }
    }
}
