//! Assembly of the merged output file.

use std::ops::Range;

use log::warn;

use crate::ast::{Expr, Module};
use crate::error::MergeError;
use crate::import_merge::merge_imports;
use crate::syntax::SourceSyntax;

pub(crate) const MANAGED_REGION_START: &str = "// plasmic-managed-start";
pub(crate) const MANAGED_REGION_END: &str = "// plasmic-managed-end";

/// Builds the merged file text: the edited file with the merged markup
/// substituted in, the revision marker bumped, imports unioned, and the
/// verbatim managed region copied from the new file.
pub(crate) fn assemble_file(
    syntax: &dyn SourceSyntax,
    edited: &Module,
    new: &Module,
    new_source: &str,
    merged_markup: Expr,
    new_revision: u64,
) -> Result<String, MergeError> {
    let mut out = edited.clone();
    let managed = out
        .managed_mut()
        .expect("the caller only assembles files that carry managed markup");
    managed.expr = merged_markup;
    managed.revision = new_revision;
    merge_imports(&mut out, new);
    let printed = syntax.print(&out);
    let replaced = replace_managed_region(&printed, new_source)?;
    Ok(syntax.format(&replaced))
}

/// Character-exact substitution of the region bounded by the managed-region
/// markers with the corresponding region of the new file.
fn replace_managed_region(output: &str, new_source: &str) -> Result<String, MergeError> {
    let new_region = region_bounds(new_source).ok_or(MergeError::MissingManagedRegion)?;
    match region_bounds(output) {
        Some(range) => {
            let mut replaced =
                String::with_capacity(output.len() + new_region.len() - range.len());
            replaced.push_str(&output[..range.start]);
            replaced.push_str(&new_source[new_region]);
            replaced.push_str(&output[range.end..]);
            Ok(replaced)
        }
        None => {
            warn!("merged output carries no managed region markers; leaving the edited region");
            Ok(output.to_owned())
        }
    }
}

fn region_bounds(text: &str) -> Option<Range<usize>> {
    let start = text.find(MANAGED_REGION_START)?;
    let end = text[start..].find(MANAGED_REGION_END)? + start + MANAGED_REGION_END.len();
    Some(start..end)
}
