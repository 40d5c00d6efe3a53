//! The parsing/printing boundary of the merge engine.

use crate::ast::Module;
use crate::error::MergeError;
use crate::{parser, printer};

/// Source-level collaborators of the merge: a parser producing [`Module`]
/// trees, a printer turning them back into text, and a final formatting
/// pass. Deployments wire their own toolchain here; the crate ships
/// [`ReferenceSyntax`] for the generated-file dialect.
pub trait SourceSyntax {
    fn parse(&self, source: &str) -> Result<Module, String>;
    fn print(&self, module: &Module) -> String;
    /// Formats assembled output text. The reference implementation is the
    /// identity.
    fn format(&self, source: &str) -> String;
}

/// The crate's own recursive-descent parser and compact printer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceSyntax;

impl SourceSyntax for ReferenceSyntax {
    fn parse(&self, source: &str) -> Result<Module, String> {
        parser::parse_module(source)
    }

    fn print(&self, module: &Module) -> String {
        printer::print_module(module)
    }

    fn format(&self, source: &str) -> String {
        source.to_owned()
    }
}

pub(crate) fn parse_as(
    syntax: &dyn SourceSyntax,
    source: &str,
    role: &'static str,
) -> Result<Module, MergeError> {
    syntax
        .parse(source)
        .map_err(|message| MergeError::Parse { role, message })
}
