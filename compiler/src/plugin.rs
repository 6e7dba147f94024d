use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::printer::Printer;
use crate::types::FileId;

/// An extension of the generator that appends extra declarations, such as
/// RPC stubs, to every generated file.
///
/// A plugin only runs when its name is listed in the `plugins` parameter.
pub trait Plugin {
    fn name(&self) -> &str;

    /// Called once per run, after the descriptors are wrapped and named and
    /// before any file is emitted.
    fn init(&mut self, _gen: &Generator) {}

    /// Appends body text for `file`. Packages the text refers to must be
    /// marked with [`Printer::use_package`] so they end up imported.
    fn generate(&mut self, gen: &Generator, file: FileId, out: &mut Printer) -> Result<(), GeneratorError>;

    /// Appends extra import declarations for `file`. Called after
    /// [`Plugin::generate`], while the import block is being assembled.
    fn generate_imports(&mut self, _gen: &Generator, _file: FileId, _out: &mut Printer) -> Result<(), GeneratorError> {
        Ok(())
    }
}
