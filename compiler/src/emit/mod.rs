//! Go source emission for one file.
//!
//! The body is printed first while the packages it touches are collected;
//! the header and import block are assembled last, then the whole text goes
//! through the verifier.

pub mod alias;
mod enums;
mod extension;
mod message;
mod oneof;

use std::collections::BTreeSet;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use prost::Message as _;
use prost_types::FieldDescriptorProto;
use tracing::debug;

use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::mapper::GoType;
use crate::naming::{camel_case_slice, dir_name};
use crate::packages::BUILTIN_PACKAGES;
use crate::plugin::Plugin;
use crate::printer::Printer;
use crate::types::{FileDescriptor, FileId, ImportedId, MessageId, Object};
use crate::utils::quote;
use crate::verifier::format_source;
use crate::wrap::PACKAGE_PATH;

use alias::Symbol;

/// Result of emitting one file.
pub(crate) struct Emitted {
    /// Formatted Go source, present only for files being generated.
    pub content: Option<String>,
    pub exports: Vec<(Object, Symbol)>,
}

pub(crate) struct FileEmitter<'a> {
    gen:      &'a Generator,
    file:     FileId,
    out:      Printer,
    /// Statements collected for the file's `init` function.
    init:     Vec<String>,
    exports:  Vec<(Object, Symbol)>,
    /// Files named by forwarded getters without being dependencies.
    indirect: BTreeSet<FileId>,
}

impl<'a> FileEmitter<'a> {
    pub fn new(gen: &'a Generator, file: FileId) -> FileEmitter<'a> {
        FileEmitter {
            gen,
            file,
            out: Printer::new(gen.is_generated(file)),
            init: Vec::new(),
            exports: Vec::new(),
            indirect: BTreeSet::new(),
        }
    }

    fn fd(&self) -> &'a FileDescriptor {
        let gen: &'a Generator = self.gen;
        gen.set.file(self.file)
    }

    /// Local name of the `proto` runtime package, marked as used.
    fn proto_pkg(&mut self) -> &'a str {
        let gen: &'a Generator = self.gen;
        let pkg = gen.packages.builtin("proto");
        self.out.use_package(pkg);
        pkg
    }

    fn fmt_pkg(&mut self) -> &'a str {
        let gen: &'a Generator = self.gen;
        let pkg = gen.packages.builtin("fmt");
        self.out.use_package(pkg);
        pkg
    }

    fn math_pkg(&mut self) -> &'a str {
        let gen: &'a Generator = self.gen;
        let pkg = gen.packages.builtin("math");
        self.out.use_package(pkg);
        pkg
    }

    fn export(&mut self, obj: Object, sym: Symbol) {
        self.exports.push((obj, sym));
    }

    /// Maps a field and records the package of any foreign type it names.
    fn go_type(&mut self, message: Option<MessageId>, field: &FieldDescriptorProto) -> Result<GoType, GeneratorError> {
        let typ = self.gen.go_type(self.file, message, field)?;
        if let Some(pkg) = &typ.package {
            self.out.use_package(pkg);
        }
        Ok(typ)
    }

    /// Printed name of `obj` plus a `.`, or nothing when it lives in the
    /// generated package.
    fn package_prefix(&mut self, obj: Object) -> Result<String, GeneratorError> {
        let pkg = self.gen.packages.of(self.gen.set.file_of(obj))?;
        if pkg == self.gen.package_name {
            return Ok(String::new());
        }
        self.out.use_package(pkg);
        Ok(format!("{}.", pkg))
    }

    /// Prints the leading comments recorded for a source path, returning
    /// whether there were any.
    fn print_comments(&mut self, path: &str) -> bool {
        if !self.out.enabled() {
            return false;
        }
        let text = match self.fd().comments.get(path) {
            Some(text) => text,
            None => return false,
        };
        let text = text.strip_suffix('\n').unwrap_or(text);
        for line in text.split('\n') {
            self.out.line(format!("// {}", line.strip_prefix(' ').unwrap_or(line)));
        }
        true
    }

    pub fn run(mut self, plugins: &mut [Box<dyn Plugin>]) -> Result<Emitted, GeneratorError> {
        let fd = self.fd();
        debug!(file = fd.name(), generated = self.out.enabled(), "emitting");

        if fd.index == 0 {
            self.version_assertion();
        }
        for &id in &fd.imported {
            self.imported(id)?;
        }
        for &id in &fd.enums {
            self.enumeration(id)?;
        }
        for &id in &fd.messages {
            // map entries are rendered as Go maps
            if self.gen.set.message(id).is_map_entry() {
                continue;
            }
            self.message(id)?;
        }
        for &id in &fd.extensions {
            self.extension(id)?;
        }
        self.init_function();

        for plugin in plugins.iter_mut() {
            plugin.generate(self.gen, self.file, &mut self.out)?;
        }

        self.file_descriptor()?;

        if !self.out.enabled() {
            return Ok(Emitted {
                content: None,
                exports: self.exports,
            });
        }

        let mut extra = Printer::new(true);
        for plugin in plugins.iter_mut() {
            plugin.generate_imports(self.gen, self.file, &mut extra)?;
        }
        for pkg in extra.used() {
            self.out.use_package(pkg);
        }

        let mut head = Printer::new(true);
        self.header(&mut head);
        self.imports(&mut head)?;

        let mut source = head.into_body();
        source.push_str(&extra.into_body());
        source.push('\n');
        source.push_str(&self.out.into_body());

        Ok(Emitted {
            content: Some(format_source(&source)?),
            exports: self.exports,
        })
    }

    fn version_assertion(&mut self) {
        let proto = self.proto_pkg();
        self.out.line("// This is a compile-time assertion to ensure that this generated file");
        self.out.line("// is compatible with the proto package it is being compiled against.");
        self.out.line("// A compilation error at this line likely means your copy of the");
        self.out.line("// proto package needs to be updated.");
        self.out.line(format!(
            "const _ = {}.ProtoPackageIsVersion2 // please upgrade the proto package",
            proto
        ));
        self.out.blank();
    }

    fn header(&self, head: &mut Printer) {
        let gen = self.gen;
        let fd = self.fd();
        head.line("// Code generated by protoc-gen-go. DO NOT EDIT.");
        head.line(format!("// source: {}", fd.name()));
        head.blank();

        if fd.index == 0 {
            head.line("/*");
            head.line(format!("Package {} is a generated protocol buffer package.", gen.package_name));
            head.blank();
            if let Some(text) = fd.comments.get(&PACKAGE_PATH.to_string()) {
                let text = text.strip_suffix('\n').unwrap_or(text);
                for line in text.split('\n') {
                    let line = line.strip_prefix(' ').unwrap_or(line);
                    // keep the text inside the block comment
                    head.line(line.replace("*/", "* /"));
                }
                head.blank();
            }
            head.line("It is generated from these files:");
            let mut top_level = Vec::new();
            for &f in &gen.gen_files {
                let gfd = gen.set.file(f);
                head.line(format!("\t{}", gfd.name()));
                for &m in &gfd.messages {
                    let msg = gen.set.message(m);
                    if msg.parent.is_none() {
                        top_level.push(camel_case_slice(&msg.type_name));
                    }
                }
            }
            head.blank();
            head.line("It has these top-level messages:");
            for name in top_level {
                head.line(format!("\t{}", name));
            }
            head.line("*/");
        }

        head.line(format!("package {}", gen.package_name));
        head.blank();
    }

    fn imports(&self, head: &mut Printer) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let fd = self.fd();
        let mut entries = Vec::new();

        for builtin in BUILTIN_PACKAGES {
            let local = gen.packages.builtin(builtin);
            if !self.out.is_used(local) {
                continue;
            }
            let path = match gen.packages.builtin_import_path(local) {
                Some(path) if path.contains('/') => format!("{}{}", gen.params.import_prefix, path),
                Some(path) => path.to_string(),
                None => continue,
            };
            entries.push(format!("{} {}", local, quote(&path)));
        }

        for (i, (name, &dep)) in fd.proto.dependency.iter().zip(&fd.dependencies).enumerate() {
            let pkg = gen.packages.of(dep)?;
            // never import our own package
            if pkg == gen.package_name {
                continue;
            }
            let path = self.import_path(name, dep);

            if fd.is_weak_dependency(i) {
                entries.push(format!("// skipping weak import {} {}", pkg, quote(&path)));
                continue;
            }
            // Unreferenced dependencies are still linked in, for their
            // registrations.
            let local = if self.out.is_used(pkg) { pkg } else { "_" };
            entries.push(format!("{} {}", local, quote(&path)));
        }

        for &dep in &self.indirect {
            let pkg = gen.packages.of(dep)?;
            if pkg == gen.package_name || fd.dependencies.contains(&dep) {
                continue;
            }
            let path = self.import_path(gen.set.file(dep).name(), dep);
            entries.push(format!("{} {}", pkg, quote(&path)));
        }

        if entries.is_empty() {
            return Ok(());
        }
        head.line("import (");
        head.indent();
        for entry in entries {
            head.line(entry);
        }
        head.outdent();
        head.line(")");
        Ok(())
    }

    /// Import path of the package generated for `dep`, imported as `name`.
    fn import_path(&self, name: &str, dep: FileId) -> String {
        let gen = self.gen;
        let mut path = match gen.params.import_map.get(name) {
            Some(path) => path.clone(),
            None => dir_name(&gen.set.file(dep).go_file_name()).to_string(),
        };
        path.insert_str(0, &gen.params.import_prefix);
        path
    }

    /// Forwards the symbols of a publicly imported object.
    fn imported(&mut self, id: ImportedId) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let target = gen.set.imported(id).target;
        let short = gen.set.type_name(target).last().map_or("", String::as_str);
        let owner = gen.set.file_of(target);
        let filename = gen.set.file(owner).name();

        // Symbols of generated files already live in this package.
        if gen.is_generated(owner) {
            self.out.line(format!("// Ignoring public import of {} from {}", short, filename));
            self.out.blank();
            return Ok(());
        }

        self.out.line(format!("// {} from public import {}", short, filename));
        let pkg = gen.packages.of(owner)?;
        self.out.use_package(pkg);
        for sym in gen.exports(target) {
            self.alias(sym, pkg)?;
        }
        self.out.blank();
        Ok(())
    }

    fn init_function(&mut self) {
        let gen = self.gen;
        let fd = self.fd();
        for &id in &fd.enums {
            let e = gen.set.enumeration(id);
            let cc = camel_case_slice(&e.type_name);
            let pkg = fd.proto.package();
            let registered = if pkg.is_empty() { cc.clone() } else { format!("{}.{}", pkg, cc) };
            let proto = self.proto_pkg();
            self.init.push(format!(
                "{}.RegisterEnum({}, {}_name, {}_value)",
                proto,
                quote(&registered),
                cc,
                cc
            ));
        }
        let nested = fd.messages.iter().flat_map(|&m| gen.set.message(m).extensions.iter());
        for &id in nested.chain(fd.extensions.iter()) {
            let proto = self.proto_pkg();
            self.init
                .push(format!("{}.RegisterExtension({})", proto, gen.set.extension(id).desc_name()));
        }

        if self.init.is_empty() {
            return;
        }
        self.out.line("func init() {");
        self.out.indent();
        for stmt in std::mem::take(&mut self.init) {
            self.out.line(stmt);
        }
        self.out.outdent();
        self.out.line("}");
    }

    /// Registers the serialized file descriptor, gzipped, minus its source
    /// info.
    fn file_descriptor(&mut self) -> Result<(), GeneratorError> {
        if !self.out.enabled() {
            return Ok(());
        }
        let fd = self.fd();
        let mut pb = fd.proto.clone();
        pb.source_code_info = None;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&pb.encode_to_vec())?;
        let compressed = encoder.finish()?;

        let var = fd.var_name();
        let proto = self.proto_pkg();
        self.out.blank();
        self.out.line(format!(
            "func init() {{ {}.RegisterFile({}, {}) }}",
            proto,
            quote(fd.name()),
            var
        ));
        self.out.line(format!("var {} = []byte{{", var));
        self.out.indent();
        self.out
            .line(format!("// {} bytes of a gzipped FileDescriptorProto", compressed.len()));
        for chunk in compressed.chunks(16) {
            let row: String = chunk.iter().map(|b| format!("0x{:02x},", b)).collect();
            self.out.line(row);
        }
        self.out.outdent();
        self.out.line("}");
        Ok(())
    }
}

/// Comma separated index path of a message, outermost first, as used by the
/// `Descriptor` methods.
fn descriptor_indexes(gen: &Generator, mut message: Option<MessageId>, last: Option<usize>) -> String {
    let mut indexes = Vec::new();
    if let Some(last) = last {
        indexes.push(last.to_string());
    }
    while let Some(id) = message {
        let msg = gen.set.message(id);
        indexes.push(msg.index.to_string());
        message = msg.parent;
    }
    indexes.reverse();
    indexes.join(", ")
}
