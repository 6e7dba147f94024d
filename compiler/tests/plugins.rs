mod common;

use common::*;
use protogo_compiler::printer::Printer;
use protogo_compiler::types::FileId;
use protogo_compiler::{generate_with_plugins, Generator, GeneratorError, Plugin};

/// Appends a greeting function and a stand-alone import to every file.
struct Hello;

impl Plugin for Hello {
    fn name(&self) -> &str {
        "hello"
    }

    fn generate(&mut self, gen: &Generator, file: FileId, out: &mut Printer) -> Result<(), GeneratorError> {
        let fmt = gen.packages.builtin("fmt");
        out.use_package(fmt);
        out.line(format!("// Hello greets {}.", gen.set.file(file).name()));
        out.line("func Hello() string {");
        out.indent();
        out.line(format!("return {}.Sprint(\"hello\")", fmt));
        out.outdent();
        out.line("}");
        Ok(())
    }

    fn generate_imports(&mut self, _gen: &Generator, _file: FileId, out: &mut Printer) -> Result<(), GeneratorError> {
        out.line("import context \"context\"");
        out.line("var _ context.Context");
        Ok(())
    }
}

fn run(parameter: &str) -> String {
    let req = request(
        vec![file("p.proto", "p", vec![message("M", vec![])])],
        &["p.proto"],
        parameter,
    );
    let resp = generate_with_plugins(req, vec![Box::new(Hello)]).unwrap();
    resp.file[0].content().to_string()
}

#[test]
fn test_plugin_runs_when_enabled() {
    let go = run("plugins=hello");
    assert!(go.contains("// Hello greets p.proto.\nfunc Hello() string {\n\treturn fmt.Sprint(\"hello\")\n}\n"));
    assert!(go.contains("\tfmt \"fmt\"\n"));
    assert!(go.contains("import context \"context\"\nvar _ context.Context\n"));
}

#[test]
fn test_empty_plugin_list_enables_all() {
    assert!(run("plugins=").contains("func Hello() string {"));
}

#[test]
fn test_plugin_skipped_when_not_listed() {
    for parameter in ["", "plugins=grpc"] {
        let go = run(parameter);
        assert!(!go.contains("Hello"));
        assert!(!go.contains("context"));
    }
}
