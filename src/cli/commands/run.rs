use std::path::{Path, PathBuf};

use crate::ast::{Statement, Type};
use crate::cli::report;
use crate::compiler::Compiler;
use crate::evaluator::value::Value;
use crate::evaluator::Evaluator;
use crate::parser::parse;
use crate::scope::Scope;
use crate::vm::Vm;

use super::IdkCommand;

/// Runs a single source file, a multi-package module, or the byte-code compiler + VM, per
/// spec.md §6.3's flag table. Exactly one of `-f`, `-m`, `-c` must be given.
#[derive(clap::Parser)]
pub struct RunCommand {
    /// Evaluate a single source file.
    #[arg(short = 'f', value_name = "FILE", group = "mode")]
    file: Option<PathBuf>,

    /// Evaluate a multi-package module: the entry file's directory is the module, each immediate
    /// subdirectory is a package.
    #[arg(short = 'm', value_name = "FILE", group = "mode")]
    module: Option<PathBuf>,

    /// Compile the file to byte-code and run it on the VM instead of tree-walking it.
    #[arg(short = 'c', value_name = "FILE", group = "mode")]
    compile: Option<PathBuf>,

    /// Pretty-print the parsed AST before evaluating it.
    #[arg(short = 'p')]
    pretty: bool,

    /// With `-c`, print the compiled chunk's disassembly before running it.
    #[arg(long)]
    disassemble: bool,
}

impl IdkCommand for RunCommand {
    fn execute(self) -> anyhow::Result<()> {
        match (self.file, self.module, self.compile) {
            (Some(path), None, None) => run_file(&path, self.pretty),
            (None, Some(path), None) => run_module(&path, self.pretty),
            (None, None, Some(path)) => run_compiled(&path, self.pretty, self.disassemble),
            (None, None, None) => anyhow::bail!("one of -f, -m, or -c is required"),
            _ => anyhow::bail!("-f, -m, and -c are mutually exclusive"),
        }
    }
}

/// Parses and tree-walks a single file in a fresh root scope.
fn run_file(path: &Path, pretty: bool) -> anyhow::Result<()> {
    let file = path.display().to_string();
    report::start("Running", &file);
    let source = std::fs::read_to_string(path)?;
    let (program, errors) = parse(&source);
    if !errors.is_empty() {
        report::parser_errors(&file, &errors);
        anyhow::bail!("parsing {file} failed");
    }
    if pretty {
        print_program(&program);
    }

    let scope = Scope::new_root();
    let mut evaluator = Evaluator::new(file);
    let result = evaluator.eval_program(&program, &scope);
    if report::eval_result(&result) {
        anyhow::bail!("evaluation failed");
    }
    report::finish();
    Ok(())
}

/// Parses and evaluates every package under the entry file's directory into its own named
/// scope, then evaluates the entry file in the module's root scope (spec.md §6.3).
fn run_module(entry: &Path, pretty: bool) -> anyhow::Result<()> {
    let file = entry.display().to_string();
    report::start("Running", &file);
    let module_dir = entry.parent().unwrap_or_else(|| Path::new("."));
    let root = Scope::new_root();

    for package_dir in immediate_subdirectories(module_dir)? {
        let Some(package_name) = package_dir.file_name().and_then(std::ffi::OsStr::to_str) else {
            continue;
        };
        let package_scope = Scope::named_scope(&root, package_name);
        for source_file in idk_files_in(&package_dir) {
            let source = std::fs::read_to_string(&source_file)?;
            let (program, errors) = parse(&source);
            if !errors.is_empty() {
                report::parser_errors(&source_file.display().to_string(), &errors);
                anyhow::bail!("parsing {} failed", source_file.display());
            }
            let mut evaluator = Evaluator::new(source_file.display().to_string());
            let result = evaluator.eval_program(&program, &package_scope);
            if report::eval_result(&result) {
                anyhow::bail!("evaluating {} failed", source_file.display());
            }
        }
        Scope::insert(&package_scope, "name", Value::String(package_name.to_owned()), Type::String);
    }

    let source = std::fs::read_to_string(entry)?;
    let (program, errors) = parse(&source);
    if !errors.is_empty() {
        report::parser_errors(&file, &errors);
        anyhow::bail!("parsing {file} failed");
    }
    if pretty {
        print_program(&program);
    }
    let mut evaluator = Evaluator::new(file);
    let result = evaluator.eval_program(&program, &root);
    if report::eval_result(&result) {
        anyhow::bail!("evaluation failed");
    }
    report::finish();
    Ok(())
}

/// Compiles the file to a `Chunk` and runs it on the VM instead of the tree-walking evaluator.
fn run_compiled(path: &Path, pretty: bool, disassemble: bool) -> anyhow::Result<()> {
    let file = path.display().to_string();
    report::start("Compiling", &file);
    let source = std::fs::read_to_string(path)?;
    let (program, errors) = parse(&source);
    if !errors.is_empty() {
        report::parser_errors(&file, &errors);
        anyhow::bail!("parsing {file} failed");
    }
    if pretty {
        print_program(&program);
    }

    let (chunk, compile_errors) = Compiler::new().compile_program(&program);
    if !compile_errors.is_empty() {
        for error in &compile_errors {
            report::fatal(&file, error);
        }
        anyhow::bail!("compiling {file} failed");
    }
    if disassemble {
        println!("{}", chunk.disassemble());
    }

    let mut vm = Vm::new();
    if let Err(error) = vm.run(&chunk) {
        report::fatal(&file, error);
        anyhow::bail!("running {file} failed");
    }
    report::finish();
    Ok(())
}

fn print_program(program: &[Statement]) {
    for statement in program {
        println!("{statement}");
    }
}

fn immediate_subdirectories(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    Ok(walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect())
}

fn idk_files_in(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.path().extension().is_some_and(|extension| extension == "idk"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
