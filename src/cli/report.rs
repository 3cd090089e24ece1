//! `ERROR:`-prefixed diagnostic printing, styled with `colored` the same way
//! `crate::parser` styles token/type names in its own error text (`.bold().cyan()`).

use colored::Colorize as _;

use crate::evaluator::value::Value;

/// Prints every accumulated parser error to stdout, one per line (spec.md §6.3: diagnostics are
/// human-readable `ERROR:`-prefixed stdout lines, not stderr).
pub fn parser_errors(file: &str, errors: &[String]) {
    for error in errors {
        println!("{} {file}: {error}", "ERROR:".bold().red());
    }
}

/// Prints an evaluator result if it's an error, and returns whether it was one.
pub fn eval_result(value: &Value) -> bool {
    if let Value::Error(error) = value {
        println!("{} {error}", "ERROR:".bold().red());
        true
    } else {
        false
    }
}

/// Prints a single fatal error not tied to a specific language-level diagnostic (host I/O,
/// missing package directories, and the like).
pub fn fatal(file: &str, message: impl std::fmt::Display) {
    println!("{} {file}: {message}", "ERROR:".bold().red());
}

/// Announces the start of a run mode, e.g. `"Running main.idk..."`.
pub fn start(action: &str, file: &str) {
    println!("{} {}...", action.bold().green(), file.bold());
}

/// Prints the closing `"Done!"` line a run mode leaves once it returns without error.
pub fn finish() {
    println!("{}", "Done!".bold().green());
}
