//! The default mode: a line-at-a-time read-eval-print loop over one persistent root scope, so
//! declarations made on one line stay visible on the next (spec.md §6.3's supplemented REPL
//! behavior, grounded on `cmd/idk/repl/repl.go`'s long-lived scope).

use std::io::Write as _;

use colored::Colorize as _;

use crate::cli::report;
use crate::evaluator::value::Value;
use crate::evaluator::Evaluator;
use crate::parser::parse;
use crate::scope::Scope;

pub fn run() -> anyhow::Result<()> {
    let scope = Scope::new_root();
    let mut evaluator = Evaluator::new("<repl>");
    let stdin = std::io::stdin();

    loop {
        print!("{} ", ">>".bold().cyan());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        let (program, errors) = parse(&line);
        if !errors.is_empty() {
            report::parser_errors("<repl>", &errors);
            continue;
        }

        let result = evaluator.eval_program(&program, &scope);
        if !report::eval_result(&result) && !matches!(result, Value::Null) {
            println!("{result}");
        }
    }
}
