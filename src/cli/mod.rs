//! CLI tooling (spec §6.3): the `-f`/`-m`/`-c`/`-p` run modes, the default REPL, and the
//! `colored` diagnostic printer shared by both.

/// The subcommands module, which handles the compiler's one subcommand (`run`) and its flags.
pub mod commands;

/// The REPL: a persistent-scope read-eval-print loop, started when no subcommand is given.
pub mod repl;

/// Shared `colored`, `ERROR:`-prefixed diagnostic printing for parser errors, eval errors, and
/// compile/VM errors.
pub mod report;
