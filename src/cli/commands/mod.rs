/// The `run` subcommand: `-f`/`-m`/`-c`/`-p` all live on it, the way `cabin-lang-cabin`'s
/// `run`/`set`/`new`/`add` subcommands each get their own module under `commands/`.
pub mod run;

use run::RunCommand;

#[enum_dispatch::enum_dispatch]
pub trait IdkCommand {
    /// Executes this subcommand.
    fn execute(self) -> anyhow::Result<()>;
}

#[derive(clap::Subcommand)]
#[enum_dispatch::enum_dispatch(IdkCommand)]
pub enum Command {
    Run(RunCommand),
}
