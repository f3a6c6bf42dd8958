use std::process::ExitCode;

use clap::Parser;

/// A first-order sequent-calculus theorem prover.
///
/// With no script argument, runs an interactive REPL reading commands from standard input. With a
/// script argument, replays its lines as commands (`-` also means standard input).
#[derive(Parser)]
#[command(name = "entail", version, about)]
struct Cli {
    /// A file of commands to replay, or `-` for standard input.
    script: Option<String>,

    /// Print each sequent visited during proof search, plus the substitution that closes a
    /// branch.
    #[arg(long)]
    trace: bool,

    /// Abandon a proof search after this many dequeues, reporting `not provable.` instead of
    /// running forever on an essentially-quantified non-theorem.
    #[arg(long, default_value_t = 100_000)]
    max_steps: u64,
}

fn main() -> ExitCode {
    entail::install_panic_hook();
    let cli = Cli::parse();
    if entail::shell::main(cli.script, cli.trace, cli.max_steps) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
