//! Runs an LS-8 program.
//!
//! Usage: `ls8 <program.ls8> [--trace]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;

use ls8::{loader, Core};

#[derive(Parser, Debug)]
#[command(name = "ls8")]
#[command(about = "Load an LS-8 program and run it until HLT")]
struct Args {
    /// Program source: one binary byte per line, `#` starts a comment
    program: PathBuf,

    /// Log a TRACE line (PC, next three bytes, registers) before each instruction
    #[arg(long, short)]
    trace: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    ls8::init_logging(args.trace);

    if let Err(e) = run(&args) {
        error!(target: ls8::REPORT_TARGET, "error in {}: {}", e.subsystem(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> ls8::Result<()> {
    let image = loader::load_file(&args.program)?;
    let mut core = Core::new();
    core.set_trace(args.trace);
    core.load_image(&image)?;
    core.run()
}
