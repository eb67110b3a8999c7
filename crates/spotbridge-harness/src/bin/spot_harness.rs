use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write, stdin, stdout};
use std::process::ExitCode;

use clap::Parser;

use spotbridge_harness::{Args, HarnessError, run};

fn run_with_sinks(args: &Args) -> Result<(), HarnessError> {
    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(stdin().lock()),
    };
    let out: Box<dyn Write> = match &args.log {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout().lock()),
    };
    run(args, BufReader::new(input), out)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run_with_sinks(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spot-harness: {err}");
            ExitCode::FAILURE
        }
    }
}
