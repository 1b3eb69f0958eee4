//! `echo-diff`: print the delta between two echo documents.
//!
//! Usage:
//!   echo-diff [--text|--pretty|--binary] <from> <to>

use std::io::{self, Write};

use echo::cli::{run_diff, Invocation, Output};

const USAGE: &str = "usage: echo-diff [--text|--pretty|--binary] <from> <to>";

fn main() {
    echo::logging::init();
    let invocation = match Invocation::parse(std::env::args().skip(1), USAGE) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    match run_diff(&invocation) {
        Ok(mut bytes) => {
            if invocation.output != Output::Binary {
                bytes.push(b'\n');
            }
            if let Err(e) = io::stdout().lock().write_all(&bytes) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
