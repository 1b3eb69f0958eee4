//! `echo-patch`: apply a delta document to a base document.
//!
//! Usage:
//!   echo-patch [--text|--pretty|--binary] <base> <delta>

use std::io::{self, Write};

use echo::cli::{run_patch, Invocation, Output};

const USAGE: &str = "usage: echo-patch [--text|--pretty|--binary] <base> <delta>";

fn main() {
    echo::logging::init();
    let invocation = match Invocation::parse(std::env::args().skip(1), USAGE) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    match run_patch(&invocation) {
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
