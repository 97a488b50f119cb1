use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::{Arg, Command};
use log::{LevelFilter, info};

use lispy::{Error, evaluate, new_root_environment, parse_all, render};

// Evaluates every top-level expression in `input`, printing each non-void
// result. Stops at the first error, which is reported against `input`.
fn run(name: &str, input: &str) -> io::Result<bool> {
    let mut env = new_root_environment();
    let outcome = parse_all(input).map_err(Error::from).and_then(|terms| {
        for term in &terms {
            let value = evaluate(term, &mut env)?;
            if !value.is_void() {
                println!("{}", render(&value));
            }
        }
        Ok(())
    });
    match outcome {
        Ok(()) => Ok(true),
        Err(e) => {
            e.pretty_print(name, input)?;
            Ok(false)
        }
    }
}

fn main() -> io::Result<ExitCode> {
    // Setup logging.
    env_logger::Builder::from_default_env()
        .filter_module("rustyline", LevelFilter::Warn)
        .init();

    let matches = Command::new("lispy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Evaluates S-expressions from a file, the command line or stdin")
        .arg(
            Arg::new("script")
                .help("File of expressions to evaluate in order")
                .index(1),
        )
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .takes_value(true)
                .value_name("EXPR")
                .conflicts_with("script")
                .help("Evaluate EXPR instead of reading a file"),
        )
        .get_matches();

    let (name, input) = if let Some(expr) = matches.value_of("eval") {
        ("<eval>".to_string(), expr.to_string())
    } else if let Some(path) = matches.value_of("script") {
        (path.to_string(), fs::read_to_string(path)?)
    } else {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        ("<stdin>".to_string(), input)
    };

    info!("evaluating {} ({} bytes)", name, input.len());
    Ok(if run(&name, &input)? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
