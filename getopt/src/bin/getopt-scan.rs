// Token dump runner: prints what the tokenizer makes of ARGS under SPEC.
//
//   getopt-scan [-p] SPEC [ARG]...
//
// One token per line on stdout. Scan errors go to stderr (unless SPEC starts
// with ':') and the exit status is 1. Put `--` before a SPEC that starts
// with '-'.

use std::process::ExitCode;

use getopt::{tokenize, Opt, Registry, ScanConfig};
use log::debug;

type BoxResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn run() -> BoxResult<ExitCode> {
    let mut reg = Registry::new().with_defaults(
        "getopt-scan",
        env!("CARGO_PKG_VERSION"),
        &["Print the tokens getopt produces for ARGS under SPEC."],
    )?;
    let posix = reg.flag(Opt::new("Stop at the first positional argument").names("p,posix"))?;

    // Our own options end at SPEC; everything after it is scanned verbatim.
    let argv: Vec<String> = std::env::args().collect();
    let rest = reg.try_parse(&argv, true)?;
    if reg.help_requested() {
        reg.print_help()?;
        return Ok(ExitCode::SUCCESS);
    }
    if reg.version_requested() {
        reg.print_version()?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some((spec, args)) = rest.split_first() else {
        eprintln!("usage: getopt-scan [-p] SPEC [ARG]...");
        return Ok(ExitCode::from(2));
    };
    let spec = if reg.get(&posix) == Some(&true) && !spec.starts_with('+') {
        format!("+{}", spec)
    } else {
        spec.clone()
    };
    debug!("spec {:?}, {} arguments", spec, args.len());

    let scan_args: Vec<&str> = std::iter::once("getopt-scan")
        .chain(args.iter().map(String::as_str))
        .collect();
    let (tokens, error) = tokenize(&scan_args, &spec);
    for token in &tokens {
        println!("{}", token);
    }

    match error {
        None => Ok(ExitCode::SUCCESS),
        Some(err) => {
            let quiet = ScanConfig::parse(&spec).map_or(false, |cfg| cfg.quiet);
            if !quiet {
                eprintln!("getopt-scan: {}", err);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("getopt-scan: {}", e);
            ExitCode::FAILURE
        }
    }
}
