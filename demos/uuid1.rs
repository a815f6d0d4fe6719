//! Simple command that prints one or '-n count' UUIDv1 strings, optionally for a fixed '-t
//! unix_ts_ms', or decodes '-d uuid' back to its Unix timestamp in milliseconds

use std::{env, io, io::Write, process::ExitCode};

#[derive(Debug, Default)]
struct Options {
    count: Option<usize>,
    timestamp: Option<u64>,
    decode: Option<String>,
}

fn main() -> io::Result<ExitCode> {
    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-n count] [-t unix_ts_ms] | -d uuid",
                    program.as_deref().unwrap_or("uuid1")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    if let Some(text) = opts.decode {
        match text.parse::<timeuuid1::Uuid>() {
            Ok(uuid) if uuid.version() == Some(1) => writeln!(buf, "{}", uuid.to_unix_ts_ms())?,
            _ => {
                eprintln!("Error: not a UUIDv1 string: '{}'", text);
                return Ok(ExitCode::FAILURE);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let generator = timeuuid1::global();
    for _ in 0..opts.count.unwrap_or(1) {
        let uuid = match opts.timestamp {
            Some(ts) => match generator.generate_core(ts) {
                Ok(uuid) => uuid,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    return Ok(ExitCode::FAILURE);
                }
            },
            None => generator.generate(),
        };
        writeln!(buf, "{}", uuid)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    while let Some(arg) = args.next() {
        let name = match arg.as_str() {
            "-n" if opts.count.is_some() => return Err("option 'n' given more than once".to_owned()),
            "-t" if opts.timestamp.is_some() => {
                return Err("option 't' given more than once".to_owned())
            }
            "-d" if opts.decode.is_some() => return Err("option 'd' given more than once".to_owned()),
            "-n" | "-t" | "-d" => &arg[1..],
            _ => return Err(format!("unrecognized argument '{}'", arg)),
        };
        let Some(value) = args.next() else {
            return Err(format!("argument to option '{}' missing", name));
        };
        match name {
            "n" => {
                let Ok(c) = value.parse() else {
                    return Err(format!("invalid argument to option 'n': '{}'", value));
                };
                opts.count.replace(c);
            }
            "t" => {
                let Ok(t) = value.parse() else {
                    return Err(format!("invalid argument to option 't': '{}'", value));
                };
                opts.timestamp.replace(t);
            }
            _ => {
                opts.decode.replace(value);
            }
        }
    }
    if opts.decode.is_some() && (opts.count.is_some() || opts.timestamp.is_some()) {
        return Err("option 'd' cannot be combined with 'n' or 't'".to_owned());
    }
    Ok(opts)
}
