//! iconvg-disassemble - print an IconVG graphic's disassembly.
//!
//! With no argument, reads the graphic from standard input; with one
//! argument, reads from that file path. The disassembly goes to standard
//! output.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use thiserror::Error;

#[derive(Debug, Error)]
enum Error {
    #[error("usage: iconvg-disassemble [file]")]
    Usage,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to read standard input: {0}")]
    Stdin(io::Error),

    #[error(transparent)]
    Disassemble(#[from] iconvg::DisassembleError),
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().skip(1).collect();
    let src = match args.as_slice() {
        [] => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(Error::Stdin)?;
            buf
        }
        [path] => fs::read(path).map_err(|source| Error::Read {
            path: path.into(),
            source,
        })?,
        _ => return Err(Error::Usage),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    iconvg::disassemble(&mut out, &src)?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
