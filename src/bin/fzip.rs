//! Zip filter: streams a zip file on stdout with a single entry holding the
//! data read from stdin. The entry name is given on the command line.

use std::io::{stdin, stdout, ErrorKind, Read};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use zipflow::{EntryMeta, Level, ZipStream};

#[derive(Parser, Debug)]
#[command(name = "fzip", version)]
#[command(about = "Read stdin, write a single-entry zip stream to stdout")]
#[command(after_help = "Examples:\n  \
  fzip name < infile > outfile\n  \
  inprog | fzip name | outprog")]
struct Cli {
    /// Name of the zip file entry
    #[arg(value_name = "NAME")]
    name: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |since| since.as_secs() as u32);

    let mut zip = match ZipStream::new(stdout().lock(), Level::Default) {
        Ok(zip) => zip,
        Err(err) => {
            eprintln!("fzip: {err}");
            return ExitCode::FAILURE;
        }
    };
    let meta = EntryMeta::Unix {
        mode: 0o644,
        atime: now,
        mtime: now,
    };
    if zip.meta(&cli.name, meta).is_err() {
        return ExitCode::FAILURE;
    }

    let mut input = stdin().lock();
    let mut buf = [0u8; 32768];
    loop {
        match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if zip.data(&buf[..n], false).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                eprintln!("fzip: read error on stdin: {err}");
                break;
            }
        }
    }
    let _ = zip.data(&[], true);

    match zip.close() {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
