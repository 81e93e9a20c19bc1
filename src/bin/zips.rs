//! Streaming zipper: writes a zip file to stdout containing the files named
//! on the command line, and any files contained at any level in the named
//! directories.

use std::io::stdout;
use std::process::ExitCode;

use clap::Parser;
use zipflow::{Level, ZipStream};

#[derive(Parser, Debug)]
#[command(name = "zips", version)]
#[command(about = "Stream a zip archive of the named files and directories to stdout")]
struct Cli {
    /// Files and/or directories to zip
    #[arg(value_name = "PATH")]
    paths: Vec<String>,

    /// Deflate compression level
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = cli.level.map_or(Level::Default, Level::Precise);

    let mut zip = match ZipStream::new(stdout().lock(), level) {
        Ok(zip) => zip,
        Err(err) => {
            eprintln!("zips: {err}");
            return ExitCode::FAILURE;
        }
    };

    for path in &cli.paths {
        if zip.set_level(level).is_err() {
            break;
        }
        if zip.entry(path).is_err() {
            break;
        }
    }

    match zip.close() {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
