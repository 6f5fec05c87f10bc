use std::io;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, LevelFilter};

use rd94::Rd94ReceiverBuilder;

mod app;
mod cli;
mod wav;

use cli::{Args, CliError};
use wav::WavReader;

fn main() {
    match rd94dec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn rd94dec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let inbuf = file_setup(&args, stdin_handle)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mode = args.output_mode();

    if args.rawin {
        app::run_bitstream(mode, inbuf, &mut out)?;
    } else {
        let wav = WavReader::new(inbuf)
            .with_context(|| format!("unable to read WAV header from \"{}\"", args.file))?;
        let format = *wav.format();
        info!(
            "sample rate: {} Hz, {} bits, {} channel(s)",
            format.sample_rate, format.bits_per_sample, format.channels
        );

        let mut rx = Rd94ReceiverBuilder::new(format.sample_rate)
            .with_drift_compensation(args.drift_compensation)
            .with_inverted_polarity(args.invert)
            .build();

        app::run_audio(mode, &mut rx, wav.samples(), args.flush_partial, &mut out)?;
    }

    Ok(())
}

fn log_setup(args: &Args) {
    if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("rd94", log_filter)
            .filter_module("rd94dec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("RD94 decoder reading standard input");
        if args.rawin || !is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read audio samples from a terminal.

Pipe a WAV file from sox, rtl_fm, or similar into this program,
or name the file to read."
            ))
        }
    } else {
        info!("RD94 decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("unable to open \"{}\"", args.file))?,
        )))
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
