use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

use crate::app::OutputMode;

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts a WAV file containing the baseband FM signal of an RD94 dropsonde and prints one line for each valid GPS fix it decodes.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts a WAV file containing the baseband FM signal of an RD94 dropsonde and prints one line for each valid GPS fix it decodes.

The WAV file may be 8-bit unsigned or 16-bit signed PCM at any sampling rate well above 4800 Hz; 44.1 kHz or 48 kHz is typical. Only the first channel is used. Record the discriminator output of your receiver, or the FM-demodulated audio of an SDR, without de-emphasis.

    rtl_fm -M fm -s 48k -f 403.0M \
        | sox -t raw -r 48k -e signed -b 16 -c 1 - -t wav - \
        | rd94dec

If no fixes are printed, try --invert. Some receivers flip the polarity of the signal.

With --rawbits, the Manchester-decoded bits of each frame are printed instead, one frame per line. Invalid bits are shown as "x". These lines may be decoded again with --rawin.

All times are in the GPS time scale, which is ahead of UTC by the accumulated leap seconds.
"#;

const ADVANCED: &str = "Advanced Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    ///
    /// A single -v adds the GPS week and the raw velocity fields to
    /// each fix. More increase the log level.
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print frame bits instead of fixes
    #[arg(short = 'r', long, conflicts_with = "rawbytes")]
    pub rawbits: bool,

    /// Print frame bytes, in hex, instead of fixes
    #[arg(short = 'R', long)]
    pub rawbytes: bool,

    /// Invert the signal polarity
    #[arg(short, long)]
    pub invert: bool,

    /// Read lines of frame bits instead of audio
    ///
    /// Each line holds the Manchester-decoded bits of one frame, as
    /// printed by --rawbits.
    #[arg(long)]
    pub rawin: bool,

    /// Interpolate zero crossings between samples
    ///
    /// May recover more frames at low sampling rates.
    #[arg(long)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub drift_compensation: bool,

    /// Decode a frame cut short by the end of the input
    ///
    /// Its missing bytes are zero. The fix is printed if the
    /// position arrived in full; velocity may be missing.
    #[arg(long)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub flush_partial: bool,

    /// Input file (or "-" for stdin)
    #[arg(default_value_t = STDIN_FILE.to_string())]
    pub file: String,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }

    /// What to print for each frame
    pub fn output_mode(&self) -> OutputMode {
        if self.rawbits {
            OutputMode::Bits
        } else if self.rawbytes {
            OutputMode::Bytes
        } else {
            OutputMode::Fix {
                verbose: self.verbose > 0,
            }
        }
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Io, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_output_mode() {
        let args = Args::try_parse_from(["rd94dec"]).expect("parse");
        assert!(args.input_is_stdin());
        assert_eq!(OutputMode::Fix { verbose: false }, args.output_mode());

        let args = Args::try_parse_from(["rd94dec", "-v", "in.wav"]).expect("parse");
        assert!(!args.input_is_stdin());
        assert_eq!(OutputMode::Fix { verbose: true }, args.output_mode());

        let args = Args::try_parse_from(["rd94dec", "-r", "--rawin"]).expect("parse");
        assert_eq!(OutputMode::Bits, args.output_mode());
        assert!(args.rawin);

        let args = Args::try_parse_from(["rd94dec", "-R", "-i"]).expect("parse");
        assert_eq!(OutputMode::Bytes, args.output_mode());
        assert!(args.invert);

        assert!(!args.flush_partial);

        let args = Args::try_parse_from(["rd94dec", "--flush-partial", "in.wav"]).expect("parse");
        assert!(args.flush_partial);

        assert!(Args::try_parse_from(["rd94dec", "-r", "-R"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let err: CliError = Args::try_parse_from(["rd94dec", "--help"])
            .expect_err("help")
            .into();
        assert_eq!(0, err.exit_code);

        let err: CliError = Args::try_parse_from(["rd94dec", "--bogus"])
            .expect_err("bad flag")
            .into();
        assert_eq!(1, err.exit_code);
    }
}
