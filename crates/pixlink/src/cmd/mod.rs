use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use pixlink_codec::{Geometry, Layout};
use pixlink_session::{CancelFlag, SessionConfig, WriteMode};
use pixlink_transport::{LinkEndpoint, LinkTransport};

use crate::exit::{codec_error, transport_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod batch;
pub mod envinfo;
pub mod layout;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one image to the remote unit and save its reply.
    Send(SendArgs),
    /// Process several images over one link, stopping at the first failure.
    Batch(BatchArgs),
    /// Show the resolved target/padded layout.
    Layout(LayoutArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Batch(args) => batch::run(args, format),
        Command::Layout(args) => layout::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum WriteModeArg {
    Bulk,
    PerByte,
}

impl From<WriteModeArg> for WriteMode {
    fn from(arg: WriteModeArg) -> Self {
        match arg {
            WriteModeArg::Bulk => WriteMode::Bulk,
            WriteModeArg::PerByte => WriteMode::PerByte,
        }
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Link endpoint: a device path (e.g. /dev/ttyUSB0) or unix:<socket path>.
    #[arg(long, env = "PIXLINK_LINK")]
    pub link: String,
    /// Wait after sending before polling for the reply (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s", env = "PIXLINK_SETTLE_DELAY")]
    pub settle_delay: String,
    /// Give up on the reply this long after polling starts.
    #[arg(long, default_value = "20s", env = "PIXLINK_POLL_DEADLINE")]
    pub poll_deadline: String,
    /// Give up when the link refuses outbound bytes for this long.
    #[arg(long, default_value = "10s", env = "PIXLINK_WRITE_TIMEOUT")]
    pub write_timeout: String,
    /// Set the line speed of a serial device (e.g. 115200). Kept as-is when omitted.
    #[arg(long, env = "PIXLINK_BAUD")]
    pub baud: Option<u32>,
    /// Pause after an empty read; 0 re-polls immediately.
    #[arg(long, default_value = "0ms")]
    pub poll_interval: String,
    /// Push the frame in one write or one byte per write.
    #[arg(long, value_enum, default_value = "bulk")]
    pub write_mode: WriteModeArg,
}

impl LinkArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let poll_deadline = parse_duration(&self.poll_deadline)?;
        if poll_deadline.is_zero() {
            return Err(CliError::new(USAGE, "poll deadline must be greater than zero"));
        }
        let write_timeout = parse_duration(&self.write_timeout)?;
        if write_timeout.is_zero() {
            return Err(CliError::new(USAGE, "write timeout must be greater than zero"));
        }
        Ok(SessionConfig {
            write_timeout,
            settle_delay: parse_duration(&self.settle_delay)?,
            poll_deadline,
            poll_interval: parse_duration(&self.poll_interval)?,
            write_mode: self.write_mode.into(),
            ..SessionConfig::default()
        })
    }

    pub fn endpoint(&self) -> CliResult<LinkEndpoint> {
        self.link
            .parse::<LinkEndpoint>()
            .map_err(|err| transport_error("invalid --link", err))
    }

    pub fn open(&self) -> CliResult<(LinkEndpoint, Box<dyn LinkTransport + Send>)> {
        let endpoint = self.endpoint()?;
        let link = endpoint
            .open_with_baud(self.baud)
            .map_err(|err| transport_error(&format!("failed to open {endpoint}"), err))?;
        Ok((endpoint, link))
    }
}

#[derive(Args, Debug)]
pub struct GeometryArgs {
    /// Content geometry the remote unit processes (WIDTHxHEIGHT).
    #[arg(long, default_value = "254x254", env = "PIXLINK_TARGET")]
    pub target: String,
    /// Transmitted canvas geometry (WIDTHxHEIGHT), at least the target.
    #[arg(long, default_value = "256x256", env = "PIXLINK_PADDED")]
    pub padded: String,
}

impl GeometryArgs {
    pub fn layout(&self) -> CliResult<Layout> {
        let target: Geometry = self
            .target
            .parse()
            .map_err(|err| codec_error("invalid --target", err))?;
        let padded: Geometry = self
            .padded
            .parse()
            .map_err(|err| codec_error("invalid --padded", err))?;
        Layout::new(target, padded).map_err(|err| codec_error("invalid layout", err))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Image to send (PNG or JPEG).
    pub input: PathBuf,
    /// Where to save the reply. Default: <input stem>_processed.png next to the input.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub geometry: GeometryArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Images to send, in order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory for <stem>_processed.png results.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub geometry: GeometryArgs,
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

/// Accepts `500ms`, `10s`, or bare seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Ctrl-C cancels the exchange in flight instead of killing the process.
pub fn install_ctrlc_handler() -> CliResult<CancelFlag> {
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        handler_flag.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(cancel)
}
