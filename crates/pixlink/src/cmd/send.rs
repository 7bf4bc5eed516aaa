use std::path::{Path, PathBuf};

use pixlink_codec::{image, prepare, Geometry, Layout};
use pixlink_session::{exchange, ExchangeStats, FsImageStore};
use pixlink_transport::LinkEndpoint;
use serde::Serialize;

use crate::cmd::{install_ctrlc_handler, SendArgs};
use crate::exit::{image_error, session_error, CliResult, SUCCESS};
use crate::output::{millis, print_json, table, OutputFormat};

#[derive(Serialize)]
struct SendOutput {
    input: PathBuf,
    output: PathBuf,
    link: String,
    target: Geometry,
    padded: Geometry,
    sent: usize,
    received: usize,
    discarded: usize,
    reads: usize,
    waited_ms: f64,
    elapsed_ms: f64,
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = args.geometry.layout()?;
    let config = args.link.session_config()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    let source = image::open(&args.input).map_err(|err| {
        image_error(&format!("failed to load {}", args.input.display()), err)
    })?;
    let buffer = prepare(&source, &layout);

    let (endpoint, mut link) = args.link.open()?;
    let cancel = install_ctrlc_handler()?;
    tracing::info!(
        input = %args.input.display(),
        link = %endpoint,
        target = %layout.target(),
        padded = %layout.padded(),
        "sending image"
    );

    let done = exchange(link.as_mut(), &buffer, &layout, &config, Some(&cancel))
        .map_err(|err| session_error("exchange failed", err))?;
    drop(link);

    done.image
        .save(&output)
        .map_err(|err| image_error(&format!("failed to save {}", output.display()), err))?;

    let out = SendOutput::new(args.input, output, &endpoint, &layout, &done.stats);
    print_send(&out, format);
    Ok(SUCCESS)
}

/// `<input dir>/<stem>_processed.png`, matching the batch naming.
fn default_output(input: &Path) -> PathBuf {
    let dir = input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    FsImageStore::new(dir).output_path_for(input)
}

impl SendOutput {
    fn new(
        input: PathBuf,
        output: PathBuf,
        endpoint: &LinkEndpoint,
        layout: &Layout,
        stats: &ExchangeStats,
    ) -> Self {
        Self {
            input,
            output,
            link: endpoint.to_string(),
            target: layout.target(),
            padded: layout.padded(),
            sent: stats.sent,
            received: stats.received,
            discarded: stats.discarded,
            reads: stats.reads,
            waited_ms: millis(stats.waited),
            elapsed_ms: millis(stats.elapsed),
        }
    }
}

fn print_send(out: &SendOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = table(vec![
                "INPUT", "OUTPUT", "SENT", "RECEIVED", "DISCARDED", "ELAPSED",
            ]);
            table.add_row(vec![
                out.input.display().to_string(),
                out.output.display().to_string(),
                out.sent.to_string(),
                out.received.to_string(),
                out.discarded.to_string(),
                format!("{:.2}ms", out.elapsed_ms),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Exchange:");
            println!("  Input:      {}", out.input.display());
            println!("  Output:     {}", out.output.display());
            println!("  Link:       {}", out.link);
            println!("  Layout:     {} in {}", out.target, out.padded);
            println!("  Sent:       {} bytes", out.sent);
            println!(
                "  Received:   {} bytes in {} reads ({} discarded)",
                out.received, out.reads, out.discarded
            );
            println!("  Polling:    {:.2}ms", out.waited_ms);
            println!("  Total:      {:.2}ms", out.elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output(Path::new("/data/frames/lena.jpg")),
            PathBuf::from("/data/frames/lena_processed.png")
        );
    }

    #[test]
    fn default_output_for_bare_file_name() {
        assert_eq!(
            default_output(Path::new("scan.png")),
            PathBuf::from("./scan_processed.png")
        );
    }

    #[test]
    fn stats_carry_into_output() {
        let out = SendOutput::new(
            PathBuf::from("in.png"),
            PathBuf::from("in_processed.png"),
            &LinkEndpoint::Device(PathBuf::from("/dev/ttyUSB0")),
            &Layout::default(),
            &ExchangeStats {
                sent: 65536,
                received: 65536,
                discarded: 4,
                reads: 9,
                waited: Duration::from_millis(12),
                elapsed: Duration::from_micros(10_012_344),
            },
        );
        assert_eq!(out.link, "/dev/ttyUSB0");
        assert_eq!(out.padded, Geometry::new(256, 256));
        assert_eq!(out.received, 65536);
        assert_eq!(out.discarded, 4);
        assert_eq!(out.elapsed_ms, 10012.34);
    }
}
