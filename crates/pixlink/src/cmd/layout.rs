use pixlink_codec::{Geometry, Layout};
use serde::Serialize;

use crate::cmd::LayoutArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct LayoutOutput {
    target: Geometry,
    padded: Geometry,
    offset_x: u32,
    offset_y: u32,
    frame_len: usize,
}

impl From<&Layout> for LayoutOutput {
    fn from(layout: &Layout) -> Self {
        let (offset_x, offset_y) = layout.offset();
        Self {
            target: layout.target(),
            padded: layout.padded(),
            offset_x,
            offset_y,
            frame_len: layout.frame_len(),
        }
    }
}

pub fn run(args: LayoutArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = args.geometry.layout()?;
    print_layout(&LayoutOutput::from(&layout), format);
    Ok(SUCCESS)
}

fn print_layout(out: &LayoutOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = table(vec!["TARGET", "PADDED", "OFFSET", "FRAME BYTES"]);
            table.add_row(vec![
                out.target.to_string(),
                out.padded.to_string(),
                format!("{},{}", out.offset_x, out.offset_y),
                out.frame_len.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Layout:");
            println!("  Target:  {}", out.target);
            println!("  Padded:  {}", out.padded);
            println!("  Offset:  x={} y={}", out.offset_x, out.offset_y);
            println!("  Frame:   {} bytes each way", out.frame_len);
        }
    }
}
