use std::path::PathBuf;

use pixlink_session::{BatchDriver, BatchItem, BatchReport, FsImageStore, ItemStatus};
use pixlink_transport::LinkEndpoint;
use serde::Serialize;

use crate::cmd::{install_ctrlc_handler, BatchArgs};
use crate::exit::{batch_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct BatchOutput<'a> {
    link: String,
    out_dir: PathBuf,
    total: usize,
    completed: usize,
    aborted_at: Option<usize>,
    items: &'a [BatchItem],
}

pub fn run(args: BatchArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = args.geometry.layout()?;
    let config = args.link.session_config()?;
    let (endpoint, link) = args.link.open()?;
    let cancel = install_ctrlc_handler()?;

    let store = FsImageStore::new(&args.out_dir);
    let mut driver = BatchDriver::new(link, store, layout, config).with_cancel(cancel);
    let result = driver.run(args.inputs.as_slice());
    // Release the link before reporting.
    drop(driver);

    match result {
        Ok(report) => {
            print_batch(&batch_output(&args, &endpoint, &report), format);
            Ok(SUCCESS)
        }
        Err(err) => {
            print_batch(&batch_output(&args, &endpoint, &err.report), format);
            Err(batch_error(err))
        }
    }
}

fn batch_output<'a>(
    args: &BatchArgs,
    endpoint: &LinkEndpoint,
    report: &'a BatchReport,
) -> BatchOutput<'a> {
    BatchOutput {
        link: endpoint.to_string(),
        out_dir: args.out_dir.clone(),
        total: args.inputs.len(),
        completed: report.completed(),
        aborted_at: report.aborted_at,
        items: &report.items,
    }
}

fn status_cells(status: &ItemStatus) -> (&'static str, String, String) {
    match status {
        ItemStatus::Completed {
            output,
            received,
            elapsed_ms,
            ..
        } => (
            "completed",
            output.display().to_string(),
            format!("{received} bytes in {elapsed_ms}ms"),
        ),
        ItemStatus::Failed { error } => ("failed", String::new(), error.clone()),
        ItemStatus::Skipped => ("skipped", String::new(), String::new()),
    }
}

fn print_batch(out: &BatchOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = table(vec!["#", "INPUT", "STATUS", "OUTPUT", "DETAIL"]);
            for (index, item) in out.items.iter().enumerate() {
                let (status, output, detail) = status_cells(&item.status);
                table.add_row(vec![
                    index.to_string(),
                    item.input.display().to_string(),
                    status.to_string(),
                    output,
                    detail,
                ]);
            }
            println!("{table}");
            println!("{}/{} completed", out.completed, out.total);
        }
        OutputFormat::Pretty => {
            println!("Batch over {}:", out.link);
            for item in out.items {
                let input = item.input.display();
                match &item.status {
                    ItemStatus::Completed {
                        output, discarded, ..
                    } => println!(
                        "  ok    {input} -> {} ({discarded} excess bytes dropped)",
                        output.display()
                    ),
                    ItemStatus::Failed { error } => println!("  FAIL  {input}: {error}"),
                    ItemStatus::Skipped => println!("  skip  {input}"),
                }
            }
            println!("{}/{} completed", out.completed, out.total);
        }
    }
}
