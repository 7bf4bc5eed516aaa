use std::collections::BTreeMap;

use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

/// Environment variables that feed CLI defaults.
const ENV_VARS: [&str; 8] = [
    "PIXLINK_LINK",
    "PIXLINK_BAUD",
    "PIXLINK_SETTLE_DELAY",
    "PIXLINK_POLL_DEADLINE",
    "PIXLINK_WRITE_TIMEOUT",
    "PIXLINK_TARGET",
    "PIXLINK_PADDED",
    "PIXLINK_LOG_LEVEL",
];

#[derive(Serialize)]
struct PlatformInfo {
    os: &'static str,
    arch: &'static str,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: &'static str,
    target: String,
    git_hash: &'static str,
    platform: PlatformInfo,
    features: Vec<&'static str>,
    environment: BTreeMap<&'static str, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION"),
        target: target_triple(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        platform: PlatformInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        },
        features: active_features(),
        environment: ENV_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect(),
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("PIXLINK_BUILD_TARGET") {
        return target.to_string();
    }
    format!("{}-unknown-{}", std::env::consts::ARCH, std::env::consts::OS)
}

fn active_features() -> Vec<&'static str> {
    let mut features = vec!["cli"];
    if cfg!(feature = "async") {
        features.push("async");
    }
    features
}

fn print_envinfo(out: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = table(vec!["KEY", "VALUE"]);
            table.add_row(vec!["version", out.version]);
            table.add_row(vec!["target", out.target.as_str()]);
            table.add_row(vec!["git_hash", out.git_hash]);
            for (name, value) in &out.environment {
                table.add_row(vec![*name, value.as_deref().unwrap_or("-")]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("pixlink {} ({})", out.version, out.target);
            println!("  platform: {}/{}", out.platform.os, out.platform.arch);
            println!("  features: {}", out.features.join(", "));
            for (name, value) in &out.environment {
                println!("  {name}: {}", value.as_deref().unwrap_or("<unset>"));
            }
        }
    }
}
