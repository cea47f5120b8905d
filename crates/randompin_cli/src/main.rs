//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `randompin_core` linkage.
//! - Let a developer check target detection and hook plans off-device.
//!
//! Usage:
//! - `randompin_cli` prints ping and version.
//! - `randompin_cli classify <data_dir>` prints the detected process.
//! - `randompin_cli plan <sdk>` prints the SystemUI hook plan.

use randompin_core::{classify_data_dir, HookPlan, SYSTEMUI_PACKAGE};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            println!("randompin_core ping={}", randompin_core::ping());
            println!("randompin_core version={}", randompin_core::core_version());
            ExitCode::SUCCESS
        }
        Some("classify") => match args.get(1) {
            Some(data_dir) => {
                let target = classify_data_dir(Some(data_dir.as_str()), SYSTEMUI_PACKAGE);
                println!("target={}", target.as_str());
                ExitCode::SUCCESS
            }
            None => usage(),
        },
        Some("plan") => match args.get(1).and_then(|raw| raw.parse::<i32>().ok()) {
            Some(sdk) => {
                let plan = HookPlan::for_systemui(sdk);
                for target in &plan.targets {
                    println!(
                        "{}#{} phase={:?} purpose={:?} optional={}",
                        target.class_name,
                        target.method.unwrap_or("<probe>"),
                        target.phase,
                        target.purpose,
                        target.optional
                    );
                }
                ExitCode::SUCCESS
            }
            None => usage(),
        },
        Some(_) => usage(),
    }
}

fn usage() -> ExitCode {
    eprintln!("usage: randompin_cli [classify <data_dir> | plan <sdk>]");
    ExitCode::from(2)
}
