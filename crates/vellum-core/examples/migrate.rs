//! Upgrade saved documents to the current schema version in place.
//!
//! Usage: `cargo run -p vellum-core --example migrate -- a.json b.json`
//! With no arguments, every `.json` file under `crates/vellum-core/tests/fixtures`
//! is checked but not rewritten.

use std::env;
use std::fs;
use std::path::PathBuf;
use vellum_core::{CURRENT_VERSION, SerializeOptions, parse_document_text, serialize_document};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let (paths, write): (Vec<PathBuf>, bool) = if args.len() > 1 {
        (args[1..].iter().map(PathBuf::from).collect(), true)
    } else {
        let mut paths = Vec::new();
        if let Ok(entries) = fs::read_dir("crates/vellum-core/tests/fixtures") {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "json") {
                    paths.push(path);
                }
            }
        }
        paths.sort();
        (paths, false)
    };

    let mut migrated = 0;
    let mut failed = 0;

    for path in &paths {
        let input = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("SKIP {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        let outcome = match parse_document_text(&input) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("LOAD ERROR {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };
        for warning in &outcome.warnings {
            println!("  warning: {warning}");
        }

        let options = SerializeOptions {
            active_page_id: None,
            pretty: true,
        };
        let output = match serialize_document(&outcome.document, &options) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("SAVE ERROR {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        if write {
            if let Err(e) = fs::write(path, output) {
                eprintln!("ERROR writing {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        }
        migrated += 1;
        println!("✓ {} (v{CURRENT_VERSION})", path.display());
    }

    println!("\nMigrated: {migrated}, Failed: {failed}");
}
