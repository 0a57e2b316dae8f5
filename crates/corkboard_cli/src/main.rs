//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `corkboard_core` linkage.
//! - Run an in-memory schema self-check so packaging problems surface before
//!   any real database is touched.

use corkboard_core::db::{migrations, open_db_in_memory};

fn main() {
    println!("corkboard_core ping={}", corkboard_core::ping());
    println!("corkboard_core version={}", corkboard_core::core_version());

    if let Err(err) = open_db_in_memory() {
        eprintln!("schema self-check failed: {err}");
        std::process::exit(1);
    }
    println!(
        "schema self-check ok (schema_version={})",
        migrations::latest_version()
    );
}
