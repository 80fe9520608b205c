use anyhow::Result;
/// Logging helpers
///
/// Banner / summary lines shared by the orchestration layer
use std::fs;
use tracing::info;

/// Write the run header to the output log file
///
/// # Arguments
/// - `log_file_path`: log file path
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\nCosting run log - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// Log startup information
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 Costing automation starting");
    info!("📊 Max concurrent jobs: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// Log how many jobs were submitted and how they will be waved
pub fn log_jobs_loaded(total: usize, max_concurrent: usize) {
    info!("✓ {} job(s) submitted", total);
    info!("📋 Running in waves of {}", max_concurrent);
}

/// Log the start of a wave
///
/// # Arguments
/// - `wave_num`: 1-based wave number
/// - `total_waves`: number of waves
/// - `start` / `end`: 1-based job positions covered by this wave
/// - `total`: number of jobs
pub fn log_wave_start(wave_num: usize, total_waves: usize, start: usize, end: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 Starting wave {}/{}", wave_num, total_waves);
    info!("📄 Jobs {}-{} of {}", start, end, total);
    info!("{}", "=".repeat(60));
}

/// Log the end of a wave
pub fn log_wave_complete(wave_num: usize, success: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ Wave {} done: {}/{} succeeded", wave_num, success, total);
    info!("{}", "─".repeat(60));
}

/// Print final statistics
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("{}", "=".repeat(60));
    info!("📊 Run complete");
    info!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Succeeded: {}/{}", success, total);
    info!("❌ Failed: {}", failed);
    info!("{}", "=".repeat(60));
    info!("Log header written to: {}", log_file_path);
}

/// Truncate long text for log display
///
/// # Arguments
/// - `text`: original text
/// - `max_len`: maximum number of characters
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
