use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::validation::SetReport;

/// Write the collected set reports as pretty JSON, one machine-readable
/// record alongside the console lines.
pub fn write_report(path: &Path, sets: &[SetReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(sets)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}
