//! CSV persistence of harvested postings
//!
//! One row per posting with a fixed header. Every field is a plain string,
//! so missing values are written as empty cells.

use crate::crawler::Posting;
use crate::HarvestError;
use std::io::Write;
use std::path::Path;

/// Writes postings to a CSV file, creating parent directories as needed
///
/// # Arguments
///
/// * `postings` - The postings to write, in any order
/// * `output_path` - Destination file; overwritten if it exists
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the file
/// * `Err(HarvestError)` - Failed to create directories or write rows
pub fn write_postings_csv(postings: &[Posting], output_path: &Path) -> Result<(), HarvestError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(output_path)?;
    write_postings(postings, file)?;

    tracing::info!(
        "Successfully saved {} postings to {}",
        postings.len(),
        output_path.display()
    );
    Ok(())
}

/// Writes the header and one row per posting to any writer
///
/// The header is written even when there are no postings.
pub fn write_postings<W: Write>(postings: &[Posting], writer: W) -> Result<(), HarvestError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(Posting::COLUMNS)?;
    for posting in postings {
        csv_writer.serialize(posting)?;
    }
    csv_writer.flush()?;

    Ok(())
}
