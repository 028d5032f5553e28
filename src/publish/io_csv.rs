// Primitives for reading the precinct exports.

use crate::publish::*;

use std::fs::File;

pub fn read_precinct_export(path: &str, generated_at: Timestamp) -> BuildResult<Snapshot> {
    info!("Attempting to read precinct export {:?}", path);
    let file = File::open(path).context(OpeningFileSnafu { path })?;
    let snapshot = read_export(file, generated_at).context(TallySnafu { path })?;
    debug!(
        "read_precinct_export: {:?}: {} rows, {} contests",
        path,
        snapshot.rows().len(),
        snapshot.contests().len()
    );
    Ok(snapshot)
}
