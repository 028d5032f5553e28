// Reading the precinct-level exports.

use std::io::{BufRead, BufReader, Read};

use csv::StringRecord;
use log::{debug, info};

use crate::builder::SnapshotBuilder;
use crate::config::*;

pub const CONTEST_COLUMN: &str = "Contest Name";
pub const PRECINCT_COLUMN: &str = "Precinct";
pub const CANDIDATE_COLUMN: &str = "Candidate Name";
pub const VOTES_COLUMN: &str = "Votes";

/// Builds a snapshot out of raw rows.
///
/// A single bad row rejects the whole snapshot.
pub fn parse_snapshot(
    records: &[RawCsvRecord],
    generated_at: Timestamp,
) -> Result<Snapshot, TallyErrors> {
    let mut builder = SnapshotBuilder::new(generated_at);
    for record in records.iter() {
        builder.add_record(record)?;
    }
    let snapshot = builder.build();
    info!(
        "parse_snapshot: {} rows, {} contests, generated at {}",
        snapshot.rows().len(),
        snapshot.contests().len(),
        generated_at
    );
    Ok(snapshot)
}

/// Reads and parses a full export file.
pub fn read_export<R: Read>(reader: R, generated_at: Timestamp) -> Result<Snapshot, TallyErrors> {
    let records = read_records(reader)?;
    parse_snapshot(&records, generated_at)
}

/// Reads the raw rows of an export.
///
/// The exports start with a decorative line before the header: exactly one line
/// is dropped before looking for the header.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawCsvRecord>, TallyErrors> {
    let mut buf = BufReader::new(reader);
    let mut first_line = String::new();
    buf.read_line(&mut first_line)
        .map_err(|e| TallyErrors::UnreadableExport {
            lineno: Some(1),
            message: e.to_string(),
        })?;
    debug!("read_records: skipping first line {:?}", first_line.trim_end());

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(buf);
    let header = rdr
        .headers()
        .map_err(|e| csv_error(&e))?
        .clone();
    let columns = Columns::locate(&header)?;
    debug!("read_records: header {:?} columns {:?}", header, columns);

    let mut res: Vec<RawCsvRecord> = Vec::new();
    for line_r in rdr.records() {
        let line = line_r.map_err(|e| csv_error(&e))?;
        // The decorative line is not seen by the CSV reader.
        let lineno = line.position().map(|p| p.line() + 1).unwrap_or(0);
        if line.iter().all(|field| field.trim().is_empty()) {
            debug!("read_records: skipping empty line {}", lineno);
            continue;
        }
        res.push(columns.extract(&line, lineno)?);
    }
    Ok(res)
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    contest: usize,
    precinct: usize,
    candidate: usize,
    votes: usize,
}

impl Columns {
    fn locate(header: &StringRecord) -> Result<Columns, TallyErrors> {
        let find = |name: &str| -> Result<usize, TallyErrors> {
            header
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| TallyErrors::MissingColumn {
                    column: name.to_string(),
                })
        };
        Ok(Columns {
            contest: find(CONTEST_COLUMN)?,
            precinct: find(PRECINCT_COLUMN)?,
            candidate: find(CANDIDATE_COLUMN)?,
            votes: find(VOTES_COLUMN)?,
        })
    }

    fn extract(&self, line: &StringRecord, lineno: u64) -> Result<RawCsvRecord, TallyErrors> {
        let get = |idx: usize| -> Result<String, TallyErrors> {
            line.get(idx)
                .map(|s| s.to_string())
                .ok_or_else(|| TallyErrors::MalformedRow {
                    lineno,
                    votes: "".to_string(),
                })
        };
        Ok(RawCsvRecord {
            lineno,
            contest: get(self.contest)?,
            precinct: get(self.precinct)?,
            candidate: get(self.candidate)?,
            votes: get(self.votes)?,
        })
    }
}

fn csv_error(e: &csv::Error) -> TallyErrors {
    TallyErrors::UnreadableExport {
        lineno: e.position().map(|p| p.line() + 1),
        message: e.to_string(),
    }
}
