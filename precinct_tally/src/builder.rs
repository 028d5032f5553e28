pub use crate::config::*;

use std::collections::HashMap;

use log::debug;

use crate::precinct_code::PrecinctCode;

/// A builder for assembling a snapshot row by row.
///
/// Rows that share the same contest, precinct and candidate are summed into
/// the first one.
///
/// ```
/// use precinct_tally::builder::SnapshotBuilder;
/// # use precinct_tally::TallyErrors;
///
/// let generated_at = "2020-11-03T20:00:00-08:00".parse().unwrap();
/// let mut builder = SnapshotBuilder::new(generated_at);
///
/// builder.add_votes("Mayor", "1234-567890-DOWNTOWN", "Anna", 12)?;
/// builder.add_votes("Mayor", "1234-567890-DOWNTOWN", "Bob", 7)?;
///
/// let snapshot = builder.build();
/// assert_eq!(snapshot.rows().len(), 2);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct SnapshotBuilder {
    generated_at: Timestamp,
    rows: Vec<PrecinctResultRow>,
    positions: HashMap<(String, String, String), usize>,
}

impl SnapshotBuilder {
    pub fn new(generated_at: Timestamp) -> SnapshotBuilder {
        SnapshotBuilder {
            generated_at,
            rows: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Converts and adds one raw line of an export.
    pub fn add_record(&mut self, record: &RawCsvRecord) -> Result<(), TallyErrors> {
        let votes = parse_votes(&record.votes).ok_or_else(|| TallyErrors::MalformedRow {
            lineno: record.lineno,
            votes: record.votes.clone(),
        })?;
        let code = PrecinctCode::parse(&record.precinct).ok_or_else(|| {
            TallyErrors::MalformedPrecinctCode {
                lineno: record.lineno,
                code: record.precinct.clone(),
            }
        })?;
        self.add_row(PrecinctResultRow {
            contest: record.contest.clone(),
            precinct_code: code.precinct_id,
            consolidation_name: code.consolidation,
            candidate: record.candidate.clone(),
            votes,
        });
        Ok(())
    }

    /// Adds the votes of a candidate, given the compound precinct code.
    pub fn add_votes(
        &mut self,
        contest: &str,
        precinct: &str,
        candidate: &str,
        votes: u64,
    ) -> Result<(), TallyErrors> {
        let code = PrecinctCode::parse(precinct).ok_or_else(|| {
            TallyErrors::MalformedPrecinctCode {
                lineno: 0,
                code: precinct.to_string(),
            }
        })?;
        self.add_row(PrecinctResultRow {
            contest: contest.to_string(),
            precinct_code: code.precinct_id,
            consolidation_name: code.consolidation,
            candidate: candidate.to_string(),
            votes,
        });
        Ok(())
    }

    /// Adds a row that is already normalized (for example read back from a published artifact).
    pub fn add_row(&mut self, row: PrecinctResultRow) {
        let key = (
            row.contest.clone(),
            row.precinct_code.clone(),
            row.candidate.clone(),
        );
        if let Some(&idx) = self.positions.get(&key) {
            debug!(
                "add_row: duplicate row for {:?}, adding {} votes",
                key, row.votes
            );
            self.rows[idx].votes += row.votes;
        } else {
            self.positions.insert(key, self.rows.len());
            self.rows.push(row);
        }
    }

    pub fn build(self) -> Snapshot {
        Snapshot::new(self.generated_at, self.rows)
    }
}

fn parse_votes(s: &str) -> Option<u64> {
    let s = s.trim();
    // u64::from_str accepts a leading '+'
    if s.starts_with('+') {
        return None;
    }
    s.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2020-11-03T20:00:00-08:00".parse().unwrap()
    }

    fn record(lineno: u64, precinct: &str, votes: &str) -> RawCsvRecord {
        RawCsvRecord {
            lineno,
            contest: "Mayor".to_string(),
            precinct: precinct.to_string(),
            candidate: "Anna".to_string(),
            votes: votes.to_string(),
        }
    }

    #[test]
    fn duplicates_are_summed() {
        let mut b = SnapshotBuilder::new(ts());
        b.add_record(&record(3, "1234-567890-DOWNTOWN", "5")).unwrap();
        b.add_record(&record(4, "1234-567890-DOWNTOWN", "7")).unwrap();
        let s = b.build();
        assert_eq!(s.rows().len(), 1);
        assert_eq!(s.rows()[0].votes, 12);
    }

    #[test]
    fn vote_counts_must_be_non_negative_integers() {
        for bad in ["abc", "-3", "2.5", "", "+4"] {
            let mut b = SnapshotBuilder::new(ts());
            let res = b.add_record(&record(9, "1234-567890-DOWNTOWN", bad));
            assert_eq!(
                res,
                Err(TallyErrors::MalformedRow {
                    lineno: 9,
                    votes: bad.to_string()
                })
            );
        }
    }

    #[test]
    fn vote_count_whitespace_is_tolerated() {
        let mut b = SnapshotBuilder::new(ts());
        b.add_record(&record(3, "1234-567890-DOWNTOWN", " 42 ")).unwrap();
        assert_eq!(b.build().rows()[0].votes, 42);
    }

    #[test]
    fn malformed_precinct_code() {
        let mut b = SnapshotBuilder::new(ts());
        let res = b.add_record(&record(5, "DOWNTOWN", "1"));
        assert_eq!(
            res,
            Err(TallyErrors::MalformedPrecinctCode {
                lineno: 5,
                code: "DOWNTOWN".to_string()
            })
        );
    }

    #[test]
    fn contests_are_collected() {
        let mut b = SnapshotBuilder::new(ts());
        b.add_votes("Mayor", "1234-567890-A", "Anna", 1).unwrap();
        b.add_votes("Measure B", "1234-567890-A", "Yes", 1).unwrap();
        b.add_votes("Mayor", "1234-567891-B", "Anna", 1).unwrap();
        let s = b.build();
        let contests: Vec<&String> = s.contests().iter().collect();
        assert_eq!(contests, vec!["Mayor", "Measure B"]);
    }
}
