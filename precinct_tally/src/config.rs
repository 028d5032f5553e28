// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The generation time of an export, as found in its metadata.
pub type Timestamp = DateTime<FixedOffset>;

/// One line of a precinct-level export, before any conversion.
///
/// The fields are the raw text found under the `Contest Name`, `Precinct`,
/// `Candidate Name` and `Votes` columns.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawCsvRecord {
    /// The line in the source file (1-based), only used for error reporting.
    pub lineno: u64,
    pub contest: String,
    pub precinct: String,
    pub candidate: String,
    pub votes: String,
}

/// One normalized observation: the votes of one candidate in one precinct for one contest.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct PrecinctResultRow {
    pub contest: String,
    /// The 6-digit precinct id extracted from the compound precinct code.
    #[serde(rename = "id")]
    pub precinct_code: String,
    /// The consolidation name, with the vote-by-mail marker removed.
    #[serde(rename = "consName")]
    pub consolidation_name: String,
    pub candidate: String,
    pub votes: u64,
}

/// A full export at one point in time.
///
/// Snapshots are only created through the parser or the
/// [`SnapshotBuilder`](crate::builder::SnapshotBuilder) and cannot be modified afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Snapshot {
    generated_at: Timestamp,
    rows: Vec<PrecinctResultRow>,
    contests: BTreeSet<String>,
}

impl Snapshot {
    pub(crate) fn new(generated_at: Timestamp, rows: Vec<PrecinctResultRow>) -> Snapshot {
        let contests = rows.iter().map(|r| r.contest.clone()).collect();
        Snapshot {
            generated_at,
            rows,
            contests,
        }
    }

    pub fn generated_at(&self) -> Timestamp {
        self.generated_at
    }

    /// The rows, in the order of the source file.
    pub fn rows(&self) -> &[PrecinctResultRow] {
        &self.rows
    }

    /// The distinct contest names found in this snapshot.
    pub fn contests(&self) -> &BTreeSet<String> {
        &self.contests
    }

    pub fn rows_for<'a>(
        &'a self,
        contest: &'a str,
    ) -> impl Iterator<Item = &'a PrecinctResultRow> + 'a {
        self.rows.iter().filter(move |r| r.contest == contest)
    }
}

// ******** Output data structures *********

/// Votes per candidate. Candidates without any vote may be missing.
pub type CandidateTotals = BTreeMap<String, u64>;

/// Candidate totals for each precinct id.
pub type PrecinctBreakdown = BTreeMap<String, CandidateTotals>;

/// Candidate totals for each consolidation name.
pub type ConsolidationBreakdown = BTreeMap<String, CandidateTotals>;

/// One point of the time series of a contest.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestSummary {
    pub timestamp: Timestamp,
    pub totals: CandidateTotals,
}

// ******** Published metadata *********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(rename = "resultId")]
    pub result_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}

/// An election and its result sets, newest first.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionMetadata {
    #[serde(rename = "electionId")]
    pub election_id: String,
    pub name: String,
    pub results: Vec<ResultMetadata>,
}

/// Errors that prevent a snapshot from being built, or a selection from being made.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// The vote count is not a non-negative integer.
    MalformedRow { lineno: u64, votes: String },
    /// The precinct code does not follow `<4 digits>-<6 digits>-<name>`.
    MalformedPrecinctCode { lineno: u64, code: String },
    /// One of the required columns is absent from the header.
    MissingColumn { column: String },
    /// The export could not be read as CSV.
    UnreadableExport { lineno: Option<u64>, message: String },
    EmptyMetadata,
    UnknownElection { election_id: String },
    UnknownResult { result_id: String },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::MalformedRow { lineno, votes } => {
                write!(f, "line {}: vote count {:?} is not a number", lineno, votes)
            }
            TallyErrors::MalformedPrecinctCode { lineno, code } => {
                write!(f, "line {}: cannot understand precinct code {:?}", lineno, code)
            }
            TallyErrors::MissingColumn { column } => {
                write!(f, "missing column {:?} in header", column)
            }
            TallyErrors::UnreadableExport {
                lineno: Some(lineno),
                message,
            } => write!(f, "line {}: {}", lineno, message),
            TallyErrors::UnreadableExport {
                lineno: None,
                message,
            } => write!(f, "{}", message),
            TallyErrors::EmptyMetadata => write!(f, "no election in metadata"),
            TallyErrors::UnknownElection { election_id } => {
                write!(f, "unknown election {:?}", election_id)
            }
            TallyErrors::UnknownResult { result_id } => {
                write!(f, "unknown result set {:?}", result_id)
            }
        }
    }
}
