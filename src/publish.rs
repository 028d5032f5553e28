use log::{debug, error, info, warn};

use precinct_tally::*;
use snafu::{prelude::*, Snafu};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::publish::config_reader::*;
use crate::publish::io_artifacts::*;
use crate::publish::io_common::*;

mod config_reader;
mod io_artifacts;
mod io_common;
mod io_csv;
mod io_summary;

#[derive(Debug, Snafu)]
pub enum BuildError {
    #[snafu(display("Expected export file is missing: {path}"))]
    MissingFile { path: String },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error listing directory {path}: {source}"))]
    ListingDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No GeneratedDate element in {path}"))]
    MissingTimestamp { path: String },
    #[snafu(display("Cannot understand the date {value:?} in {path}"))]
    InvalidTimestamp { path: String, value: String },
    #[snafu(display("Error in export {path}: {source}"))]
    Tally { source: TallyErrors, path: String },
    #[snafu(display("Contests {first:?} and {second:?} would both be written to {key}"))]
    ArtifactKeyCollision {
        first: String,
        second: String,
        key: String,
    },
    #[snafu(display("Error writing {path}: {source}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing {path}: {source}"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error parsing {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("{count} file(s) differ from the reference"))]
    ReferenceMismatch { count: usize },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type BuildResult<T> = Result<T, BuildError>;
type BBuildResult<T> = Result<T, Box<BuildError>>;

/// A result set that could not be published.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FailedResultSet {
    pub election_id: String,
    pub result_id: String,
    pub reason: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BuildReport {
    pub elections: usize,
    pub result_sets: usize,
    pub artifacts: usize,
    pub failures: Vec<FailedResultSet>,
}

/// A result set that was read successfully.
struct BuiltResult {
    result_id: String,
    snapshot: Snapshot,
}

/// Reads the exports of one result set: the generation date, then the precinct rows.
fn load_result_set(source: &ResultSource) -> BBuildResult<Snapshot> {
    for p in [&source.summary_path, &source.precincts_path] {
        if !Path::new(p).is_file() {
            return Err(Box::new(BuildError::MissingFile { path: p.clone() }));
        }
    }
    let generated_at = io_summary::read_generated_at(&source.summary_path)?;
    debug!(
        "load_result_set: {} generated at {}",
        source.result_id, generated_at
    );
    let snapshot = io_csv::read_precinct_export(&source.precincts_path, generated_at)?;
    Ok(snapshot)
}

/// Checks that the contests of a snapshot share a file name neither with each other nor with
/// another contest of the same election. `known` maps the keys of the election to their
/// contest, and receives the keys of the snapshot once the check passes.
fn check_contest_keys(
    snapshot: &Snapshot,
    scheme: KeyScheme,
    known: &mut BTreeMap<String, String>,
) -> BuildResult<()> {
    let mut pending: BTreeMap<String, &String> = BTreeMap::new();
    for contest in snapshot.contests().iter() {
        let key = contest_key(contest, scheme);
        let first = known.get(&key).or_else(|| pending.get(&key).copied());
        if let Some(first) = first {
            if first != contest {
                return ArtifactKeyCollisionSnafu {
                    first: first.clone(),
                    second: contest.clone(),
                    key,
                }
                .fail();
            }
        }
        pending.insert(key, contest);
    }
    for (key, contest) in pending {
        known.insert(key, contest.clone());
    }
    Ok(())
}

fn record_failure(
    report: &mut BuildReport,
    election_id: &str,
    result_id: &str,
    reason: &dyn std::fmt::Display,
) {
    error!(
        "Skipping election {} result set {}: {}",
        election_id, result_id, reason
    );
    report.failures.push(FailedResultSet {
        election_id: election_id.to_string(),
        result_id: result_id.to_string(),
        reason: reason.to_string(),
    });
}

/// Writes the files that span all the result sets of an election.
fn write_election_files(
    writer: &mut ArtifactWriter,
    election_id: &str,
    built: &[BuiltResult],
    scheme: KeyScheme,
) -> BuildResult<()> {
    let mut contests: BTreeSet<String> = BTreeSet::new();
    for b in built.iter() {
        contests.extend(b.snapshot.contests().iter().cloned());
    }
    let contest_list: Vec<&String> = contests.iter().collect();
    writer.write_json(&format!("{}_contests.json", election_id), &contest_list)?;

    let snapshots: Vec<Snapshot> = built.iter().map(|b| b.snapshot.clone()).collect();
    for contest in contests.iter() {
        let series = summarize(&snapshots, contest);
        writer.write_json(&series_file_name(election_id, contest, scheme), &series)?;
    }
    Ok(())
}

/// Builds the files of one election.
///
/// Every failure is recorded in the report against the result sets it affects, and the
/// election is left out of the metadata when none of its result sets could be published.
fn build_election(
    election: &ElectionSource,
    scheme: KeyScheme,
    writer: &mut ArtifactWriter,
    report: &mut BuildReport,
) -> Option<ElectionMetadata> {
    let election_id = election.election_id.as_str();
    info!(
        "Building election {:?} ({} result sets)",
        election_id,
        election.results.len()
    );
    let mut loaded: Vec<BuiltResult> = Vec::new();
    for source in election.results.iter() {
        match load_result_set(source) {
            Ok(snapshot) => loaded.push(BuiltResult {
                result_id: source.result_id.clone(),
                snapshot,
            }),
            Err(e) => record_failure(report, election_id, &source.result_id, &e),
        }
    }

    // Oldest first, the order of the time series.
    loaded.sort_by_key(|b| b.snapshot.generated_at());

    let mut keys: BTreeMap<String, String> = BTreeMap::new();
    let mut built: Vec<BuiltResult> = Vec::new();
    for b in loaded.into_iter() {
        let res = check_contest_keys(&b.snapshot, scheme, &mut keys).and_then(|_| {
            write_result_set(writer, election_id, &b.result_id, &b.snapshot, scheme)
        });
        match res {
            Ok(()) => built.push(b),
            Err(e) => record_failure(report, election_id, &b.result_id, &e),
        }
    }

    if built.is_empty() {
        warn!(
            "Election {:?} has no usable result set, it is not published",
            election_id
        );
        return None;
    }

    if let Err(e) = write_election_files(writer, election_id, &built, scheme) {
        for b in built.iter() {
            record_failure(report, election_id, &b.result_id, &e);
        }
        return None;
    }

    report.result_sets += built.len();
    Some(ElectionMetadata {
        election_id: election.election_id.clone(),
        name: election.display_name(),
        // Newest first.
        results: built
            .iter()
            .rev()
            .map(|b| ResultMetadata {
                result_id: b.result_id.clone(),
                created_at: b.snapshot.generated_at(),
            })
            .collect(),
    })
}

/// Resolves the elections to build, from the command line and the configuration file.
fn resolve_elections(args: &Args, config: &BuildConfig, root: &Path) -> BuildResult<Vec<ElectionSource>> {
    if let Some(input) = &args.input {
        return discover_elections(Path::new(input), config.election_names.as_ref());
    }
    if let Some(elections) = &config.elections {
        return Ok(elections.iter().map(|e| e.relative_to(root)).collect());
    }
    if let Some(source_dir) = &config.source_directory {
        let p: PathBuf = root.join(source_dir);
        return discover_elections(&p, config.election_names.as_ref());
    }
    whatever!("No elections to build: provide --input or a configuration with elections or sourceDirectory")
}

/// Builds all the data files.
///
/// A result set that cannot be read or written is skipped and reported; the other ones are
/// still published.
pub fn run_build(args: &Args) -> BuildResult<BuildReport> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (BuildConfig::default(), PathBuf::new()),
    };

    let elections = resolve_elections(args, &config, &root)?;
    let output_settings = config.output_settings.clone().unwrap_or_default();
    let out_dir: PathBuf = match (&args.out, &output_settings.output_directory) {
        (Some(out), _) => PathBuf::from(out),
        (None, Some(out)) => root.join(out),
        (None, None) => PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
    };
    let scheme = if args.legacy_keys || output_settings.legacy_keys.unwrap_or(false) {
        KeyScheme::Legacy
    } else {
        KeyScheme::Hex
    };
    info!(
        "Building {} elections into {:?} with {:?} contest keys",
        elections.len(),
        out_dir,
        scheme
    );

    fs::create_dir_all(&out_dir).context(WritingJsonSnafu {
        path: out_dir.display().to_string(),
    })?;
    let mut writer = ArtifactWriter::new(&out_dir);
    let mut report = BuildReport::default();
    let mut metadata: Vec<ElectionMetadata> = Vec::new();
    for election in elections.iter() {
        if let Some(m) = build_election(election, scheme, &mut writer, &mut report) {
            metadata.push(m);
        }
    }
    writer.write_json(METADATA_FILE_NAME, &metadata)?;
    report.elections = metadata.len();
    report.artifacts = writer.written().len();

    // The reference data, if provided for comparison
    if let Some(reference) = &args.reference {
        let count = check_against_reference(&out_dir, Path::new(reference), writer.written())?;
        if count > 0 {
            return ReferenceMismatchSnafu { count }.fail();
        }
        info!("All {} files match the reference", writer.written().len());
    }

    Ok(report)
}
