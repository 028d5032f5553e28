// Writing the published files, and comparing them to a reference.

use crate::publish::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "data";
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Writes JSON files into the output directory and remembers their names.
pub struct ArtifactWriter {
    out_dir: PathBuf,
    written: Vec<String>,
}

impl ArtifactWriter {
    pub fn new(out_dir: &Path) -> ArtifactWriter {
        ArtifactWriter {
            out_dir: out_dir.to_path_buf(),
            written: Vec::new(),
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> BuildResult<()> {
        let p = self.out_dir.join(name);
        let path = p.display().to_string();
        let contents = serde_json::to_string(value).context(SerializingJsonSnafu { path: path.clone() })?;
        fs::write(&p, contents).context(WritingJsonSnafu { path })?;
        debug!("write_json: wrote {:?}", name);
        self.written.push(name.to_string());
        Ok(())
    }

    /// The file names written so far, in order.
    pub fn written(&self) -> &[String] {
        &self.written
    }
}

/// The result of one contest in one precinct, without the contest name.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PrecinctContestResult {
    pub id: String,
    #[serde(rename = "consName")]
    pub consolidation_name: String,
    pub candidate: String,
    pub votes: u64,
}

/// The content of a contest file.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestArtifact {
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    pub summary: CandidateTotals,
    pub results: Vec<PrecinctContestResult>,
}

fn contest_artifact(snapshot: &Snapshot, contest: &str) -> ContestArtifact {
    ContestArtifact {
        created_at: snapshot.generated_at(),
        summary: contest_totals(snapshot, contest),
        results: snapshot
            .rows_for(contest)
            .map(|row| PrecinctContestResult {
                id: row.precinct_code.clone(),
                consolidation_name: row.consolidation_name.clone(),
                candidate: row.candidate.clone(),
                votes: row.votes,
            })
            .collect(),
    }
}

/// Writes the files of one result set: all its rows, then one file per contest.
pub fn write_result_set(
    writer: &mut ArtifactWriter,
    election_id: &str,
    result_id: &str,
    snapshot: &Snapshot,
    scheme: KeyScheme,
) -> BuildResult<()> {
    writer.write_json(
        &format!("{}_{}.json", election_id, result_id),
        snapshot.rows(),
    )?;
    for contest in snapshot.contests().iter() {
        let artifact = contest_artifact(snapshot, contest);
        writer.write_json(
            &contest_file_name(election_id, result_id, contest, scheme),
            &artifact,
        )?;
    }
    info!(
        "Wrote election {} result set {}: {} contests",
        election_id,
        result_id,
        snapshot.contests().len()
    );
    Ok(())
}

fn read_pretty(path: &Path) -> BuildResult<String> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path: p.clone() })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu { path: p.clone() })?;
    serde_json::to_string_pretty(&js).context(SerializingJsonSnafu { path: p })
}

/// Compares the written files to the files of the same name in the reference directory.
///
/// Returns the number of files that differ. A file missing from the reference counts as a
/// difference.
pub fn check_against_reference(
    out_dir: &Path,
    reference_dir: &Path,
    written: &[String],
) -> BuildResult<usize> {
    let mut mismatches: usize = 0;
    for name in written.iter() {
        let reference_path = reference_dir.join(name);
        if !reference_path.is_file() {
            warn!("check_against_reference: {:?} is not in the reference", name);
            mismatches += 1;
            continue;
        }
        let reference = read_pretty(&reference_path)?;
        let generated = read_pretty(&out_dir.join(name))?;
        if reference != generated {
            warn!("Found differences with the reference in {:?}", name);
            text_diff::print_diff(reference.as_str(), generated.as_str(), "\n");
            mismatches += 1;
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use precinct_tally::builder::SnapshotBuilder;

    fn snapshot() -> Snapshot {
        let mut b = SnapshotBuilder::new("2020-11-03T20:00:00-08:00".parse().unwrap());
        b.add_votes("Mayor", "1234-000001-NORTH", "A", 5).unwrap();
        b.add_votes("Mayor", "1234-000002-NORTH-VBM", "A", 2).unwrap();
        b.add_votes("Measure A", "1234-000001-NORTH", "Yes", 4).unwrap();
        b.build()
    }

    #[test]
    fn contest_file_content() {
        let artifact = contest_artifact(&snapshot(), "Mayor");
        let js = serde_json::to_value(&artifact).unwrap();
        assert_eq!(js["createdAt"], "2020-11-03T20:00:00-08:00");
        assert_eq!(js["summary"], serde_json::json!({"A": 7}));
        assert_eq!(
            js["results"][1],
            serde_json::json!({"id": "000002", "consName": "NORTH", "candidate": "A", "votes": 2})
        );
    }

    #[test]
    fn writes_result_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path());
        write_result_set(&mut writer, "10", "1", &snapshot(), KeyScheme::Legacy).unwrap();
        assert_eq!(
            writer.written(),
            &["10_1.json", "10_1_Mayor.json", "10_1_Measure20A.json"]
        );
        for name in writer.written() {
            assert!(dir.path().join(name).is_file());
        }
    }

    #[test]
    fn reference_ignores_formatting() {
        let out = tempfile::tempdir().unwrap();
        let reference = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(out.path());
        writer.write_json("a.json", &serde_json::json!({"x": [1, 2]})).unwrap();
        writer.write_json("b.json", &serde_json::json!(["y"])).unwrap();

        fs::write(reference.path().join("a.json"), "{\n  \"x\": [1,\n 2]\n}\n").unwrap();
        let count = check_against_reference(out.path(), reference.path(), writer.written()).unwrap();
        // b.json is not in the reference.
        assert_eq!(count, 1);

        fs::write(reference.path().join("b.json"), "[\"z\"]").unwrap();
        let count = check_against_reference(out.path(), reference.path(), writer.written()).unwrap();
        assert_eq!(count, 1);

        fs::write(reference.path().join("b.json"), "[\"y\"]").unwrap();
        let count = check_against_reference(out.path(), reference.path(), writer.written()).unwrap();
        assert_eq!(count, 0);
    }
}
