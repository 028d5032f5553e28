use crate::publish::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "legacyKeys")]
    pub legacy_keys: Option<bool>,
}

/// The export files of one result set.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultSource {
    #[serde(rename = "resultId")]
    pub result_id: String,
    #[serde(rename = "summaryPath")]
    pub summary_path: String,
    #[serde(rename = "precinctsPath")]
    pub precincts_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSource {
    #[serde(rename = "electionId")]
    pub election_id: String,
    pub name: Option<String>,
    pub results: Vec<ResultSource>,
}

impl ElectionSource {
    pub fn display_name(&self) -> String {
        match self.name.clone() {
            Some(x) if !x.is_empty() => x,
            _ => self.election_id.clone(),
        }
    }

    /// The same election, with the paths resolved against a root directory.
    pub fn relative_to(&self, root: &Path) -> ElectionSource {
        let resolve = |p: &String| root.join(p).display().to_string();
        ElectionSource {
            election_id: self.election_id.clone(),
            name: self.name.clone(),
            results: self
                .results
                .iter()
                .map(|r| ResultSource {
                    result_id: r.result_id.clone(),
                    summary_path: resolve(&r.summary_path),
                    precincts_path: resolve(&r.precincts_path),
                })
                .collect(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "sourceDirectory")]
    pub source_directory: Option<String>,
    #[serde(rename = "electionNames")]
    pub election_names: Option<BTreeMap<String, String>>,
    pub elections: Option<Vec<ElectionSource>>,
}

pub fn read_config(path: &str) -> BuildResult<BuildConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

/// Lists the election directories of a source directory, and the result set
/// directories inside each of them.
///
/// The layout is `<source>/<election>/<result>/{summary_<election>.xml, precincts_<election>.csv}`.
/// Files next to the result set directories (boundary files for instance) are ignored.
pub fn discover_elections(
    source_dir: &Path,
    names: Option<&BTreeMap<String, String>>,
) -> BuildResult<Vec<ElectionSource>> {
    info!("Looking for elections in {:?}", source_dir);
    let mut res: Vec<ElectionSource> = Vec::new();
    for election_id in list_directories(source_dir)? {
        let election_dir = source_dir.join(&election_id);
        let results: Vec<ResultSource> = list_directories(&election_dir)?
            .into_iter()
            .map(|result_id| {
                let result_dir = election_dir.join(&result_id);
                ResultSource {
                    summary_path: result_dir
                        .join(format!("summary_{}.xml", election_id))
                        .display()
                        .to_string(),
                    precincts_path: result_dir
                        .join(format!("precincts_{}.csv", election_id))
                        .display()
                        .to_string(),
                    result_id,
                }
            })
            .collect();
        debug!(
            "discover_elections: election {:?}: {} result sets",
            election_id,
            results.len()
        );
        res.push(ElectionSource {
            name: names.and_then(|n| n.get(&election_id)).cloned(),
            election_id,
            results,
        });
    }
    Ok(res)
}

fn list_directories(dir: &Path) -> BuildResult<Vec<String>> {
    let path = dir.display().to_string();
    let entries = fs::read_dir(dir).context(ListingDirectorySnafu { path: path.clone() })?;
    let mut names: Vec<String> = Vec::new();
    for entry_r in entries {
        let entry = entry_r.context(ListingDirectorySnafu { path: path.clone() })?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_layout() {
        let dir = tempfile::tempdir().unwrap();
        for (e, r) in [("8", "1"), ("10", "2"), ("10", "1")] {
            fs::create_dir_all(dir.path().join(e).join(r)).unwrap();
        }
        fs::write(dir.path().join("10").join("sandiego.txt"), "{}").unwrap();

        let mut names = BTreeMap::new();
        names.insert("8".to_string(), "March 3, 2020 Primary".to_string());
        let elections = discover_elections(dir.path(), Some(&names)).unwrap();

        assert_eq!(elections.len(), 2);
        assert_eq!(elections[0].election_id, "10");
        assert_eq!(elections[0].display_name(), "10");
        let ids: Vec<&str> = elections[0]
            .results
            .iter()
            .map(|r| r.result_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(elections[0].results[1]
            .precincts_path
            .ends_with("precincts_10.csv"));
        assert_eq!(elections[1].display_name(), "March 3, 2020 Primary");
    }

    #[test]
    fn missing_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        let res = discover_elections(&dir.path().join("nope"), None);
        assert!(matches!(res, Err(BuildError::ListingDirectory { .. })));
    }

    #[test]
    fn explicit_manifest() {
        let js = r#"{
            "elections": [
                {
                    "electionId": "10",
                    "name": "November 3, 2020 General",
                    "results": [
                        { "resultId": "1", "summaryPath": "raw/s.xml", "precinctsPath": "raw/p.csv" }
                    ]
                }
            ]
        }"#;
        let config: BuildConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings, None);
        let elections = config.elections.unwrap();
        let resolved = elections[0].relative_to(Path::new("/srv/exports"));
        assert_eq!(resolved.results[0].summary_path, "/srv/exports/raw/s.xml");
        assert_eq!(resolved.display_name(), "November 3, 2020 General");
    }
}
