//! The state of a browsing session: which election, result set and contest are
//! currently selected, and the snapshots loaded so far.
//!
//! The session does not compute anything by itself: views are produced by the
//! pure functions of this crate. Every computation is tagged with the
//! selection it was started for, so that a late answer for an old selection
//! can be dropped instead of replacing the current view.
//!
//! ```
//! use precinct_tally::session::ElectionSession;
//! use precinct_tally::{ElectionMetadata, ResultMetadata};
//!
//! let metadata = vec![ElectionMetadata {
//!     election_id: "10".to_string(),
//!     name: "November 3, 2020 General".to_string(),
//!     results: vec![ResultMetadata {
//!         result_id: "2".to_string(),
//!         created_at: "2020-11-04T01:00:00-08:00".parse().unwrap(),
//!     }],
//! }];
//! let mut session = ElectionSession::new(metadata)?;
//! session.select_contest("Mayor");
//! let tag = session.begin_request();
//! session.select_contest("Measure A");
//! // The answer for "Mayor" arrives too late.
//! assert_eq!(session.complete(&tag, 42), None);
//! # Ok::<(), precinct_tally::TallyErrors>(())
//! ```

use std::collections::{BTreeSet, HashMap};

use log::{debug, info};

use crate::config::*;
use crate::{
    breakdown_by_consolidation, breakdown_by_precinct, contest_totals, latest,
    leading_candidates, summarize,
};

/// The current selection. Every field may be unset while data is loading.
#[derive(Eq, PartialEq, Debug, Clone, Default, Hash)]
pub struct Selection {
    pub election_id: Option<String>,
    pub result_id: Option<String>,
    pub contest: Option<String>,
}

/// Identifies one request: the selection it was made for.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RequestTag {
    pub selection: Selection,
    generation: u64,
}

/// Everything needed to display one contest.
#[derive(PartialEq, Debug, Clone)]
pub struct ContestView {
    pub contest: String,
    /// Oldest first.
    pub series: Vec<ContestSummary>,
    /// Totals of the displayed result set.
    pub totals: CandidateTotals,
    pub leading: BTreeSet<String>,
    pub precincts: PrecinctBreakdown,
    pub consolidations: ConsolidationBreakdown,
}

/// Computes the view of a contest for one result set of an election.
///
/// `displayed` is the result set shown on the map; the most recent snapshot is
/// used when it is not provided.
pub fn contest_view(
    snapshots: &[Snapshot],
    displayed: Option<&Snapshot>,
    contest: &str,
) -> ContestView {
    let series = summarize(snapshots, contest);
    match displayed.or_else(|| latest(snapshots)) {
        Some(snapshot) => {
            let totals = contest_totals(snapshot, contest);
            ContestView {
                contest: contest.to_string(),
                series,
                leading: leading_candidates(&totals),
                totals,
                precincts: breakdown_by_precinct(snapshot, contest),
                consolidations: breakdown_by_consolidation(snapshot, contest),
            }
        }
        None => ContestView {
            contest: contest.to_string(),
            series,
            totals: CandidateTotals::new(),
            leading: BTreeSet::new(),
            precincts: PrecinctBreakdown::new(),
            consolidations: ConsolidationBreakdown::new(),
        },
    }
}

#[derive(Debug, Clone, Default)]
struct LoadedElection {
    // Both sorted by generation time, oldest first.
    result_ids: Vec<String>,
    snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct ElectionSession {
    metadata: Vec<ElectionMetadata>,
    selection: Selection,
    generation: u64,
    loaded: HashMap<String, LoadedElection>,
}

impl ElectionSession {
    /// Starts a session on the first election and its most recent result set.
    pub fn new(metadata: Vec<ElectionMetadata>) -> Result<ElectionSession, TallyErrors> {
        let first = metadata.first().ok_or(TallyErrors::EmptyMetadata)?;
        let selection = Selection {
            election_id: Some(first.election_id.clone()),
            result_id: first.results.first().map(|r| r.result_id.clone()),
            contest: None,
        };
        info!("ElectionSession: starting with {:?}", selection);
        Ok(ElectionSession {
            metadata,
            selection,
            generation: 0,
            loaded: HashMap::new(),
        })
    }

    pub fn metadata(&self) -> &[ElectionMetadata] {
        &self.metadata
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn current_election(&self) -> Option<&ElectionMetadata> {
        let id = self.selection.election_id.as_ref()?;
        self.metadata.iter().find(|e| &e.election_id == id)
    }

    /// Switches to another election, on its most recent result set. The contest is cleared.
    pub fn select_election(&mut self, election_id: &str) -> Result<(), TallyErrors> {
        let election = self
            .metadata
            .iter()
            .find(|e| e.election_id == election_id)
            .ok_or_else(|| TallyErrors::UnknownElection {
                election_id: election_id.to_string(),
            })?;
        let selection = Selection {
            election_id: Some(election.election_id.clone()),
            result_id: election.results.first().map(|r| r.result_id.clone()),
            contest: None,
        };
        self.update(selection);
        Ok(())
    }

    /// Switches to another result set of the current election.
    pub fn select_result(&mut self, result_id: &str) -> Result<(), TallyErrors> {
        let known = self
            .current_election()
            .map(|e| e.results.iter().any(|r| r.result_id == result_id))
            .unwrap_or(false);
        if !known {
            return Err(TallyErrors::UnknownResult {
                result_id: result_id.to_string(),
            });
        }
        let selection = Selection {
            result_id: Some(result_id.to_string()),
            ..self.selection.clone()
        };
        self.update(selection);
        Ok(())
    }

    /// Any name is accepted: a contest without data shows an empty view.
    pub fn select_contest(&mut self, contest: &str) {
        let selection = Selection {
            contest: Some(contest.to_string()),
            ..self.selection.clone()
        };
        self.update(selection);
    }

    /// Stores the snapshots of an election, keyed by result id.
    pub fn load_snapshots(&mut self, election_id: &str, snapshots: Vec<(String, Snapshot)>) {
        let mut snapshots = snapshots;
        snapshots.sort_by_key(|(_, s)| s.generated_at());
        let (result_ids, snapshots): (Vec<String>, Vec<Snapshot>) = snapshots.into_iter().unzip();
        info!(
            "load_snapshots: election {:?}: {} snapshots",
            election_id,
            snapshots.len()
        );
        self.loaded.insert(
            election_id.to_string(),
            LoadedElection {
                result_ids,
                snapshots,
            },
        );
        // Pending requests were computed without these snapshots.
        self.generation += 1;
    }

    pub fn is_loaded(&self, election_id: &str) -> bool {
        self.loaded.contains_key(election_id)
    }

    /// The contests of the displayed result set (or of the latest one).
    pub fn contests(&self) -> BTreeSet<String> {
        self.displayed_snapshot()
            .map(|s| s.contests().clone())
            .unwrap_or_default()
    }

    /// Starts a request for the current selection.
    pub fn begin_request(&self) -> RequestTag {
        RequestTag {
            selection: self.selection.clone(),
            generation: self.generation,
        }
    }

    /// True if nothing changed since the request was started.
    pub fn is_current(&self, tag: &RequestTag) -> bool {
        tag.generation == self.generation && tag.selection == self.selection
    }

    /// Accepts the answer to a request, unless the request is stale.
    pub fn complete<T>(&self, tag: &RequestTag, value: T) -> Option<T> {
        if self.is_current(tag) {
            Some(value)
        } else {
            debug!("complete: dropping stale answer for {:?}", tag.selection);
            None
        }
    }

    /// Computes the view of the selected contest, as seen by the given request.
    ///
    /// Returns `None` when no contest is selected or the election is not loaded yet.
    pub fn compute_view(&self, tag: &RequestTag) -> Option<ContestView> {
        let contest = tag.selection.contest.as_ref()?;
        let election_id = tag.selection.election_id.as_ref()?;
        let loaded = self.loaded.get(election_id)?;
        let displayed = self.find_snapshot(loaded, tag.selection.result_id.as_deref());
        Some(contest_view(&loaded.snapshots, displayed, contest))
    }

    fn displayed_snapshot(&self) -> Option<&Snapshot> {
        let election_id = self.selection.election_id.as_ref()?;
        let loaded = self.loaded.get(election_id)?;
        self.find_snapshot(loaded, self.selection.result_id.as_deref())
            .or_else(|| latest(&loaded.snapshots))
    }

    fn find_snapshot<'a>(
        &self,
        loaded: &'a LoadedElection,
        result_id: Option<&str>,
    ) -> Option<&'a Snapshot> {
        let result_id = result_id?;
        let idx = loaded.result_ids.iter().position(|r| r == result_id)?;
        loaded.snapshots.get(idx)
    }

    fn update(&mut self, selection: Selection) {
        if selection != self.selection {
            debug!("update: {:?} -> {:?}", self.selection, selection);
            self.selection = selection;
            self.generation += 1;
        }
    }
}
