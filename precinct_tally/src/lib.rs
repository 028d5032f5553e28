mod config;
pub mod builder;
pub mod export;
pub mod manual;
pub mod precinct_code;
pub mod session;

use log::{debug, info};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;
pub use crate::export::{parse_snapshot, read_export};

/// Computes the time series of a contest: one point per snapshot.
///
/// The points are in ascending order of generation time, whatever the order of
/// the input. Snapshots generated at the same time keep their relative order.
/// A snapshot without any row for this contest still produces a point, with
/// empty totals.
///
/// Arguments:
/// * `snapshots` all the snapshots of one election
/// * `contest` the name of the contest. An unknown contest yields empty totals.
pub fn summarize(snapshots: &[Snapshot], contest: &str) -> Vec<ContestSummary> {
    info!(
        "summarize: contest {:?} over {} snapshots",
        contest,
        snapshots.len()
    );
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.generated_at());
    ordered
        .iter()
        .map(|s| ContestSummary {
            timestamp: s.generated_at(),
            totals: contest_totals(s, contest),
        })
        .collect()
}

/// The votes of each candidate of a contest, summed over all the precincts.
pub fn contest_totals(snapshot: &Snapshot, contest: &str) -> CandidateTotals {
    let mut totals = CandidateTotals::new();
    for row in snapshot.rows_for(contest) {
        *totals.entry(row.candidate.clone()).or_insert(0) += row.votes;
    }
    totals
}

/// The votes of each candidate of a contest, for every precinct id.
pub fn breakdown_by_precinct(snapshot: &Snapshot, contest: &str) -> PrecinctBreakdown {
    let res = accumulate(snapshot, contest, |row| &row.precinct_code);
    debug!(
        "breakdown_by_precinct: contest {:?}: {} precincts",
        contest,
        res.len()
    );
    res
}

/// The votes of each candidate of a contest, for every consolidation.
///
/// Mail and in-person precincts of the same consolidation are merged, which
/// matches the dissolved consolidation polygons.
pub fn breakdown_by_consolidation(snapshot: &Snapshot, contest: &str) -> ConsolidationBreakdown {
    let res = accumulate(snapshot, contest, |row| &row.consolidation_name);
    debug!(
        "breakdown_by_consolidation: contest {:?}: {} consolidations",
        contest,
        res.len()
    );
    res
}

fn accumulate<F>(snapshot: &Snapshot, contest: &str, key: F) -> BTreeMap<String, CandidateTotals>
where
    F: Fn(&PrecinctResultRow) -> &String,
{
    let mut res: BTreeMap<String, CandidateTotals> = BTreeMap::new();
    for row in snapshot.rows_for(contest) {
        let totals = res.entry(key(row).clone()).or_default();
        *totals.entry(row.candidate.clone()).or_insert(0) += row.votes;
    }
    res
}

/// The most recent snapshot, if any.
pub fn latest(snapshots: &[Snapshot]) -> Option<&Snapshot> {
    snapshots.iter().max_by_key(|s| s.generated_at())
}

/// The candidates in the lead.
///
/// All the candidates that share the maximum are returned, as long as this
/// maximum is above zero. Without any vote, nobody is leading.
///
/// ```
/// use precinct_tally::{leading_candidates, CandidateTotals};
///
/// let totals: CandidateTotals = [("A", 100), ("B", 100), ("C", 0)]
///     .iter()
///     .map(|(c, v)| (c.to_string(), *v))
///     .collect();
/// let leading: Vec<String> = leading_candidates(&totals).into_iter().collect();
/// assert_eq!(leading, vec!["A".to_string(), "B".to_string()]);
/// ```
pub fn leading_candidates(totals: &CandidateTotals) -> BTreeSet<String> {
    let highest = totals.values().cloned().max().unwrap_or(0);
    if highest == 0 {
        return BTreeSet::new();
    }
    totals
        .iter()
        .filter(|&(_, &count)| count == highest)
        .map(|(name, _)| name.clone())
        .collect()
}

pub fn total_votes(totals: &CandidateTotals) -> u64 {
    totals.values().sum()
}

/// The fraction of the votes obtained by a candidate, between 0 and 1.
///
/// Returns 0 when no vote has been recorded yet.
pub fn vote_share(totals: &CandidateTotals, candidate: &str) -> f64 {
    let count = totals.get(candidate).cloned().unwrap_or(0);
    count as f64 / total_votes(totals).max(1) as f64
}

/// The candidates by decreasing number of votes. Equal counts are ordered by name.
pub fn ranked_candidates(totals: &CandidateTotals) -> Vec<(String, u64)> {
    let mut res: Vec<(String, u64)> = totals.iter().map(|(n, c)| (n.clone(), *c)).collect();
    res.sort_by(|(n1, c1), (n2, c2)| c2.cmp(c1).then_with(|| n1.cmp(n2)));
    res
}

#[cfg(test)]
mod tests {
    use super::builder::SnapshotBuilder;
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn snapshot(generated_at: &str, rows: &[(&str, &str, &str, u64)]) -> Snapshot {
        let mut b = SnapshotBuilder::new(ts(generated_at));
        for (contest, precinct, candidate, votes) in rows.iter() {
            b.add_votes(contest, precinct, candidate, *votes).unwrap();
        }
        b.build()
    }

    fn totals(entries: &[(&str, u64)]) -> CandidateTotals {
        entries.iter().map(|(c, v)| (c.to_string(), *v)).collect()
    }

    fn s1() -> Snapshot {
        snapshot(
            "2020-11-03T10:00:00+00:00",
            &[
                ("contestX", "1234-000001-NORTH", "A", 5),
                ("contestX", "1234-000001-NORTH", "B", 3),
            ],
        )
    }

    fn s2() -> Snapshot {
        snapshot(
            "2020-11-03T11:00:00+00:00",
            &[
                ("contestX", "1234-000001-NORTH", "A", 9),
                ("contestX", "1234-000001-NORTH", "B", 3),
                ("contestX", "1234-000002-NORTH-VBM", "A", 1),
                ("contestY", "1234-000002-NORTH-VBM", "Yes", 4),
            ],
        )
    }

    #[test]
    fn two_snapshots_end_to_end() {
        let snapshots = vec![s1(), s2()];
        let series = summarize(&snapshots, "contestX");
        assert_eq!(
            series,
            vec![
                ContestSummary {
                    timestamp: ts("2020-11-03T10:00:00+00:00"),
                    totals: totals(&[("A", 5), ("B", 3)]),
                },
                ContestSummary {
                    timestamp: ts("2020-11-03T11:00:00+00:00"),
                    totals: totals(&[("A", 10), ("B", 3)]),
                },
            ]
        );

        let breakdown = breakdown_by_precinct(latest(&snapshots).unwrap(), "contestX");
        let mut expected = PrecinctBreakdown::new();
        expected.insert("000001".to_string(), totals(&[("A", 9), ("B", 3)]));
        expected.insert("000002".to_string(), totals(&[("A", 1)]));
        assert_eq!(breakdown, expected);
    }

    #[test]
    fn summary_follows_generation_time() {
        let snapshots = vec![s2(), s1()];
        let series = summarize(&snapshots, "contestX");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, ts("2020-11-03T10:00:00+00:00"));
        assert_eq!(series[1].totals, totals(&[("A", 10), ("B", 3)]));
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn contest_missing_from_a_snapshot_still_has_a_point() {
        let snapshots = vec![s1(), s2()];
        let series = summarize(&snapshots, "contestY");
        assert_eq!(series.len(), 2);
        assert!(series[0].totals.is_empty());
        assert_eq!(series[1].totals, totals(&[("Yes", 4)]));
    }

    #[test]
    fn unknown_contest_is_empty() {
        let snapshots = vec![s1(), s2()];
        assert!(summarize(&snapshots, "Dog catcher")
            .iter()
            .all(|p| p.totals.is_empty()));
        assert!(breakdown_by_precinct(&s2(), "Dog catcher").is_empty());
        assert!(summarize(&[], "contestX").is_empty());
        assert_eq!(latest(&[]), None);
    }

    #[test]
    fn breakdown_conserves_votes() {
        let s = s2();
        for contest in ["contestX", "contestY", "other"] {
            let from_rows: u64 = s.rows_for(contest).map(|r| r.votes).sum();
            let from_precincts: u64 = breakdown_by_precinct(&s, contest)
                .values()
                .map(total_votes)
                .sum();
            let from_consolidations: u64 = breakdown_by_consolidation(&s, contest)
                .values()
                .map(total_votes)
                .sum();
            assert_eq!(from_rows, from_precincts);
            assert_eq!(from_rows, from_consolidations);
        }
    }

    #[test]
    fn consolidation_merges_mail_precincts() {
        let breakdown = breakdown_by_consolidation(&s2(), "contestX");
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown["NORTH"], totals(&[("A", 10), ("B", 3)]));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let snapshots = vec![s1(), s2()];
        assert_eq!(
            summarize(&snapshots, "contestX"),
            summarize(&snapshots, "contestX")
        );
        assert_eq!(
            breakdown_by_precinct(&snapshots[1], "contestX"),
            breakdown_by_precinct(&snapshots[1], "contestX")
        );
    }

    #[test]
    fn leading_ties_are_kept() {
        let leading = leading_candidates(&totals(&[("A", 100), ("B", 100), ("C", 0)]));
        let expected: BTreeSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        assert_eq!(leading, expected);
    }

    #[test]
    fn nobody_leads_without_votes() {
        assert!(leading_candidates(&totals(&[("A", 0), ("B", 0)])).is_empty());
        assert!(leading_candidates(&CandidateTotals::new()).is_empty());
    }

    #[test]
    fn single_leader() {
        let leading = leading_candidates(&totals(&[("A", 7), ("B", 100)]));
        assert_eq!(leading.into_iter().collect::<Vec<_>>(), vec!["B".to_string()]);
    }

    #[test]
    fn shares() {
        let t = totals(&[("A", 3), ("B", 1)]);
        assert_eq!(vote_share(&t, "A"), 0.75);
        assert_eq!(vote_share(&t, "C"), 0.0);
        assert_eq!(vote_share(&totals(&[("A", 0)]), "A"), 0.0);
    }

    #[test]
    fn ranking() {
        let t = totals(&[("C", 3), ("A", 1), ("B", 3)]);
        assert_eq!(
            ranked_candidates(&t),
            vec![
                ("B".to_string(), 3),
                ("C".to_string(), 3),
                ("A".to_string(), 1)
            ]
        );
    }
}
