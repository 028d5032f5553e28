// Naming of the published files.

use sha2::{Digest, Sha256};

/// Names up to this length (in bytes) are hex-encoded as a whole.
pub const MAX_PLAIN_KEY_BYTES: usize = 48;
/// Bytes of a longer name kept in clear before its digest.
const KEY_PREFIX_BYTES: usize = 16;

/// How contest names are turned into file name keys.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeyScheme {
    /// Lowercase hexadecimal of the UTF-8 bytes, which can be decoded back.
    /// Longer names give the hex of their first bytes, a dash and the hex of their SHA-256
    /// digest, so a key never exceeds 97 characters. Plain keys contain no dash, so the two
    /// forms cannot meet.
    Hex,
    /// Percent-encoding with the percent signs removed, as read by older viewers.
    /// Distinct names may share a key.
    Legacy,
}

pub fn contest_key(contest: &str, scheme: KeyScheme) -> String {
    match scheme {
        KeyScheme::Hex => hex_key(contest),
        KeyScheme::Legacy => legacy_encode(contest),
    }
}

fn hex_key(contest: &str) -> String {
    let bytes = contest.as_bytes();
    if bytes.len() <= MAX_PLAIN_KEY_BYTES {
        return hex::encode(bytes);
    }
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest: [u8; 32] = hasher.finalize().into();
    format!(
        "{}-{}",
        hex::encode(&bytes[..KEY_PREFIX_BYTES]),
        hex::encode(digest)
    )
}

/// Percent-encodes a name, leaving `!'()*` as they are, then drops the percent signs.
pub fn legacy_encode(name: &str) -> String {
    urlencoding::encode(name)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
        .replace('%', "")
}

/// The file holding the precinct results of one contest in one result set.
pub fn contest_file_name(
    election_id: &str,
    result_id: &str,
    contest: &str,
    scheme: KeyScheme,
) -> String {
    match scheme {
        KeyScheme::Hex => format!(
            "{}_{}_{}.json",
            election_id,
            result_id,
            contest_key(contest, scheme)
        ),
        KeyScheme::Legacy => legacy_encode(&format!("{}_{}_{}.json", election_id, result_id, contest)),
    }
}

/// The file holding the totals of one contest over all the result sets of an election.
pub fn series_file_name(election_id: &str, contest: &str, scheme: KeyScheme) -> String {
    format!("{}_{}_series.json", election_id, contest_key(contest, scheme))
}
