//! The compound precinct identifier of the exports.
//!
//! Grammar: `<4 digits>-<6 digits>-<consolidation name>[-VBM]`
//!
//! ```
//! use precinct_tally::precinct_code::PrecinctCode;
//!
//! let code = PrecinctCode::parse("1234-567890-DOWNTOWN-VBM").unwrap();
//! assert_eq!(code.precinct_id, "567890");
//! assert_eq!(code.consolidation, "DOWNTOWN");
//! assert!(code.vote_by_mail);
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Marker of the vote-by-mail variant of a precinct. It is usually the suffix of the
/// consolidation name, and every occurrence is removed from the name.
pub const VOTE_BY_MAIL_SUFFIX: &str = "-VBM";

// ASCII digits only: `\d` would accept any Unicode digit.
static PRECINCT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-([0-9]{6})-(.*)$").expect("valid regex"));

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PrecinctCode {
    pub precinct_id: String,
    /// Mail and in-person precincts of the same area share this name.
    pub consolidation: String,
    pub vote_by_mail: bool,
}

impl PrecinctCode {
    /// Splits a compound code. Returns `None` if it does not follow the grammar.
    pub fn parse(code: &str) -> Option<PrecinctCode> {
        let caps = PRECINCT_CODE_RE.captures(code.trim())?;
        let precinct_id = caps.get(1)?.as_str().to_string();
        let name = caps.get(2)?.as_str();
        Some(PrecinctCode {
            precinct_id,
            consolidation: name.replace(VOTE_BY_MAIL_SUFFIX, ""),
            vote_by_mail: name.contains(VOTE_BY_MAIL_SUFFIX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_person_precinct() {
        let code = PrecinctCode::parse("1234-567890-DOWNTOWN").unwrap();
        assert_eq!(code.precinct_id, "567890");
        assert_eq!(code.consolidation, "DOWNTOWN");
        assert!(!code.vote_by_mail);
    }

    #[test]
    fn mail_suffix_is_folded() {
        let code = PrecinctCode::parse("1234-567890-DOWNTOWN-VBM").unwrap();
        assert_eq!(code.precinct_id, "567890");
        assert_eq!(code.consolidation, "DOWNTOWN");
        assert!(code.vote_by_mail);
    }

    #[test]
    fn consolidation_with_dashes_and_spaces() {
        let code = PrecinctCode::parse("0001-000042-CHULA VISTA-2-VBM").unwrap();
        assert_eq!(code.precinct_id, "000042");
        assert_eq!(code.consolidation, "CHULA VISTA-2");
    }

    #[test]
    fn surrounding_whitespace() {
        let code = PrecinctCode::parse("  1234-567890-PALA ").unwrap();
        assert_eq!(code.consolidation, "PALA");
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(PrecinctCode::parse("123-567890-DOWNTOWN"), None);
        assert_eq!(PrecinctCode::parse("1234-56789-DOWNTOWN"), None);
        assert_eq!(PrecinctCode::parse("DOWNTOWN"), None);
        assert_eq!(PrecinctCode::parse(""), None);
        assert_eq!(PrecinctCode::parse("١٢٣٤-٥٦٧٨٩٠-X"), None);
        assert_eq!(PrecinctCode::parse("1234-５６７８９０-X"), None);
    }

    #[test]
    fn mail_marker_inside_the_name() {
        let code = PrecinctCode::parse("1234-567890-PALA-VBM-2").unwrap();
        assert_eq!(code.consolidation, "PALA-2");
        assert!(code.vote_by_mail);
    }
}
