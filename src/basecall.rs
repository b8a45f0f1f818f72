//! Choosing one basecall among the variants stored for a single read
//!
//! Container files can hold several basecalled FASTQ records per read (a combined
//! 2D call, a template strand call, a complement strand call, and repeated runs of
//! each). Locations are compared by name: within one kind the lexicographically
//! greatest location is taken to be the most recent basecall. That is a naming
//! convention of the container, not something read from write-order metadata.

use crate::quality::mean_quality;
use crate::shared::Read;

/// Kind of basecall, classified from its location name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    TwoD,
    Template,
    Complement,
    Other,
}

impl VariantKind {
    /// Classify a location by case-insensitive substring match
    pub fn from_location(location: &str) -> Self {
        let upper = location.to_ascii_uppercase();
        if upper.contains("BASECALLED_2D") {
            VariantKind::TwoD
        } else if upper.contains("TEMPLATE") {
            VariantKind::Template
        } else if upper.contains("COMPLEMENT") {
            VariantKind::Complement
        } else {
            VariantKind::Other
        }
    }
}

/// True for locations that hold a FASTQ record
pub fn is_basecall_location(location: &str) -> bool {
    location.to_ascii_uppercase().ends_with("FASTQ")
}

/// One candidate basecall for a physical read
#[derive(Debug, Clone, PartialEq)]
pub struct BasecallCandidate {
    pub location: String,
    pub kind: VariantKind,
    pub read: Read,
}

impl BasecallCandidate {
    pub fn new(location: impl Into<String>, kind: VariantKind, read: Read) -> Self {
        Self {
            location: location.into(),
            kind,
            read,
        }
    }

    /// Build a candidate from a location name and the FASTQ record stored there
    pub fn from_location(location: impl Into<String>, record: &[u8]) -> Self {
        let location = location.into();
        let kind = VariantKind::from_location(&location);
        Self {
            location,
            kind,
            read: Read::from_embedded_fastq(record),
        }
    }
}

/// Index of the latest candidate of one kind, by location name
fn latest(candidates: &[BasecallCandidate], kind: VariantKind) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == kind)
        .max_by(|(_, a), (_, b)| a.location.cmp(&b.location))
        .map(|(i, _)| i)
}

/// Pick the best basecall for one read
///
/// A 2D call always wins. Failing that, when both strands were called the one
/// with the higher mean quality wins, template on ties. Otherwise whichever
/// strand exists, then any other FASTQ location. Returns None when there are
/// no candidates at all.
pub fn resolve_basecall(mut candidates: Vec<BasecallCandidate>) -> Option<Read> {
    let chosen = match (
        latest(&candidates, VariantKind::TwoD),
        latest(&candidates, VariantKind::Template),
        latest(&candidates, VariantKind::Complement),
    ) {
        (Some(two_d), _, _) => two_d,
        (None, Some(template), Some(complement)) => {
            let template_mean = mean_quality(&candidates[template].read.quality);
            let complement_mean = mean_quality(&candidates[complement].read.quality);
            if template_mean >= complement_mean {
                template
            } else {
                complement
            }
        }
        (None, Some(template), None) => template,
        (None, None, Some(complement)) => complement,
        (None, None, None) => latest(&candidates, VariantKind::Other)?,
    };
    let chosen = candidates.swap_remove(chosen);
    log::debug!("Using basecall at {}", chosen.location);
    Some(chosen.read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TWO_D: &str = "Analyses/Basecall_2D_000/BaseCalled_2D/Fastq";
    const TEMPLATE: &str = "Analyses/Basecall_2D_000/BaseCalled_template/Fastq";
    const COMPLEMENT: &str = "Analyses/Basecall_2D_000/BaseCalled_complement/Fastq";

    /// Candidate whose quality string is four copies of `symbol`
    fn candidate(location: &str, symbol: u8) -> BasecallCandidate {
        let mut record = b"@read\nACGT\n+\n".to_vec();
        record.extend_from_slice(&[symbol; 4]);
        record.push(b'\n');
        BasecallCandidate::from_location(location, &record)
    }

    #[rstest]
    #[case(TWO_D, VariantKind::TwoD)]
    #[case(TEMPLATE, VariantKind::Template)]
    #[case(COMPLEMENT, VariantKind::Complement)]
    #[case("Analyses/Basecall_1D_000/BaseCalled_TEMPLATE/Fastq", VariantKind::Template)]
    #[case("Analyses/Basecall_1D_000/BaseCalled_Unknown/Fastq", VariantKind::Other)]
    fn test_classify_location(#[case] location: &str, #[case] expected: VariantKind) {
        assert_eq!(VariantKind::from_location(location), expected);
    }

    #[test]
    fn test_is_basecall_location() {
        assert!(is_basecall_location(TEMPLATE));
        assert!(is_basecall_location("Analyses/x/FASTQ"));
        assert!(!is_basecall_location("Analyses/Basecall_2D_000/BaseCalled_2D/Events"));
    }

    #[test]
    fn test_two_d_always_chosen() {
        // Template has a higher mean quality but 2D still wins
        let chosen = resolve_basecall(vec![candidate(TEMPLATE, b'I'), candidate(TWO_D, b'#')]);
        assert_eq!(chosen.unwrap().quality, b"####");
    }

    #[test]
    fn test_higher_strand_quality_chosen() {
        // Template Q25, complement Q30
        let chosen = resolve_basecall(vec![candidate(TEMPLATE, b':'), candidate(COMPLEMENT, b'?')]);
        assert_eq!(chosen.unwrap().quality, b"????");
    }

    #[test]
    fn test_template_wins_ties() {
        let template = BasecallCandidate::new(
            TEMPLATE,
            VariantKind::Template,
            Read::new(b"t", b"ACGT", b"5555"),
        );
        let complement = BasecallCandidate::new(
            COMPLEMENT,
            VariantKind::Complement,
            Read::new(b"c", b"ACGT", b"5555"),
        );
        let chosen = resolve_basecall(vec![complement, template]);
        assert_eq!(chosen.unwrap().name, b"t");
    }

    #[test]
    fn test_single_strand() {
        let chosen = resolve_basecall(vec![candidate(COMPLEMENT, b'+')]);
        assert_eq!(chosen.unwrap().quality, b"++++");
    }

    #[test]
    fn test_latest_location_wins() {
        let chosen = resolve_basecall(vec![
            candidate("Analyses/Basecall_1D_001/BaseCalled_template/Fastq", b'5'),
            candidate("Analyses/Basecall_1D_000/BaseCalled_template/Fastq", b'I'),
        ]);
        assert_eq!(chosen.unwrap().quality, b"5555");
    }

    #[test]
    fn test_other_location_used_last() {
        let chosen = resolve_basecall(vec![
            candidate("Analyses/Basecall_A/Fastq", b'#'),
            candidate("Analyses/Basecall_B/Fastq", b'+'),
        ]);
        assert_eq!(chosen.unwrap().quality, b"++++");
    }

    #[test]
    fn test_chosen_read_taken_from_middle() {
        let chosen = resolve_basecall(vec![
            candidate(TEMPLATE, b'+'),
            candidate(COMPLEMENT, b'I'),
            candidate("Analyses/Basecall_A/Fastq", b'#'),
            candidate("Analyses/Basecall_1D_000/BaseCalled_template/Fastq", b'!'),
        ]);
        assert_eq!(chosen.unwrap().quality, b"IIII");
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(resolve_basecall(Vec::new()), None);
    }

    #[test]
    fn test_malformed_record_is_chosen_but_empty() {
        let chosen = resolve_basecall(vec![BasecallCandidate::from_location(TWO_D, b"@read\nACGT")]);
        assert!(chosen.unwrap().is_empty());
    }
}
