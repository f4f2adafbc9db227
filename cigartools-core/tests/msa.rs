//! Rendering alignments as multiple sequence alignments and parsing them
//! back.

use cigartools_core::{Cigar, CigarError, CigarHit};

fn hit(text: &str) -> CigarHit {
    CigarHit::parse(text).unwrap()
}

#[test]
fn test_cigar_to_msa() {
    let cases = [
        ("ACTG", "ACTG", "4M", "ACTG", "ACTG"),
        ("ACTG", "", "4D", "ACTG", "----"),
        ("", "ACTG", "4I", "----", "ACTG"),
        ("ACTGAC", "ACAC", "2M2D2M", "ACTGAC", "AC--AC"),
        ("ACAC", "ACTGAC", "2M2I2M", "AC--AC", "ACTGAC"),
        ("GCTATGGGAA", "GCTATGGGAA", "5M3D2M", "GCTATGGGAA", "GCTAT---GG"),
        // Operations that consume neither side are not rendered.
        ("ACTG", "ACTG", "2M99H77P2M", "ACTG", "ACTG"),
    ];

    for (reference_seq, query_seq, cigar, expected_reference, expected_query) in cases {
        let (reference_msa, query_msa) = Cigar::parse(cigar)
            .unwrap()
            .to_msa(reference_seq, query_seq)
            .unwrap();
        assert_eq!(reference_msa, expected_reference, "reference row of {cigar}");
        assert_eq!(query_msa, expected_query, "query row of {cigar}");
    }
}

#[test]
fn test_cigar_to_msa_rejects_short_sequences() {
    let cases = [
        ("10M", "AAA", "AAAAAAAAAA"), // reference shorter than the CIGAR
        ("10M", "AAAAAAAAAA", "AAA"), // query shorter than the CIGAR
        ("10D", "AAA", "AAA"),
        ("10I", "AAA", "AAA"),
    ];

    for (cigar, reference_seq, query_seq) in cases {
        let result = Cigar::parse(cigar).unwrap().to_msa(reference_seq, query_seq);
        assert!(
            matches!(result, Err(CigarError::MSALength(_))),
            "{cigar} over ({reference_seq}, {query_seq}) should fail"
        );
    }
}

#[test]
fn test_from_msa() {
    let cases = [
        ("ACTGACTG", "ACTGACTG", "8M"),
        ("ACTG----ACTG", "ACTGACTG----", "4M4I4D"),
        ("----ACTG", "ACTGACTG", "4I4M"),
        // Mismatching columns still become matches.
        ("ACGTACGT", "ACGAAGTT", "8M"),
        ("", "", ""),
        ("AAAA----TTTT", "----GGGG----", "4D4I4D"),
        ("A---CGT", "ATTT---", "1M3I3D"),
        ("GG--C--TTA--A", "GGTT---AACCCA", "2M2I1D3M2I1M"),
        ("AAA---AAA", "---AAA---", "3D3I3D"),
        ("---ACTG---", "TTTACTGGGG", "3I4M3I"),
        ("TTTACTGGGG", "---ACTG---", "3D4M3D"),
        ("-A-C-G-", "Z-Z-Z-Z", "1I1D1I1D1I1D1I"),
        ("AAAAAAAAAA", "TTTTTTTTTT", "10M"),
        ("-B-D-", "A-C-E", "1I1D1I1D1I"),
        ("A", "A", "1M"),
        ("A", "-", "1D"),
        ("-", "A", "1I"),
        ("A-C-T-G", "A-G-C-T", "4M"),
    ];

    for (reference, query, expected) in cases {
        let cigar = Cigar::from_msa(reference, query).unwrap().relax();
        assert_eq!(cigar.to_string(), expected, "from_msa({reference}, {query})");
    }

    let long_insert = Cigar::from_msa(&"-".repeat(100), &"A".repeat(100)).unwrap();
    assert_eq!(long_insert.to_string(), "100I");
    let long_delete = Cigar::from_msa(&"A".repeat(100), &"-".repeat(100)).unwrap();
    assert_eq!(long_delete.to_string(), "100D");
}

#[test]
fn test_from_msa_rejects_unequal_lengths() {
    for (reference, query) in [("ACTG", "ACG"), ("ACTG-", "ACTG")] {
        assert!(matches!(
            Cigar::from_msa(reference, query),
            Err(CigarError::Parse(_))
        ));
    }
}

#[test]
fn test_cigar_hit_to_msa() {
    let cases = [
        ("ACTG", "ACTG", "4M@1->1", "ACTG", "ACTG"),
        ("ACTG", "", "4D@1->1", "ACTG", "----"),
        ("", "ACTG", "4I@1->1", "----", "ACTG"),
        ("ACTGAC", "ACAC", "2M2D2M@1->1", "ACTGAC", "AC--AC"),
        ("ACAC", "ACTGAC", "2M2I2M@1->1", "AC--AC", "ACTGAC"),
        ("GCTATGGGAA", "GCTATGGGAA", "5M3D2M@1->1", "GCTATGGGAA", "GCTAT---GG"),
        ("ACTG", "ACTG", "2M99H77P2M@1->1", "ACTG", "ACTG"),
        // Hit coordinates are 1-based and pick the aligned slice out of the
        // full sequences.
        ("ACTG", "ACTG", "2M@1->3", "TG", "AC"),
        ("ACTG", "ACTG", "2M@3->1", "AC", "TG"),
        ("ACTG", "ACTG", "2M@3->2", "CT", "TG"),
    ];

    for (reference_seq, query_seq, hit_str, expected_reference, expected_query) in cases {
        let (reference_msa, query_msa) = hit(hit_str).to_msa(reference_seq, query_seq).unwrap();
        assert_eq!(reference_msa, expected_reference, "reference row of {hit_str}");
        assert_eq!(query_msa, expected_query, "query row of {hit_str}");
    }
}

#[test]
fn test_cigar_hit_to_msa_rejects_out_of_range_hits() {
    let cases = [
        ("10M@1->1", "AAA", "AAAAAAAAAA"),
        ("10M@1->1", "AAAAAAAAAA", "AAA"),
        ("10D@1->1", "AAA", "AAA"),
        ("10I@1->1", "AAA", "AAA"),
        ("1M@99->1", "AAA", "AAA"),
        ("1M@1->99", "AAA", "AAA"),
        ("1M@99->99", "AAA", "AAA"),
    ];

    for (hit_str, reference_seq, query_seq) in cases {
        let result = hit(hit_str).to_msa(reference_seq, query_seq);
        assert!(
            matches!(result, Err(CigarError::MSALength(_))),
            "{hit_str} over ({reference_seq}, {query_seq}) should fail"
        );
    }
}

#[test]
fn test_msa_round_trip_through_hit() {
    // from_msa + to_msa reproduce the rows when the hit spans the inputs.
    let reference = "ACTG---TACGT";
    let query = "ACTGCCAT---T";
    let cigar = Cigar::from_msa(reference, query).unwrap();

    let plain_reference: String = reference.chars().filter(|base| *base != '-').collect();
    let plain_query: String = query.chars().filter(|base| *base != '-').collect();
    let rendered = cigar.to_msa(&plain_reference, &plain_query).unwrap();
    assert_eq!(rendered, (reference.to_string(), query.to_string()));
}
