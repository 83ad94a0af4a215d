//! Property tests for the mutation enumerator, label parsing and the
//! wild-type check.
use mutscan_core::scoring::locate_all;
use mutscan_core::{
    generate_all_mutations, generate_all_mutations_with_offset, parse_user_mutations, Mutation,
    ProteinSequence, ScanError, ScoreMatrix, ScoreTable, AMINO_ACIDS,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn protein() -> impl Strategy<Value = String> {
    "[ACDEFGHIKLMNPQRSTVWY]{1,40}"
}

fn amino_acid() -> impl Strategy<Value = char> {
    proptest::sample::select(AMINO_ACIDS.chars().collect::<Vec<_>>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn enumerator_emits_twenty_per_position(raw in protein(), offset in 1usize..500) {
        let sequence = ProteinSequence::parse(&raw).unwrap();
        let all = generate_all_mutations_with_offset(&sequence, offset);
        prop_assert_eq!(all.len(), sequence.len() * 20);
        for (i, chunk) in all.chunks(20).enumerate() {
            let wt = sequence.residue(i).unwrap();
            let mutants: String = chunk.iter().map(|m| m.mutant).collect();
            prop_assert_eq!(mutants.as_str(), AMINO_ACIDS);
            prop_assert!(chunk.iter().all(|m| m.wild_type == wt && m.position == i + offset));
            prop_assert_eq!(chunk.iter().filter(|m| m.is_synonymous()).count(), 1);
        }
    }

    #[test]
    fn labels_parse_back(wt in amino_acid(), position in 1usize..100_000, mt in amino_acid()) {
        let mutation = Mutation::new(wt, position, mt);
        let parsed: Mutation = mutation.to_string().parse().unwrap();
        prop_assert_eq!(parsed, mutation);
    }

    #[test]
    fn user_lists_keep_order(raw in protein()) {
        let sequence = ProteinSequence::parse(&raw).unwrap();
        let all = generate_all_mutations(&sequence);
        let labels: Vec<String> = all.iter().rev().map(ToString::to_string).collect();
        let parsed = parse_user_mutations(&labels.join(", ")).unwrap();
        let reparsed: Vec<String> = parsed.iter().map(ToString::to_string).collect();
        prop_assert_eq!(reparsed, labels);
    }

    #[test]
    fn wild_type_check_fails_iff_symbols_differ(
        raw in protein(),
        idx in any::<prop::sample::Index>(),
        wt in amino_acid(),
        mt in amino_acid(),
    ) {
        let sequence = ProteinSequence::parse(&raw).unwrap();
        let i = idx.index(sequence.len());
        let mutation = Mutation::new(wt, i + 1, mt);
        let result = locate_all(&[mutation], &sequence, 1);
        if sequence.residue(i) == Some(wt) {
            prop_assert_eq!(result.unwrap(), vec![i]);
        } else {
            let is_mismatch = matches!(
                result,
                Err(ScanError::InconsistentMutation { position, .. }) if position == i + 1
            );
            prop_assert!(is_mismatch);
        }
    }

    #[test]
    fn exhaustive_tables_reshape(raw in protein()) {
        let sequence = ProteinSequence::parse(&raw).unwrap();
        let labels: Vec<String> = generate_all_mutations(&sequence)
            .iter()
            .map(ToString::to_string)
            .collect();
        let n = labels.len();
        let mut table = ScoreTable::new(labels);
        table.add_column("m", (0..n).map(|i| i as f32).collect()).unwrap();
        let matrix = ScoreMatrix::from_table(&table, "m", &sequence, 1).unwrap();
        prop_assert_eq!(matrix.n_positions(), sequence.len());
        for (r, label) in matrix.positions().iter().enumerate() {
            let expected = format!("{}{}", sequence.residue(r).unwrap(), r + 1);
            prop_assert_eq!(label, &expected);
        }
    }
}
