use mutscan_core::scoring::pseudo_log_likelihood;
use mutscan_core::{
    Alignment, LanguageModel, MutationInput, ProteinSequence, ScanConfig, ScanError,
    ScoringStrategy, SequenceModelAdapter,
};
use mutscan_test_data::{TestFile, ToyModel, EXAMPLE_SEQUENCE};
use std::path::Path;

fn sequence(s: &str) -> ProteinSequence {
    ProteinSequence::parse(s).unwrap()
}

fn user(list: &str) -> MutationInput {
    MutationInput::resolve(Some(list), None, None).unwrap()
}

fn log_softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f32::MIN, f32::max) as f64;
    let norm = logits.iter().map(|l| (*l as f64 - max).exp()).sum::<f64>().ln() + max;
    logits.iter().map(|l| *l as f64 - norm).collect()
}

#[test]
fn test_exhaustive_scan_of_three_residues() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder().sequence(sequence("ACD")).build();
    let result = scan.run(&[&model]).unwrap();

    assert_eq!(result.table.len(), 60);
    assert_eq!(result.table.labels()[0], "A1A");
    assert_eq!(result.table.labels()[59], "D3Y");
    assert_eq!(model.forward_calls(), 1);

    let matrix = result.matrix.expect("exhaustive scans have a matrix");
    assert_eq!(matrix.positions(), ["A1", "C2", "D3"]);
    assert_eq!(matrix.rows().len(), 3);
    assert_eq!(matrix.get(0, 'A'), Some(0.0));
    assert_eq!(matrix.get(1, 'C'), Some(0.0));
}

#[test]
fn test_user_mutations_have_no_matrix() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .input(user("A1C,D3A"))
        .strategy(ScoringStrategy::WtMarginals)
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(result.table.labels(), ["A1C", "D3A"]);
    assert!(result.matrix.is_none());
    let scores = result.table.column("toy").unwrap();
    // C (23) ranks above A (5); A (5) below D (13)
    assert!(scores[0] > 0.0);
    assert!(scores[1] < 0.0);
}

#[test]
fn test_wild_type_mismatch_fails_before_scoring() {
    let model = ToyModel::new();
    for strategy in [
        ScoringStrategy::WtMarginals,
        ScoringStrategy::MaskedMarginals,
        ScoringStrategy::PseudoPpl,
    ] {
        let scan = ScanConfig::builder()
            .sequence(sequence("GCD"))
            .input(user("A1C"))
            .strategy(strategy)
            .build();
        match scan.run(&[&model]) {
            Err(ScanError::InconsistentMutation {
                position,
                expected,
                found,
                ..
            }) => {
                assert_eq!(position, 1);
                assert_eq!(expected, 'A');
                assert_eq!(found, 'G');
            }
            other => panic!("expected a wild-type mismatch, got {:?}", other.map(|_| ())),
        }
    }
    assert_eq!(model.forward_calls(), 0);
}

#[test]
fn test_pseudo_ppl_sums_masked_log_probabilities() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .input(user("A1C"))
        .strategy(ScoringStrategy::PseudoPpl)
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(model.forward_calls(), 3);
    assert_eq!(model.forward_rows(), 3);

    let alphabet = model.alphabet();
    let tokens = alphabet.tokenize("CCD").unwrap();
    let mut expected = 0.0f64;
    for pos in 1..=3 {
        let mut masked = tokens.clone();
        masked[pos] = alphabet.mask_idx();
        let logits = model.row_logits(&masked, &[]);
        let row = &logits[pos * alphabet.len()..(pos + 1) * alphabet.len()];
        expected += log_softmax(row)[tokens[pos] as usize];
    }
    let score = result.table.column("toy").unwrap()[0] as f64;
    assert!((score - expected).abs() < 1e-4, "{} != {}", score, expected);
}

#[test]
fn test_masked_marginals_run_one_pass_per_residue() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .strategy(ScoringStrategy::MaskedMarginals)
        .build();
    let single = scan.run(&[&model]).unwrap();
    assert_eq!(model.forward_calls(), EXAMPLE_SEQUENCE.len());
    assert_eq!(single.table.len(), EXAMPLE_SEQUENCE.len() * 20);

    model.reset_counters();
    let batched = ScanConfig {
        batch_size: 4,
        ..scan.clone()
    }
    .run(&[&model])
    .unwrap();
    assert_eq!(model.forward_calls(), 3);
    assert_eq!(model.forward_rows(), EXAMPLE_SEQUENCE.len());
    assert_eq!(single.table, batched.table);
}

#[test]
fn test_marginal_strategies_agree_in_sign() {
    let model = ToyModel::new();
    let base = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .build();
    let wt = base.run(&[&model]).unwrap();
    let masked = ScanConfig {
        strategy: ScoringStrategy::MaskedMarginals,
        ..base.clone()
    }
    .run(&[&model])
    .unwrap();

    let wt_scores = wt.table.column("toy").unwrap();
    let masked_scores = masked.table.column("toy").unwrap();
    for ((label, a), b) in wt.table.labels().iter().zip(wt_scores).zip(masked_scores) {
        assert_eq!(a.signum(), b.signum(), "{}: {} vs {}", label, a, b);
    }
    // no-op substitutions score exactly zero
    for (label, score) in wt.table.labels().iter().zip(wt_scores) {
        let bytes = label.as_bytes();
        if bytes[0] == bytes[bytes.len() - 1] {
            assert_eq!(*score, 0.0, "{}", label);
        }
    }
}

#[test]
fn test_offset_shifts_labels() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .offset(10)
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(result.table.labels()[0], "A10A");
    assert_eq!(result.matrix.unwrap().positions(), ["A10", "C11", "D12"]);

    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .input(user("C11A"))
        .offset(10)
        .build();
    assert!(scan.run(&[&model]).is_ok());
}

#[test]
fn test_models_are_ensembled_as_columns() {
    let first = ToyModel::new().with_name("first");
    let second = ToyModel::new().with_name("second");
    let scan = ScanConfig::builder().sequence(sequence("AC")).build();
    let result = scan.run(&[&first, &second]).unwrap();
    let names: Vec<&str> = result.table.column_names().collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(
        result.table.column("first"),
        result.table.column("second")
    );
    assert!(result.matrix.is_some());
}

#[test]
fn test_repeated_model_name_fails_before_scoring() {
    let first = ToyModel::new().with_name("toy");
    let second = ToyModel::new().with_name("toy");
    let scan = ScanConfig::builder().sequence(sequence("AC")).build();
    let err = scan.run(&[&first, &second]).unwrap_err();
    assert!(matches!(err, ScanError::ConflictingInputs(_)));
    assert!(err.to_string().contains("'toy'"));
    assert_eq!(first.forward_calls() + second.forward_calls(), 0);
}

#[test]
fn test_sequence_over_model_limit() {
    let model = ToyModel::new().with_max_length(2);
    let scan = ScanConfig::builder().sequence(sequence("ACD")).build();
    assert!(matches!(
        scan.run(&[&model]),
        Err(ScanError::UnsupportedSequenceLength { length: 3, max: 2 })
    ));
}

#[test]
fn test_indels_score_against_wild_type() {
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .input(MutationInput::resolve(None, Some("ACDE,3,AD,1"), None).unwrap())
        .strategy(ScoringStrategy::Indel)
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(result.table.labels(), ["3:ACDE", "1:AD"]);
    assert!(result.matrix.is_none());
    // wild type once, then one pass per residue of each indel
    assert_eq!(model.forward_calls(), 3 + 4 + 2);

    let reference = ToyModel::new();
    let adapter = SequenceModelAdapter::new(&reference);
    let expected = pseudo_log_likelihood(&adapter, "ACDE").unwrap()
        - pseudo_log_likelihood(&adapter, "ACD").unwrap();
    let score = result.table.column("toy").unwrap()[0];
    assert!((score - expected).abs() < 1e-5);
}

#[test]
fn test_indel_input_needs_indel_strategy() {
    let model = ToyModel::new();
    let indels = MutationInput::resolve(None, Some("ACDE,3"), None).unwrap();
    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .input(indels)
        .strategy(ScoringStrategy::WtMarginals)
        .build();
    assert!(matches!(
        scan.run(&[&model]),
        Err(ScanError::ConflictingInputs(_))
    ));

    let scan = ScanConfig::builder()
        .sequence(sequence("ACD"))
        .strategy(ScoringStrategy::Indel)
        .build();
    assert!(matches!(
        scan.run(&[&model]),
        Err(ScanError::ConflictingInputs(_))
    ));
}

#[test]
fn test_alignment_model_scores_query_row() {
    let (path, _handle) = TestFile::alignment_01().create_temp().unwrap();
    let alignment = Alignment::read_a3m(&path, 400).unwrap();
    let model = ToyModel::alignment();
    let scan = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .input(user("K2R,Y5F"))
        .strategy(ScoringStrategy::MaskedMarginals)
        .alignment(alignment.clone())
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(model.forward_calls(), EXAMPLE_SEQUENCE.len());

    // K2R read back from the query row with position 2 masked
    let alphabet = model.alphabet();
    let rows: Vec<Vec<u32>> = alignment
        .rows()
        .map(|row| alphabet.tokenize(row).unwrap())
        .collect();
    let mut query = rows[0].clone();
    query[2] = alphabet.mask_idx();
    let others: Vec<&[u32]> = rows[1..].iter().map(Vec::as_slice).collect();
    let logits = model.row_logits(&query, &others);
    let row = log_softmax(&logits[2 * alphabet.len()..3 * alphabet.len()]);
    let k = alphabet.symbol_to_index('K').unwrap() as usize;
    let r = alphabet.symbol_to_index('R').unwrap() as usize;
    let expected = row[r] - row[k];
    let score = result.table.column("toy-msa").unwrap()[0] as f64;
    assert!((score - expected).abs() < 1e-4, "{} != {}", score, expected);
}

#[test]
fn test_alignment_model_configuration_errors() {
    let (path, _handle) = TestFile::alignment_01().create_temp().unwrap();
    let alignment = Alignment::read_a3m(&path, 400).unwrap();
    let model = ToyModel::alignment();

    let wrong_strategy = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .strategy(ScoringStrategy::WtMarginals)
        .alignment(alignment.clone())
        .build();
    assert!(matches!(
        wrong_strategy.run(&[&model]),
        Err(ScanError::IncompatibleStrategy { .. })
    ));

    let no_alignment = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .strategy(ScoringStrategy::MaskedMarginals)
        .build();
    assert!(matches!(
        no_alignment.run(&[&model]),
        Err(ScanError::MissingAlignment(_))
    ));

    let other_query = ScanConfig::builder()
        .sequence(sequence("MKTAYIAKQK"))
        .strategy(ScoringStrategy::MaskedMarginals)
        .alignment(alignment)
        .build();
    assert!(matches!(
        other_query.run(&[&model]),
        Err(ScanError::ConflictingInputs(_))
    ));
    assert_eq!(model.forward_calls(), 0);
}

#[test]
fn test_dms_file_input() {
    let (path, _handle) = TestFile::dms_01().create_temp().unwrap();
    let input = MutationInput::resolve(None, None, Some((Path::new(&path), "mutant"))).unwrap();
    let model = ToyModel::new();
    let scan = ScanConfig::builder()
        .sequence(sequence(EXAMPLE_SEQUENCE))
        .input(input)
        .build();
    let result = scan.run(&[&model]).unwrap();
    assert_eq!(result.table.len(), 9);
    assert_eq!(result.table.labels()[0], "M1A");
    assert_eq!(result.table.labels()[8], "R10K");
}
