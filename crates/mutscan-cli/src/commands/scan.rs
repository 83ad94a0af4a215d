use crate::cli::ScanArgs;
use anyhow::{Context, Result};
use mutscan_core::{
    write_label_list, Alignment, MutationInput, ProteinSequence, ScanConfig, ScoringStrategy,
};
use mutscan_plms::device;
use mutscan_viz::{PlotStyle, ScanRenderer, SvgRenderer};

pub fn execute(args: ScanArgs) -> Result<()> {
    let sequence = ProteinSequence::parse(&args.sequence)?;
    let input = MutationInput::resolve(
        args.dms_mutation.as_deref(),
        args.dms_indel.as_deref(),
        args.dms_input
            .as_deref()
            .map(|path| (path, args.mutation_col.as_str())),
    )?;
    let strategy = args.scoring_strategy.unwrap_or(match input {
        MutationInput::UserIndels(_) => ScoringStrategy::Indel,
        _ => ScoringStrategy::WtMarginals,
    });
    let alignment = args
        .msa_path
        .as_deref()
        .map(|path| Alignment::read_a3m(path, args.msa_samples))
        .transpose()?;

    let scan = ScanConfig::builder()
        .sequence(sequence)
        .input(input)
        .strategy(strategy)
        .offset(args.offset_idx)
        .batch_size(args.batch_size)
        .maybe_alignment(alignment)
        .build();

    // Everything that can fail without a model fails before the first download.
    scan.validate()?;
    let names: Vec<String> = args.models.iter().map(ToString::to_string).collect();
    let ensemble: Vec<(&str, bool)> = names
        .iter()
        .zip(&args.models)
        .map(|(name, spec)| (name.as_str(), spec.is_alignment_aware()))
        .collect();
    scan.check_models(&ensemble)?;

    let labels = scan.labels();
    let list = format!("{}-{}", args.output_prefix, scan.input.list_file_suffix());
    write_label_list(&list, &labels)?;
    tracing::info!(path = %list, count = labels.len(), "wrote mutation list");

    let device = device(args.cpu)?;
    let mut columns = Vec::with_capacity(args.models.len());
    for (name, spec) in names.iter().zip(&args.models) {
        let model = spec
            .load(&device)
            .with_context(|| format!("failed to load model {}", spec))?;
        columns.push((name.clone(), scan.score_model(model.as_ref())?));
    }

    let result = scan.assemble(columns)?;
    result.write_csv(&args.output_prefix)?;
    if !args.no_plots {
        SvgRenderer::new(PlotStyle::default()).render(&result, &args.output_prefix)?;
    }
    Ok(())
}
