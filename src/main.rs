use clap::Parser;
use permgap::{
    analyzer::{GapAnalyzer, unmapped_types},
    cli::Cli,
    config::Config,
    iam::{AwsPolicySimulator, AwsPolicyStore, PermissionAggregator, PrincipalIdentity},
    logging::init_logging,
    mapping::{ActionTable, derive_required_actions},
    output::OutputWriter,
    terraform::SourceModelBuilder,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color);

    let config = Config::from_cli(cli)?;

    log::debug!("Configuration: {:?}", config);

    // Load the action mapping table once; it is immutable afterwards.
    let table = ActionTable::load(config.mappings_file.as_deref())?;
    log::debug!("Action mapping table has {} entries", table.len());

    // Build the source model from the target file or directory.
    let builder = SourceModelBuilder::new(config.duplicate_modules);
    let (model, diagnostics) = builder.build(&config.target)?;

    if model.is_empty() {
        log::info!(
            "No resource or data blocks found in {:?}",
            config.target
        );
    }

    for (name, declarations) in &model.modules {
        for module in declarations {
            log::debug!(
                "Module {:?} (source: {:?})",
                name,
                model.resolved_module_source(module)
            );
        }
    }

    let required = derive_required_actions(&model, &table);
    let unmapped = unmapped_types(&model, &table);

    log::debug!(
        "{} required action(s), {} unmapped type(s)",
        required.len(),
        unmapped.len()
    );

    let writer = OutputWriter::new(
        config.output_format,
        config.output_file.clone(),
        config.no_color,
    );

    if config.requirements_only {
        writer.write_requirements(&required, &unmapped, &diagnostics)?;
        return Ok(());
    }

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let identity = match &config.principal_arn {
        Some(arn) => PrincipalIdentity::from_arn(arn)?,
        None => PrincipalIdentity::resolve_caller(&aws_config).await?,
    };
    log::info!("Analyzing principal {}", identity.arn);

    // The full effective permission set is aggregated before the analyzer
    // runs; a fetch failure aborts here rather than producing a report
    // built on partial knowledge.
    let store = AwsPolicyStore::new(&aws_config);
    let aggregator = PermissionAggregator::new(&store, config.max_concurrency);
    let effective = aggregator.aggregate(&identity).await?;
    log::debug!("Aggregated {} policy document(s)", effective.len());

    let simulator = AwsPolicySimulator::new(&aws_config);
    let analyzer = GapAnalyzer::new(&simulator);
    let report = analyzer
        .analyze(&required, &model, &table, &identity, &diagnostics)
        .await?;

    writer.write(&report, &effective)?;

    Ok(())
}
