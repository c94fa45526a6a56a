use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use vo_cone::adapters::output::write_table;
use vo_cone::utils::error::{ConeError, ErrorSeverity};
use vo_cone::utils::{logger, validation::Validate};
use vo_cone::{CliConfig, CoordsInput, RadiusInput, ServiceInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("🚀 Starting vo-cone");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Cone search failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), ConeError> {
    cli.validate()?;

    let config = cli.resolve()?;
    config.validate()?;
    if config.services.is_empty() {
        return Err(ConeError::MissingConfigError {
            field: "services".to_string(),
        });
    }

    let cone = config.cone_search()?;
    tracing::info!(
        "✅ {} service(s), timeout {:?}, {} attempt(s), {:?} on failure",
        config.services.len(),
        cone.settings().timeout,
        cone.settings().retries,
        cone.failure_policy()
    );
    if let Some(url) = config.resolver_url() {
        tracing::info!("🔎 Object names resolved via {}", url);
    }

    let coords = CoordsInput::from(cli.coords.clone());
    let radius = match cli.radius.as_slice() {
        [single] => RadiusInput::Single(*single),
        many => RadiusInput::PerPosition(many.to_vec()),
    };
    let services: Vec<ServiceInput> = config.services.iter().cloned().map(ServiceInput::from).collect();

    let table = cone.query_services(services, coords, radius).await?;
    tracing::info!(
        "📊 {} row(s), {} column(s) from {} sub-query(ies)",
        table.len(),
        table.columns.len(),
        table.meta.url.len()
    );

    match &cli.output {
        Some(path) => {
            let file = File::create(path)?;
            write_table(&table, cli.format, BufWriter::new(file))?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => {
            let stdout = std::io::stdout();
            write_table(&table, cli.format, stdout.lock())?;
        }
    }

    Ok(())
}
