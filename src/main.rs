use clap::Parser;
use std::time::Duration;
use zipliner::core::postal::PostalResolver;
use zipliner::core::route::RouteBuilder;
use zipliner::utils::error::{ErrorSeverity, ZiplinerError};
use zipliner::utils::{logger, validation::Validate};
use zipliner::{
    AppConfig, CliConfig, GeoNamesTables, LocalStorage, MapEngine, OsrmClient, RouteMapPipeline,
};

fn exit_code(e: &ZiplinerError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: ZiplinerError) -> ! {
    tracing::error!(
        "❌ zipliner failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

async fn run(config: AppConfig) -> Result<(), ZiplinerError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("zipliner/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(config.routing.timeout_seconds))
        .build()?;

    let countries = config.country_set();
    let tables = GeoNamesTables::load(&config.postal, &countries, &client).await?;
    let resolver = PostalResolver::new(countries, tables);

    let osrm = OsrmClient::new(client, config.routing.endpoint.clone(), config.routing.profile.clone());
    let builder = RouteBuilder::new(config.routing.mode, osrm, config.retry_policy());

    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = RouteMapPipeline::new(storage, config, resolver, builder);
    let summary = MapEngine::new(pipeline).run().await?;

    if summary.is_complete_success() {
        println!("✅ Done! {} route(s) mapped.", summary.succeeded);
    } else {
        println!(
            "⚠️  {} of {} row(s) failed, see {}",
            summary.failed,
            summary.total(),
            summary.failure_path.as_deref().unwrap_or_default()
        );
    }
    println!("🗺️  Open '{}' in your browser.", summary.map_path);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    logger::init_cli_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting zipliner");
    tracing::debug!("CLI arguments: {:?}", cli);

    let config = match cli.into_app_config() {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    if config.routing_enabled() {
        tracing::info!(
            "🛣️  Routing via {} (max {} attempts, {}s timeout)",
            config.routing.endpoint,
            config.routing.max_attempts,
            config.routing.timeout_seconds
        );
    }

    if let Err(e) = run(config).await {
        fail(e);
    }

    Ok(())
}
