use anyhow::Context;
use chassis_monitor::adapters::{ConsoleSink, ReplaySource, SshConnector, ZabbixSender};
use chassis_monitor::domain::ports::Connector;
use chassis_monitor::utils::error::ErrorSeverity;
use chassis_monitor::utils::{logger, validation::Validate};
use chassis_monitor::{run, CliConfig, Monitor, MonitorConfig, RunReport};
use clap::Parser;

async fn run_with_sink<K: Connector>(
    cli: &CliConfig,
    monitor: &Monitor<MonitorConfig>,
    connector: &K,
) -> RunReport {
    if cli.dry_run {
        tracing::info!("🔍 Dry run, payload is printed instead of sent");
        run(monitor, cli.mode, connector, &ConsoleSink).await
    } else {
        let sender = ZabbixSender::new(&monitor.config().sink);
        run(monitor, cli.mode, connector, &sender).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => MonitorConfig::default(),
    };
    cli.apply(&mut config);
    tracing::debug!("Resolved config: {:?}", config.sink);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let report = match cli.replay_files() {
        Some((module_table, error_log)) => {
            let source =
                ReplaySource::new(&config, module_table.to_path_buf(), error_log.to_path_buf());
            let monitor = Monitor::new(config);
            run_with_sink(&cli, &monitor, &source).await
        }
        None => {
            // chassis settings are validated in connect and end up in the errors item
            let connector = SshConnector::new(&config);
            let monitor = Monitor::new(config);
            run_with_sink(&cli, &monitor, &connector).await
        }
    };

    if let Some(document) = &report.discovery {
        println!("{}", serde_json::to_string_pretty(document)?);
    }

    match &report.delivery {
        Ok(response) if report.diagnostics.is_empty() => {
            tracing::info!("✅ Run completed, {} items delivered", response.processed);
        }
        Ok(_) => {
            tracing::warn!(
                "⚠️ Run completed with {} diagnostic(s)",
                report.diagnostics.messages().len()
            );
        }
        Err(e) => {
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
    }

    Ok(())
}
