//! mysql-script-runner CLI - run SQL scripts against MySQL in order, stopping
//! at the first failure.

use clap::Parser;
use mysql_script_runner::{
    MysqlConnector, RunConfig, RunnerError, ScriptRunner, TaskOptions, TemplateContext,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mysql-script-runner")]
#[command(about = "Run SQL scripts against MySQL in order, stopping at the first failure")]
#[command(version)]
struct Cli {
    /// SQL script files, executed in the order given
    files: Vec<PathBuf>,

    /// Path to a JSON config file merged over the command-line options
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Database host [default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Database port [default: 3306]
    #[arg(long)]
    port: Option<u16>,

    /// Default database for the connection
    #[arg(long)]
    database: Option<String>,

    /// Username
    #[arg(short, long)]
    user: Option<String>,

    /// Password
    #[arg(short, long)]
    password: Option<String>,

    /// TLS mode: disable, prefer, require, verify-ca, verify-full
    #[arg(long)]
    ssl_mode: Option<String>,

    /// Render each script as a template before executing it
    #[arg(long)]
    sql_is_template: bool,

    /// JSON file whose top-level keys become template variables
    #[arg(long)]
    template_data: Option<PathBuf>,

    /// Template variable as KEY=VALUE (repeatable)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

impl Cli {
    fn task_options(&self) -> TaskOptions {
        TaskOptions {
            config_path: self.config_path.clone(),
            host: self.host.clone(),
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            port: self.port,
            // An absent flag leaves the config file free to enable templating.
            sql_is_template: self.sql_is_template.then_some(true),
            ssl_mode: self.ssl_mode.clone(),
        }
    }

    /// Build the template context: process environment under `env`, then
    /// `--template-data`, then `--define` entries.
    fn template_context(&self) -> Result<TemplateContext, RunnerError> {
        let mut context = TemplateContext::new().with_env();

        if let Some(ref path) = self.template_data {
            let content = std::fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&content)?;
            context = context.merge(value).ok_or_else(|| {
                RunnerError::Config(format!(
                    "template data in {:?} must be a JSON object",
                    path
                ))
            })?;
        }

        for define in &self.defines {
            let (key, value) = define.split_once('=').ok_or_else(|| {
                RunnerError::Config(format!("--define expects KEY=VALUE, got '{}'", define))
            })?;
            context = context.with_value(key.trim(), value);
        }

        Ok(context)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), RunnerError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(RunnerError::Config)?;

    let config = RunConfig::resolve(&cli.task_options())?;
    info!(
        "Running {} script(s) against {}",
        cli.files.len(),
        config.endpoint()
    );

    // Malformed template input is reported even when templating is off.
    let context = cli.template_context()?;
    if !config.template_enabled && (cli.template_data.is_some() || !cli.defines.is_empty()) {
        warn!("Template data was given but sqlIsTemplate is not enabled; scripts run as-is");
    }

    let runner = ScriptRunner::new(config, Arc::new(MysqlConnector)).with_context(context);

    let result = runner.run_files(&cli.files).await;

    if cli.output_json {
        println!("{}", result.to_json()?);
    }

    let result = result.into_result()?;
    if !cli.output_json {
        println!(
            "Executed {} script(s) in {:.2}s",
            result.outcomes.len(),
            result.duration_seconds()
        );
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
