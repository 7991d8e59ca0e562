//! CLI entry point for `sqlnav`.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlnav_core::{LogFormat, SqlNavConfig};
use sqlnav_database_tools::{
    DatabaseToolConfig, RelationshipService, SqlValidator, connect_database, execute_query,
    scan_schema,
};
use sqlnav_telemetry::{TelemetryOptions, init_telemetry};

use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "sqlnav",
    version,
    about = "Explore foreign-key relationships and generate JOIN queries"
)]
struct Cli {
    /// Database connection string (postgresql://... or sqlite:...)
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    connection_string: Option<String>,

    /// Schema to inspect (default: public for PostgreSQL, main for SQLite)
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Configuration file (default: sqlnav.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown", global = true)]
    output_format: OutputFormat,

    /// Always read the catalog instead of using cached snapshots
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List foreign keys and many-to-many relationships (default)
    Relationships,

    /// Suggest the JOIN between two tables
    SuggestJoin { table1: String, table2: String },

    /// Generate a query joining all given tables; the first is the FROM table
    GenerateJoin {
        #[arg(required = true)]
        tables: Vec<String>,

        /// Use SELECT * instead of one <table>.* per table
        #[arg(long)]
        select_all: bool,
    },

    /// Detect junction tables
    #[command(name = "detect-m2m")]
    DetectM2m,

    /// Execute a SQL statement
    Query {
        #[arg(long)]
        sql: String,

        /// Allow INSERT/UPDATE/DELETE statements
        #[arg(long)]
        allow_writes: bool,

        /// Maximum number of rows to return
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// Check a SQL statement against the schema without running it
    Validate {
        #[arg(long)]
        sql: String,

        /// Include the query planner's estimate
        #[arg(long)]
        explain: bool,
    },

    /// Describe tables, columns, indexes and constraints
    Schema {
        /// Only describe this table
        #[arg(long)]
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SqlNavConfig> {
    let mut config = match &cli.config {
        Some(path) => SqlNavConfig::load_from(path)?,
        None => SqlNavConfig::load()?,
    };

    if let Some(connection_string) = &cli.connection_string {
        config.database.connection_string = Some(connection_string.clone());
    }
    if let Some(schema) = &cli.schema {
        config.database.schema = Some(schema.clone());
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    Ok(config)
}

fn telemetry_options(cli: &Cli, config: &SqlNavConfig) -> TelemetryOptions {
    let mut options = if cli.verbose {
        TelemetryOptions::verbose()
    } else {
        TelemetryOptions::default()
    };
    options.json = config.observability.log_format == LogFormat::Json;
    if let Some(name) = &config.observability.otel_service_name {
        options.service_name = name.clone();
    }
    options
}

fn exit_code(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli)?;

    if let Err(e) = init_telemetry(telemetry_options(&cli, &config)) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let tool_config = DatabaseToolConfig::from_tools_config(&config.tools);
    let handle = connect_database(config.connection_string()?, &tool_config)
        .await
        .context("Failed to connect to database")?;

    let service = RelationshipService::from_config(handle.catalog.clone(), &config.cache);
    let schema = config
        .database
        .schema
        .clone()
        .unwrap_or_else(|| service.default_schema().to_string());
    let format = cli.output_format;

    tracing::debug!(endpoint = %service.endpoint(), schema = %schema, "Connected");

    let code = match cli.command.unwrap_or(Command::Relationships) {
        Command::Relationships => {
            let foreign_keys = service.foreign_keys(&schema).await?;
            let many_to_many = service.many_to_many(&schema).await?;
            println!("{}", output::relationships(&foreign_keys, &many_to_many, format)?);
            ExitCode::SUCCESS
        }
        Command::SuggestJoin { table1, table2 } => {
            let suggestion = service.suggest_join(&schema, &table1, &table2).await?;
            println!("{}", output::suggestion(&table1, &table2, &suggestion, format)?);
            exit_code(suggestion.found)
        }
        Command::GenerateJoin { tables, select_all } => {
            let result = service.generate_join(&schema, &tables, select_all).await?;
            println!("{}", output::multi_join(&result, format)?);
            exit_code(result.found)
        }
        Command::DetectM2m => {
            let relationships = service.many_to_many(&schema).await?;
            println!("{}", output::many_to_many(&relationships, format)?);
            ExitCode::SUCCESS
        }
        Command::Query {
            sql,
            allow_writes,
            max_rows,
        } => {
            let mut query_config = if allow_writes {
                DatabaseToolConfig {
                    max_rows: tool_config.max_rows,
                    timeout_secs: tool_config.timeout_secs,
                    ..DatabaseToolConfig::with_write_enabled()
                }
            } else {
                tool_config
            };
            if let Some(max_rows) = max_rows {
                query_config.max_rows = max_rows;
            }

            let result = execute_query(handle.executor.as_ref(), &sql, &query_config).await?;
            println!("{}", output::query_result(&result, format)?);
            ExitCode::SUCCESS
        }
        Command::Validate { sql, explain } => {
            let validator = SqlValidator::new(handle.catalog.clone(), handle.executor.clone());
            let report = validator.validate(&sql, &schema, explain).await;
            println!("{}", output::validation(&report, format)?);
            exit_code(report.valid)
        }
        Command::Schema { table } => {
            let scan = scan_schema(handle.catalog.as_ref(), &schema, table.as_deref()).await?;
            println!("{}", output::schema_scan(&scan, format)?);
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
