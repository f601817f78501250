use clap::Parser;
use criteria_sql::{CompilerConfig, Context};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "criteria-sql")]
#[command(about = "Compile a criteria query into parameterized SQL", long_about = None)]
struct Args {
    /// Criteria document (JSON); `-` reads standard input
    query: PathBuf,

    /// Schema file (.json or .toml)
    #[arg(short, long)]
    schema: PathBuf,

    /// Compiler configuration file
    #[arg(short, long, default_value = criteria_sql::config::CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Dialect name, overrides the configuration and CRITERIA_DIALECT
    #[arg(short, long)]
    dialect: Option<String>,

    /// Print only the SQL text
    #[arg(long)]
    sql_only: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "criteria_sql=info,criteria_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = CompilerConfig::load(&args.config)?;
    config.apply_env_overrides();
    config.override_dialect(args.dialect);

    let context = Context::load(&args.schema, &config)?;

    let document = if args.query.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.query)?
    };

    let compiled = context.compile_json(&document)?;
    tracing::info!("Compiled statement with {} parameters", compiled.parameters.len());

    if args.sql_only {
        println!("{}", compiled.sql);
    } else {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
    }

    Ok(())
}
