use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Runs one SQL statement against the gateway's embedded database and
/// prints the result as JSON lines, for operators inspecting the catalog
/// or audit log without going through the HTTP admin surface.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the DuckDB file the gateway server is using.
    #[arg(long, env = "DUCKDB_PATH", default_value = "gateway.duckdb")]
    db_path: PathBuf,

    /// The SQL statement to run.
    #[arg(long)]
    sql: String,

    /// Open the database read-only, refusing to run statements that
    /// write to it.
    #[arg(long, default_value_t = true)]
    read_only: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let args = Args::parse();

    let conn = if args.read_only {
        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .context("building read-only config")?;
        duckdb::Connection::open_with_flags(&args.db_path, config)
            .with_context(|| format!("opening {} read-only", args.db_path.display()))?
    } else {
        duckdb::Connection::open(&args.db_path)
            .with_context(|| format!("opening {}", args.db_path.display()))?
    };

    let mut stmt = conn.prepare(&args.sql).context("preparing statement")?;
    let column_count = stmt.column_count();
    let column_names: Vec<String> = (0..column_count)
        .map(|i| stmt.column_name(i).unwrap_or("?").to_string())
        .collect();

    let mut rows = stmt.query([]).context("running statement")?;
    let mut printed = 0usize;
    while let Some(row) = rows.next().context("fetching row")? {
        let mut object = serde_json::Map::new();
        for (i, name) in column_names.iter().enumerate() {
            let value: duckdb::types::Value = row.get(i).unwrap_or(duckdb::types::Value::Null);
            object.insert(name.clone(), duckdb_value_to_json(value));
        }
        println!("{}", serde_json::Value::Object(object));
        printed += 1;
    }

    tracing::info!(rows = printed, "query complete");
    Ok(())
}

fn duckdb_value_to_json(value: duckdb::types::Value) -> serde_json::Value {
    use duckdb::types::Value as V;
    match value {
        V::Null => serde_json::Value::Null,
        V::Boolean(b) => serde_json::Value::Bool(b),
        V::TinyInt(i) => serde_json::Value::from(i),
        V::SmallInt(i) => serde_json::Value::from(i),
        V::Int(i) => serde_json::Value::from(i),
        V::BigInt(i) => serde_json::Value::from(i),
        V::Float(f) => serde_json::Value::from(f),
        V::Double(f) => serde_json::Value::from(f),
        V::Text(s) => serde_json::Value::String(s),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}
