//! strata — schema to DDL compiler
//!
//! # Usage
//!
//! ```bash
//! # Creation script for every database in the document
//! strata sql schema.json --platform mysql
//!
//! # Finalize and summarize the model
//! strata check schema.json
//!
//! # Migration DDL between two versions of a schema
//! strata diff old.json new.json --platform pgsql
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use strata::prelude::*;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Schema model and dialect-aware DDL compiler", long_about = None)]
#[command(after_help = "EXAMPLES:
    strata sql schema.json --platform mysql -o schema.sql
    strata check schema.json
    strata diff v1.json v2.json --platform sqlite")]
struct Cli {
    /// Target dialect, overrides the document and the config file
    #[arg(short, long, global = true, env = "STRATA_PLATFORM")]
    platform: Option<String>,

    /// Path to strata.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the creation script
    Sql {
        /// JSON schema document
        schema: PathBuf,

        /// Write the script to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Finalize the schema and print a summary of every entity
    Check {
        /// JSON schema document
        schema: PathBuf,
    },
    /// Render migration DDL from one schema version to another
    Diff {
        from: PathBuf,
        to: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the supported dialects
    Platforms,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "strata=debug" } else { "strata=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Sql { schema, output } => {
            let targets = Targets::resolve(cli)?;
            let schema = targets.load(schema)?;
            let mut sql = String::new();
            for database in schema.databases() {
                let platform = targets.platform_for(database)?;
                sql.push_str(&database.sql_dump(platform.as_ref())?);
            }
            write_output(&sql, output.as_deref())
        }
        Commands::Check { schema } => {
            let targets = Targets::resolve(cli)?;
            let schema = targets.load(schema)?;
            print_summary(&schema, &targets)
        }
        Commands::Diff { from, to, output } => {
            let targets = Targets::resolve(cli)?;
            let old = targets.load(from)?;
            let new = targets.load(to)?;

            let mut sql = String::new();
            for database in new.databases() {
                let platform = targets.platform_for(database)?;
                let Some(previous) = old.database(database.name()) else {
                    sql.push_str(&database.sql_dump(platform.as_ref())?);
                    continue;
                };
                let diff = compare(previous, database);
                if diff.is_empty() {
                    tracing::info!("Database '{}' is unchanged", database.name());
                    continue;
                }
                sql.push_str(&platform.get_modify_database_ddl(&diff)?);
            }
            write_output(&sql, output.as_deref())
        }
        Commands::Platforms => {
            for kind in PlatformKind::ALL {
                println!("{:<8} {}", kind.as_str().cyan().bold(), kind.aliases().join(", "));
            }
            Ok(())
        }
    }
}

/// Config plus the `--platform` override. Without an override every
/// database renders for the platform it declares, else the configured one.
struct Targets {
    config: Config,
    forced: Option<PlatformKind>,
}

impl Targets {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = Config::discover(cli.config.as_deref())?;
        let forced = cli
            .platform
            .as_deref()
            .map(PlatformKind::from_name)
            .transpose()?;
        if let Some(kind) = forced {
            tracing::debug!("Rendering every database for platform '{}'", kind);
        }
        Ok(Self { config, forced })
    }

    fn platform_for(&self, database: &Database) -> Result<Box<dyn Platform>> {
        Ok(self.config.platform_for(database, self.forced)?)
    }

    /// Read, build and finalize a schema file.
    fn load(&self, path: &Path) -> Result<Schema> {
        let registry = BehaviorRegistry::with_builtins();
        let mut schema = SchemaDocument::from_path(path)
            .and_then(|doc| doc.into_schema(&registry))
            .with_context(|| format!("Failed to load {}", path.display()))?;
        self.config.apply(&mut schema);
        schema
            .finalize_each(|database| self.config.platform_for(database, self.forced))
            .with_context(|| format!("Failed to finalize {}", path.display()))?;
        Ok(schema)
    }
}

fn write_output(sql: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, sql).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        None => print!("{}", sql),
    }
    Ok(())
}

fn print_summary(schema: &Schema, targets: &Targets) -> Result<()> {
    for database in schema.databases() {
        let platform = targets.platform_for(database)?;
        println!(
            "{} {} {}",
            "Database".green().bold(),
            database.name().white().bold(),
            format!("({})", platform.name()).dimmed()
        );
        for entity in database.entities() {
            let marker = if entity.is_sql_eligible() { "" } else { " [skip]" };
            println!("  {}{}", entity.table_name().cyan(), marker.dimmed());
            for field in entity.fields() {
                let mut flags = Vec::new();
                if field.is_primary_key() {
                    flags.push("pk");
                }
                if field.is_auto_increment() {
                    flags.push("auto");
                }
                if field.is_not_null() {
                    flags.push("not null");
                }
                if field.is_implementation_detail() {
                    flags.push("synthesized");
                }
                println!(
                    "    {:<24} {:<12} {}",
                    field.column_name(),
                    field.field_type().to_string(),
                    flags.join(", ").dimmed()
                );
            }
            for relation in entity.relations() {
                println!(
                    "    {} {} ({} -> {})",
                    "->".yellow(),
                    relation.foreign_table_name(),
                    relation.local_fields().join(", "),
                    relation.foreign_fields().join(", ")
                );
            }
            for referrer in entity.referrers() {
                println!(
                    "    {} {}.{}",
                    "<-".magenta(),
                    referrer.entity,
                    referrer.relation
                );
            }
        }
    }
    Ok(())
}
