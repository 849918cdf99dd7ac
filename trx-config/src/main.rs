use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};
use trx_config::{
    EditorSession,
    data::{Property, PropertyValue},
    lang::{LanguageTable, SharedText},
    schema::SchemaRegistry,
};

/// Inspect and edit TRX game settings.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file to edit.
    #[arg(default_value = "cfg/TR1X.json5")]
    config: PathBuf,
    /// Directory holding the schema files.
    #[arg(long, default_value = "resources/schemas")]
    schema_dir: PathBuf,
    /// Schema the configuration file follows.
    #[arg(long, default_value = "tr1")]
    schema: String,
    /// Language table with property titles and descriptions.
    #[arg(long, default_value = "resources/lang/en.toml")]
    lang: PathBuf,
    /// Gameflow document carrying enforced settings.
    #[arg(long)]
    enforced: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every category and property.
    Show,
    /// Find properties by title or description.
    Search {
        /// Words to look for; any of them may match.
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Change one property and save.
    Set { field: String, value: String },
    /// Restore every property to its default and save.
    Reset,
    /// List the available schemas.
    Schemas,
}

fn load_lang(path: &Path) -> Result<SharedText> {
    if !path.exists() {
        warn!(
            "language table {} not found, showing raw field names",
            path.display()
        );
        return Ok(Arc::new(LanguageTable::default()));
    }
    let table = LanguageTable::load(path)
        .with_context(|| format!("Failed to load language table {}", path.display()))?;
    Ok(Arc::new(table))
}

fn print_property(prop: &Property) {
    let lock = if prop.is_enabled() { " " } else { "!" };
    let marker = if prop.is_default() { " " } else { "*" };
    println!(
        "  {lock}{marker} {:<36} {:<12} {}",
        prop.field(),
        prop.effective_value().to_string(),
        prop.title()
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let schemas = SchemaRegistry::load_dir(&cli.schema_dir)
        .with_context(|| format!("Failed to load schemas from {}", cli.schema_dir.display()))?;
    if let Command::Schemas = cli.command {
        for name in schemas.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let lang = load_lang(&cli.lang)?;
    let mut session = EditorSession::new(schemas, lang);
    if let Some(enforced) = &cli.enforced {
        session = session.with_enforced_path(enforced);
    }

    if cli.config.exists() {
        session
            .open(&cli.config, &cli.schema)
            .with_context(|| format!("Failed to open {}", cli.config.display()))?;
    } else {
        info!(
            "'{}' not found - creating it with default settings",
            cli.config.display()
        );
        session.open_default(&cli.config, &cli.schema)?;
    }

    match cli.command {
        Command::Show => {
            let Some(config) = session.configuration() else {
                bail!("no configuration is open");
            };
            for category in config.categories() {
                println!("{} [{}]", category.title(), category.image());
                for prop in category.properties() {
                    print_property(prop);
                }
            }
            if session.has_read_only_items() {
                println!("\n! = enforced by the gameflow, * = changed from default");
            }
        }
        Command::Search { query } => {
            let query = query.join(" ");
            let found = session.search(&query);
            if found.is_empty() {
                println!("no matches for {query:?}");
            }
            for prop in found {
                print_property(prop);
            }
        }
        Command::Set { field, value } => {
            let Some(prop) = session.configuration().and_then(|c| c.property(&field)) else {
                bail!("unknown property: {field}");
            };
            if !prop.is_enabled() {
                warn!("{field} is enforced by the gameflow; the saved value has no effect in game");
            }
            let Some(parsed) = PropertyValue::parse_as(&value, &prop.value()) else {
                bail!(
                    "{value:?} is not a valid {} value for {field}",
                    prop.value().type_name()
                );
            };
            session.set_value(&field, parsed)?;
            if session.save()? {
                info!("{field} updated");
            }
        }
        Command::Reset => {
            let changes = session.restore_defaults()?;
            info!("restored {} properties to their defaults", changes.len());
            session.save()?;
        }
        Command::Schemas => {}
    }

    Ok(())
}
