mod app_view;
mod logging;

use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use impress_core::config::AppConfig;
use impress_core::kernel::constants;
use impress_core::plugin_system::PluginRegistrar;
use impress_core::storage::{impress_schema, LocalStore, RecordKey, StoreSchema};
use impress_core::{Application, CapabilityRegistry, HostDocument, KernelError};
use log::{debug, info};

use crate::app_view::AppView;

/// Impress: bootstraps the local store, the shared services and the UI kit,
/// then mounts the root view.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Simple liveness check
    #[arg(long)]
    ping: bool,

    /// Config file (.json, .yaml, .yml or .toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory holding the local store
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Attachment point the root view mounts into; must be one of the
    /// host document's points (see --attach)
    #[arg(long)]
    mount_target: Option<String>,

    /// Attachment points offered by the host document (repeatable)
    #[arg(long = "attach", value_name = "ID", default_value = constants::DEFAULT_MOUNT_TARGET)]
    attach: Vec<String>,

    /// Raise the configured log level one step per use
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the declared store schema
    Schema,
    /// List the capabilities provided by the UI kit
    Capabilities,
    /// Read a record by primary key
    Get {
        /// Table name (`data` or `dpt`)
        table: String,
        /// Primary key; integer when it parses as one, text otherwise
        key: String,
    },
    /// Insert or replace a record
    Put {
        /// Table name (`data` or `dpt`)
        table: String,
        /// JSON object holding the record
        record: String,
    },
}

type CliResult<T> = Result<T, Box<dyn StdError>>;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> CliResult<()> {
    let config = load_config(&args)?;
    logging::init(&config.log_level, args.verbose);
    debug!("Effective configuration: {:?}", config);

    match args.command {
        Some(Commands::Schema) => print_schema(&store_schema(&config)),
        Some(Commands::Capabilities) => print_capabilities()?,
        Some(Commands::Get { table, key }) => {
            let store = open_store(&config)?;
            match store.table(&table)?.get(parse_key(&key))? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => return Err(format!("no record with key {} in '{}'", parse_key(&key), table).into()),
            }
        }
        Some(Commands::Put { table, record }) => {
            let store = open_store(&config)?;
            let value: serde_json::Value = serde_json::from_str(&record)?;
            let key = store.table(&table)?.put(value)?;
            println!("stored {}", key);
        }
        None => boot(config, &args.attach).await?,
    }
    Ok(())
}

/// Defaults, then the config file, then command-line overrides.
fn load_config(args: &CliArgs) -> CliResult<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.store_dir {
        config.store.dir = Some(dir.clone());
    }
    if let Some(target) = &args.mount_target {
        config.mount_target = target.clone();
    }
    config.validate()?;
    Ok(config)
}

fn store_schema(config: &AppConfig) -> StoreSchema {
    let mut schema = impress_schema();
    schema.name = config.store.name.clone();
    schema
}

fn open_store(config: &AppConfig) -> Result<LocalStore, KernelError> {
    let dir = config.store.resolved_dir();
    Ok(LocalStore::open(&dir, store_schema(config))?)
}

fn parse_key(raw: &str) -> RecordKey {
    match raw.parse::<i64>() {
        Ok(n) => RecordKey::Int(n),
        Err(_) => RecordKey::Text(raw.to_string()),
    }
}

fn print_schema(schema: &StoreSchema) {
    println!("{} (version {})", schema.name, schema.version);
    for table in &schema.tables {
        println!("  {}: {}", table.name, table);
    }
}

fn print_capabilities() -> Result<(), KernelError> {
    let mut registry = CapabilityRegistry::new();
    PluginRegistrar::for_current_api()?.register(impress_ui_kit::all(), &mut registry)?;
    for plugin in registry.plugins() {
        println!(
            "{} ({} v{}): {}",
            plugin.capability,
            plugin.name,
            plugin.version,
            registry.tags_for(plugin.capability).join(", ")
        );
    }
    Ok(())
}

async fn boot(config: AppConfig, attach: &[String]) -> Result<(), KernelError> {
    info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let mut document = HostDocument::new();
    for id in attach {
        document.add_attachment_point(id)?;
    }
    let mut app = Application::new(config);
    app.bootstrap(impress_ui_kit::all(), &AppView, &mut document).await?;

    let target = app.config().mount_target.trim_start_matches('#').to_string();
    if let Some(mounted) = document.mounted(&target) {
        println!("Mounted {} at #{}", mounted.view_name, mounted.target);
        println!("{}", mounted.outline());
    }
    Ok(())
}
