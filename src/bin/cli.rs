//! Cert Tracker CLI
//!
//! Local presentation layer: every command prints its result as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use cert_tracker::{
    error::{AppError, Result},
    models::{CertForm, Config, ResourceDraft, ResourceKind, SectionDraft, SectionUpdate},
    routes::{FileRouteRegistry, RouteRegistry},
    services::{ContentService, PublishResult, PublishingCoordinator, catalog, search},
    storage::{ContentStore, SnapshotStore, SqliteStore},
};

/// Cert Tracker - certification study catalog
#[derive(Parser, Debug)]
#[command(name = "cert-tracker", version, about = "Certification study catalog")]
struct Cli {
    /// Path to storage directory containing config, database and routes
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Create, list and show certs
    #[command(subcommand)]
    Cert(CertCommand),

    /// Publish the cert bound to a registered route
    Publish {
        /// Route identifier, e.g. data.test_tst101
        identifier: String,
    },

    /// Search published certs by path, name, code or tag
    Search { term: String },

    /// Add resources to a cert
    #[command(subcommand)]
    Resource(ResourceCommand),

    /// Add and update course sections
    #[command(subcommand)]
    Section(SectionCommand),

    /// Inspect and register page routes
    #[command(subcommand)]
    Routes(RoutesCommand),

    /// Write the published catalog snapshot
    Export,

    /// Validate configuration
    Validate,
}

#[derive(Subcommand, Debug, Clone)]
enum CertCommand {
    /// Create a cert; it is published immediately if its route is live
    Create(CertArgs),

    /// List certs
    List {
        /// Only published certs
        #[arg(long, conflicts_with = "unpublished")]
        published: bool,

        /// Only certs awaiting their route
        #[arg(long)]
        unpublished: bool,
    },

    /// Show a cert page with its courses and resources
    Show {
        /// Page path, e.g. /test_tst101
        path: String,
    },
}

#[derive(Args, Debug, Clone)]
struct CertArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    code: String,

    #[arg(long)]
    date: String,

    #[arg(long, default_value = "")]
    head_img: String,

    #[arg(long, default_value = "")]
    badge_img: String,

    #[arg(long)]
    exam_date: Option<String>,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,
}

impl From<CertArgs> for CertForm {
    fn from(args: CertArgs) -> Self {
        CertForm {
            name: args.name,
            code: args.code,
            date: args.date,
            head_img: args.head_img,
            badge_img: args.badge_img,
            exam_date: args.exam_date,
            tags: args.tags,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum ResourceCommand {
    /// Add a course, video, article or documentation link
    Add(ResourceArgs),

    /// Print the OpenGraph prefill for a URL without storing it
    #[cfg(feature = "opengraph")]
    Preview {
        #[arg(long)]
        cert_id: i64,

        #[arg(long = "type")]
        kind: ResourceKind,

        url: String,
    },
}

#[derive(Args, Debug, Clone)]
struct ResourceArgs {
    #[arg(long)]
    cert_id: i64,

    /// course, video, article or documentation
    #[arg(long = "type")]
    kind: ResourceKind,

    #[arg(long)]
    url: String,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    image: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "")]
    site_logo: String,

    #[arg(long, default_value = "")]
    site_name: String,

    /// Fill blank fields from the page's OpenGraph tags
    #[cfg(feature = "opengraph")]
    #[arg(long)]
    prefill: bool,
}

impl From<ResourceArgs> for ResourceDraft {
    fn from(args: ResourceArgs) -> Self {
        ResourceDraft {
            cert_id: args.cert_id,
            kind: args.kind,
            url: args.url,
            title: args.title,
            image: args.image,
            description: args.description,
            site_logo: args.site_logo,
            site_name: args.site_name,
            has_og_data: false,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum SectionCommand {
    /// Add a section to a course
    Add {
        #[arg(long)]
        course_id: i64,

        #[arg(long)]
        number: i64,

        #[arg(long)]
        title: String,
    },

    /// Set a section's progress flags
    Update {
        id: i64,

        #[arg(long)]
        cards_made: bool,

        #[arg(long)]
        complete: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum RoutesCommand {
    /// List known endpoints
    List,

    /// Register an endpoint (stands in for deploying a cert page)
    Add {
        endpoint: String,

        #[arg(long)]
        path: Option<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_store(config: &Config, storage_dir: &Path) -> Result<SqliteStore> {
    let store = SqliteStore::from_config(&config.database, storage_dir).await?;
    log::debug!("Opened content store ({})", config.database.file);
    Ok(store)
}

#[cfg(feature = "opengraph")]
async fn prefill_draft(config: &Config, mut draft: ResourceDraft) -> Result<ResourceDraft> {
    use cert_tracker::services::OpenGraphFetcher;

    let fetcher = OpenGraphFetcher::new(&config.opengraph)?;
    let Some(og) = fetcher.prefill(draft.cert_id, draft.kind, &draft.url).await else {
        return Ok(draft);
    };

    // Values given on the command line win over fetched ones.
    for (field, fetched) in [
        (&mut draft.title, og.title),
        (&mut draft.image, og.image),
        (&mut draft.description, og.description),
        (&mut draft.site_logo, og.site_logo),
        (&mut draft.site_name, og.site_name),
    ] {
        if field.is_empty() {
            *field = fetched;
        }
    }
    draft.has_og_data = true;
    Ok(draft)
}

/// Load the config file, keeping any failure to report once logging is up.
fn load_config(path: &Path) -> (Config, Option<AppError>) {
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// State re-displayed after a failed command, so the operator can retry.
async fn prior_state(
    command: &Command,
    config: &Config,
    storage_dir: &Path,
) -> Result<Option<serde_json::Value>> {
    let state = match command {
        Command::Cert(CertCommand::Create(_) | CertCommand::Show { .. }) => {
            let store = open_store(config, storage_dir).await?;
            serde_json::to_value(store.list_certs().await?)?
        }
        Command::Resource(ResourceCommand::Add(args)) => {
            let store = open_store(config, storage_dir).await?;
            match store.cert_by_id(args.cert_id).await? {
                Some(cert) => serde_json::to_value(catalog::fetch_cert_view(&store, cert).await?)?,
                None => serde_json::to_value(store.list_certs().await?)?,
            }
        }
        Command::Section(SectionCommand::Add { course_id, .. }) => {
            let store = open_store(config, storage_dir).await?;
            serde_json::to_value(store.sections_for_course(*course_id).await?)?
        }
        _ => return Ok(None),
    };
    Ok(Some(state))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let (config, load_error) = load_config(&config_path);
    init_logging(cli.verbose, &config.logging.level);

    if let Some(e) = load_error {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            config_path.display(),
            e
        );
    }
    log::debug!("Storage directory: {}", cli.storage_dir.display());

    match run(cli.command.clone(), &config, &cli.storage_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            match prior_state(&cli.command, &config, &cli.storage_dir).await {
                Ok(Some(state)) => {
                    if let Err(e) = print_json(&state) {
                        log::error!("{e}");
                    }
                }
                Ok(None) => {}
                Err(e) => log::debug!("Prior state unavailable: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config, storage_dir: &Path) -> Result<()> {
    let config_path = storage_dir.join("config.toml");
    let registry = FileRouteRegistry::new(config.registry_path(storage_dir));

    match command {
        Command::Cert(CertCommand::Create(args)) => {
            let store = open_store(config, storage_dir).await?;
            let coordinator =
                PublishingCoordinator::new(&store, &registry, config.routes.namespace.as_str());

            let created = coordinator.create_cert(&CertForm::from(args)).await?;
            log::info!("{}", created.message());
            print_json(&created.cert)?;
        }

        Command::Cert(CertCommand::List {
            published,
            unpublished,
        }) => {
            let store = open_store(config, storage_dir).await?;
            let certs = if published {
                search::find_published(&store).await?
            } else if unpublished {
                search::find_unpublished(&store).await?
            } else {
                store.list_certs().await?
            };
            print_json(&certs)?;
        }

        Command::Cert(CertCommand::Show { path }) => {
            let store = open_store(config, storage_dir).await?;
            let view = catalog::fetch_cert_view_by_path(&store, &path).await?;
            log::info!("{}", view.title());
            print_json(&view)?;
        }

        Command::Publish { identifier } => {
            let store = open_store(config, storage_dir).await?;
            let coordinator =
                PublishingCoordinator::new(&store, &registry, config.routes.namespace.as_str());

            let result = coordinator.publish_by_route_identifier(&identifier).await?;
            match &result {
                PublishResult::Published { cert, .. } => {
                    log::info!("{}", result.message());
                    print_json(cert)?;
                }
                PublishResult::Rejected { unpublished, .. } => {
                    log::error!("{}", result.message());
                    print_json(unpublished)?;
                }
            }
        }

        Command::Search { term } => {
            if term.is_empty() {
                log::warn!("Please enter a search term");
                return Ok(());
            }
            let store = open_store(config, storage_dir).await?;
            let results = search::find(&store, &term).await?;
            log::info!("{} result(s) for '{}'", results.len(), term);
            print_json(&results)?;
        }

        Command::Resource(ResourceCommand::Add(args)) => {
            #[cfg(feature = "opengraph")]
            let prefill = args.prefill;
            let draft = ResourceDraft::from(args);
            #[cfg(feature = "opengraph")]
            let draft = if prefill {
                prefill_draft(config, draft).await?
            } else {
                draft
            };

            let store = open_store(config, storage_dir).await?;
            let created = ContentService::new(&store).create_resource(draft).await?;
            print_json(&created)?;
        }

        #[cfg(feature = "opengraph")]
        Command::Resource(ResourceCommand::Preview { cert_id, kind, url }) => {
            let fetcher = cert_tracker::services::OpenGraphFetcher::new(&config.opengraph)?;
            match fetcher.prefill(cert_id, kind, &url).await {
                Some(draft) => print_json(&draft)?,
                None => log::warn!("No OpenGraph data found for {}", url),
            }
        }

        Command::Section(SectionCommand::Add {
            course_id,
            number,
            title,
        }) => {
            let store = open_store(config, storage_dir).await?;
            let section = ContentService::new(&store)
                .create_section(SectionDraft {
                    course_id,
                    number,
                    title,
                })
                .await?;
            print_json(&section)?;
        }

        Command::Section(SectionCommand::Update {
            id,
            cards_made,
            complete,
        }) => {
            let store = open_store(config, storage_dir).await?;
            let section = ContentService::new(&store)
                .update_section(
                    id,
                    SectionUpdate {
                        cards_made,
                        complete,
                    },
                )
                .await?;
            print_json(&section)?;
        }

        Command::Routes(RoutesCommand::List) => {
            let endpoints = registry.endpoints().await?;
            print_json(&endpoints)?;
        }

        Command::Routes(RoutesCommand::Add { endpoint, path }) => {
            if !registry.register(&endpoint, path).await? {
                log::warn!("Route {} is already registered", endpoint);
            }
        }

        Command::Export => {
            let store = open_store(config, storage_dir).await?;
            let certs = store.list_certs().await?;
            let snapshot = SnapshotStore::new(config.export_path(storage_dir));
            let meta = snapshot.write(&certs).await?;
            log::info!(
                "Exported {} published certs to {} at {}",
                meta.count,
                meta.location.display(),
                meta.timestamp
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            config.validate()?;
            if !config_path.exists() {
                log::warn!("No config file at {}; defaults are in use", config_path.display());
            }
            let endpoints = registry.endpoints().await?;
            log::info!("✓ Config OK ({} routes known)", endpoints.len());
        }
    }

    Ok(())
}
