//! Hypergraph CLI - multi-tenant hypergraph store

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hypergraph_core::Error;
use hypergraph_core::config::{Config, StoreBackend};
use hypergraph_core::domain::graph::{
    Attributes, GraphStore, HyperGraphService, ListOptions, NavigationRequest, OrgLevel,
    OrganizationContext, RecordFilter, ScalingConfig, ScalingLevel, ScalingMode,
    attributes_from_value, generate_org_structure,
};
use hypergraph_core::infrastructure::graph::InMemoryGraphStore;
use hypergraph_core::storage::{
    Database, DatabaseConfig, export_projections, import_projections,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

type Service = HyperGraphService<dyn GraphStore>;

#[derive(Parser)]
#[command(name = "hypergraph")]
#[command(author, version, about = "Multi-tenant hypergraph store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file (overrides store.path and store.backend)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage entities
    Entity {
        #[command(subcommand)]
        action: EntityAction,
    },

    /// Manage relations
    Relation {
        #[command(subcommand)]
        action: RelationAction,
    },

    /// Expand the neighborhood of an entity
    Navigate {
        /// Entity to start from
        entity_id: String,
        /// Number of relation hops (default 1, capped by query.max_query_depth)
        #[arg(short, long)]
        depth: Option<u32>,
        /// Only follow relations of this type (repeatable)
        #[arg(short = 't', long = "relation-type")]
        relation_types: Vec<String>,
    },

    /// Show the hypergraph of an organization
    Graph {
        /// Organization (all records when omitted)
        #[arg(long)]
        org: Option<String>,
    },

    /// Compress or expand a hypergraph snapshot
    Scale {
        /// compress or expand
        #[arg(long, value_parser = parse_mode)]
        mode: ScalingMode,
        /// folder, repo, org or enterprise
        #[arg(long, value_parser = parse_level)]
        level: ScalingLevel,
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Show the folder layout of an organization
    Structure {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Write records as projection files
    Export {
        /// Target directory
        dir: PathBuf,
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Load records from projection files
    Import {
        /// Source directory
        dir: PathBuf,
    },

    /// Show store statistics
    Stats,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Organization context shared by scaling, structure and export
#[derive(Args)]
struct ContextArgs {
    /// Organization name (defaults to query.default_org)
    #[arg(long)]
    org: Option<String>,
    /// Repository in the organization (repeatable)
    #[arg(long = "repo")]
    repos: Vec<String>,
    /// repo, org or enterprise
    #[arg(long, value_parser = parse_org_level)]
    org_level: Option<OrgLevel>,
}

#[derive(Subcommand)]
enum EntityAction {
    /// Create an entity
    Create {
        /// Entity type
        #[arg(short = 't', long = "type")]
        entity_type: String,
        /// Attributes as a JSON object
        #[arg(short, long)]
        attrs: Option<String>,
        /// Owning organization
        #[arg(long)]
        org: Option<String>,
    },
    /// Show an entity
    Get {
        id: String,
        /// Hide the entity unless it belongs to this organization
        #[arg(long)]
        org: Option<String>,
    },
    /// List entities
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Merge attributes into an entity
    Update {
        id: String,
        /// Attribute patch as a JSON object
        #[arg(short, long)]
        attrs: String,
    },
    /// Delete an entity
    Delete { id: String },
    /// List relations touching an entity
    Relations { id: String },
}

#[derive(Subcommand)]
enum RelationAction {
    /// Create a relation
    Create {
        /// Relation type
        #[arg(short = 't', long = "type")]
        relation_type: String,
        /// Source entity id
        #[arg(long)]
        source: String,
        /// Target entity id
        #[arg(long)]
        target: String,
        /// Attributes as a JSON object
        #[arg(short, long)]
        attrs: Option<String>,
        /// Owning organization
        #[arg(long)]
        org: Option<String>,
    },
    /// Show a relation
    Get {
        id: String,
        /// Hide the relation unless it belongs to this organization
        #[arg(long)]
        org: Option<String>,
    },
    /// List relations
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Merge attributes into a relation
    Update {
        id: String,
        /// Attribute patch as a JSON object
        #[arg(short, long)]
        attrs: String,
    },
    /// Delete a relation
    Delete { id: String },
    /// Show the source and target entities of a relation
    Endpoints { id: String },
}

#[derive(Args)]
struct FilterArgs {
    /// Only records of this type
    #[arg(short = 't', long = "type")]
    record_type: Option<String>,
    /// Only records of this organization
    #[arg(long)]
    org: Option<String>,
    /// Attribute equality, `key=value` with a JSON or plain-string value (repeatable)
    #[arg(long = "attr", value_parser = parse_attr)]
    attrs: Vec<(String, Value)>,
    /// Page size (defaults to query.default_limit)
    #[arg(short, long)]
    limit: Option<i64>,
    /// Records to skip
    #[arg(short, long, default_value_t = 0)]
    offset: i64,
}

impl FilterArgs {
    fn into_options(self, default_limit: i64) -> ListOptions {
        let mut filter = RecordFilter::new();
        if let Some(record_type) = self.record_type {
            filter = filter.with_type(record_type);
        }
        if let Some(org) = self.org {
            filter = filter.with_organization(org);
        }
        for (key, value) in self.attrs {
            filter = filter.with_attribute(key, value);
        }

        ListOptions::new(filter)
            .with_limit(self.limit.unwrap_or(default_limit))
            .with_offset(self.offset)
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all configuration values
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hypergraph=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, cli.quiet);
    }

    let config = Config::load()?;
    let service = open_service(&config, cli.db).await?;

    match cli.command {
        Commands::Entity { action } => cmd_entity(&service, &config, action, cli.quiet).await,
        Commands::Relation { action } => cmd_relation(&service, &config, action, cli.quiet).await,
        Commands::Navigate {
            entity_id,
            depth,
            relation_types,
        } => cmd_navigate(&service, entity_id, depth, relation_types).await,
        Commands::Graph { org } => cmd_graph(&service, org.as_deref()).await,
        Commands::Scale {
            mode,
            level,
            context,
        } => cmd_scale(&service, &config, mode, level, context).await,
        Commands::Structure { context } => {
            print_json(&generate_org_structure(&context.resolve(&config)))
        }
        Commands::Export { dir, context } => {
            cmd_export(&service, &config, &dir, context, cli.quiet).await
        }
        Commands::Import { dir } => cmd_import(&service, &dir, cli.quiet).await,
        Commands::Stats => print_json(&service.stats().await?),
        Commands::Config { .. } => Ok(()),
    }
}

/// Open the store selected by configuration, or the `--db` file when given
async fn open_service(config: &Config, db: Option<PathBuf>) -> anyhow::Result<Service> {
    let store: Arc<dyn GraphStore> = match (db, config.store.backend) {
        (Some(path), _) => {
            let database = Database::new(
                DatabaseConfig::with_path(path)
                    .max_connections(config.store.max_connections),
            )
            .await?;
            Arc::new(database.graph_store())
        }
        (None, StoreBackend::Sqlite) => {
            let database = Database::new(config.database_config()).await?;
            Arc::new(database.graph_store())
        }
        (None, StoreBackend::Memory) => {
            warn!("Using the memory backend; records are discarded on exit");
            Arc::new(InMemoryGraphStore::new())
        }
    };

    Ok(HyperGraphService::new(store).with_settings(config.service_settings()))
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_entity(
    service: &Service,
    config: &Config,
    action: EntityAction,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        EntityAction::Create {
            entity_type,
            attrs,
            org,
        } => {
            let attributes = parse_attributes(attrs.as_deref())?;
            let entity = service.create_entity(&entity_type, attributes, org).await?;
            print_json(&entity)
        }
        EntityAction::Get { id, org } => {
            let entity = service
                .get_entity(&id, org.as_deref())
                .await?
                .ok_or(Error::EntityNotFound(id))?;
            print_json(&entity)
        }
        EntityAction::List { filter } => {
            let options = filter.into_options(config.query.default_limit);
            print_json(&service.list_entities(&options).await?)
        }
        EntityAction::Update { id, attrs } => {
            let patch = parse_attributes(Some(&attrs))?;
            print_json(&service.update_entity(&id, &patch).await?)
        }
        EntityAction::Delete { id } => {
            if !service.delete_entity(&id).await? {
                return Err(Error::EntityNotFound(id).into());
            }
            if !quiet {
                println!("Entity '{}' deleted.", id);
            }
            Ok(())
        }
        EntityAction::Relations { id } => print_json(&service.entity_relations(&id).await?),
    }
}

async fn cmd_relation(
    service: &Service,
    config: &Config,
    action: RelationAction,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        RelationAction::Create {
            relation_type,
            source,
            target,
            attrs,
            org,
        } => {
            let attributes = parse_attributes(attrs.as_deref())?;
            let relation = service
                .create_relation(&relation_type, &source, &target, attributes, org)
                .await?;
            print_json(&relation)
        }
        RelationAction::Get { id, org } => {
            let relation = service
                .get_relation(&id, org.as_deref())
                .await?
                .ok_or(Error::RelationNotFound(id))?;
            print_json(&relation)
        }
        RelationAction::List { filter } => {
            let options = filter.into_options(config.query.default_limit);
            print_json(&service.list_relations(&options).await?)
        }
        RelationAction::Update { id, attrs } => {
            let patch = parse_attributes(Some(&attrs))?;
            print_json(&service.update_relation(&id, &patch).await?)
        }
        RelationAction::Delete { id } => {
            if !service.delete_relation(&id).await? {
                return Err(Error::RelationNotFound(id).into());
            }
            if !quiet {
                println!("Relation '{}' deleted.", id);
            }
            Ok(())
        }
        RelationAction::Endpoints { id } => {
            let relation = service
                .get_relation(&id, None)
                .await?
                .ok_or(Error::RelationNotFound(id))?;
            let (source, target) = service.relation_endpoints(&relation).await?;
            print_json(&serde_json::json!({ "source": source, "target": target }))
        }
    }
}

async fn cmd_navigate(
    service: &Service,
    entity_id: String,
    depth: Option<u32>,
    relation_types: Vec<String>,
) -> anyhow::Result<()> {
    let mut request = NavigationRequest::new(entity_id);
    if let Some(depth) = depth {
        request = request.with_depth(depth);
    }
    if !relation_types.is_empty() {
        request = request.with_relation_types(relation_types);
    }

    print_json(&service.navigate(&request).await?)
}

async fn cmd_graph(service: &Service, org: Option<&str>) -> anyhow::Result<()> {
    let graph = match org {
        Some(org) => service.organization_hypergraph(org).await?,
        None => service.full_hypergraph().await?,
    };
    print_json(&graph)
}

async fn cmd_scale(
    service: &Service,
    config: &Config,
    mode: ScalingMode,
    level: ScalingLevel,
    context: ContextArgs,
) -> anyhow::Result<()> {
    let graph = match &context.org {
        Some(org) => service.organization_hypergraph(org).await?,
        None => service.full_hypergraph().await?,
    };
    let ctx = context.resolve(config);
    let scaling = match mode {
        ScalingMode::Compress => ScalingConfig::compress(level),
        ScalingMode::Expand => ScalingConfig::expand(level),
    };

    print_json(&service.scale(&graph, &scaling, &ctx).await)
}

async fn cmd_export(
    service: &Service,
    config: &Config,
    dir: &std::path::Path,
    context: ContextArgs,
    quiet: bool,
) -> anyhow::Result<()> {
    let graph = match &context.org {
        Some(org) => service.organization_hypergraph(org).await?,
        None => service.full_hypergraph().await?,
    };
    let ctx = context.resolve(config);

    let result = export_projections(dir, &graph, &ctx)
        .with_context(|| format!("Failed to export projections to {}", dir.display()))?;

    info!(files = result.files_written.len(), "Export complete");
    if !quiet {
        println!(
            "Exported {} entities and {} relations to {}",
            result.metadata.entity_count,
            result.metadata.relation_count,
            result.root.display()
        );
    }
    Ok(())
}

async fn cmd_import(service: &Service, dir: &std::path::Path, quiet: bool) -> anyhow::Result<()> {
    let result = import_projections(dir)
        .with_context(|| format!("Failed to import projections from {}", dir.display()))?;

    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let summary = service.import_hypergraph(&result.graph).await?;
    if quiet {
        return Ok(());
    }
    print_json(&summary)
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

impl ContextArgs {
    fn resolve(&self, config: &Config) -> OrganizationContext {
        let org = self
            .org
            .clone()
            .unwrap_or_else(|| config.query.default_org.clone());
        let mut ctx = OrganizationContext::new(org.clone(), org).with_repos(self.repos.clone());
        if let Some(level) = self.org_level {
            ctx = ctx.with_level(level);
        }
        ctx
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse an optional JSON object of attributes
fn parse_attributes(raw: Option<&str>) -> anyhow::Result<Attributes> {
    let Some(raw) = raw else {
        return Ok(Attributes::new());
    };
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("Invalid attributes JSON: {}", raw))?;
    Ok(attributes_from_value(value)?)
}

/// Parse `key=value`; the value is JSON when it parses, a string otherwise
fn parse_attr(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty attribute key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_mode(raw: &str) -> Result<ScalingMode, String> {
    ScalingMode::parse(raw).ok_or_else(|| format!("invalid mode '{}': use compress or expand", raw))
}

fn parse_level(raw: &str) -> Result<ScalingLevel, String> {
    ScalingLevel::parse(raw)
        .ok_or_else(|| format!("invalid level '{}': use folder, repo, org or enterprise", raw))
}

fn parse_org_level(raw: &str) -> Result<OrgLevel, String> {
    OrgLevel::parse(raw)
        .ok_or_else(|| format!("invalid org level '{}': use repo, org or enterprise", raw))
}
