//! CLI command implementations
//!
//! Both commands load the configuration, build a `QueryEngine` for the named
//! entity and run one call:
//! - explain: validation and rendering only, never touches a store
//! - query: runs against a `MemoryStore` seeded from `seed_file`

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::mapping::{EntityDescriptor, EntityMetadata};
use crate::observability::{log_event_with_fields, Event};
use crate::paging::{ContinuationToken, PageRequest};
use crate::planner::ExplainPlan;
use crate::repository::{CallArgs, Outcome, QueryEngine};
use crate::store::{Document, MemoryStore};

use super::args::{CallOptions, Command};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings (`default_page_size`, `log_level`)
    #[serde(flatten)]
    pub engine: EngineConfig,

    /// Entity declarations
    #[serde(default)]
    pub collections: Vec<EntityDescriptor>,

    /// JSON file of documents keyed by collection name, relative to the
    /// configuration file
    #[serde(default)]
    pub seed_file: Option<String>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        config.validate()?;
        config
            .engine
            .apply_logging()
            .map_err(|e| CliError::config_error(e.to_string()))?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("entities", &config.collections.len().to_string()),
                ("path", &path.display().to_string()),
            ],
        );
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.engine
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for descriptor in &self.collections {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(CliError::config_error(format!(
                    "Entity '{}' is declared twice",
                    descriptor.name
                )));
            }
            EntityMetadata::from_descriptor(descriptor.clone()).map_err(|e| {
                CliError::config_error(format!("Entity '{}': {}", descriptor.name, e))
            })?;
        }
        Ok(())
    }

    /// Resolved metadata for a declared entity
    pub fn entity(&self, name: &str) -> CliResult<EntityMetadata> {
        let descriptor = self
            .collections
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CliError::unknown_entity(name))?;
        EntityMetadata::from_descriptor(descriptor.clone())
            .map_err(|e| CliError::config_error(e.to_string()))
    }

    /// Path of the seed file, if configured
    pub fn seed_path(&self) -> Option<PathBuf> {
        self.seed_file.as_ref().map(|file| self.base_dir.join(file))
    }

    /// In-memory store with every declared collection, filled from `seed_file`
    pub fn seeded_store(&self) -> CliResult<MemoryStore> {
        let store = MemoryStore::new();
        for descriptor in &self.collections {
            let metadata = EntityMetadata::from_descriptor(descriptor.clone())
                .map_err(|e| CliError::config_error(e.to_string()))?;
            let partition_field = metadata
                .partition_key()
                .map(|key| metadata.document_field(key));
            store.create_collection(metadata.collection_name(), partition_field.as_deref());
        }

        let Some(path) = self.seed_path() else {
            return Ok(store);
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            CliError::config_error(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let seed: BTreeMap<String, Vec<Document>> = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid seed JSON: {}", e)))?;

        for (collection, documents) in seed {
            for document in documents {
                store.insert(&collection, document).map_err(|e| {
                    CliError::config_error(format!("Seed document in '{}': {}", collection, e))
                })?;
            }
        }
        Ok(store)
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command; failures are also reported on stdout
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::Explain(opts) => explain(&opts),
        Command::Query(opts) => query(&opts),
    };
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Print the explain plan for one call
pub fn explain(opts: &CallOptions) -> CliResult<()> {
    let plan = run_explain(opts)?;
    eprint!("{}", plan);

    let accepted = plan.accepted;
    let reason = plan.rejection_reason.clone().unwrap_or_default();
    write_response(serde_json::to_value(plan)?)?;

    if accepted {
        Ok(())
    } else {
        Err(CliError::new(CliErrorCode::QueryFailed, reason))
    }
}

/// Run one call and print its outcome
pub fn query(opts: &CallOptions) -> CliResult<()> {
    write_response(run_query(opts)?)
}

/// Explain plan for the call described by `opts`
pub fn run_explain(opts: &CallOptions) -> CliResult<ExplainPlan> {
    let config = Config::load(&opts.config)?;
    let engine = QueryEngine::with_config(
        Arc::new(config.entity(&opts.entity)?),
        MemoryStore::new(),
        config.engine.clone(),
    );
    let call = build_call(opts, &config.engine)?;
    Ok(engine.explain(&opts.method, &call))
}

/// Outcome of the call described by `opts`, as JSON
pub fn run_query(opts: &CallOptions) -> CliResult<Value> {
    let config = Config::load(&opts.config)?;
    let engine = QueryEngine::with_config(
        Arc::new(config.entity(&opts.entity)?),
        config.seeded_store()?,
        config.engine.clone(),
    );
    let call = build_call(opts, &config.engine)?;

    Ok(match engine.invoke(&opts.method, &call)? {
        Outcome::Found(page) => json!({
            "items": page.items(),
            "page_size": page.page_size(),
            "continuation": page.next_token().map(ContinuationToken::to_base64),
        }),
        Outcome::Exists(found) => json!({ "exists": found }),
        Outcome::Count(count) => json!({ "count": count }),
        Outcome::Deleted(deleted) => json!({ "deleted": deleted }),
    })
}

fn build_call(opts: &CallOptions, engine: &EngineConfig) -> CliResult<CallArgs> {
    let args = match serde_json::from_str::<Value>(&opts.args) {
        Ok(Value::Array(values)) => values,
        Ok(_) => return Err(CliError::usage_error("--args must be a JSON array")),
        Err(e) => return Err(CliError::usage_error(format!("--args is not valid JSON: {}", e))),
    };
    let mut call = CallArgs::with_args(args);

    if opts.page_size.is_none() && opts.continuation.is_none() {
        return Ok(call);
    }

    let size = opts
        .page_size
        .unwrap_or_else(|| i64::from(engine.default_page_size));
    let mut page = PageRequest::of(size)?;
    if let Some(encoded) = &opts.continuation {
        let token = ContinuationToken::from_base64(encoded)
            .map_err(|e| CliError::usage_error(format!("--continuation is not base64: {}", e)))?;
        page = page.with_continuation(token);
    }
    call = call.with_page(page);
    Ok(call)
}
