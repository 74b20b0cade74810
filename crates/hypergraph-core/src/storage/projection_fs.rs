//! Projection export/import on the filesystem
//!
//! Writes a hypergraph as one pretty-printed JSON file per record, laid out
//! by projection path, and reads such a tree back:
//!
//! ```text
//! <root>/
//! ├── _metadata.json
//! └── acme/
//!     ├── default/entities/Developer/<id>.json
//!     └── team-a/relations/WorksOn/<id>.json
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::Result;
use crate::domain::graph::{
    GraphRecord, HyperGraph, HyperGraphMetadata, OrganizationContext, RecordKind, kind_of_path,
    parse_entity_from_path, parse_relation_from_path, project_entity, project_relation,
    projection_content,
};
use crate::error::Error;

/// Name of the metadata file at the export root
pub const METADATA_FILE: &str = "_metadata.json";

/// Summary written next to the projected records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionMetadata {
    /// When the export was created
    pub exported_at: DateTime<Utc>,
    /// Metadata of the exported hypergraph
    pub graph: HyperGraphMetadata,
    /// Number of entity files written
    pub entity_count: usize,
    /// Number of relation files written
    pub relation_count: usize,
}

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Root directory of the export
    pub root: PathBuf,
    /// Metadata about the export
    pub metadata: ProjectionMetadata,
    /// Files that were written
    pub files_written: Vec<PathBuf>,
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// Records read back
    pub graph: HyperGraph,
    /// Number of record files examined
    pub files_read: usize,
    /// Files that were skipped, with the reason
    pub warnings: Vec<String>,
}

/// Write every record of `graph` under `root` using its projection path
///
/// Nothing is written when any record would land outside `root`.
pub fn export_projections(
    root: &Path,
    graph: &HyperGraph,
    ctx: &OrganizationContext,
) -> Result<ExportResult> {
    let mut targets = Vec::with_capacity(graph.entities.len() + graph.relations.len());
    for entity in &graph.entities {
        let projection = project_entity(entity, ctx);
        targets.push((checked_target(root, entity, &projection.path)?, projection));
    }
    for relation in &graph.relations {
        let projection = project_relation(relation, ctx);
        targets.push((checked_target(root, relation, &projection.path)?, projection));
    }

    fs::create_dir_all(root)?;

    let mut files_written = Vec::new();
    for (file_path, projection) in targets {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, projection_content(&projection)?)?;
        files_written.push(file_path);
    }

    let metadata = ProjectionMetadata {
        exported_at: Utc::now(),
        graph: graph.metadata.clone(),
        entity_count: graph.entities.len(),
        relation_count: graph.relations.len(),
    };

    let metadata_path = root.join(METADATA_FILE);
    let content = serde_json::to_string_pretty(&metadata)
        .map_err(|e| Error::Serialization(format!("Failed to write metadata: {}", e)))?;
    fs::write(&metadata_path, content)?;
    files_written.push(metadata_path);

    debug!(
        root = %root.display(),
        org = %ctx.org_name,
        files = files_written.len(),
        "Projections exported"
    );

    Ok(ExportResult {
        root: root.to_path_buf(),
        metadata,
        files_written,
    })
}

/// Read a projection tree back into a hypergraph
///
/// Files whose content is not valid JSON fail the import. Well-formed files
/// that are not records of the kind their folder names are skipped with a
/// warning. Records are returned in creation order.
pub fn import_projections(root: &Path) -> Result<ImportResult> {
    if !root.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Projection directory not found: {}",
            root.display()
        )));
    }

    let metadata = read_metadata(root)?;
    let mut files = Vec::new();
    collect_record_files(root, &mut files)?;
    files.sort();

    let mut entities = Vec::new();
    let mut relations = Vec::new();
    let mut warnings = Vec::new();

    for file in &files {
        let relative = relative_path(root, file);
        let content = fs::read_to_string(file)?;

        let parsed = match kind_of_path(&relative) {
            Some(RecordKind::Entity) => match parse_entity_from_path(&relative, &content)? {
                Some(entity) => {
                    entities.push(entity);
                    true
                }
                None => false,
            },
            Some(RecordKind::Relation) => match parse_relation_from_path(&relative, &content)? {
                Some(relation) => {
                    relations.push(relation);
                    true
                }
                None => false,
            },
            None => false,
        };

        if !parsed {
            warn!(path = %relative, "Skipping file that is not a projected record");
            warnings.push(format!("Not a projected record: {}", relative));
        }
    }

    entities.sort_by_key(|e| e.created_at);
    relations.sort_by_key(|r| r.created_at);

    Ok(ImportResult {
        graph: HyperGraph::from_parts(entities, relations, metadata),
        files_read: files.len(),
        warnings,
    })
}

/// File a projection is written to, refused unless it stays under `root`
fn checked_target<R: GraphRecord>(root: &Path, record: &R, path: &str) -> Result<PathBuf> {
    let unsafe_name = |name: &str| name.contains('/') || name.contains('\\');
    let bad_segment = path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    let relative = Path::new(path);
    let nested = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if unsafe_name(record.record_type()) || unsafe_name(record.id()) || bad_segment || !nested {
        return Err(Error::InvalidInput(format!(
            "{} {} cannot be exported: projection path '{}' leaves the export root",
            R::KIND,
            record.id(),
            path
        )));
    }

    let target = root.join(relative);
    if !target.starts_with(root) {
        return Err(Error::InvalidInput(format!(
            "projection path '{}' leaves the export root",
            path
        )));
    }
    Ok(target)
}

fn read_metadata(root: &Path) -> Result<HyperGraphMetadata> {
    let path = root.join(METADATA_FILE);
    if !path.exists() {
        return Ok(HyperGraphMetadata::new(crate::domain::graph::DEFAULT_SCOPE));
    }
    let metadata: ProjectionMetadata = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(metadata.graph)
}

fn collect_record_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_record_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json")
            && path.file_name().is_some_and(|name| name != METADATA_FILE)
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Path relative to `root`, with `/` separators
fn relative_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
