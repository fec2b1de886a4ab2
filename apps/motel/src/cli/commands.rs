//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use motel_core::formats::{read_jsonl_file, write_jsonl_file};
use motel_core::{
    ActiveLearning, Dataset, Ensemble, EnsembleKind, GraphDocument, GraphStore, MotelConfig,
    MotelError, Motif, Partition, ResultRow, Session, SparseImage, extract_neighborhoods,
    precision_recall_curve,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for graph ingestion (100 MB).
const MAX_INGEST_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum file size for configuration files (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), MotelError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| MotelError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(MotelError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, MotelError> {
    let canonical = path.canonicalize().map_err(|e| {
        MotelError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(MotelError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Load and validate the configuration.
///
/// No path means defaults. Every startup invariant is checked before any
/// command runs.
pub fn load_config(path: Option<&Path>) -> Result<MotelConfig, MotelError> {
    let config = match path {
        Some(path) => {
            let validated = validate_file_path(path)?;
            validate_file_size(&validated, MAX_CONFIG_FILE_SIZE)?;
            let text = std::fs::read_to_string(&validated)
                .map_err(|e| MotelError::IoError(format!("Read config: {}", e)))?;
            let config: MotelConfig = toml::from_str(&text)
                .map_err(|e| MotelError::InvalidConfiguration(e.to_string()))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        }
        None => MotelConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Load a pre-parsed graph file into a document store.
pub fn cmd_ingest(db_path: &Path, file: &Path, json_mode: bool) -> Result<(), MotelError> {
    tracing::info!("Ingesting from {:?} into {:?}", file, db_path);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_INGEST_FILE_SIZE)?;

    let contents = std::fs::read_to_string(&validated_path)
        .map_err(|e| MotelError::IoError(format!("Read file: {}", e)))?;
    let document = GraphDocument::from_json(&contents)?;

    let mut session = Session::open(db_path)?;
    let mapping = session.ingest(&document)?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "vertices_ingested": mapping.len(),
            "edges_ingested": document.edges.len(),
            "vertex_count": session.vertex_count()?,
            "edge_count": session.edge_count()?
        }));
        return Ok(());
    }

    println!(
        "Ingested {} vertices and {} edges into {:?}",
        mapping.len(),
        document.edges.len(),
        db_path
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document store status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), MotelError> {
    let session = Session::open_existing(db_path)?;
    let vertices = session.vertex_count()?;
    let edges = session.edge_count()?;
    let positives = session.positive_vertices()?.len();

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "persistent": session.is_persistent(),
            "vertex_count": vertices,
            "edge_count": edges,
            "positive_count": positives
        }));
        return Ok(());
    }

    println!("Motel Document Status");
    println!("=====================");
    println!("Database:  {:?}", db_path);
    println!();
    println!("Vertices:  {}", vertices);
    println!("Edges:     {}", edges);
    println!("Positives: {}", positives);

    Ok(())
}

// =============================================================================
// EXTRACT COMMAND
// =============================================================================

/// Write one neighborhood motif per positively labeled vertex.
pub fn cmd_extract_neighborhoods(
    config: &MotelConfig,
    input: &Path,
    output: &Path,
    distance: Option<f64>,
    json_mode: bool,
) -> Result<(), MotelError> {
    let distance = distance.unwrap_or(config.neighborhood_distance);
    let weights = config.edge_weights()?;

    tracing::info!("Looking for labels in {:?}...", input);
    let records = {
        let session = Session::open_existing(input)?;
        extract_neighborhoods(&session, distance, &weights)?
    };

    write_jsonl_file(output, &records)?;
    tracing::info!("Results written to {:?}", output);

    if json_mode {
        print_json(&serde_json::json!({
            "input": input.to_string_lossy(),
            "output": output.to_string_lossy(),
            "distance": distance,
            "neighborhoods": records.len()
        }));
    } else {
        println!("Wrote {} neighborhoods to {:?}", records.len(), output);
    }
    Ok(())
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

/// Evaluate motifs over every document of a dataset and write the image.
pub fn cmd_evaluate(
    motifs_path: &Path,
    data: &Path,
    output: &Path,
    json_mode: bool,
) -> Result<(), MotelError> {
    tracing::info!("Loading motifs from {:?}...", motifs_path);
    let motifs: Vec<Motif> = read_jsonl_file(motifs_path)?;
    tracing::info!("Motifs loaded. Found {} motifs.", motifs.len());

    let dataset = Dataset::load(data)?;

    let mut image = SparseImage::new();
    image.register_many(motifs);
    let report = image.evaluate_dataset(&dataset);
    image.dump(output)?;

    if json_mode {
        let failed: Vec<serde_json::Value> = report
            .failed
            .iter()
            .map(|(document, error)| serde_json::json!({"document": document, "error": error}))
            .collect();
        print_json(&serde_json::json!({
            "output": output.to_string_lossy(),
            "motifs": image.motif_count(),
            "evaluated": report.evaluated,
            "failed": failed
        }));
        return Ok(());
    }

    println!(
        "Evaluated {} motifs over {} documents ({} failed)",
        image.motif_count(),
        report.evaluated.len(),
        report.failed.len()
    );
    for (document, error) in &report.failed {
        println!("  {}: {}", document, error);
    }
    println!("Image written to {:?}", output);
    Ok(())
}

// =============================================================================
// ANALYZE COMMAND
// =============================================================================

/// Run active learning for each ensemble and write every result row as CSV.
///
/// An empty `kinds` list runs every strategy.
pub fn cmd_analyze(
    config: &MotelConfig,
    image_path: &Path,
    data: &Path,
    output: &Path,
    kinds: &[EnsembleKind],
    run: &ActiveLearning,
    json_mode: bool,
) -> Result<(), MotelError> {
    let image = SparseImage::load(image_path)?;
    let dataset = Dataset::load(data)?;
    let truth = dataset.ground_truth();
    tracing::info!("Found {} ground-truth positives", truth.len());

    let kinds = if kinds.is_empty() {
        EnsembleKind::ALL.as_slice()
    } else {
        kinds
    };

    let mut rows: Vec<ResultRow> = Vec::new();
    for &kind in kinds {
        let mut ensemble = Ensemble::new(kind, &image, config);
        let mut partition = Partition::from_dataset(ensemble.domain(), &dataset);
        rows.extend(run.run(
            &mut ensemble,
            &truth,
            &mut partition,
            config.classification_threshold,
        )?);
    }

    write_csv(output, &ResultRow::HEADER, &rows)?;

    if json_mode {
        print_json(&serde_json::json!({
            "output": output.to_string_lossy(),
            "ensembles": kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "rows": rows.len()
        }));
    } else {
        println!("Wrote {} result rows to {:?}", rows.len(), output);
    }
    Ok(())
}

// =============================================================================
// CURVE COMMAND
// =============================================================================

/// One CSV line of a precision-recall curve.
#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    ranking: f64,
    file: &'a str,
    identifier: u64,
    precision: f64,
    recall: f64,
    gt: bool,
}

impl CurveRow<'_> {
    const HEADER: [&'static str; 6] = ["ranking", "file", "identifier", "precision", "recall", "gt"];
}

/// Write the precision-recall curve of one ensemble as CSV.
pub fn cmd_curve(
    config: &MotelConfig,
    image_path: &Path,
    data: &Path,
    output: &Path,
    kind: EnsembleKind,
    json_mode: bool,
) -> Result<(), MotelError> {
    let image = SparseImage::load(image_path)?;
    let truth = Dataset::load(data)?.ground_truth();
    let ensemble = Ensemble::new(kind, &image, config);

    let curve = precision_recall_curve(&ensemble, &truth);
    let rows: Vec<CurveRow<'_>> = curve
        .iter()
        .map(|step| CurveRow {
            ranking: step.ranking,
            file: &step.point.document,
            identifier: step.point.identifier.0,
            precision: step.precision,
            recall: step.recall,
            gt: step.ground_truth,
        })
        .collect();
    write_csv(output, &CurveRow::HEADER, &rows)?;

    if json_mode {
        print_json(&serde_json::json!({
            "output": output.to_string_lossy(),
            "ensemble": kind.as_str(),
            "points": rows.len()
        }));
    } else {
        println!("Wrote {}-point curve to {:?}", rows.len(), output);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Write serializable rows as CSV with a header line.
///
/// `header` must match the serialized field names; it is written directly
/// only when there are no rows to derive it from.
pub fn write_csv<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: &[T],
) -> Result<(), MotelError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| MotelError::IoError(e.to_string()))?;
    }
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| MotelError::IoError(e.to_string()))?;
    if rows.is_empty() {
        writer
            .write_record(header)
            .map_err(|e| MotelError::SerializationError(e.to_string()))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| MotelError::SerializationError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| MotelError::IoError(e.to_string()))
}
