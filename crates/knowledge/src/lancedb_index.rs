//! LanceDB-backed vector index.

use crate::types::{Chunk, ChunkMetadata, IndexedChunk, MetadataFilter};
use crate::vector_index::VectorIndex;
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use pdfchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Columns that mirror a `ChunkMetadata` string field.
const STRING_COLUMNS: [&str; 3] = ["filename", "file_id", "source"];

/// Vector index stored as a LanceDB table.
///
/// Construction does no I/O; [`VectorIndex::init`] connects and loads or
/// creates the table.
pub struct LanceDbIndex {
    db_path: PathBuf,
    table_name: String,
    embedding_dim: usize,
    table: OnceCell<Table>,
}

impl LanceDbIndex {
    /// Describe an index at `db_path` without touching disk.
    ///
    /// # Arguments
    /// * `db_path` - Directory of the LanceDB database
    /// * `table_name` - Collection name (e.g. "documents")
    /// * `embedding_dim` - Dimension of embedding vectors (e.g. 384)
    pub fn new(db_path: &Path, table_name: &str, embedding_dim: usize) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            table_name: table_name.to_string(),
            embedding_dim,
            table: OnceCell::new(),
        }
    }

    async fn load_or_create(&self) -> AppResult<Table> {
        std::fs::create_dir_all(&self.db_path).map_err(|e| {
            AppError::Storage(format!(
                "Failed to create index directory {:?}: {}",
                self.db_path, e
            ))
        })?;

        let uri = self.db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            let table = conn
                .open_table(&self.table_name)
                .execute()
                .await
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

            let schema = table.schema().await.map_err(|e| {
                AppError::Storage(format!("Failed to read table schema: {}", e))
            })?;
            let stored_dim = embedding_dim_of(&schema);
            if stored_dim != Some(self.embedding_dim) {
                return Err(AppError::Storage(format!(
                    "Collection '{}' stores {:?}-dimensional embeddings, expected {}",
                    self.table_name, stored_dim, self.embedding_dim
                )));
            }

            tracing::info!("Loaded collection '{}' from {:?}", self.table_name, self.db_path);
            return Ok(table);
        }

        let schema = create_schema(self.embedding_dim);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let table = conn
            .create_table(
                &self.table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create table: {}", e)))?;

        tracing::info!("Created collection '{}' at {:?}", self.table_name, self.db_path);
        Ok(table)
    }

    fn table(&self) -> AppResult<&Table> {
        self.table.get().ok_or_else(|| {
            AppError::NotInitialized(format!(
                "collection '{}' at {:?} has not been loaded",
                self.table_name, self.db_path
            ))
        })
    }

    fn check_dim(&self, len: usize, what: &str) -> AppResult<()> {
        if len != self.embedding_dim {
            return Err(AppError::Storage(format!(
                "{} dimension mismatch: expected {}, got {}",
                what, self.embedding_dim, len
            )));
        }
        Ok(())
    }

    async fn scan(&self, limit: Option<usize>) -> AppResult<Vec<IndexedChunk>> {
        let table = self.table()?;
        let mut query = table.query();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let batches: Vec<RecordBatch> = query
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to scan collection: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read rows: {}", e)))?;

        let mut rows = Vec::new();
        for batch in &batches {
            rows.extend(batch_to_rows(batch)?);
        }
        Ok(rows)
    }

    /// Delete the rows matching `predicate` in one commit; returns how many
    /// there were.
    async fn delete_matching(&self, predicate: &str) -> AppResult<usize> {
        let table = self.table()?;
        let count = table
            .count_rows(Some(predicate.to_string()))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to count rows: {}", e)))?;

        if count > 0 {
            table
                .delete(predicate)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete rows: {}", e)))?;
        }
        Ok(count)
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn name(&self) -> &str {
        &self.table_name
    }

    fn location(&self) -> String {
        self.db_path.display().to_string()
    }

    fn dimensions(&self) -> usize {
        self.embedding_dim
    }

    async fn init(&self) -> AppResult<()> {
        self.table
            .get_or_try_init(|| self.load_or_create())
            .await?;
        Ok(())
    }

    async fn add(&self, rows: &[IndexedChunk]) -> AppResult<()> {
        let table = self.table()?;
        if rows.is_empty() {
            return Ok(());
        }
        for row in rows {
            self.check_dim(row.embedding.len(), "Embedding")?;
        }

        let batch = rows_to_batch(rows, self.embedding_dim)?;
        let schema = batch.schema();
        table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to add chunks: {}", e)))?;

        tracing::debug!("Inserted {} chunks into '{}'", rows.len(), self.table_name);
        Ok(())
    }

    async fn nearest(&self, query: &[f32], top_k: usize) -> AppResult<Vec<(IndexedChunk, f32)>> {
        let table = self.table()?;
        self.check_dim(query.len(), "Query embedding")?;

        if top_k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        // Zero vectors have no direction; keep them out of the ranking
        let batches: Vec<RecordBatch> = table
            .query()
            .only_if("norm > 0")
            .nearest_to(query.to_vec())
            .map_err(|e| AppError::Storage(format!("Failed to create query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to collect results: {}", e)))?;

        let mut scored = Vec::new();
        for batch in &batches {
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| AppError::Storage("Invalid _distance column".to_string()))?;

            for (i, row) in batch_to_rows(batch)?.into_iter().enumerate() {
                scored.push((row, 1.0 - distances.value(i)));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{}), best score {:.3}",
            scored.len(),
            top_k,
            scored.first().map(|(_, s)| *s).unwrap_or(0.0)
        );

        Ok(scored)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table()?
            .count_rows(None)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to count rows: {}", e)))
    }

    async fn sample(&self, limit: usize) -> AppResult<Vec<IndexedChunk>> {
        if limit == 0 {
            self.table()?;
            return Ok(Vec::new());
        }
        self.scan(Some(limit)).await
    }

    async fn delete_all(&self) -> AppResult<usize> {
        let table = self.table()?;
        let count = self.count().await?;
        if count > 0 {
            table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| AppError::Storage(format!("Failed to clear collection: {}", e)))?;
        }
        tracing::info!("Cleared {} chunks from '{}'", count, self.table_name);
        Ok(count)
    }

    async fn delete_where(&self, filter: &MetadataFilter) -> AppResult<usize> {
        if filter.is_empty() {
            return self.delete_all().await;
        }

        let removed = match sql_predicate(filter) {
            Some(predicate) => self.delete_matching(&predicate).await?,
            None => {
                // Keys without a column are matched against the stored JSON
                let ids: Vec<String> = self
                    .scan(None)
                    .await?
                    .into_iter()
                    .filter(|row| filter.matches(&row.chunk.metadata))
                    .map(|row| quote(&row.id))
                    .collect();

                if ids.is_empty() {
                    0
                } else {
                    self.delete_matching(&format!("id IN ({})", ids.join(", ")))
                        .await?
                }
            }
        };

        tracing::info!("Deleted {} chunks matching {:?}", removed, filter);
        Ok(removed)
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL form of `filter`, or `None` when some pair has no column equivalent.
fn sql_predicate(filter: &MetadataFilter) -> Option<String> {
    let clauses = filter
        .iter()
        .map(|(key, value)| match (key, value) {
            (key, serde_json::Value::String(s)) if STRING_COLUMNS.contains(&key) => {
                Some(format!("{} = {}", key, quote(s)))
            }
            ("page", serde_json::Value::Null) => Some("page IS NULL".to_string()),
            ("page", serde_json::Value::Number(n)) => n
                .as_u64()
                .filter(|page| *page <= u32::MAX as u64)
                .map(|page| format!("page = {}", page)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some(clauses.join(" AND "))
}

fn create_schema(embedding_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
        Field::new("norm", DataType::Float32, false),
        // Queryable copies of the common metadata fields
        Field::new("filename", DataType::Utf8, false),
        Field::new("file_id", DataType::Utf8, false),
        Field::new("page", DataType::UInt32, true),
        Field::new("source", DataType::Utf8, false),
        // Full ChunkMetadata as JSON
        Field::new("metadata", DataType::Utf8, false),
    ]))
}

fn embedding_dim_of(schema: &Schema) -> Option<usize> {
    match schema.field_with_name("embedding").ok()?.data_type() {
        DataType::FixedSizeList(_, size) => Some(*size as usize),
        _ => None,
    }
}

fn rows_to_batch(rows: &[IndexedChunk], embedding_dim: usize) -> AppResult<RecordBatch> {
    let schema = create_schema(embedding_dim);

    let metadata_json = rows
        .iter()
        .map(|row| serde_json::to_string(&row.chunk.metadata))
        .collect::<Result<Vec<_>, _>>()?;

    let flat: Vec<f32> = rows
        .iter()
        .flat_map(|row| row.embedding.iter().copied())
        .collect();
    let embeddings = FixedSizeListArray::try_new(
        Arc::new(Field::new("item", DataType::Float32, true)),
        embedding_dim as i32,
        Arc::new(Float32Array::from(flat)),
        None,
    )
    .map_err(|e| AppError::Storage(format!("Failed to build embedding column: {}", e)))?;

    let norms = Float32Array::from_iter_values(
        rows.iter()
            .map(|r| r.embedding.iter().map(|x| x * x).sum::<f32>().sqrt()),
    );

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.id.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.chunk.text.as_str()))),
        Arc::new(embeddings),
        Arc::new(norms),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.chunk.metadata.filename.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.chunk.metadata.file_id.as_str()),
        )),
        Arc::new(UInt32Array::from(
            rows.iter().map(|r| r.chunk.metadata.page).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.chunk.metadata.source.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(metadata_json.iter().map(String::as_str))),
    ];

    RecordBatch::try_new(schema, columns)
        .map_err(|e| AppError::Storage(format!("Failed to create RecordBatch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Storage(format!("Invalid {} column", name)))
}

fn batch_to_rows(batch: &RecordBatch) -> AppResult<Vec<IndexedChunk>> {
    let ids = string_column(batch, "id")?;
    let texts = string_column(batch, "text")?;
    let metadata = string_column(batch, "metadata")?;
    let embeddings = batch
        .column_by_name("embedding")
        .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| AppError::Storage("Invalid embedding column".to_string()))?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let values = embeddings.value(i);
        let values = values
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| AppError::Storage("Invalid embedding values".to_string()))?;

        let chunk_metadata: ChunkMetadata = serde_json::from_str(metadata.value(i))
            .map_err(|e| AppError::Storage(format!("Failed to parse metadata: {}", e)))?;

        rows.push(IndexedChunk {
            id: ids.value(i).to_string(),
            chunk: Chunk::new(texts.value(i), chunk_metadata),
            embedding: values.values().to_vec(),
        });
    }

    Ok(rows)
}
