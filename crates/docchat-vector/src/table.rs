//! LanceDB reads and writes for the `chunks` and `meta` tables.
use anyhow::{anyhow, ensure, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray,
};
use chrono::Utc;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::schema::{build_chunks_schema, build_meta_schema, CHUNKS_TABLE, META_TABLE};

/// One `chunks` row as stored.
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub position: usize,
    pub chunk_index: usize,
    pub content: String,
    pub vector: Vec<f32>,
}

pub async fn open_db(path: &Path) -> Result<Connection> {
    Ok(connect(path.to_string_lossy().as_ref()).execute().await?)
}

pub async fn table_names(conn: &Connection) -> Result<Vec<String>> {
    Ok(conn.table_names().execute().await?)
}

pub async fn write_chunks(conn: &Connection, rows: &[StoredRow], dim: usize) -> Result<()> {
    let dim = i32::try_from(dim)?;
    let schema = build_chunks_schema(dim);
    let mut positions = Vec::with_capacity(rows.len());
    let mut chunk_indices = Vec::with_capacity(rows.len());
    let mut contents = Vec::with_capacity(rows.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
    for row in rows {
        positions.push(i32::try_from(row.position)?);
        chunk_indices.push(i32::try_from(row.chunk_index)?);
        contents.push(row.content.clone());
        vectors.push(Some(row.vector.iter().map(|&x| Some(x)).collect()));
    }
    let rb = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int32Array::from(positions)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), dim)),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
    conn.create_table(CHUNKS_TABLE, reader).execute().await?;
    Ok(())
}

pub async fn write_meta(conn: &Connection, pairs: &[(&str, String)]) -> Result<()> {
    let now = Utc::now().timestamp_millis();
    let rb = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(pairs.iter().map(|(k, _)| (*k).to_string()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(pairs.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>())),
            Arc::new(TimestampMillisecondArray::from(vec![now; pairs.len()])),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
    conn.create_table(META_TABLE, reader).execute().await?;
    Ok(())
}

pub async fn read_meta(conn: &Connection) -> Result<HashMap<String, String>> {
    let t = conn.open_table(META_TABLE).execute().await?;
    let mut out = HashMap::new();
    let mut stream = t.query().execute().await?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        let keys = string_column(&batch, "key")?;
        let values = string_column(&batch, "value")?;
        for i in 0..batch.num_rows() {
            out.insert(keys.value(i).to_string(), values.value(i).to_string());
        }
    }
    Ok(out)
}

/// All `chunks` rows, each vector checked against `dim`.
pub async fn read_chunks(conn: &Connection, dim: usize) -> Result<Vec<StoredRow>> {
    let t = conn.open_table(CHUNKS_TABLE).execute().await?;
    let mut rows = Vec::new();
    let mut stream = t.query().execute().await?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        let positions = int_column(&batch, "position")?;
        let chunk_indices = int_column(&batch, "chunk_index")?;
        let contents = string_column(&batch, "content")?;
        let vectors = batch
            .column_by_name("vector")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| anyhow!("chunks.vector column missing"))?;
        ensure!(
            usize::try_from(vectors.value_length()).ok() == Some(dim),
            "stored vectors have dimension {}, metadata says {dim}",
            vectors.value_length()
        );
        for i in 0..batch.num_rows() {
            ensure!(vectors.is_valid(i), "row {i} has no vector");
            let list = vectors.value(i);
            let values = list
                .as_primitive_opt::<Float32Type>()
                .ok_or_else(|| anyhow!("chunks.vector items are not f32"))?;
            rows.push(StoredRow {
                position: usize::try_from(positions.value(i))?,
                chunk_index: usize::try_from(chunk_indices.value(i))?,
                content: contents.value(i).to_string(),
                vector: values.values().to_vec(),
            });
        }
    }
    Ok(rows)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not a string"))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not an int32"))
}
