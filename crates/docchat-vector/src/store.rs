//! Persisting a [`VectorIndex`] as a LanceDB directory.
//!
//! `persist` writes a complete database into a sibling staging directory and
//! only then swaps it into place, so a failed write leaves the previous index
//! untouched. LanceDB is async; both entry points drive it on a private
//! runtime and must not be called from inside another tokio runtime.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure};
use docchat_core::types::Chunk;
use docchat_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::index::{IndexEntry, VectorIndex};
use crate::schema::{meta_keys, CHUNKS_TABLE, FORMAT_VERSION, META_TABLE};
use crate::table::{open_db, read_chunks, read_meta, table_names, write_chunks, write_meta, StoredRow};

pub fn persist(index: &VectorIndex, location: &Path) -> Result<()> {
    let staging = sibling(location, "staging")?;
    let retired = sibling(location, "old")?;
    if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("{}: {e}", parent.display())))?;
    }
    remove_dir_if_exists(&staging)?;
    remove_dir_if_exists(&retired)?;

    let rt = runtime().map_err(|e| Error::Storage(format!("{e:#}")))?;
    rt.block_on(write_all(index, &staging)).map_err(|e| {
        let _ = fs::remove_dir_all(&staging);
        Error::Storage(format!("{e:#}"))
    })?;

    swap_into_place(&staging, location, &retired)?;
    info!(path = %location.display(), entries = index.len(), embedder = index.embedder_id(), "persisted index");
    Ok(())
}

/// Replace `location` with `staging`, parking the old index at `retired`
/// until the new one is in place. If the second rename fails the old index
/// is moved back.
fn swap_into_place(staging: &Path, location: &Path, retired: &Path) -> Result<()> {
    let parked = location.exists();
    if parked {
        fs::rename(location, retired).map_err(|e| Error::Storage(format!("{}: {e}", location.display())))?;
    }
    if let Err(e) = fs::rename(staging, location) {
        if parked {
            if let Err(restore) = fs::rename(retired, location) {
                warn!(path = %retired.display(), error = %restore, "could not restore previous index");
            }
        }
        return Err(Error::Storage(format!("{}: {e}", location.display())));
    }
    remove_dir_if_exists(retired)
}

pub fn load(location: &Path) -> Result<VectorIndex> {
    if !location.exists() {
        return Err(Error::IndexNotFound(location.to_path_buf()));
    }
    if !location.is_dir() {
        return Err(Error::IndexCorrupt(format!("{} is not a directory", location.display())));
    }
    let rt = runtime().map_err(|e| Error::IndexCorrupt(format!("{e:#}")))?;
    match rt.block_on(read_all(location)) {
        Ok(Some(index)) => {
            info!(path = %location.display(), entries = index.len(), embedder = index.embedder_id(), "loaded index");
            Ok(index)
        }
        Ok(None) => Err(Error::IndexNotFound(location.to_path_buf())),
        Err(e) => Err(Error::IndexCorrupt(format!("{e:#}"))),
    }
}

async fn write_all(index: &VectorIndex, dir: &Path) -> anyhow::Result<()> {
    let conn = open_db(dir).await?;
    let rows: Vec<StoredRow> = index
        .entries()
        .iter()
        .enumerate()
        .map(|(position, e)| StoredRow {
            position,
            chunk_index: e.chunk.index,
            content: e.chunk.content.clone(),
            vector: e.embedding.clone(),
        })
        .collect();
    write_chunks(&conn, &rows, index.dim()).await?;
    write_meta(
        &conn,
        &[
            (meta_keys::EMBEDDER_ID, index.embedder_id().to_string()),
            (meta_keys::DIMENSION, index.dim().to_string()),
            (meta_keys::COUNT, index.len().to_string()),
            (meta_keys::FORMAT_VERSION, FORMAT_VERSION.to_string()),
        ],
    )
    .await?;
    debug!(rows = rows.len(), dir = %dir.display(), "wrote index tables");
    Ok(())
}

/// `Ok(None)` when the directory holds no index tables at all.
async fn read_all(dir: &Path) -> anyhow::Result<Option<VectorIndex>> {
    let conn = open_db(dir).await?;
    let names = table_names(&conn).await?;
    let has_chunks = names.iter().any(|n| n == CHUNKS_TABLE);
    let has_meta = names.iter().any(|n| n == META_TABLE);
    if !has_chunks && !has_meta {
        return Ok(None);
    }
    ensure!(has_chunks && has_meta, "index tables incomplete (found {names:?})");

    let meta = read_meta(&conn).await?;
    let version = required(&meta, meta_keys::FORMAT_VERSION)?;
    ensure!(version == FORMAT_VERSION, "unsupported index format version {version}");
    let embedder_id = required(&meta, meta_keys::EMBEDDER_ID)?.to_string();
    let dim: usize = required(&meta, meta_keys::DIMENSION)?.parse()?;
    let count: usize = required(&meta, meta_keys::COUNT)?.parse()?;
    ensure!(dim > 0 && count > 0, "empty index metadata (dimension {dim}, count {count})");

    let mut rows = read_chunks(&conn, dim).await?;
    ensure!(rows.len() == count, "metadata lists {count} chunks, table has {}", rows.len());
    rows.sort_by_key(|r| r.position);
    if let Some((i, r)) = rows.iter().enumerate().find(|(i, r)| r.position != *i) {
        bail!("chunk positions are not contiguous: expected {i}, found {}", r.position);
    }
    let entries = rows
        .into_iter()
        .map(|r| IndexEntry { chunk: Chunk { index: r.chunk_index, content: r.content }, embedding: r.vector })
        .collect();
    Ok(Some(VectorIndex::from_entries(entries, embedder_id, dim)))
}

fn required<'a>(meta: &'a HashMap<String, String>, key: &str) -> anyhow::Result<&'a str> {
    meta.get(key).map(String::as_str).ok_or_else(|| anyhow!("metadata key '{key}' missing"))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// `<dir>/.<name>.<suffix>` next to `location`.
fn sibling(location: &Path, suffix: &str) -> Result<PathBuf> {
    let name = location
        .file_name()
        .ok_or_else(|| Error::Storage(format!("{} has no directory name", location.display())))?;
    Ok(location.with_file_name(format!(".{}.{suffix}", name.to_string_lossy())))
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| Error::Storage(format!("{}: {e}", path.display())))?;
    }
    Ok(())
}
