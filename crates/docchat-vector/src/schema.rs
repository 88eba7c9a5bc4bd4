use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const CHUNKS_TABLE: &str = "chunks";
pub const META_TABLE: &str = "meta";

/// Bumped whenever the table layout changes; older directories load as corrupt.
pub const FORMAT_VERSION: &str = "1";

pub mod meta_keys {
    pub const EMBEDDER_ID: &str = "embedder_id";
    pub const DIMENSION: &str = "dimension";
    pub const COUNT: &str = "count";
    pub const FORMAT_VERSION: &str = "format_version";
}

pub fn vector_field(dim: i32) -> Field {
    Field::new(
        "vector",
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
        false,
    )
}

/// `position` is the insertion ordinal; `chunk_index` is the chunk's own ordinal.
pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("position", DataType::Int32, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("content", DataType::Utf8, false),
        vector_field(dim),
    ]))
}

pub fn build_meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
        Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}
