#![forbid(unsafe_code)]

//! Scalar SQL functions installed on every connection. Case folding and keyword buckets run
//! the same Rust code whether a query filters in SQL or a caller checks a value in memory.

use am_core::categorize::{FeatureCategory, economics_bucket, is_search_like};
use rusqlite::Connection;
use rusqlite::functions::{Context, FunctionFlags};

/// Installs `fold`, `feature_category`, `economics_bucket` and `search_like`.
///
/// `fold(x)` is Unicode lowercase and keeps NULL; the others treat NULL as empty text.
pub(in crate::store) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function("fold", 1, flags, |ctx| {
        Ok(text_arg(ctx)?.map(|text| text.to_lowercase()))
    })?;
    conn.create_scalar_function("feature_category", 1, flags, |ctx| {
        Ok(FeatureCategory::of(&text_arg(ctx)?.unwrap_or_default()).as_str())
    })?;
    conn.create_scalar_function("economics_bucket", 1, flags, |ctx| {
        Ok(economics_bucket(&text_arg(ctx)?.unwrap_or_default()))
    })?;
    conn.create_scalar_function("search_like", 1, flags, |ctx| {
        Ok(is_search_like(&text_arg(ctx)?.unwrap_or_default()))
    })?;
    Ok(())
}

fn text_arg(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    ctx.get::<Option<String>>(0)
}
