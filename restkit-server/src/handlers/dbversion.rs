use axum::extract::Extension;
use axum::Json;
use restkit_plugins::adapters::{self, DbPool};
use restkit_plugins::RequestContext;
use restkit_queries::QueryCatalog;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Catalog entry the handler runs.
pub const VERSION_QUERY: &str = "version";

/// GET /dbversion
/// Run the catalog's `version` query against the relational store.
pub async fn db_version(
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Value>, ApiError> {
    let catalog = ctx
        .get::<QueryCatalog>(adapters::QUERIES)
        .ok_or_else(|| ApiError::unavailable("query catalog is not configured"))?;
    let sql = catalog
        .get(VERSION_QUERY)
        .ok_or_else(|| ApiError::not_found(format!("query '{VERSION_QUERY}' is not defined")))?;
    let pool = ctx
        .get::<DbPool>(adapters::SQL)
        .ok_or_else(|| ApiError::unavailable("sql store is not configured"))?;

    let version: String = sqlx::query_scalar(sql).fetch_one(&*pool).await?;
    Ok(Json(json!({ "db": version })))
}
