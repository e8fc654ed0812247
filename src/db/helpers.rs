use color_eyre::Result;
use libsql::params::IntoParams;

/// Fetch all rows and decode each with `decode`.
pub async fn query_all<T>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
    decode: impl Fn(&libsql::Row) -> Result<T>,
) -> Result<Vec<T>> {
    let mut rows = conn.query(sql, params).await?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        results.push(decode(&row)?);
    }
    Ok(results)
}

/// Fetch the first row and decode it, or return `None` if no rows.
pub async fn query_optional<T>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
    decode: impl Fn(&libsql::Row) -> Result<T>,
) -> Result<Option<T>> {
    match conn.query(sql, params).await?.next().await? {
        Some(row) => Ok(Some(decode(&row)?)),
        None => Ok(None),
    }
}
