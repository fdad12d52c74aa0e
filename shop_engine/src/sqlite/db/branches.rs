use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::escape_like;
use crate::{db_types::Branch, order_objects::BranchQueryFilter};

pub async fn fetch_branch(id: i64, conn: &mut SqliteConnection) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM branches WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_branches(
    filter: BranchQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Branch>, sqlx::Error> {
    let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM branches");
    if filter.is_active.is_some() || search.is_some() {
        builder.push(" WHERE ");
        let mut where_clause = builder.separated(" AND ");
        if let Some(active) = filter.is_active {
            where_clause.push("is_active = ");
            where_clause.push_bind_unseparated(active);
        }
        if let Some(prefix) = search {
            where_clause.push("name LIKE ");
            where_clause.push_bind_unseparated(format!("{}%", escape_like(prefix)));
            where_clause.push_unseparated(" ESCAPE '\\'");
        }
    }
    builder.push(" ORDER BY name");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Branch>().fetch_all(conn).await
}

pub async fn insert_branch(name: &str, is_active: bool, conn: &mut SqliteConnection) -> Result<Branch, sqlx::Error> {
    let branch: Branch = sqlx::query_as("INSERT INTO branches (name, is_active) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(is_active)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Branch '{}' created with id {}", branch.name, branch.id);
    Ok(branch)
}

pub async fn set_branch_active(
    id: i64,
    is_active: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Branch>, sqlx::Error> {
    sqlx::query_as("UPDATE branches SET is_active = $1 WHERE id = $2 RETURNING *")
        .bind(is_active)
        .bind(id)
        .fetch_optional(conn)
        .await
}
