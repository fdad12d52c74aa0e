use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{AdminUser, NewAdminUser};

const USER_QUERY: &str = r#"
    SELECT admin_users.*, branch_accounts.branch_id AS branch_id
    FROM admin_users LEFT JOIN branch_accounts ON branch_accounts.user_id = admin_users.id
"#;

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<AdminUser>, sqlx::Error> {
    let sql = format!("{USER_QUERY} WHERE admin_users.id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(conn).await
}

pub async fn fetch_user_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AdminUser>, sqlx::Error> {
    let sql = format!("{USER_QUERY} WHERE admin_users.username = $1");
    sqlx::query_as(&sql).bind(username).fetch_optional(conn).await
}

/// Inserts the user and returns its id.
pub async fn insert_user(user: NewAdminUser, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO admin_users (username, email, first_name, last_name, password_hash, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id;
        "#,
    )
    .bind(&user.username)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.password_hash)
    .bind(user.is_superuser)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Admin user '{}' created with id {id}", user.username);
    Ok(id)
}

pub async fn upsert_branch_account(
    user_id: i64,
    branch_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO branch_accounts (user_id, branch_id) VALUES ($1, $2) ON CONFLICT (user_id) DO UPDATE SET \
         branch_id = excluded.branch_id",
    )
    .bind(user_id)
    .bind(branch_id)
    .execute(conn)
    .await?;
    debug!("🗃️ Admin user {user_id} assigned to branch {branch_id}");
    Ok(())
}
