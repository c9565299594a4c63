use diesel::prelude::*;

use crate::db::{DbConnection, schema::users};

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserModel {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub created_at: i64,
}

impl<'a> NewUser<'a> {
    pub fn new(username: &'a str, password_hash: &'a str) -> Self {
        Self {
            username,
            password_hash,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Insert the user and return its id.
    pub fn insert(&self, conn: &mut DbConnection) -> QueryResult<i32> {
        diesel::insert_into(users::table)
            .values(self)
            .returning(users::id)
            .get_result(conn)
    }
}

pub fn find_by_username(
    conn: &mut DbConnection,
    username: &str,
) -> QueryResult<Option<UserModel>> {
    users::table
        .filter(users::username.eq(username))
        .select(UserModel::as_select())
        .first(conn)
        .optional()
}

pub fn find_username(conn: &mut DbConnection, user_id: i32) -> QueryResult<Option<String>> {
    users::table
        .filter(users::id.eq(user_id))
        .select(users::username)
        .first(conn)
        .optional()
}
