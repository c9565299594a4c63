use chatwire_types::Message;
use chrono::DateTime;
use diesel::{dsl::max, prelude::*};

use crate::db::{DbConnection, schema::messages};

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MessageModel {
    pub id: i32,
    pub sender_id: i32,
    pub content: String,
    pub timestamp: i64,
}

impl MessageModel {
    /// Convert a row into the wire type. `None` if the stored millisecond
    /// timestamp is outside chrono's representable range.
    pub fn into_message(self) -> Option<Message> {
        let timestamp = DateTime::from_timestamp_millis(self.timestamp)?;
        Some(Message {
            id: self.id,
            sender_id: self.sender_id,
            content: self.content,
            timestamp,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage<'a> {
    pub sender_id: i32,
    pub content: &'a str,
    pub timestamp: i64,
}

/// Insert a message stamped with `max(now_ms, latest stored timestamp)`.
///
/// The read and the write share one immediate transaction, so concurrent
/// writers are serialized and the table stays non-decreasing in
/// `(timestamp, id)` even if the wall clock steps backwards.
pub fn insert_stamped(
    conn: &mut DbConnection,
    sender_id: i32,
    content: &str,
    now_ms: i64,
) -> QueryResult<MessageModel> {
    conn.immediate_transaction(|conn| {
        let latest: Option<i64> = messages::table
            .select(max(messages::timestamp))
            .first(conn)?;
        let timestamp = latest.map_or(now_ms, |latest| latest.max(now_ms));

        diesel::insert_into(messages::table)
            .values(&NewMessage {
                sender_id,
                content,
                timestamp,
            })
            .returning(MessageModel::as_returning())
            .get_result(conn)
    })
}

/// Every message, most recent first.
pub fn list_all(conn: &mut DbConnection) -> QueryResult<Vec<MessageModel>> {
    messages::table
        .order((messages::timestamp.desc(), messages::id.desc()))
        .select(MessageModel::as_select())
        .load(conn)
}

/// Messages strictly after the `(timestamp, id)` watermark, oldest first.
///
/// With `last_id = None` the watermark is the timestamp alone.
pub fn list_since(
    conn: &mut DbConnection,
    since_ms: i64,
    last_id: Option<i32>,
) -> QueryResult<Vec<MessageModel>> {
    let query = messages::table.into_boxed();
    let query = match last_id {
        Some(id) => query.filter(
            messages::timestamp
                .gt(since_ms)
                .or(messages::timestamp.eq(since_ms).and(messages::id.gt(id))),
        ),
        None => query.filter(messages::timestamp.gt(since_ms)),
    };

    query
        .order((messages::timestamp.asc(), messages::id.asc()))
        .select(MessageModel::as_select())
        .load(conn)
}
