use std::time::Duration;

use chatwire_types::{Message, UNKNOWN_USERNAME};
use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, warn};

use crate::{
    store::{MessageStore, StoreError, UserDirectory},
    stream::Cursor,
};

pub mod models;
pub mod schema;

pub use models::UserModel;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./src/db/migrations");

/// How long a connection waits on a locked database before failing a query.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbConnection = diesel::sqlite::SqliteConnection;

pub type PooledConnection = diesel::r2d2::PooledConnection<ConnectionManager<DbConnection>>;

pub type DbPool = Pool<ConnectionManager<DbConnection>>;

/// Handle on the chat store. Opened once at startup and shared by reference.
#[derive(Debug)]
pub struct DbManager {
    pool: DbPool,
}

pub type DbResult<T> = Result<T, DbError>;
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Failed to insert user: {0}")]
    InsertUserError(diesel::result::Error),
    #[error("Failed to find user: {0}")]
    FindUserError(diesel::result::Error),
    #[error("Failed to insert message: {0}")]
    InsertMessageError(diesel::result::Error),
    #[error("Failed to list messages: {0}")]
    ListMessagesError(diesel::result::Error),
    #[error("Database health check failed: {0}")]
    HealthCheckError(diesel::result::Error),
    #[error("Stored message {0} has an out-of-range timestamp")]
    CorruptMessage(i32),
}

#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<DbConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut DbConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn run_migrations(conn: &mut PooledConnection) -> Result<(), DbError> {
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

impl DbManager {
    /// Open the store at `database_url` and bring its schema up to date.
    ///
    /// Every connection to `:memory:` is a distinct database, so in-memory
    /// stores get a single-connection pool.
    pub fn local(database_url: &str) -> DbResult<Self> {
        debug!("Establishing connection to database at {}", database_url);
        let manager = ConnectionManager::<DbConnection>::new(database_url);
        let mut builder = Pool::builder().connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: BUSY_TIMEOUT,
        }));
        if database_url == ":memory:" {
            builder = builder.max_size(1);
        }
        let pool = builder
            .build(manager)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let mut pooled_connection = pool
            .get()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        debug!("Running database migrations...");
        run_migrations(&mut pooled_connection)?;

        Ok(Self { pool })
    }

    pub(crate) fn connection(&self) -> DbResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| DbError::ConnectionError(e.to_string()))
    }

    pub fn insert_user(&self, username: &str, password_hash: &str) -> DbResult<i32> {
        let mut conn = self.connection()?;

        match models::NewUser::new(username, password_hash).insert(&mut conn) {
            Ok(id) => Ok(id),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => Err(DbError::UsernameTaken),
            Err(e) => Err(DbError::InsertUserError(e)),
        }
    }

    /// Round trip on a pooled connection.
    pub fn ping(&self) -> DbResult<()> {
        let mut conn = self.connection()?;
        conn.batch_execute("SELECT 1")
            .map_err(DbError::HealthCheckError)
    }

    pub fn find_user(&self, username: &str) -> DbResult<Option<UserModel>> {
        let mut conn = self.connection()?;
        models::user::find_by_username(&mut conn, username).map_err(DbError::FindUserError)
    }

    pub fn find_username(&self, user_id: i32) -> DbResult<Option<String>> {
        let mut conn = self.connection()?;
        models::user::find_username(&mut conn, user_id).map_err(DbError::FindUserError)
    }

    /// Append a message from `sender_id`, stamped by the store's clock.
    pub fn insert_message(&self, sender_id: i32, content: &str) -> DbResult<Message> {
        let mut conn = self.connection()?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let row = models::message::insert_stamped(&mut conn, sender_id, content, now_ms)
            .map_err(DbError::InsertMessageError)?;
        let id = row.id;
        row.into_message().ok_or(DbError::CorruptMessage(id))
    }

    /// Every message, most recent first.
    pub fn list_messages(&self) -> DbResult<Vec<Message>> {
        let mut conn = self.connection()?;
        let rows = models::message::list_all(&mut conn).map_err(DbError::ListMessagesError)?;
        Ok(into_messages(rows))
    }

    /// Messages strictly after `cursor`, oldest first.
    pub fn list_messages_since(&self, cursor: &Cursor) -> DbResult<Vec<Message>> {
        let mut conn = self.connection()?;
        let rows = models::message::list_since(
            &mut conn,
            cursor.timestamp.timestamp_millis(),
            cursor.last_id,
        )
        .map_err(DbError::ListMessagesError)?;
        Ok(into_messages(rows))
    }
}

fn into_messages(rows: Vec<models::MessageModel>) -> Vec<Message> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let message = row.into_message();
            if message.is_none() {
                warn!(message_id = %id, "Skipping message with out-of-range timestamp");
            }
            message
        })
        .collect()
}

impl MessageStore for DbManager {
    fn insert(&self, sender_id: i32, content: &str) -> Result<Message, StoreError> {
        Ok(self.insert_message(sender_id, content)?)
    }

    fn list_all(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.list_messages()?)
    }

    fn list_since(&self, cursor: &Cursor) -> Result<Vec<Message>, StoreError> {
        Ok(self.list_messages_since(cursor)?)
    }
}

impl UserDirectory for DbManager {
    fn username_for(&self, sender_id: i32) -> String {
        match self.find_username(sender_id) {
            Ok(Some(username)) => username,
            Ok(None) => {
                warn!(sender_id = %sender_id, "No user for sender, using placeholder");
                UNKNOWN_USERNAME.to_string()
            }
            Err(e) => {
                warn!(sender_id = %sender_id, error = %e, "Username lookup failed, using placeholder");
                UNKNOWN_USERNAME.to_string()
            }
        }
    }
}
