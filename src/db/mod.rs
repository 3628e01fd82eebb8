pub mod models;
pub mod schema;


use std::env;
use std::fmt;
use std::time::SystemTime;

use diesel::prelude::*;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::result::DatabaseErrorKind;
use diesel::sql_query;
use diesel::sql_types::BigInt;

use models::*;
use schema::reports::dsl::{self as r_dsl};
use schema::votes::dsl::{self as v_dsl};


type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
type PooledConn = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

const POOL_SIZE: u32 = 10;


lazy_static! {
    static ref DB_POOL: PgPool = establish_pool();
}


#[derive(Debug)]
pub enum Error {
    Pool(r2d2::PoolError),
    Query(diesel::result::Error),
}

impl Error {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Query(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation, _)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Pool(err) => write!(f, "pool error: {}", err),
            Error::Query(err) => write!(f, "query error: {}", err),
        }
    }
}

impl From<r2d2::PoolError> for Error {
    fn from(err: r2d2::PoolError) -> Self {
        Error::Pool(err)
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Query(err)
    }
}

pub type DbResult<T> = Result<T, Error>;


fn establish_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");
    r2d2::Pool::builder()
        .max_size(POOL_SIZE)
        .build(ConnectionManager::new(database_url))
        .expect("Fail to create DB pool")
}

fn conn() -> DbResult<PooledConn> {
    Ok(DB_POOL.get()?)
}

/// Creates the tables when they do not exist yet.
pub fn init() -> DbResult<()> {
    let conn = conn()?;

    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS reports (
            id SERIAL PRIMARY KEY,
            user_id VARCHAR(64) NOT NULL,
            category VARCHAR(50) NOT NULL,
            description TEXT,
            lat DOUBLE PRECISION NOT NULL,
            lng DOUBLE PRECISION NOT NULL,
            photo_url TEXT,
            status VARCHAR(50) NOT NULL DEFAULT 'OPEN',
            created_at TIMESTAMP NOT NULL DEFAULT now(),
            updated_at TIMESTAMP NOT NULL DEFAULT now()
        );
        CREATE TABLE IF NOT EXISTS votes (
            id SERIAL PRIMARY KEY,
            report_id INTEGER NOT NULL
                REFERENCES reports (id) ON DELETE CASCADE,
            user_id VARCHAR(64) NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT now(),
            UNIQUE (user_id, report_id)
        );")?;

    Ok(())
}

pub fn insert_report(report: &NewReport) -> DbResult<Report> {
    let conn = conn()?;

    Ok(diesel::insert_into(schema::reports::table)
        .values(report)
        .get_result::<Report>(&*conn)?)
}

pub fn get_recent_reports(limit: i64) -> DbResult<Vec<Report>> {
    let conn = conn()?;

    Ok(r_dsl::reports
        .order(r_dsl::created_at.desc())
        .limit(limit)
        .load::<Report>(&*conn)?)
}

pub fn get_any_report() -> DbResult<Option<Report>> {
    let conn = conn()?;

    Ok(r_dsl::reports
        .first::<Report>(&*conn)
        .optional()?)
}

/// Returns the number of touched rows; zero when the id does not exist.
pub fn update_report_status(id: i32, status: &str, now: SystemTime) -> DbResult<usize> {
    let conn = conn()?;

    Ok(diesel::update(r_dsl::reports.find(id))
        .set((r_dsl::status.eq(status), r_dsl::updated_at.eq(now)))
        .execute(&*conn)?)
}

pub fn count_reports_by_category(category: &str) -> DbResult<i64> {
    let conn = conn()?;

    Ok(r_dsl::reports
        .filter(r_dsl::category.eq(category))
        .count()
        .get_result::<i64>(&*conn)?)
}

pub fn insert_vote(vote: &NewVote) -> DbResult<Vote> {
    let conn = conn()?;

    Ok(diesel::insert_into(schema::votes::table)
        .values(vote)
        .get_result::<Vote>(&*conn)?)
}

pub fn delete_vote(report_id: i32, user_id: &str) -> DbResult<usize> {
    let conn = conn()?;

    Ok(diesel::delete(v_dsl::votes
            .filter(v_dsl::report_id.eq(report_id))
            .filter(v_dsl::user_id.eq(user_id)))
        .execute(&*conn)?)
}

pub fn count_votes(report_id: i32) -> DbResult<i64> {
    let conn = conn()?;

    Ok(v_dsl::votes
        .filter(v_dsl::report_id.eq(report_id))
        .count()
        .get_result::<i64>(&*conn)?)
}

/// Report counts per user, busiest first. Rows without a user id are skipped.
pub fn get_leaderboard(top_n: i64) -> DbResult<Vec<LeaderboardRow>> {
    let conn = conn()?;

    Ok(sql_query(
            "SELECT user_id, COUNT(*) AS report_count \
             FROM reports \
             WHERE user_id <> '' \
             GROUP BY user_id \
             ORDER BY report_count DESC \
             LIMIT $1")
        .bind::<BigInt, _>(top_n)
        .load::<LeaderboardRow>(&*conn)?)
}
