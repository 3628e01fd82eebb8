use std::time::SystemTime;

use diesel::sql_types::{BigInt, Text};

use super::schema::{reports, votes};


#[derive(Queryable)]
pub struct Report {
    pub id: i32,
    pub user_id: String,
    pub category: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub photo_url: Option<String>,
    pub status: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Insertable)]
#[table_name="reports"]
pub struct NewReport {
    pub user_id: String,
    pub category: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub photo_url: Option<String>,
    pub status: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Queryable)]
pub struct Vote {
    pub id: i32,
    pub report_id: i32,
    pub user_id: String,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name="votes"]
pub struct NewVote {
    pub report_id: i32,
    pub user_id: String,
    pub created_at: SystemTime,
}

/// One GROUP BY row of the leaderboard aggregation.
#[derive(QueryableByName)]
pub struct LeaderboardRow {
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "BigInt"]
    pub report_count: i64,
}
