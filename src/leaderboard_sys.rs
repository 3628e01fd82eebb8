use serde_json::{json, Value as JsonValue};

use crate::api::{self, JsonResult};
use crate::db::{self, models::LeaderboardRow};


const TOP_N: i64 = 10;
const POINTS_PER_REPORT: i64 = 10;


// Score counts reports only; votes received stay out of it. The `votes`
// field is kept in the payload for response-shape compatibility.
fn leaderboard_entries(rows: &[LeaderboardRow]) -> Vec<JsonValue> {
    rows.iter()
        .map(|row| {
            json!({
                "userId": row.user_id,
                "reports": row.report_count,
                "votes": 0,
                "score": row.report_count * POINTS_PER_REPORT,
            })
        })
        .collect()
}


#[get("/api/leaderboard")]
pub fn get_leaderboard() -> JsonResult {
    match db::get_leaderboard(TOP_N) {
        Ok(rows) => {
            api::make_json_result(JsonValue::Array(leaderboard_entries(&rows)).to_string())
        },
        Err(err) => Err(api::internal_error(err)),
    }
}
