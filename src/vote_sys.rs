use rocket_contrib::json::Json as JsonBody;
use serde::Deserialize;
use serde_json::json;

use crate::api::{self, JsonResult};
use crate::db::{self, models::NewVote};


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteBody {
    user_id: Option<String>,
}


#[post("/api/reports/<id>/upvote", format = "json", data = "<body>")]
pub fn post_upvote(id: i32, body: Option<JsonBody<UpvoteBody>>) -> JsonResult {
    let user_id = match body.and_then(|b| b.into_inner().user_id) {
        Some(ref user_id) if !user_id.is_empty() => user_id.clone(),
        _ => return Err(api::validation_error("User ID required")),
    };

    let new_vote = NewVote {
        report_id: id,
        user_id: user_id.clone(),
        created_at: std::time::SystemTime::now(),
    };

    match db::insert_vote(&new_vote) {
        Ok(_) => api::make_json_result(json!({
            "message": "Vote added",
        }).to_string()),
        // A second vote by the same user toggles the first one off.
        // Concurrent toggles race through the unique constraint, never here.
        Err(ref err) if err.is_unique_violation() => {
            match db::delete_vote(id, &user_id) {
                Ok(_) => api::make_json_result(json!({
                    "message": "Vote removed",
                }).to_string()),
                Err(err) => Err(api::internal_error(err)),
            }
        },
        Err(err) => Err(api::internal_error(err)),
    }
}

#[get("/api/reports/<id>/upvote")]
pub fn get_upvote_count(id: i32) -> JsonResult {
    match db::count_votes(id) {
        Ok(count) => api::make_json_result(json!({
            "count": count,
        }).to_string()),
        Err(err) => Err(api::internal_error(err)),
    }
}
