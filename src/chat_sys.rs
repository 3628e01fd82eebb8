use rocket_contrib::json::Json as JsonBody;
use serde::Deserialize;
use serde_json::json;

use crate::api::{self, JsonResult};
use crate::db::{self, models::Report};
use crate::report_sys::Category;


#[derive(PartialEq, Debug)]
pub enum ChatIntent {
    Trending,
    PotholeCount,
    TrashCount,
    Greeting,
    Unknown,
}

/// Keyword rules checked in a fixed order; the first hit wins.
/// A message can match several keywords, so the order is load-bearing.
pub fn classify(message: &str) -> ChatIntent {
    let msg = message.to_lowercase();

    if msg.contains("trending") || msg.contains("popular") {
        ChatIntent::Trending
    }
    else if msg.contains("pothole") {
        ChatIntent::PotholeCount
    }
    else if msg.contains("trash") {
        ChatIntent::TrashCount
    }
    else if msg.contains("hello") || msg.contains("hi") {
        ChatIntent::Greeting
    }
    else {
        ChatIntent::Unknown
    }
}


fn trending_reply(report: Option<&Report>) -> String {
    match report {
        Some(r) => format!(
            "The most trending issue nearby is a {}: \"{}\". People are really concerned about it!",
            r.category.to_lowercase(),
            r.description.as_deref().unwrap_or("")),
        None => "Nothing is trending right now. It's quiet... too quiet.".into(),
    }
}

fn pothole_reply(count: i64) -> String {
    format!("There are currently {} potholes reported in this area. Drive carefully!", count)
}

fn trash_reply(count: i64) -> String {
    format!("We have {} reports of trash piling up. Let's get it cleaned!", count)
}

fn greeting_reply() -> String {
    "Hello citizen! I'm your Civic Assistant. Ask me about issues nearby.".into()
}

fn fallback_reply() -> String {
    "I'm not sure about that. Try asking 'What's trending nearby?' or 'Show me potholes'.".into()
}


// lat/lng may travel in the body as well; they are accepted and ignored
// until proximity filtering exists.
#[derive(Deserialize)]
pub struct ChatBody {
    message: Option<String>,
}


#[post("/api/chat", format = "json", data = "<body>")]
pub fn post_chat(body: Option<JsonBody<ChatBody>>) -> JsonResult {
    let message = match body.and_then(|b| b.into_inner().message) {
        Some(ref message) if !message.is_empty() => message.clone(),
        _ => return Err(api::validation_error("Message required")),
    };

    let reply = match classify(&message) {
        ChatIntent::Trending => {
            match db::get_any_report() {
                Ok(report) => trending_reply(report.as_ref()),
                Err(err) => return Err(api::internal_error(err)),
            }
        },
        ChatIntent::PotholeCount => {
            match db::count_reports_by_category(Category::Pothole.as_str()) {
                Ok(count) => pothole_reply(count),
                Err(err) => return Err(api::internal_error(err)),
            }
        },
        ChatIntent::TrashCount => {
            match db::count_reports_by_category(Category::Trash.as_str()) {
                Ok(count) => trash_reply(count),
                Err(err) => return Err(api::internal_error(err)),
            }
        },
        ChatIntent::Greeting => greeting_reply(),
        ChatIntent::Unknown => fallback_reply(),
    };

    api::make_json_result(json!({
        "reply": reply,
    }).to_string())
}


#[cfg(test)]
mod tests {
    use std::time::SystemTime;
    use super::*;

    #[test]
    fn keywords_map_to_intents() {
        assert_eq!(classify("What's trending nearby?"), ChatIntent::Trending);
        assert_eq!(classify("anything POPULAR today?"), ChatIntent::Trending);
        assert_eq!(classify("How many potholes?"), ChatIntent::PotholeCount);
        assert_eq!(classify("trash piling up again"), ChatIntent::TrashCount);
        assert_eq!(classify("hello there"), ChatIntent::Greeting);
        assert_eq!(classify("weather forecast"), ChatIntent::Unknown);
    }

    #[test]
    fn first_matching_rule_wins() {
        // Matches both "popular" and "pothole"; the trending rule is first.
        assert_eq!(classify("popular potholes"), ChatIntent::Trending);
        // Matches both "pothole" and "hi" (substring); pothole rule is first.
        assert_eq!(classify("hi, potholes?"), ChatIntent::PotholeCount);
    }

    #[test]
    fn greeting_matches_substrings() {
        // Faithful to the keyword matcher this replaces: "hi" may be part
        // of a longer word.
        assert_eq!(classify("everything fine"), ChatIntent::Greeting);
    }

    #[test]
    fn trending_reply_describes_a_report() {
        let now = SystemTime::now();
        let report = Report {
            id: 1,
            user_id: "u1".into(),
            category: "POTHOLE".into(),
            description: Some("big hole".into()),
            lat: 0.0,
            lng: 0.0,
            photo_url: None,
            status: "OPEN".into(),
            created_at: now,
            updated_at: now,
        };

        let reply = trending_reply(Some(&report));
        assert!(reply.contains("pothole"));
        assert!(reply.contains("big hole"));
    }

    #[test]
    fn trending_reply_without_reports() {
        assert_eq!(trending_reply(None),
            "Nothing is trending right now. It's quiet... too quiet.");
    }

    #[test]
    fn count_replies_contain_the_count() {
        assert!(pothole_reply(4).contains("4 potholes"));
        assert!(trash_reply(0).contains("0 reports of trash"));
    }
}
