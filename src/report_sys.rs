use std::{
    fs,
    io::{self, Read, Write},
    net::SocketAddr,
    path::Path,
    time::{UNIX_EPOCH, Duration, SystemTime},
};
use rocket::{
    State,
    data::Data,
};
use rocket_contrib::json::Json as JsonBody;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use chrono::Utc;

use crate::api::{self, JsonResult, ApiError};
use crate::admin::AdminUser;
use crate::db::{self, models::NewReport};
use crate::rate_limit::RateLimiter;
use crate::util;


type StringResult = Result<String, ApiError>;


const MAX_LIST_LIMIT: i64 = 100;
const MAX_USER_ID_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 65536;
const FILE_UPLOAD_LIMIT: usize = (8 * 1024 * 1024 / 3) * 4; // chars
pub const IMAGE_PUBLIC_DIR: &'static str = "images/";


pub enum Category {
    Pothole,
    Trash,
    Hazard,
    Other,
}

impl Category {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "POTHOLE" => Some(Category::Pothole),
            "TRASH" => Some(Category::Trash),
            "HAZARD" => Some(Category::Hazard),
            "OTHER" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pothole => "POTHOLE",
            Category::Trash => "TRASH",
            Category::Hazard => "HAZARD",
            Category::Other => "OTHER",
        }
    }
}


pub enum ReportStatus {
    Open,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(ReportStatus::Open),
            "IN_PROGRESS" => Some(ReportStatus::InProgress),
            "RESOLVED" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
        }
    }
}


// The user id is a client-generated label kept in client-local storage.
// Nothing verifies that the caller owns it; checks here are shape only.
fn verify_user_id(user_id: &str) -> Option<&'static str> {
    if user_id.is_empty() {
        Some("User ID required")
    }
    else if user_id.find(char::is_whitespace).is_some() {
        Some("The user ID can not contain spaces")
    }
    else if user_id.len() > MAX_USER_ID_LEN {
        Some("The user ID can not be longer than 64 characters")
    }
    else {
        None
    }
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportBody {
    category: Option<String>,
    description: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    photo_url: Option<String>,
    user_id: Option<String>,
}

impl CreateReportBody {
    fn verify_error(&self) -> Option<&'static str> {
        let lat = match self.lat {
            Some(lat) => lat,
            None => return Some("Missing latitude"),
        };
        let lng = match self.lng {
            Some(lng) => lng,
            None => return Some("Missing longitude"),
        };

        if self.category.is_none() {
            Some("Missing category")
        }
        else if Category::from_str(self.category.as_ref().unwrap()).is_none() {
            Some("Invalid category")
        }
        else if lat < -90.0 || lat > 90.0 {
            Some("Latitude must be between -90 and 90")
        }
        else if lng < -180.0 || lng > 180.0 {
            Some("Longitude must be between -180 and 180")
        }
        else if self.description.as_ref().map_or(false, |d| d.len() >= MAX_DESCRIPTION_LEN) {
            Some("The maximum length of the description is 65536")
        }
        else if self.photo_url.as_ref().map_or(false, |p| p.len() > FILE_UPLOAD_LIMIT) {
            Some("The photo is too large")
        }
        else {
            verify_user_id(self.user_id.as_deref().unwrap_or(""))
        }
    }
}


#[derive(Deserialize)]
pub struct StatusBody {
    status: Option<String>,
}


fn report_to_json(r: &db::models::Report) -> JsonValue {
    json!({
        "id": r.id,
        "user_id": r.user_id,
        "category": r.category,
        "description": r.description,
        "lat": r.lat,
        "lng": r.lng,
        "photo_url": r.photo_url,
        "status": r.status,
        "created_at": util::epoch_secs(r.created_at),
        "updated_at": util::epoch_secs(r.updated_at),
    })
}

// Second-granularity wall clock, so DB timestamps round-trip cleanly.
fn now_secs() -> SystemTime {
    let utc = Utc::now().timestamp() as u64;
    UNIX_EPOCH + Duration::new(utc, 0)
}


#[post("/api/reports", format = "json", data = "<body>")]
pub fn post_report(body: Option<JsonBody<CreateReportBody>>,
    remote: SocketAddr, limiter: State<RateLimiter>) -> JsonResult {

    if let Some(remaining) = limiter.try_acquire(&remote.ip().to_string()) {
        return Err(api::rate_limit_error(remaining.as_secs().max(1)));
    }

    let body = match body {
        Some(body) => body.into_inner(),
        None => return Err(api::validation_error("Invalid body")),
    };

    if let Some(err) = body.verify_error() {
        return Err(api::validation_error(err));
    }

    let now = now_secs();

    let new_report = NewReport {
        user_id: body.user_id.unwrap(),
        category: body.category.unwrap(),
        description: body.description,
        lat: body.lat.unwrap(),
        lng: body.lng.unwrap(),
        photo_url: body.photo_url,
        status: ReportStatus::Open.as_str().into(),
        created_at: now,
        updated_at: now,
    };

    match db::insert_report(&new_report) {
        Ok(report) => api::make_json_result(report_to_json(&report).to_string()),
        Err(err) => Err(api::internal_error(err)),
    }
}

#[get("/api/reports?<limit>")]
pub fn get_reports(limit: Option<i64>) -> JsonResult {
    let limit = limit.unwrap_or(MAX_LIST_LIMIT).max(1).min(MAX_LIST_LIMIT);

    match db::get_recent_reports(limit) {
        Ok(reports) => {
            let part_jsons = reports.iter()
                .map(report_to_json)
                .collect::<Vec<_>>();

            api::make_json_result(json!({
                "reports": part_jsons,
                "size": part_jsons.len(),
            }).to_string())
        },
        Err(err) => Err(api::internal_error(err)),
    }
}

#[patch("/api/reports/<id>/status", format = "json", data = "<body>")]
pub fn patch_report_status(id: i32, _admin: AdminUser,
    body: Option<JsonBody<StatusBody>>) -> JsonResult {

    let body = match body {
        Some(body) => body.into_inner(),
        None => return Err(api::validation_error("Invalid body")),
    };

    let status = match body.status.as_deref().and_then(ReportStatus::from_str) {
        Some(status) => status,
        None => return Err(api::validation_error("Invalid status")),
    };

    // Touching zero rows is still a success; the id may never have existed.
    match db::update_report_status(id, status.as_str(), now_secs()) {
        Ok(_) => api::make_json_result(json!({
            "message": "Status updated",
        }).to_string()),
        Err(err) => Err(api::internal_error(err)),
    }
}


/// Splits a base64 image data-URI into its extension and payload.
fn split_data_uri(data_uri: &str) -> Option<(&str, &str)> {
    let ext = data_uri.split(',').nth(0)
        .and_then(|x| x.split('/').nth(1))
        .and_then(|x| x.split(';').nth(0))?;
    let payload = data_uri.split(',').nth(1)?;

    Some((ext, payload))
}

#[post("/api/photos", format = "plain", data = "<data>")]
pub fn post_upload_photo(data: Data) -> StringResult {
    // Read base64 encoded string.
    let mut file_data = data.open().take(FILE_UPLOAD_LIMIT as u64 + 1);
    let mut data_uri = String::new();
    let read_result = file_data.read_to_string(&mut data_uri);

    match read_result {
        Ok(bytes) if bytes <= FILE_UPLOAD_LIMIT => (),
        Ok(_) => return Err(api::validation_error("The photo is too large")),
        Err(err) => return Err(api::internal_error(err)),
    }

    let (ext, payload) = match split_data_uri(&data_uri) {
        Some(parts) => parts,
        None => return Err(api::validation_error("Invalid uri")),
    };

    let allowed_exts = &["jpeg", "jpg", "png", "bmp"];
    if !allowed_exts.iter().any(|&x| x == ext) {
        return Err(api::validation_error("Invalid extension"));
    }

    let bytes = match base64::decode(payload) {
        Ok(bytes) => bytes,
        Err(_) => return Err(api::validation_error("Invalid base64 payload")),
    };

    // Create unique id and file for the photo.
    let (id, mut file) = loop {
        let id = util::generate_rand_id(32) + "." + ext;
        let path = Path::new(crate::STATIC_DIR).join(IMAGE_PUBLIC_DIR).join(&id);
        let file_result = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path);

        match file_result {
            Ok(file) => break (id, file),
            Err(ref err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(api::internal_error(err)),
        }
    };

    match file.write_all(&bytes) {
        Ok(_) => Ok(format!("/{}{}{}", crate::STATIC_DIR, IMAGE_PUBLIC_DIR, id)),
        Err(err) => Err(api::internal_error(err)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn valid_body() -> CreateReportBody {
        CreateReportBody {
            category: Some("POTHOLE".into()),
            description: Some("Deep pothole near the crossing".into()),
            lat: Some(37.5665),
            lng: Some(126.9780),
            photo_url: None,
            user_id: Some("0b6f3a92-user".into()),
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert_eq!(valid_body().verify_error(), None);
    }

    #[test]
    fn category_is_required_and_checked() {
        let mut body = valid_body();
        body.category = None;
        assert_eq!(body.verify_error(), Some("Missing category"));

        let mut body = valid_body();
        body.category = Some("FLOOD".into());
        assert_eq!(body.verify_error(), Some("Invalid category"));
    }

    #[test]
    fn coordinates_must_be_in_range() {
        let mut body = valid_body();
        body.lat = Some(90.5);
        assert!(body.verify_error().unwrap().contains("Latitude"));

        let mut body = valid_body();
        body.lng = Some(-180.5);
        assert!(body.verify_error().unwrap().contains("Longitude"));

        let mut body = valid_body();
        body.lat = None;
        assert_eq!(body.verify_error(), Some("Missing latitude"));
    }

    #[test]
    fn boundary_coordinates_are_accepted() {
        let mut body = valid_body();
        body.lat = Some(-90.0);
        body.lng = Some(180.0);
        assert_eq!(body.verify_error(), None);
    }

    #[test]
    fn user_id_shape_is_checked() {
        let mut body = valid_body();
        body.user_id = None;
        assert_eq!(body.verify_error(), Some("User ID required"));

        let mut body = valid_body();
        body.user_id = Some("has space".into());
        assert!(body.verify_error().is_some());

        let mut body = valid_body();
        body.user_id = Some("x".repeat(MAX_USER_ID_LEN + 1));
        assert!(body.verify_error().is_some());
    }

    #[test]
    fn oversized_description_is_rejected() {
        let mut body = valid_body();
        body.description = Some("x".repeat(MAX_DESCRIPTION_LEN));
        assert!(body.verify_error().is_some());
    }

    #[test]
    fn status_parsing_accepts_only_known_values() {
        assert!(ReportStatus::from_str("OPEN").is_some());
        assert!(ReportStatus::from_str("IN_PROGRESS").is_some());
        assert!(ReportStatus::from_str("RESOLVED").is_some());
        assert!(ReportStatus::from_str("CLOSED").is_none());
        assert!(ReportStatus::from_str("open").is_none());
    }

    #[test]
    fn new_reports_default_to_open() {
        assert_eq!(ReportStatus::Open.as_str(), "OPEN");
    }

    #[test]
    fn data_uri_splitting() {
        let (ext, payload) = split_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(payload, "aGVsbG8=");

        assert!(split_data_uri("not a data uri").is_none());
    }

    #[test]
    fn report_json_uses_epoch_seconds() {
        let now = now_secs();
        let report = db::models::Report {
            id: 7,
            user_id: "u1".into(),
            category: "TRASH".into(),
            description: None,
            lat: 1.0,
            lng: 2.0,
            photo_url: None,
            status: "OPEN".into(),
            created_at: now,
            updated_at: now,
        };

        let json = report_to_json(&report);
        assert_eq!(json["id"], 7);
        assert_eq!(json["created_at"], util::epoch_secs(now));
        assert!(json["description"].is_null());
    }
}
