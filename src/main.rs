#![feature(proc_macro_hygiene, decl_macro)]


#[macro_use] extern crate lazy_static;
#[macro_use] extern crate rocket;
#[macro_use] extern crate diesel;
#[macro_use] extern crate log;


mod admin;
mod api;
mod chat_sys;
mod db;
mod leaderboard_sys;
mod logger;
mod rate_limit;
mod report_sys;
mod util;
mod vote_sys;


use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::time::Duration;
use rocket::response::NamedFile;

use rate_limit::{MemoryCooldownStore, RateLimiter};


const STATIC_DIR: &'static str = "static/";
const REPORT_COOLDOWN_SECS: u64 = 5;


#[get("/")]
fn index() -> &'static str {
    "Civic Pulse Server"
}

#[get("/<file..>")]
fn get_static_file(file: PathBuf) -> Option<NamedFile> {
    NamedFile::open(Path::new(STATIC_DIR).join(file)).ok()
}


fn init_logger() {
    let logger = sentry_log::SentryLogger::with_dest(logger::Logger);

    log::set_boxed_logger(Box::new(logger))
        .expect("Logger initialization failed");
    log::set_max_level(log::LevelFilter::Info);
}

fn main() {
    let _sentry = sentry::init(());
    init_logger();

    create_dir_all(Path::new(STATIC_DIR).join(report_sys::IMAGE_PUBLIC_DIR))
        .expect("Initial directory creation failed");

    db::init()
        .expect("DB initialization failed");

    info!("Start server");

    rocket::ignite()
        .manage(RateLimiter::new(Box::new(MemoryCooldownStore::new(
            Duration::new(REPORT_COOLDOWN_SECS, 0)))))
        .mount("/", routes![index])
        .mount(&format!("/{}", STATIC_DIR), routes![get_static_file])
        .mount("/", routes![
            report_sys::post_report,
            report_sys::get_reports,
            report_sys::patch_report_status,
            report_sys::post_upload_photo,
        ])
        .mount("/", routes![
            vote_sys::post_upvote,
            vote_sys::get_upvote_count,
        ])
        .mount("/", routes![
            leaderboard_sys::get_leaderboard,
            chat_sys::post_chat,
        ])
        .launch();
}
