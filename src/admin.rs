use std::env;

use rocket::Outcome;
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};

use crate::util;


const PASSWORD_HASH_SALT: &'static str = "~~ CivicPulse 28 1393";

const ID_HEADER: &'static str = "X-Admin-Id";
const PWD_HEADER: &'static str = "X-Admin-Pwd";


lazy_static! {
    static ref ADMIN_ID: String = {
        env::var("ADMIN_ID").expect("ADMIN_ID must be set")
    };
    static ref ADMIN_PWD: u64 = {
        let salted_pwd = env::var("ADMIN_PWD").expect("ADMIN_PWD must be set")
            + PASSWORD_HASH_SALT;
        util::calculate_hash(&salted_pwd)
    };
}


fn check_admin(id: &str, pwd: &str) -> bool {
    let salted_pwd = pwd.to_owned() + PASSWORD_HASH_SALT;
    let hashed_pwd = util::calculate_hash(&salted_pwd);

    *ADMIN_ID == id && *ADMIN_PWD == hashed_pwd
}


/// Request guard for the admin surface.
/// Credentials travel in headers and are checked against the environment.
pub struct AdminUser;

impl<'a, 'r> FromRequest<'a, 'r> for AdminUser {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> request::Outcome<Self, Self::Error> {
        let id = request.headers().get_one(ID_HEADER);
        let pwd = request.headers().get_one(PWD_HEADER);

        match (id, pwd) {
            (Some(id), Some(pwd)) if check_admin(id, pwd) => Outcome::Success(AdminUser),
            _ => Outcome::Failure((Status::Unauthorized, ())),
        }
    }
}
