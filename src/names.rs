pub const USER_SESSION_COOKIE_NAME: &str = "user_session";

pub const HOME_URL: &str = "/";
pub const SIGN_UP_URL: &str = "/sign-up";
pub const SIGN_IN_URL: &str = "/sign-in";
pub const SIGN_OUT_URL: &str = "/sign-out";
pub const ME_URL: &str = "/me";
pub const CHANGE_PASSWORD_URL: &str = "/change-password";
pub const CREATE_URL: &str = "/create";
pub const BOOKMARKS_URL: &str = "/bookmarks";

/// Where the role gate sends anyone who may not create videos.
pub const ACCESS_DENIED_URL: &str = "/?notice=access-denied";

/// Posts shown in the trending strip.
pub const TRENDING_LIMIT: i64 = 7;

pub fn video_url(video_id: &str) -> String {
    format!("/videos/{video_id}")
}

pub fn quiz_session_url(session_id: &str) -> String {
    format!("/quiz-sessions/{session_id}")
}

pub fn file_url(public_url: &str, object_id: &str) -> String {
    format!("{}/files/{object_id}", public_url.trim_end_matches('/'))
}

/// Request body cap for the create-video form.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
