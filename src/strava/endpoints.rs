const AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";
const TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const ACTIVITIES_URL: &str = "https://www.strava.com/api/v3/athlete/activities";
const UPLOADS_URL: &str = "https://www.strava.com/api/v3/uploads";

#[derive(Debug, Clone)]
pub struct StravaEndpoints {
    /// Visited in the browser only, never called directly.
    pub authorize: String,
    pub token: String,
    pub activities: String,
    pub uploads: String,
}

impl Default for StravaEndpoints {
    fn default() -> Self {
        Self {
            authorize: AUTHORIZE_URL.to_string(),
            token: TOKEN_URL.to_string(),
            activities: ACTIVITIES_URL.to_string(),
            uploads: UPLOADS_URL.to_string(),
        }
    }
}

impl StravaEndpoints {
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{base}/oauth/authorize"),
            token: format!("{base}/oauth/token"),
            activities: format!("{base}/api/v3/athlete/activities"),
            uploads: format!("{base}/api/v3/uploads"),
        }
    }
}
