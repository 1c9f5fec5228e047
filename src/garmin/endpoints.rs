/// URL constants for the Garmin Connect web surface.
///
/// The SSO URL must carry the same query string the browser widget sends,
/// otherwise the login page does not emit the `response_url` redirect.
const SSO_URL: &str = "https://sso.garmin.com/sso/login?service=https://connect.garmin.com/modern/&webhost=https://connect.garmin.com&source=https://connect.garmin.com/en-US/signin&redirectAfterAccountLoginUrl=https://connect.garmin.com/modern/&redirectAfterAccountCreationUrl=https://connect.garmin.com/modern/&gauthHost=https://sso.garmin.com/sso&locale=en_US&id=gauth-widget&cssUrl=https://static.garmincdn.com/com.garmin.connect/ui/css/gauth-custom-v1.2-min.css&privacyStatementUrl=//connect.garmin.com/en-US/privacy/&clientId=GarminConnect&rememberMeShown=true&rememberMeChecked=false&createAccountShown=true&openCreateAccount=false&displayNameShown=false&consumeServiceTicket=false&initialFocus=true&embedWidget=false&generateExtraServiceTicket=false&globalOptInShown=true&globalOptInChecked=false&mobile=false&connectLegalTerms=true";
const LEGACY_SESSION_URL: &str = "https://connect.garmin.com/legacy/session";
const ACTIVITY_SEARCH_URL: &str =
    "https://connect.garmin.com/proxy/activity-search-service-1.2/json/activities";
const EXPORT_TCX_URL: &str =
    "https://connect.garmin.com/modern/proxy/download-service/export/tcx/activity";

#[derive(Debug, Clone)]
pub struct GarminEndpoints {
    pub sso: String,
    pub legacy_session: String,
    pub activity_search: String,
    /// Export URL without the trailing activity id.
    pub export_tcx: String,
}

impl Default for GarminEndpoints {
    fn default() -> Self {
        Self {
            sso: SSO_URL.to_string(),
            legacy_session: LEGACY_SESSION_URL.to_string(),
            activity_search: ACTIVITY_SEARCH_URL.to_string(),
            export_tcx: EXPORT_TCX_URL.to_string(),
        }
    }
}

impl GarminEndpoints {
    /// Endpoints rooted at another host, using the same paths as the live service.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            sso: format!("{base}/sso/signin"),
            legacy_session: format!("{base}/legacy/session"),
            activity_search: format!("{base}/proxy/activity-search-service-1.2/json/activities"),
            export_tcx: format!("{base}/modern/proxy/download-service/export/tcx/activity"),
        }
    }

    pub fn export_url(&self, activity_id: i64) -> String {
        format!("{}/{activity_id}", self.export_tcx)
    }
}
