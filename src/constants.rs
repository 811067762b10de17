use chrono_tz::Tz;

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MONGO_MIN_POOL_SIZE: u32 = 5;
pub const MONGO_MAX_POOL_SIZE: u32 = 10;
pub const MONGO_CONN_TIMEOUT: u64 = 10;
pub const MULTIPART_BODY_LIMIT: usize = 10 * 1024 * 1024;

// REMINDER_JOB_INTERVAL is mentioned in seconds
pub const REMINDER_JOB_INTERVAL: u64 = 60;
// reminders go out REMINDER_LEAD_MINS before the event starts
pub const REMINDER_LEAD_MINS: i64 = 10;

// all "today"/"now" computations are anchored to GST, not the server locale
pub const EVENT_TIME_ZONE: Tz = chrono_tz::Asia::Dubai;
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const EVENT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const FIREBASE_MESSAGE_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
pub const FCM_ENDPOINT_BASE: &str = "https://fcm.googleapis.com/v1/projects";
pub const PUSH_CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
pub const PUSH_ANDROID_CHANNEL_ID: &str = "default";

pub const DEFAULT_API_KEY: &str = "dev_api_key";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub const DB_NAME: &str = "eventdesk";

pub const COLL_REMINDERS: &str = "notifyMe";
pub const COLL_USERS: &str = "users";
pub const COLL_NOTIFICATION_HISTORY: &str = "notificationHistory";
pub const COLL_JOB_STATUS: &str = "jobStatus";

pub const JOB_STATUS_LAST_CHECKED: &str = "lastChecked";
