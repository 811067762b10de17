use mongodb::bson::oid::ObjectId;
use rand::{distributions::uniform::SampleUniform, thread_rng, Rng};
use serde::{Deserialize, Deserializer};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::*;

/// Get EPOCH timestamp in seconds
pub fn get_epoch_ts() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => panic!("SystemTime before UNIX EPOCH!"),
    }
}

/// Generate a random number in a given range
/// panics if the lower bound is greater than the higher bound
pub fn get_random_num<T>(low: T, high: T) -> T
where
    T: PartialEq + PartialOrd + SampleUniform,
{
    assert!(low < high);
    let mut rng = thread_rng();
    rng.gen_range(low..high)
}

/// Directory where uploaded files are stored on disk
pub fn get_uploads_dir() -> String {
    std::env::var("UPLOADS_DIR").unwrap_or(DEFAULT_UPLOADS_DIR.to_owned())
}

/// Returns the public url for an uploaded file
pub fn get_upload_url(file_name: &str) -> String {
    let base_url = std::env::var("PUBLIC_BASE_URL").unwrap_or(DEFAULT_BASE_URL.to_owned());
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/uploads/{file_name}")
}

/// Deserialize helper for ObjectId field
pub fn deserialize_helper<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<ObjectId>::deserialize(deserializer)?;
    match val {
        None => Ok(None),
        Some(val) => Ok(Some(val.to_hex())),
    }
}
