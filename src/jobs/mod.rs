use std::sync::Arc;

use self::reminder::{reminder_job, ReminderScheduler};

pub mod reminder;

#[cfg(test)]
use mockall_double::double;

#[cfg_attr(test, double)]
use crate::database::AppDatabase;

#[cfg_attr(test, double)]
use crate::fcm::FcmClient;

pub fn spawn_all_jobs(db_client: Arc<AppDatabase>, fcm_client: Arc<FcmClient>) {
    // spawn job to poll for due event reminders and push them out
    let scheduler = Arc::new(ReminderScheduler::new(db_client, fcm_client));
    tokio::spawn(async {
        reminder_job(scheduler).await;
    });
}
