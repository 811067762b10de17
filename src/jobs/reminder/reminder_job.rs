use std::{sync::Arc, time::Duration};
use tokio::time::{interval, sleep};

use super::scheduler::ReminderScheduler;
use crate::constants::REMINDER_JOB_INTERVAL;
use crate::utils::get_epoch_ts;

/// Drives the reminder scheduler: one polling pass per interval tick,
/// interleaved with draining the delay queue whenever the earliest armed
/// reminder comes due. Runs a recovery pass first so reminders that came
/// due while the process was down are picked up immediately.
pub async fn reminder_job(scheduler: Arc<ReminderScheduler>) {
    tracing::debug!("initializing reminder scheduler job");
    scheduler.recover_missed().await;
    // REMINDER_JOB_INTERVAL is mentioned in seconds
    let mut interval = interval(Duration::from_secs(REMINDER_JOB_INTERVAL));
    loop {
        match scheduler.next_deadline().await {
            Some(fire_ts) => {
                let now = get_epoch_ts() as i64;
                let wait = Duration::from_secs(fire_ts.saturating_sub(now).max(0) as u64);
                tokio::select! {
                    _ = interval.tick() => scheduler.run_pass().await,
                    _ = sleep(wait) => scheduler.fire_due().await,
                }
            }
            None => {
                interval.tick().await;
                scheduler.run_pass().await;
            }
        }
    }
}
