use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use mongodb::bson::{doc, oid::ObjectId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::time_resolver::resolve_event_time;
use crate::constants::*;
use crate::fcm::PushNote;
use crate::models::{JobStatus, NotificationHistoryEntry, ReminderRecord, ScheduledKey, User};
use crate::utils::get_epoch_ts;

#[cfg(test)]
use mockall_double::double;

#[cfg_attr(test, double)]
use crate::database::AppDatabase;

#[cfg_attr(test, double)]
use crate::fcm::FcmClient;

/// A reminder waiting in the delay queue for its fire time
#[derive(Debug, Clone)]
struct ArmedReminder {
    fire_ts: i64,
    key: ScheduledKey,
    record: ReminderRecord,
}

impl PartialEq for ArmedReminder {
    fn eq(&self, other: &Self) -> bool {
        self.fire_ts == other.fire_ts && self.key == other.key
    }
}

impl Eq for ArmedReminder {}

impl PartialOrd for ArmedReminder {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArmedReminder {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fire_ts
            .cmp(&other.fire_ts)
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Polls the store for today's un-notified reminders, keeps armed ones in a
/// min-heap keyed by fire time and pushes them out when due. All state is
/// held by this instance, there are no process globals. Armed entries are
/// lost on restart and re-derived from the store by the next pass.
pub struct ReminderScheduler {
    db: Arc<AppDatabase>,
    fcm: Arc<FcmClient>,
    scheduled: Mutex<HashSet<ScheduledKey>>,
    armed: Mutex<BinaryHeap<Reverse<ArmedReminder>>>,
    pass_running: AtomicBool,
}

impl ReminderScheduler {
    pub fn new(db: Arc<AppDatabase>, fcm: Arc<FcmClient>) -> Self {
        Self {
            db,
            fcm,
            scheduled: Mutex::new(HashSet::new()),
            armed: Mutex::new(BinaryHeap::new()),
            pass_running: AtomicBool::new(false),
        }
    }

    /// Runs one scheduling pass. At most one pass runs at a time, a tick
    /// arriving while the previous pass is still executing is dropped.
    pub async fn run_pass(&self) {
        if self.pass_running.swap(true, Ordering::SeqCst) {
            tracing::debug!("previous reminder pass still running, skipping this tick");
            return;
        }
        if let Err(err) = self.schedule_pending().await {
            tracing::debug!("reminder pass aborted: {:?}", err);
        }
        self.pass_running.store(false, Ordering::SeqCst);
    }

    async fn schedule_pending(&self) -> anyhow::Result<()> {
        let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
        let today = now.format(EVENT_DATE_FORMAT).to_string();
        tracing::debug!("checking for reminders on date: {} (GST)", today);
        let filter = doc! {"date": &today, "userNotified": false};
        let records = self
            .db
            .find::<ReminderRecord>(DB_NAME, COLL_REMINDERS, Some(filter), None)
            .await?;
        tracing::debug!("found {} users to notify today", records.len());
        for record in records {
            self.arm_reminder(record, now).await;
        }
        Ok(())
    }

    /// Arms a single record. Malformed times and already-passed fire times
    /// are per-record skips and never affect the rest of the pass.
    async fn arm_reminder(&self, record: ReminderRecord, now: DateTime<Tz>) {
        let event_time = match resolve_event_time(&record.date, &record.time) {
            Ok(event_time) => event_time,
            Err(err) => {
                tracing::debug!(
                    "invalid time format for user {}: {:?} ({:?})",
                    record.user_id,
                    record.time,
                    err
                );
                return;
            }
        };
        let fire_time = event_time - Duration::minutes(REMINDER_LEAD_MINS);
        if fire_time <= now {
            tracing::debug!(
                "event for user {} at {} has already passed",
                record.user_id,
                record.time
            );
            return;
        }
        let key = ScheduledKey::new(&record.user_id, event_time.timestamp());
        {
            let mut scheduled = self.scheduled.lock().await;
            if scheduled.contains(&key) {
                tracing::debug!(
                    "reminder already armed for user {} at {}",
                    record.user_id,
                    record.time
                );
                return;
            }
            scheduled.insert(key.clone());
        }
        tracing::debug!(
            "arming reminder for user {} at {} (GST)",
            record.user_id,
            fire_time.format(EVENT_DATE_TIME_FORMAT)
        );
        let entry = ArmedReminder {
            fire_ts: fire_time.timestamp(),
            key,
            record,
        };
        self.armed.lock().await.push(Reverse(entry));
    }

    /// Fire time of the next armed reminder, if any
    pub async fn next_deadline(&self) -> Option<i64> {
        self.armed
            .lock()
            .await
            .peek()
            .map(|Reverse(entry)| entry.fire_ts)
    }

    /// Delivers every armed reminder whose fire time has passed. The
    /// scheduled key is removed on success and on failure alike so a
    /// failed record becomes eligible again on a later pass.
    pub async fn fire_due(&self) {
        loop {
            let now = get_epoch_ts() as i64;
            let entry = {
                let mut armed = self.armed.lock().await;
                match armed.peek() {
                    Some(Reverse(entry)) if entry.fire_ts <= now => {
                        armed.pop().map(|Reverse(entry)| entry)
                    }
                    _ => None,
                }
            };
            let Some(entry) = entry else {
                break;
            };
            tracing::debug!("triggering reminder for user {}", entry.record.user_id);
            if let Err(err) = self.deliver(&entry.record).await {
                tracing::debug!(
                    "error sending reminder to user {}: {:?}",
                    entry.record.user_id,
                    err
                );
            }
            self.scheduled.lock().await.remove(&entry.key);
        }
    }

    /// Looks up the delivery token, sends the push, marks the record
    /// notified and appends a history entry. Any failure before the push
    /// leaves the record untouched for a later pass.
    async fn deliver(&self, record: &ReminderRecord) -> anyhow::Result<()> {
        let filter = doc! {"id": &record.user_id};
        let user = self
            .db
            .find_one::<User>(DB_NAME, COLL_USERS, Some(filter), None)
            .await?;
        let Some(user) = user else {
            anyhow::bail!("user with id {} not found", record.user_id);
        };
        let Some(device) = user.fcm_token else {
            anyhow::bail!("fcm token not found for user with id {}", record.user_id);
        };
        let title = format!("Reminder: {} Today!", record.topic);
        let body = format!(
            "Don't miss {} at {}. See you there!",
            record.speaker_name, record.time
        );
        let note = PushNote::new(&title, &body, None);
        self.fcm.send_push(&device, &note).await?;
        self.mark_notified(record).await?;
        let entry = NotificationHistoryEntry::new(&record.user_id, &title, &body);
        self.db
            .insert_one::<NotificationHistoryEntry>(
                DB_NAME,
                COLL_NOTIFICATION_HISTORY,
                &entry,
                None,
            )
            .await?;
        tracing::debug!(
            "reminder sent to user {} for event at {}",
            record.user_id,
            record.time
        );
        Ok(())
    }

    /// Flips userNotified false -> true. The flag is part of the filter and
    /// the update is atomic, so of two overlapping passes only one can win.
    async fn mark_notified(&self, record: &ReminderRecord) -> anyhow::Result<()> {
        let Some(id) = record._id.as_ref() else {
            anyhow::bail!("_id not present in reminder record");
        };
        let oid = ObjectId::parse_str(id)?;
        let filter = doc! {"_id": oid, "userNotified": false};
        let update = doc! {"$set": {"userNotified": true}};
        let updated = self
            .db
            .find_one_and_update::<ReminderRecord>(DB_NAME, COLL_REMINDERS, filter, update, None)
            .await?;
        if updated.is_none() {
            tracing::debug!("reminder {} already marked notified", id);
        }
        Ok(())
    }

    /// Startup recovery: when the persisted lastChecked instant is in the
    /// past (or absent, defaulting to start of today in GST), run one
    /// immediate pass so same-day reminders missed while the process was
    /// down are re-armed.
    pub async fn recover_missed(&self) {
        let filter = doc! {"_id": JOB_STATUS_LAST_CHECKED};
        let status = self
            .db
            .find_one::<JobStatus>(DB_NAME, COLL_JOB_STATUS, Some(filter), None)
            .await;
        let last_checked = match status {
            Ok(Some(status)) => status.timestamp,
            Ok(None) => start_of_today_ts(),
            Err(err) => {
                tracing::debug!("error checking for missed reminders: {:?}", err);
                return;
            }
        };
        let now = get_epoch_ts() as i64;
        if last_checked < now {
            tracing::debug!("checking for missed reminders");
            self.run_pass().await;
        } else {
            tracing::debug!("no missed reminders");
        }
    }
}

fn start_of_today_ts() -> i64 {
    let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| EVENT_TIME_ZONE.from_local_datetime(&midnight).single())
        .map(|midnight| midnight.timestamp())
        .unwrap_or_else(|| now.timestamp())
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;

    use super::*;

    fn record(user_id: &str, date: &str, time: &str) -> ReminderRecord {
        ReminderRecord {
            _id: Some(ObjectId::new().to_hex()),
            user_id: user_id.to_string(),
            topic: "Rust in Production".to_string(),
            speaker_name: "Jane Doe".to_string(),
            time: time.to_string(),
            date: date.to_string(),
            user_notified: false,
        }
    }

    fn user_with_token(user_id: &str, token: Option<&str>) -> User {
        User {
            _id: None,
            id: user_id.to_string(),
            name: Some("Jane".to_string()),
            email: None,
            fcm_token: token.map(|t| t.to_string()),
            created_ts: None,
            updated_ts: None,
        }
    }

    fn scheduler_with(db: AppDatabase, fcm: FcmClient) -> ReminderScheduler {
        ReminderScheduler::new(Arc::new(db), Arc::new(fcm))
    }

    #[tokio::test]
    async fn test_arm_reminder_dedups_by_key() {
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
        let record = record("u1", "2999-01-01", "11:00 AM");
        scheduler.arm_reminder(record.clone(), now).await;
        scheduler.arm_reminder(record, now).await;
        assert_eq!(scheduler.armed.lock().await.len(), 1);
        assert_eq!(scheduler.scheduled.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_reminder_not_armed() {
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
        scheduler.arm_reminder(record("u1", "2000-01-01", "11:00 AM"), now).await;
        assert!(scheduler.armed.lock().await.is_empty());
        assert!(scheduler.scheduled.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_time_does_not_affect_siblings() {
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
        scheduler.arm_reminder(record("u1", "2999-01-01", "not a time"), now).await;
        scheduler.arm_reminder(record("u2", "2999-01-01", "11:00 AM"), now).await;
        assert_eq!(scheduler.armed.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_next_deadline_is_earliest_fire_time() {
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        let now = Utc::now().with_timezone(&EVENT_TIME_ZONE);
        scheduler.arm_reminder(record("u1", "2999-01-01", "3:00 PM"), now).await;
        scheduler.arm_reminder(record("u2", "2999-01-01", "11:00 AM"), now).await;
        let deadline = scheduler.next_deadline().await.unwrap();
        let morning = resolve_event_time("2999-01-01", "11:00 AM").unwrap();
        let expected = morning - Duration::minutes(REMINDER_LEAD_MINS);
        assert_eq!(deadline, expected.timestamp());
    }

    #[tokio::test]
    async fn test_second_pass_is_noop_while_first_running() {
        // the mock has no find expectation, a pass slipping past the guard
        // would panic on the unexpected call
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        scheduler.pass_running.store(true, Ordering::SeqCst);
        scheduler.run_pass().await;
        assert!(scheduler.pass_running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_pass_arms_only_valid_future_records() {
        let mut mock_db = AppDatabase::default();
        let records = vec![
            record("u1", "2999-01-01", "11:00 AM"),
            record("u2", "2999-01-01", "bogus"),
            record("u3", "2000-01-01", "11:00 AM"),
        ];
        mock_db
            .expect_find::<ReminderRecord>()
            .withf(|db, coll, filter, _options| {
                db == DB_NAME
                    && coll == COLL_REMINDERS
                    && filter
                        .as_ref()
                        .map(|f| matches!(f.get_bool("userNotified"), Ok(false)))
                        .unwrap_or(false)
            })
            .times(1)
            .returning(move |_, _, _, _| Ok(records.clone()));
        let scheduler = scheduler_with(mock_db, FcmClient::default());
        scheduler.run_pass().await;
        assert_eq!(scheduler.armed.lock().await.len(), 1);
        assert!(!scheduler.pass_running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_pass_releases_guard_on_store_failure() {
        let mut mock_db = AppDatabase::default();
        mock_db.expect_find::<ReminderRecord>().times(1).returning(|_, _, _, _| {
            Err(mongodb::error::Error::custom("store unavailable"))
        });
        let scheduler = scheduler_with(mock_db, FcmClient::default());
        scheduler.run_pass().await;
        assert!(!scheduler.pass_running.load(Ordering::SeqCst));
        assert!(scheduler.armed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_deliver_success_marks_and_logs_history() {
        let rec = record("u1", "2999-01-01", "11:00 AM");
        let mut mock_db = AppDatabase::default();
        let user = user_with_token("u1", Some("device-1"));
        mock_db
            .expect_find_one::<User>()
            .withf(|db, coll, _filter, _options| db == DB_NAME && coll == COLL_USERS)
            .times(1)
            .returning(move |_, _, _, _| Ok(Some(user.clone())));
        let updated = rec.clone();
        mock_db
            .expect_find_one_and_update::<ReminderRecord>()
            .withf(|_db, coll, filter, update, _options| {
                coll == COLL_REMINDERS
                    && matches!(filter.get_bool("userNotified"), Ok(false))
                    && update.get_document("$set").is_ok()
            })
            .times(1)
            .returning(move |_, _, _, _, _| Ok(Some(updated.clone())));
        mock_db
            .expect_insert_one::<NotificationHistoryEntry>()
            .withf(|db, coll, _doc, _options| db == DB_NAME && coll == COLL_NOTIFICATION_HISTORY)
            .times(1)
            .returning(|_, _, _, _| Ok(ObjectId::new().to_hex()));
        let mut mock_fcm = FcmClient::default();
        mock_fcm
            .expect_send_push()
            .withf(|device, note| {
                device == "device-1"
                    && note.title == "Reminder: Rust in Production Today!"
                    && note.body.contains("Jane Doe")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let scheduler = scheduler_with(mock_db, mock_fcm);
        scheduler.deliver(&rec).await.unwrap();
    }

    #[tokio::test]
    async fn test_deliver_transport_failure_leaves_record_eligible() {
        let rec = record("u1", "2999-01-01", "11:00 AM");
        let mut mock_db = AppDatabase::default();
        let user = user_with_token("u1", Some("device-1"));
        mock_db
            .expect_find_one::<User>()
            .times(1)
            .returning(move |_, _, _, _| Ok(Some(user.clone())));
        // neither the flag update nor the history insert may happen
        mock_db.expect_find_one_and_update::<ReminderRecord>().times(0);
        mock_db.expect_insert_one::<NotificationHistoryEntry>().times(0);
        let mut mock_fcm = FcmClient::default();
        mock_fcm
            .expect_send_push()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("transport error")));
        let scheduler = scheduler_with(mock_db, mock_fcm);
        let result = scheduler.deliver(&rec).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deliver_missing_token_aborts_before_send() {
        let rec = record("u1", "2999-01-01", "11:00 AM");
        let mut mock_db = AppDatabase::default();
        let user = user_with_token("u1", None);
        mock_db
            .expect_find_one::<User>()
            .times(1)
            .returning(move |_, _, _, _| Ok(Some(user.clone())));
        let mut mock_fcm = FcmClient::default();
        mock_fcm.expect_send_push().times(0);
        let scheduler = scheduler_with(mock_db, mock_fcm);
        let result = scheduler.deliver(&rec).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fire_due_removes_key_on_failure_path() {
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one::<User>()
            .times(1)
            .returning(|_, _, _, _| Ok(None));
        let scheduler = scheduler_with(mock_db, FcmClient::default());
        let rec = record("u1", "2024-06-01", "11:00 AM");
        let key = ScheduledKey::new("u1", 1_717_225_200);
        scheduler.scheduled.lock().await.insert(key.clone());
        scheduler.armed.lock().await.push(Reverse(ArmedReminder {
            fire_ts: get_epoch_ts() as i64 - 5,
            key: key.clone(),
            record: rec,
        }));
        scheduler.fire_due().await;
        assert!(scheduler.armed.lock().await.is_empty());
        assert!(!scheduler.scheduled.lock().await.contains(&key));
    }

    #[tokio::test]
    async fn test_recover_missed_runs_pass_when_behind() {
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one::<JobStatus>()
            .withf(|db, coll, _filter, _options| db == DB_NAME && coll == COLL_JOB_STATUS)
            .times(1)
            .returning(|_, _, _, _| {
                Ok(Some(JobStatus {
                    _id: JOB_STATUS_LAST_CHECKED.to_owned(),
                    timestamp: 0,
                }))
            });
        mock_db
            .expect_find::<ReminderRecord>()
            .times(1)
            .returning(|_, _, _, _| Ok(vec![]));
        let scheduler = scheduler_with(mock_db, FcmClient::default());
        scheduler.recover_missed().await;
        assert!(!scheduler.pass_running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_recover_missed_skips_pass_when_up_to_date() {
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_find_one::<JobStatus>()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(Some(JobStatus {
                    _id: JOB_STATUS_LAST_CHECKED.to_owned(),
                    timestamp: get_epoch_ts() as i64 + 3600,
                }))
            });
        mock_db.expect_find::<ReminderRecord>().times(0);
        let scheduler = scheduler_with(mock_db, FcmClient::default());
        scheduler.recover_missed().await;
    }

    #[tokio::test]
    async fn test_fire_due_leaves_future_entries_untouched() {
        // no db expectations: delivering anything would panic
        let scheduler = scheduler_with(AppDatabase::default(), FcmClient::default());
        let rec = record("u1", "2999-01-01", "11:00 AM");
        let key = ScheduledKey::new("u1", 32_472_140_400);
        scheduler.scheduled.lock().await.insert(key.clone());
        scheduler.armed.lock().await.push(Reverse(ArmedReminder {
            fire_ts: get_epoch_ts() as i64 + 600,
            key,
            record: rec,
        }));
        scheduler.fire_due().await;
        assert_eq!(scheduler.armed.lock().await.len(), 1);
        assert_eq!(scheduler.scheduled.lock().await.len(), 1);
    }
}
