//! Local record collections and their server round-trip.

use super::service::{sync_callback, SyncCallback, SyncService};
use crate::egui_app::api_client::ApiClient;
use crate::shared::error::SyncError;
use crate::shared::identity::UserId;
use crate::shared::records::SyncRecord;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Local edits, numbered in the order they were made
#[derive(Debug, Default)]
struct EditLog {
    revision: u64,
    touched: HashMap<String, u64>,
}

/// In-memory records of one table
///
/// The record count is published on its own channel so periodic hooks only
/// wake up when it changes. `upsert` and `remove` are local edits and are
/// numbered, so a server list fetched before an edit cannot overwrite it.
#[derive(Debug, Clone)]
pub struct RecordCollection<R> {
    records: watch::Sender<Vec<R>>,
    count: watch::Sender<usize>,
    edits: Arc<Mutex<EditLog>>,
}

impl<R: SyncRecord> Default for RecordCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SyncRecord> RecordCollection<R> {
    pub fn new() -> Self {
        let (records, _) = watch::channel(Vec::new());
        let (count, _) = watch::channel(0);
        Self {
            records,
            count,
            edits: Arc::new(Mutex::new(EditLog::default())),
        }
    }

    fn edit_log(&self) -> MutexGuard<'_, EditLog> {
        match self.edits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn touch(&self, id: &str) {
        let mut log = self.edit_log();
        log.revision += 1;
        let revision = log.revision;
        log.touched.insert(id.to_string(), revision);
    }

    /// Number of the latest local edit
    pub fn revision(&self) -> u64 {
        self.edit_log().revision
    }

    /// Swap in `owner`'s records from the server
    ///
    /// Records edited or removed locally after `since` keep their local
    /// version. The edit log stays locked for the whole swap, so an edit
    /// either lands before it and is kept, or after it and applies on top.
    /// Returns how many server records were adopted.
    fn adopt_owned(&self, owner: &str, incoming: Vec<R>, since: u64) -> usize {
        let mut log = self.edit_log();
        let edited: HashSet<String> = log
            .touched
            .iter()
            .filter(|&(_, &at)| at > since)
            .map(|(id, _)| id.clone())
            .collect();
        if !edited.is_empty() {
            tracing::debug!(
                "[Sync] Keeping {} {} edited during the round-trip",
                edited.len(),
                R::TABLE
            );
        }

        let adopted: Vec<R> = incoming
            .into_iter()
            .filter(|r| !edited.contains(r.record_id()))
            .collect();
        let count = adopted.len();
        self.records.send_modify(|records| {
            records.retain(|r| r.owner() != owner || edited.contains(r.record_id()));
            records.extend(adopted);
        });
        self.publish_count();
        log.touched.retain(|_, at| *at > since);
        count
    }

    /// Forget edits up to `revision` once the server has seen them
    fn settle(&self, revision: u64) {
        self.edit_log().touched.retain(|_, at| *at > revision);
    }

    fn publish_count(&self) {
        let len = self.records.borrow().len();
        self.count.send_if_modified(|count| {
            let changed = *count != len;
            *count = len;
            changed
        });
    }

    pub fn replace(&self, records: Vec<R>) {
        self.records.send_replace(records);
        self.publish_count();
    }

    /// Insert or update by record id
    pub fn upsert(&self, record: R) {
        self.touch(record.record_id());
        self.records.send_modify(|records| {
            match records.iter_mut().find(|r| r.record_id() == record.record_id()) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        });
        self.publish_count();
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.records.send_if_modified(|records| {
            let before = records.len();
            records.retain(|r| r.record_id() != id);
            records.len() != before
        });
        if removed {
            self.touch(id);
        }
        self.publish_count();
        removed
    }

    pub fn snapshot(&self) -> Vec<R> {
        self.records.borrow().clone()
    }

    pub fn owned_by(&self, user_id: &UserId) -> Vec<R> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.owner() == user_id.as_str())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<R>> {
        self.records.subscribe()
    }

    pub fn watch_count(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

/// Server round-trip for one table
#[derive(Debug, Clone)]
pub struct TableSync<R> {
    api: ApiClient,
    records: RecordCollection<R>,
    service: SyncService,
}

impl<R: SyncRecord> TableSync<R> {
    pub fn new(api: ApiClient, records: RecordCollection<R>, service: SyncService) -> Self {
        Self {
            api,
            records,
            service,
        }
    }

    pub fn records(&self) -> &RecordCollection<R> {
        &self.records
    }

    pub fn service(&self) -> &SyncService {
        &self.service
    }

    /// Replace the user's records with the server's copy
    pub async fn load(&self, user_id: &UserId) -> Result<usize, SyncError> {
        let since = self.records.revision();
        let fetched = self.api.fetch_records::<R>(user_id).await?;
        Ok(self.merge_owned(user_id, fetched, since))
    }

    /// Push the user's records, then adopt the server's canonical list
    ///
    /// Records of other owners are left untouched, and so are records
    /// edited locally while the request was in flight. When the server sends
    /// no list back the local records are kept as they are.
    pub async fn handle_sync_with_server(&self, user_id: &UserId) -> Result<usize, SyncError> {
        let since = self.records.revision();
        let local = self.records.owned_by(user_id);
        tracing::debug!("[Sync] Pushing {} {} for {}", local.len(), R::TABLE, user_id);

        match self.api.push_records(user_id, &local).await? {
            Some(canonical) => Ok(self.merge_owned(user_id, canonical, since)),
            None => {
                self.records.settle(since);
                Ok(local.len())
            }
        }
    }

    fn merge_owned(&self, user_id: &UserId, incoming: Vec<R>, since: u64) -> usize {
        let (owned, foreign): (Vec<R>, Vec<R>) = incoming
            .into_iter()
            .partition(|r| r.owner() == user_id.as_str());
        if !foreign.is_empty() {
            tracing::warn!(
                "[Sync] Ignoring {} {} not owned by {}",
                foreign.len(),
                R::TABLE,
                user_id
            );
        }

        self.records.adopt_owned(user_id.as_str(), owned, since)
    }

    /// Local edit awaiting the next sync
    pub fn edit(&self, record: R) -> Result<(), SyncError> {
        self.records.upsert(record);
        self.service.mark_pending_changes()
    }

    pub fn delete(&self, id: &str) -> Result<bool, SyncError> {
        let removed = self.records.remove(id);
        if removed {
            self.service.mark_pending_changes()?;
        }
        Ok(removed)
    }

    /// Sync callback bound to whoever is signed in when it runs
    pub fn callback(&self, user: watch::Receiver<Option<UserId>>) -> SyncCallback {
        let table = self.clone();
        sync_callback(move || {
            let table = table.clone();
            let user = user.borrow().clone();
            async move {
                let user = user.ok_or(SyncError::NoSession)?;
                table.handle_sync_with_server(&user).await.map(|_| ())
            }
        })
    }
}
