//! In-memory implementation of the Registry trait.
//!
//! Same contract as the ledger, with everything held in a mutex-guarded map.
//! Used for tests, demos and short-lived offline sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sharevault_core::{
    derive_grant_id, AccessGrant, AuditRecord, Clock, ContentId, GrantDetails, GrantId,
    GrantIdContext, Owner, PasswordDigest, SystemClock,
};

use crate::error::{RegistryError, Result};
use crate::traits::Registry;

/// Backing state shared by every view of one in-memory registry.
#[derive(Debug, Default)]
struct LedgerState {
    /// All grants indexed by id.
    grants: HashMap<GrantId, AccessGrant>,

    /// Index: owner -> their grants in creation order.
    by_owner: HashMap<Owner, Vec<GrantId>>,

    /// Number of grants created so far.
    sequence: u64,
}

/// In-memory registry.
///
/// The check and the counter increment in `verify_access` happen under a
/// single lock, so concurrent verifications never lose an update.
#[derive(Clone)]
pub struct MemoryRegistry {
    state: Arc<Mutex<LedgerState>>,
    caller: Owner,
    clock: Arc<dyn Clock>,
}

impl MemoryRegistry {
    /// Create an empty registry acting as `caller`, on wall-clock time.
    pub fn new(caller: impl Into<Owner>) -> Self {
        Self::with_clock(caller, Arc::new(SystemClock))
    }

    /// Create an empty registry acting as `caller` with a custom clock.
    pub fn with_clock(caller: impl Into<Owner>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            caller: caller.into(),
            clock,
        }
    }

    /// A view of the same grants acting as a different caller.
    pub fn connect_as(&self, caller: impl Into<Owner>) -> Self {
        Self {
            state: self.state.clone(),
            caller: caller.into(),
            clock: self.clock.clone(),
        }
    }

    /// Number of grants ever created.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.grants.len()).unwrap_or(0)
    }

    /// Whether no grant has been created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|e| RegistryError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl LedgerState {
    fn grant(&self, id: &GrantId) -> Result<&AccessGrant> {
        self.grants.get(id).ok_or(RegistryError::NotFound(*id))
    }

    /// Look up a grant for modification by `caller`.
    fn owned_grant_mut(&mut self, id: &GrantId, caller: &Owner) -> Result<&mut AccessGrant> {
        let grant = self.grants.get_mut(id).ok_or(RegistryError::NotFound(*id))?;
        if !grant.is_owned_by(caller) {
            return Err(RegistryError::Unauthorized(*id));
        }
        Ok(grant)
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    fn caller(&self) -> &Owner {
        &self.caller
    }

    async fn create_access_grant(
        &self,
        content_id: &ContentId,
        duration_seconds: u64,
        password_digest: Option<PasswordDigest>,
    ) -> Result<GrantId> {
        if duration_seconds == 0 {
            return Err(RegistryError::InvalidDuration);
        }

        let now = self.clock.now();
        let mut state = self.lock()?;
        state.sequence += 1;

        let id = derive_grant_id(&GrantIdContext {
            owner: &self.caller,
            content_id,
            duration_seconds,
            password_digest: password_digest.as_ref(),
            created_at: now,
            sequence: state.sequence,
        });

        let grant = AccessGrant::new(
            id,
            self.caller.clone(),
            content_id.clone(),
            now,
            duration_seconds,
            password_digest,
        );

        state.grants.insert(id, grant);
        state
            .by_owner
            .entry(self.caller.clone())
            .or_default()
            .push(id);

        tracing::debug!(grant = %id, content_id = %content_id, duration_seconds, "created grant");
        Ok(id)
    }

    async fn verify_access(&self, id: &GrantId, password: &str) -> Result<ContentId> {
        let now = self.clock.now();
        let mut state = self.lock()?;

        let grant = state
            .grants
            .get_mut(id)
            .ok_or(RegistryError::NotFound(*id))?;
        grant
            .check_access(now, password)
            .map_err(|d| RegistryError::denied(*id, d))?;

        grant.access_count += 1;
        Ok(grant.content_id.clone())
    }

    async fn revoke(&self, id: &GrantId) -> Result<()> {
        let mut state = self.lock()?;
        let grant = state.owned_grant_mut(id, &self.caller)?;

        if grant.is_active {
            grant.is_active = false;
            tracing::debug!(grant = %id, "revoked grant");
        }
        Ok(())
    }

    async fn extend(&self, id: &GrantId, new_expiry: i64) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let grant = state.owned_grant_mut(id, &self.caller)?;

        grant
            .check_extend(now, new_expiry)
            .map_err(|d| RegistryError::denied(*id, d))?;
        grant.expiry_time = new_expiry;

        tracing::debug!(grant = %id, new_expiry, "extended grant");
        Ok(())
    }

    async fn get_access_grant_details(&self, id: &GrantId) -> Result<GrantDetails> {
        let state = self.lock()?;
        Ok(state.grant(id)?.details())
    }

    async fn audit_record(&self, id: &GrantId) -> Result<AuditRecord> {
        let state = self.lock()?;
        Ok(state.grant(id)?.audit_record())
    }

    async fn grants_by_owner(&self, owner: &Owner) -> Result<Vec<AuditRecord>> {
        let state = self.lock()?;
        let Some(ids) = state.by_owner.get(owner) else {
            return Ok(Vec::new());
        };

        ids.iter()
            .map(|id| state.grant(id).map(AccessGrant::audit_record))
            .collect()
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}
