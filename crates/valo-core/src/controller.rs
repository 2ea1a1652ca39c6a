// ── Controller ──
//
// Public facade for light operations. Every operation acquires the
// shared session, talks to the gateway, and only then commits to the
// device cache. Session-level failures tear the session down before the
// error is returned, so the next call starts fresh.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, warn};
use valo_gateway::{GatewayTransport, LightOperation};

use crate::codec;
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::model::{BulbDto, BulbId, GroupDto, GroupId, LightState};
use crate::session::{Session, SessionManager};
use crate::store::{DeviceCache, RenameCheck};

/// The main entry point for consumers of valo-core.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    sessions: SessionManager,
    cache: Arc<DeviceCache>,
}

impl Controller {
    pub fn new(config: GatewayConfig, transport: Arc<dyn GatewayTransport>) -> Self {
        let cache = Arc::new(DeviceCache::new(config.super_group_name.clone()));
        let sessions = SessionManager::new(config, transport, Arc::clone(&cache));
        Self {
            inner: Arc::new(ControllerInner { sessions, cache }),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.inner.cache
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Establish the session eagerly instead of on first use.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.sessions.acquire().await.map(|_| ())
    }

    /// Close the session. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.inner.sessions.dispose().await;
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All user-visible groups, sorted by name.
    pub async fn list_groups(&self) -> Result<Vec<GroupDto>, CoreError> {
        self.inner.sessions.acquire().await?;
        Ok(self.inner.cache.list_groups())
    }

    pub async fn group(&self, id: GroupId) -> Result<GroupDto, CoreError> {
        self.inner.sessions.acquire().await?;
        self.inner.cache.group_dto(id)
    }

    /// Members of a group, sorted by name.
    pub async fn list_bulbs(&self, group_id: GroupId) -> Result<Vec<BulbDto>, CoreError> {
        self.inner.sessions.acquire().await?;
        self.inner.cache.list_bulbs_of(group_id)
    }

    pub async fn bulb(&self, id: BulbId) -> Result<BulbDto, CoreError> {
        self.inner.sessions.acquire().await?;
        self.inner.cache.bulb_dto(id)
    }

    // ── Renames ──────────────────────────────────────────────────────

    pub async fn rename_group(&self, id: GroupId, name: &str) -> Result<GroupDto, CoreError> {
        let name = normalize_name(name)?;
        let cache = &self.inner.cache;
        self.with_session(|session| async move {
            if cache.check_group_rename(id, &name)? == RenameCheck::Unchanged {
                debug!(group_id = id, "rename is a no-op");
                return cache.group_dto(id);
            }
            session.rename_group(id, &name).await?;
            cache.rename_group(id, &name).inspect_err(|e| {
                warn!(group_id = id, error = %e, "gateway accepted rename the cache rejected");
            })
        })
        .await
    }

    pub async fn rename_bulb(&self, id: BulbId, name: &str) -> Result<BulbDto, CoreError> {
        let name = normalize_name(name)?;
        let cache = &self.inner.cache;
        self.with_session(|session| async move {
            if cache.check_bulb_rename(id, &name)? == RenameCheck::Unchanged {
                debug!(bulb_id = id, "rename is a no-op");
                return cache.bulb_dto(id);
            }
            session.rename_device(id, &name).await?;
            cache.rename_bulb(id, &name).inspect_err(|e| {
                warn!(bulb_id = id, error = %e, "gateway accepted rename the cache rejected");
            })
        })
        .await
    }

    // ── Light state ──────────────────────────────────────────────────

    /// Set every member of a group to `state`.
    ///
    /// One device command per member, issued concurrently. The cache is
    /// only updated when all of them succeed.
    pub async fn set_group_light(
        &self,
        id: GroupId,
        state: LightState,
    ) -> Result<GroupDto, CoreError> {
        state.validate()?;
        let cache = &self.inner.cache;
        self.with_session(|session| async move {
            let members = cache.member_ids(id)?;
            let op = codec::to_device_operation(&state);
            try_join_all(
                members
                    .iter()
                    .map(|bulb| session.send_device_command(*bulb, &op)),
            )
            .await?;
            cache.apply_light_states(&members, state);
            cache.group_dto(id)
        })
        .await
    }

    pub async fn set_bulb_light(&self, id: BulbId, state: LightState) -> Result<BulbDto, CoreError> {
        state.validate()?;
        let cache = &self.inner.cache;
        self.with_session(|session| async move {
            if cache.find_bulb(id).is_none() {
                return Err(CoreError::BulbNotFound { id });
            }
            session
                .send_device_command(id, &codec::to_device_operation(&state))
                .await?;
            cache.apply_light_state(id, state)
        })
        .await
    }

    /// Switch every light on or off with one super-group command.
    /// Colors and intensities are left as they are.
    pub async fn switch_all(&self, on: bool) -> Result<Vec<GroupDto>, CoreError> {
        let cache = &self.inner.cache;
        self.with_session(|session| async move {
            let super_group = cache.super_group()?;
            session
                .send_group_command(super_group.id, &LightOperation::switch(on))
                .await?;
            cache.set_all_on(on);
            Ok(cache.list_groups())
        })
        .await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Run `op` against the live session; tear it down if `op` fails in a
    /// way that leaves the session untrustworthy.
    async fn with_session<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let session = self.inner.sessions.acquire().await?;
        let result = op(Arc::clone(&session)).await;
        if let Err(e) = &result {
            if e.resets_session() {
                warn!(
                    generation = session.generation(),
                    error = %e,
                    "gateway operation failed, resetting session"
                );
                self.inner.sessions.invalidate(&session).await;
            }
        }
        result
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("sessions", &self.inner.sessions)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "name must not be empty".into(),
        });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_name("  Den ").expect("valid"), "Den");
    }

    #[test]
    fn blank_names_are_rejected() {
        for blank in ["", "   ", "\t\n"] {
            assert!(matches!(
                normalize_name(blank),
                Err(CoreError::ValidationFailed { .. })
            ));
        }
    }
}
