// ── Device cache ──
//
// Authoritative in-memory copy of the gateway topology. Reads load the
// current snapshot lock-free; writers serialize on a mutex, clone the
// snapshot, mutate, and publish the result in one swap.

mod topology;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{CoreError, RecordKind};
use crate::model::{BulbDto, BulbId, BulbRecord, GroupDto, GroupId, GroupRecord, LightState};

use self::topology::{Topology, name_key, same_name};

/// Outcome of checking a rename against the cache before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameCheck {
    /// The record already carries this exact name; nothing to do.
    Unchanged,
    /// The name is free and may be sent to the gateway.
    Available,
}

pub struct DeviceCache {
    super_group_name: String,
    topology: ArcSwap<Topology>,
    writer: Mutex<()>,
}

impl DeviceCache {
    pub fn new(super_group_name: impl Into<String>) -> Self {
        Self {
            super_group_name: super_group_name.into(),
            topology: ArcSwap::from_pointee(Topology::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn super_group_name(&self) -> &str {
        &self.super_group_name
    }

    // ── Rebuild ──────────────────────────────────────────────────────

    /// Replace the whole topology with a fresh observation.
    pub fn rebuild(&self, groups: Vec<GroupRecord>, bulbs: Vec<BulbRecord>) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let next = Topology::build(groups, bulbs, &self.super_group_name);

        if next.super_group.is_none() {
            warn!(name = %self.super_group_name, "gateway reported no super group");
        }
        warn_on_duplicates("group", next.groups.values().map(|g| g.name.as_str()));
        warn_on_duplicates("bulb", next.bulbs.values().map(|b| b.name.as_str()));
        debug!(
            groups = next.groups.len(),
            bulbs = next.bulbs.len(),
            "device cache rebuilt"
        );

        self.topology.store(Arc::new(next));
    }

    /// Drop everything. Used when a session fails before its rebuild.
    pub fn clear(&self) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.topology.store(Arc::new(Topology::default()));
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Raw lookup, super group included.
    pub fn find_group(&self, id: GroupId) -> Option<Arc<GroupRecord>> {
        self.topology.load().groups.get(&id).cloned()
    }

    pub fn find_bulb(&self, id: BulbId) -> Option<Arc<BulbRecord>> {
        self.topology.load().bulbs.get(&id).cloned()
    }

    pub fn super_group(&self) -> Result<Arc<GroupRecord>, CoreError> {
        let snap = self.topology.load();
        snap.super_group
            .and_then(|id| snap.groups.get(&id).cloned())
            .ok_or_else(|| CoreError::SuperGroupMissing {
                name: self.super_group_name.clone(),
            })
    }

    /// Ids of the cached bulbs in a user-visible group, in gateway order.
    pub fn member_ids(&self, group_id: GroupId) -> Result<Vec<BulbId>, CoreError> {
        let snap = self.topology.load();
        let group = snap
            .visible_group(group_id)
            .ok_or(CoreError::GroupNotFound { id: group_id })?;
        Ok(snap.members_of(group).map(|b| b.id).collect())
    }

    pub fn group_count(&self) -> usize {
        self.topology.load().visible_groups().count()
    }

    pub fn bulb_count(&self) -> usize {
        self.topology.load().bulbs.len()
    }

    pub fn last_rebuilt(&self) -> Option<DateTime<Utc>> {
        self.topology.load().rebuilt_at
    }

    // ── Projections ──────────────────────────────────────────────────

    /// Every group except the super group, by name (case-insensitive)
    /// then id.
    pub fn list_groups(&self) -> Vec<GroupDto> {
        let snap = self.topology.load();
        let mut groups: Vec<GroupDto> = snap.visible_groups().map(|g| snap.group_dto(g)).collect();
        groups.sort_by_cached_key(|g| (name_key(&g.name), g.id));
        groups
    }

    /// Member bulbs of a group, sorted case-insensitively by name.
    pub fn list_bulbs_of(&self, group_id: GroupId) -> Result<Vec<BulbDto>, CoreError> {
        self.group_dto(group_id).map(|dto| dto.bulbs)
    }

    /// Project a group. Its light state is the first cached member's
    /// (gateway order), or [`LightState::NEUTRAL`] when it has none.
    pub fn group_dto(&self, group_id: GroupId) -> Result<GroupDto, CoreError> {
        let snap = self.topology.load();
        snap.visible_group(group_id)
            .map(|g| snap.group_dto(g))
            .ok_or(CoreError::GroupNotFound { id: group_id })
    }

    pub fn bulb_dto(&self, bulb_id: BulbId) -> Result<BulbDto, CoreError> {
        self.find_bulb(bulb_id)
            .map(|b| b.to_dto())
            .ok_or(CoreError::BulbNotFound { id: bulb_id })
    }

    // ── Renames ──────────────────────────────────────────────────────

    pub fn check_group_rename(&self, id: GroupId, name: &str) -> Result<RenameCheck, CoreError> {
        let snap = self.topology.load();
        let group = snap
            .visible_group(id)
            .ok_or(CoreError::GroupNotFound { id })?;
        check_rename(&group.name, name, snap.group_name_taken(name, id), RecordKind::Group)
    }

    pub fn check_bulb_rename(&self, id: BulbId, name: &str) -> Result<RenameCheck, CoreError> {
        let snap = self.topology.load();
        let bulb = snap.bulbs.get(&id).ok_or(CoreError::BulbNotFound { id })?;
        check_rename(&bulb.name, name, snap.bulb_name_taken(name, id), RecordKind::Bulb)
    }

    /// Commit a group rename. Re-checks uniqueness under the writer lock.
    pub fn rename_group(&self, id: GroupId, name: &str) -> Result<GroupDto, CoreError> {
        self.update(|topo| {
            let current = topo
                .visible_group(id)
                .ok_or(CoreError::GroupNotFound { id })?;
            if check_rename(&current.name, name, topo.group_name_taken(name, id), RecordKind::Group)?
                == RenameCheck::Available
            {
                let mut renamed = GroupRecord::clone(current);
                renamed.name = name.to_owned();
                topo.groups.insert(id, Arc::new(renamed));
            }
            Ok(())
        })?;
        self.group_dto(id)
    }

    pub fn rename_bulb(&self, id: BulbId, name: &str) -> Result<BulbDto, CoreError> {
        self.update(|topo| {
            let current = topo.bulbs.get(&id).ok_or(CoreError::BulbNotFound { id })?;
            if check_rename(&current.name, name, topo.bulb_name_taken(name, id), RecordKind::Bulb)?
                == RenameCheck::Available
            {
                let mut renamed = BulbRecord::clone(current);
                renamed.name = name.to_owned();
                topo.bulbs.insert(id, Arc::new(renamed));
            }
            Ok(())
        })?;
        self.bulb_dto(id)
    }

    // ── Light state ──────────────────────────────────────────────────

    pub fn apply_light_state(&self, id: BulbId, state: LightState) -> Result<BulbDto, CoreError> {
        self.update(|topo| {
            let current = topo.bulbs.get(&id).ok_or(CoreError::BulbNotFound { id })?;
            let mut next = BulbRecord::clone(current);
            next.light = state;
            topo.bulbs.insert(id, Arc::new(next));
            Ok(())
        })?;
        self.bulb_dto(id)
    }

    /// Set the same state on several bulbs in one swap. Ids that have
    /// vanished from the cache are skipped.
    pub fn apply_light_states(&self, ids: &[BulbId], state: LightState) {
        self.modify(|topo| {
            for id in ids {
                let Some(current) = topo.bulbs.get(id) else {
                    debug!(bulb_id = id, "bulb vanished before state commit");
                    continue;
                };
                let mut next = BulbRecord::clone(current);
                next.light = state;
                topo.bulbs.insert(*id, Arc::new(next));
            }
        });
    }

    /// Flip the power flag on every cached bulb, keeping colors.
    pub fn set_all_on(&self, on: bool) {
        self.modify(|topo| {
            for bulb in topo.bulbs.values_mut() {
                if bulb.light.on != on {
                    let mut next = BulbRecord::clone(&**bulb);
                    next.light = next.light.with_on(on);
                    *bulb = Arc::new(next);
                }
            }
        });
    }

    /// Clone-modify-publish under the writer lock. Nothing is published
    /// when `mutate` fails.
    fn update<F>(&self, mutate: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Topology) -> Result<(), CoreError>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Topology::clone(&self.topology.load());
        mutate(&mut next)?;
        self.topology.store(Arc::new(next));
        Ok(())
    }

    fn modify<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Topology),
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Topology::clone(&self.topology.load());
        mutate(&mut next);
        self.topology.store(Arc::new(next));
    }
}

impl std::fmt::Debug for DeviceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.topology.load();
        f.debug_struct("DeviceCache")
            .field("super_group_name", &self.super_group_name)
            .field("groups", &snap.groups.len())
            .field("bulbs", &snap.bulbs.len())
            .finish_non_exhaustive()
    }
}

fn check_rename(
    current: &str,
    requested: &str,
    taken: bool,
    kind: RecordKind,
) -> Result<RenameCheck, CoreError> {
    if current == requested {
        return Ok(RenameCheck::Unchanged);
    }
    if taken {
        return Err(CoreError::DuplicateName {
            kind,
            name: requested.to_owned(),
        });
    }
    Ok(RenameCheck::Available)
}

fn warn_on_duplicates<'a>(kind: &str, names: impl Iterator<Item = &'a str>) {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.iter().any(|s| same_name(s, name)) {
            warn!(kind, name, "gateway reports duplicate name");
        } else {
            seen.push(name);
        }
    }
}
