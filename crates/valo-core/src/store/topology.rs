// ── Topology snapshot ──
//
// One immutable view of every cached group and bulb. The cache swaps
// whole snapshots; readers never see a half-applied mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::model::{BulbDto, BulbId, BulbRecord, GroupDto, GroupId, GroupRecord, LightState};

#[derive(Debug, Clone, Default)]
pub(crate) struct Topology {
    pub groups: IndexMap<GroupId, Arc<GroupRecord>>,
    pub bulbs: IndexMap<BulbId, Arc<BulbRecord>>,
    pub super_group: Option<GroupId>,
    pub rebuilt_at: Option<DateTime<Utc>>,
}

impl Topology {
    pub fn build(
        groups: Vec<GroupRecord>,
        bulbs: Vec<BulbRecord>,
        super_group_name: &str,
    ) -> Self {
        let super_group = groups
            .iter()
            .find(|g| g.name == super_group_name)
            .map(|g| g.id);
        Self {
            groups: groups.into_iter().map(|g| (g.id, Arc::new(g))).collect(),
            bulbs: bulbs.into_iter().map(|b| (b.id, Arc::new(b))).collect(),
            super_group,
            rebuilt_at: Some(Utc::now()),
        }
    }

    /// Groups surfaced to callers: everything but the super group.
    pub fn visible_groups(&self) -> impl Iterator<Item = &Arc<GroupRecord>> {
        self.groups
            .values()
            .filter(move |g| Some(g.id) != self.super_group)
    }

    pub fn visible_group(&self, id: GroupId) -> Option<&Arc<GroupRecord>> {
        if Some(id) == self.super_group {
            return None;
        }
        self.groups.get(&id)
    }

    /// Cached member bulbs in stored order; ids without a bulb are skipped.
    pub fn members_of<'a>(
        &'a self,
        group: &'a GroupRecord,
    ) -> impl Iterator<Item = &'a Arc<BulbRecord>> + 'a {
        group
            .member_bulb_ids
            .iter()
            .filter_map(|id| self.bulbs.get(id))
    }

    /// Light state of a group: its first member's, or neutral when empty.
    pub fn group_light(&self, group: &GroupRecord) -> LightState {
        self.members_of(group)
            .next()
            .map_or(LightState::NEUTRAL, |bulb| bulb.light)
    }

    pub fn group_dto(&self, group: &GroupRecord) -> GroupDto {
        let mut bulbs: Vec<BulbDto> = self.members_of(group).map(|b| b.to_dto()).collect();
        bulbs.sort_by_cached_key(|b| (name_key(&b.name), b.accessory_id));
        GroupDto {
            name: group.name.clone(),
            id: group.id,
            bulbs,
            light_state: self.group_light(group),
        }
    }

    pub fn group_name_taken(&self, name: &str, except: GroupId) -> bool {
        self.groups
            .values()
            .any(|g| g.id != except && same_name(&g.name, name))
    }

    pub fn bulb_name_taken(&self, name: &str, except: BulbId) -> bool {
        self.bulbs
            .values()
            .any(|b| b.id != except && same_name(&b.name, name))
    }
}

/// Case-insensitive sort/compare key for names.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub(crate) fn same_name(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}
