//! Entity and combat-event dispatch.
//!
//! Consumes decoded messages, patches entity state through the sink, and
//! emits damage events. All state here is instance state; a device switch
//! builds a fresh dispatcher, so nothing leaks across captures.

use std::collections::HashMap;

use super::entities::{EntityClass, classify, element_label, profession_name};
use crate::PipelineCounters;
use crate::protocols::attrs::error::AttrError;
use crate::protocols::attrs::layout::attr;
use crate::protocols::attrs::{parse_string_attr, parse_u32_attr};
use crate::protocols::messages::{
    AoiSyncDelta, AttrCollection, CharBase, CombatEvent, EntityContainer, MonsterBase, NewMove,
    SyncContainerData, SyncNearEntities, SyncServerTime, SyncToMeDeltaInfo, UserControlInfo,
};
use crate::sink::{CombatRecord, EnemySnapshot, LocalPosition, Sink};

/// Accumulated view of one monster, kept until it qualifies for
/// registration.
#[derive(Debug, Default, Clone)]
struct MonsterRecord {
    name: Option<String>,
    hp: u64,
    max_hp: u64,
    reduction_level: u32,
    reduction_id: u32,
    element_flag: u32,
}

pub(crate) struct EntityDispatcher<S> {
    sink: S,
    local_player: Option<u64>,
    monsters: HashMap<u64, MonsterRecord>,
    monster_names: HashMap<String, String>,
    crit_mask: u32,
    cause_lucky_mask: u32,
}

impl<S: Sink> EntityDispatcher<S> {
    pub(crate) fn new(
        monster_names: HashMap<String, String>,
        crit_mask: u32,
        cause_lucky_mask: u32,
        sink: S,
    ) -> Self {
        Self {
            sink,
            local_player: None,
            monsters: HashMap::new(),
            monster_names,
            crit_mask,
            cause_lucky_mask,
        }
    }

    pub(crate) fn into_sink(self) -> S {
        self.sink
    }

    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub(crate) fn handle_near_entities(
        &mut self,
        msg: SyncNearEntities,
        counters: &mut PipelineCounters,
    ) {
        for appear in msg.appear {
            if self.local_player.is_none() {
                self.observe_local(appear.uuid, false);
            }
            let Some((class, short_id)) = classify(appear.uuid) else {
                counters.unknown_class += 1;
                log::debug!("unknown entity class in uuid {:#x}", appear.uuid);
                continue;
            };
            if let Some(container) = appear.container {
                self.apply_container(class, short_id, container, counters);
            }
        }
    }

    pub(crate) fn handle_container_update(
        &mut self,
        msg: SyncContainerData,
        counters: &mut PipelineCounters,
    ) {
        let Some((class, short_id)) = classify(msg.uuid) else {
            counters.unknown_class += 1;
            return;
        };
        if let Some(container) = msg.container {
            self.apply_container(class, short_id, container, counters);
        }
    }

    pub(crate) fn handle_near_deltas(
        &mut self,
        deltas: Vec<AoiSyncDelta>,
        counters: &mut PipelineCounters,
    ) {
        for delta in deltas {
            self.handle_delta(delta, counters);
        }
    }

    pub(crate) fn handle_to_me_delta(
        &mut self,
        msg: SyncToMeDeltaInfo,
        counters: &mut PipelineCounters,
    ) {
        self.observe_local(msg.delta.uuid, true);
        self.handle_delta(msg.delta, counters);
    }

    pub(crate) fn handle_server_time(
        &mut self,
        msg: SyncServerTime,
        counters: &mut PipelineCounters,
    ) {
        if let Some(delta) = msg.delta {
            self.handle_delta(delta, counters);
        }
    }

    /// Speculative movement decode for unrouted method ids.
    pub(crate) fn handle_unknown_method(&mut self, body: &[u8]) {
        let Some(local) = self.local_player else {
            return;
        };
        let Some((_, short_id)) = classify(local) else {
            return;
        };
        let position = match NewMove::decode(body) {
            Ok(msg) => msg.position,
            Err(_) => match UserControlInfo::decode(body) {
                Ok(msg) => msg.position,
                Err(_) => return,
            },
        };
        self.sink.set_local_position(LocalPosition {
            uid: short_id,
            x: position.x,
            y: position.y,
            z: position.z,
            dir: position.dir,
            move_version: position.move_version,
        });
    }

    fn observe_local(&mut self, uuid: u64, authoritative: bool) {
        match self.local_player {
            None => {
                log::info!("local player identified: {uuid:#x}");
                self.local_player = Some(uuid);
            }
            Some(current) if authoritative && current != uuid => {
                log::info!("local player changed: {current:#x} -> {uuid:#x}");
                self.local_player = Some(uuid);
            }
            _ => {}
        }
    }

    fn handle_delta(&mut self, delta: AoiSyncDelta, counters: &mut PipelineCounters) {
        let Some((class, short_id)) = classify(delta.uuid) else {
            counters.unknown_class += 1;
            log::debug!("unknown entity class in uuid {:#x}", delta.uuid);
            return;
        };
        if let Some(attrs) = &delta.attrs {
            self.apply_attrs(class, short_id, attrs, counters);
            if class == EntityClass::Monster {
                self.maybe_register_monster(short_id);
            }
        }
        for event in delta.events {
            self.handle_event(class, short_id, event, counters);
        }
    }

    fn handle_event(
        &mut self,
        target_class: EntityClass,
        target_id: u64,
        event: CombatEvent,
        counters: &mut PipelineCounters,
    ) {
        let attacker_uuid = if event.top_summoner_id != 0 {
            event.top_summoner_id
        } else {
            event.attacker_uuid
        };
        let Some((attacker_class, attacker_id)) = classify(attacker_uuid) else {
            counters.unknown_class += 1;
            return;
        };
        let value = event.value.or(event.lucky_value).unwrap_or(0);
        if value == 0 {
            return;
        }
        if event.type_flag & !(self.crit_mask | self.cause_lucky_mask) != 0 {
            counters.unexpected_type_flags += 1;
        }

        let record = CombatRecord {
            attacker_id,
            target_id,
            skill_id: event.owner_id,
            value,
            lucky_value: event.lucky_value,
            is_crit: event.type_flag & self.crit_mask != 0,
            is_cause_lucky: event.type_flag & self.cause_lucky_mask != 0,
            is_miss: event.is_miss,
            is_heal: event.is_heal(),
            is_dead: event.is_dead,
            is_lucky: event.lucky_value.is_some(),
            hp_lessen: event.hp_lessen,
            element: element_label(event.property),
            damage_source: event.damage_source,
        };
        match (attacker_class, target_class) {
            (EntityClass::Player, EntityClass::Monster) => {
                self.sink.process_player_damage(record);
                counters.events_emitted += 1;
            }
            (EntityClass::Monster, EntityClass::Player) => {
                self.sink.process_damage_to_player(record);
                counters.events_emitted += 1;
            }
            _ => {}
        }
    }

    fn apply_container(
        &mut self,
        class: EntityClass,
        short_id: u64,
        container: EntityContainer,
        counters: &mut PipelineCounters,
    ) {
        match class {
            EntityClass::Player => {
                if let Some(base) = container.char_base {
                    self.apply_char_base(short_id, base);
                }
            }
            EntityClass::Monster => {
                if let Some(base) = container.monster_base {
                    self.apply_monster_base(short_id, base);
                }
            }
        }
        if let Some(attrs) = &container.attrs {
            self.apply_attrs(class, short_id, attrs, counters);
        }
        if class == EntityClass::Monster {
            self.maybe_register_monster(short_id);
        }
    }

    fn apply_char_base(&mut self, short_id: u64, base: CharBase) {
        if let Some(name) = base.name {
            self.sink.set_name(short_id, name);
        }
        if let Some(fight_point) = base.fight_point {
            self.sink.set_fight_point(short_id, fight_point);
        }
        if let Some(level) = base.level {
            self.sink.set_level(short_id, level);
        }
    }

    fn apply_monster_base(&mut self, short_id: u64, base: MonsterBase) {
        let record = self.monsters.entry(short_id).or_default();
        if let Some(raw) = base.name {
            let name = remap_name(&self.monster_names, raw);
            record.name = Some(name.clone());
            self.sink.set_enemy_name(short_id, name);
        }
        if let Some(hp) = base.hp {
            record.hp = hp;
            self.sink.set_enemy_hp(short_id, hp);
        }
        if let Some(max_hp) = base.max_hp {
            record.max_hp = max_hp;
            self.sink.set_enemy_max_hp(short_id, max_hp);
        }
        if let Some(monster_id) = base.monster_id {
            self.sink.set_enemy_id(short_id, monster_id);
        }
    }

    fn apply_attrs(
        &mut self,
        class: EntityClass,
        short_id: u64,
        attrs: &AttrCollection,
        counters: &mut PipelineCounters,
    ) {
        for entry in &attrs.attrs {
            if self.apply_attr(class, short_id, entry.id, &entry.raw).is_err() {
                counters.attr_failures += 1;
                log::debug!("attribute {:#x} on {short_id} failed to decode", entry.id);
            }
        }
    }

    fn apply_attr(
        &mut self,
        class: EntityClass,
        short_id: u64,
        attr_id: u32,
        raw: &[u8],
    ) -> Result<(), AttrError> {
        match (class, attr_id) {
            (EntityClass::Player, attr::NAME) => {
                let name = parse_string_attr(raw)?;
                self.sink.set_name(short_id, name);
            }
            (EntityClass::Player, attr::PROFESSION_ID) => {
                let id = parse_u32_attr(raw)?;
                self.sink.set_profession(short_id, profession_name(id));
            }
            (EntityClass::Player, attr::FIGHT_POINT) => {
                let value = parse_u32_attr(raw)?;
                self.sink.set_fight_point(short_id, value.into());
            }
            (EntityClass::Player, attr::LEVEL) => {
                let value = parse_u32_attr(raw)?;
                self.sink.set_level(short_id, value);
            }
            (EntityClass::Player, attr::RANK_LEVEL) => {
                let value = parse_u32_attr(raw)?;
                self.sink.set_rank_level(short_id, value);
            }
            (EntityClass::Monster, attr::NAME) => {
                let name = remap_name(&self.monster_names, parse_string_attr(raw)?);
                self.monsters.entry(short_id).or_default().name = Some(name.clone());
                self.sink.set_enemy_name(short_id, name);
            }
            (EntityClass::Monster, attr::MONSTER_TYPE_ID) => {
                let id = parse_u32_attr(raw)?;
                self.sink.set_enemy_id(short_id, id);
            }
            (EntityClass::Monster, attr::CUR_HP) => {
                let hp = u64::from(parse_u32_attr(raw)?);
                self.monsters.entry(short_id).or_default().hp = hp;
                self.sink.set_enemy_hp(short_id, hp);
            }
            (EntityClass::Monster, attr::MAX_HP) => {
                let max_hp = u64::from(parse_u32_attr(raw)?);
                self.monsters.entry(short_id).or_default().max_hp = max_hp;
                self.sink.set_enemy_max_hp(short_id, max_hp);
            }
            (EntityClass::Monster, attr::REDUCTION_LEVEL) => {
                let value = parse_u32_attr(raw)?;
                self.monsters.entry(short_id).or_default().reduction_level = value;
                self.sink.set_enemy_reduction_level(short_id, value);
            }
            (EntityClass::Monster, attr::REDUCTION_ID) => {
                let value = parse_u32_attr(raw)?;
                self.monsters.entry(short_id).or_default().reduction_id = value;
                self.sink.set_enemy_reduction_id(short_id, value);
            }
            (EntityClass::Monster, attr::ELEMENT_FLAG) => {
                let value = parse_u32_attr(raw)?;
                self.monsters.entry(short_id).or_default().element_flag = value;
                self.sink.set_enemy_element(short_id, element_label(value));
            }
            _ => {}
        }
        Ok(())
    }

    /// A monster joins the enemy registry once it has a real name and a
    /// known health pool; the sink upserts on repeats.
    fn maybe_register_monster(&mut self, short_id: u64) {
        let Some(record) = self.monsters.get(&short_id) else {
            return;
        };
        let named = record.name.as_ref().is_some_and(|name| !name.is_empty());
        if named && record.max_hp > 0 {
            let name = record.name.clone().unwrap_or_default();
            self.sink.add_enemy(
                short_id,
                EnemySnapshot {
                    name,
                    hp: record.hp,
                    max_hp: record.max_hp,
                    reduction_level: record.reduction_level,
                    reduction_id: record.reduction_id,
                    element_flag: record.element_flag,
                },
            );
        }
    }
}

fn remap_name(table: &HashMap<String, String>, raw: String) -> String {
    table.get(&raw).cloned().unwrap_or(raw)
}
