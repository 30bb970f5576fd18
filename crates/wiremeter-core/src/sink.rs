//! The injected consumer of reconstructed combat state.
//!
//! The pipeline never aggregates; it pushes entity patches and combat
//! events into a `Sink` and lets the consumer decide what a DPS ranking
//! looks like. Implementations are mutated only from the capture thread.

use serde::Serialize;

/// One damage or heal event, fully decoded.
///
/// `attacker_id` and `target_id` are entity short ids (uuid >> 16).
/// Values stay 64-bit end to end; narrowing is the consumer's concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatRecord {
    pub attacker_id: u64,
    pub target_id: u64,
    pub skill_id: u64,
    pub value: u64,
    pub lucky_value: Option<u64>,
    pub is_crit: bool,
    pub is_cause_lucky: bool,
    pub is_miss: bool,
    pub is_heal: bool,
    pub is_dead: bool,
    pub is_lucky: bool,
    pub hp_lessen: u64,
    /// Element label: None, Fire, Ice, Poison, Thunder, Wind, Rock,
    /// Light, Dark, or Unknown.
    pub element: &'static str,
    pub damage_source: u32,
}

/// Snapshot registered once a monster is fully identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnemySnapshot {
    pub name: String,
    pub hp: u64,
    pub max_hp: u64,
    pub reduction_level: u32,
    pub reduction_id: u32,
    pub element_flag: u32,
}

/// Local-player position published by the opportunistic movement decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalPosition {
    pub uid: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub dir: i32,
    pub move_version: u32,
}

/// Consumer of entity patches and combat events.
///
/// Per-attribute setters fire as attributes decode; a failed attribute is
/// skipped without touching its siblings, so implementations must accept
/// partial updates in any order.
pub trait Sink {
    fn set_name(&mut self, uid: u64, name: String);
    fn set_profession(&mut self, uid: u64, profession: &'static str);
    fn set_fight_point(&mut self, uid: u64, value: u64);
    fn set_level(&mut self, uid: u64, value: u32);
    fn set_rank_level(&mut self, uid: u64, value: u32);

    fn set_enemy_name(&mut self, uid: u64, name: String);
    fn set_enemy_id(&mut self, uid: u64, id: u32);
    fn set_enemy_hp(&mut self, uid: u64, hp: u64);
    fn set_enemy_max_hp(&mut self, uid: u64, max_hp: u64);
    fn set_enemy_reduction_level(&mut self, uid: u64, value: u32);
    fn set_enemy_reduction_id(&mut self, uid: u64, value: u32);
    fn set_enemy_element(&mut self, uid: u64, element: &'static str);
    fn add_enemy(&mut self, uid: u64, snapshot: EnemySnapshot);

    fn process_player_damage(&mut self, record: CombatRecord);
    fn process_damage_to_player(&mut self, record: CombatRecord);

    fn set_local_position(&mut self, position: LocalPosition);
}
