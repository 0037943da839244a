/// Combat configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Lower clamp applied to a positive resistance before it scales damage.
    pub min_resist_cap: f64,
    /// Upper clamp applied to resistance; 1.0 would allow full immunity.
    pub max_resist_cap: f64,
    /// Hp an undying unit is held at when a hit would kill it.
    pub undying_floor: i64,
    /// One-shot multiplier granted to a defender that evades a hit.
    pub counter_multiplier: f64,
    /// Multiplier applied when both attacker and defender carry the duel tag.
    pub duel_multiplier: f64,
    /// Upper clamp on the rolled evasion chance (0.0 ..= 1.0).
    pub max_evasion: f64,
}

impl BattleConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MIN_RESIST_CAP: f64 = 0.0;
    pub const DEFAULT_MAX_RESIST_CAP: f64 = 0.8;
    pub const DEFAULT_UNDYING_FLOOR: i64 = 1;
    pub const DEFAULT_COUNTER_MULTIPLIER: f64 = 1.5;
    pub const DEFAULT_DUEL_MULTIPLIER: f64 = 1.5;
    pub const DEFAULT_MAX_EVASION: f64 = 0.95;

    pub fn new() -> Self {
        Self {
            min_resist_cap: Self::DEFAULT_MIN_RESIST_CAP,
            max_resist_cap: Self::DEFAULT_MAX_RESIST_CAP,
            undying_floor: Self::DEFAULT_UNDYING_FLOOR,
            counter_multiplier: Self::DEFAULT_COUNTER_MULTIPLIER,
            duel_multiplier: Self::DEFAULT_DUEL_MULTIPLIER,
            max_evasion: Self::DEFAULT_MAX_EVASION,
        }
    }

    /// Clamps a resistance value into the configured cap range.
    ///
    /// The upper cap wins if a loaded config inverts the bounds.
    pub fn clamp_resist(&self, resistance: f64) -> f64 {
        resistance.max(self.min_resist_cap).min(self.max_resist_cap)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
