//! Combat system - damage and defeat detection

/// Health a fighter (re)spawns with
pub const MAX_HEALTH: u8 = 100;

/// Damage dealt by any attack, regardless of kind
pub const ATTACK_DAMAGE: u8 = 10;

/// Result of landing an attack on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Target health after the hit
    pub target_health: u8,
    /// True only on the hit that took the target from alive to 0
    pub defeated: bool,
}

/// Combat system for applying damage
pub struct CombatSystem;

impl CombatSystem {
    /// Apply one attack's damage to `current_health`.
    /// A target already at 0 stays at 0 and is not defeated again.
    pub fn apply_damage(current_health: u8) -> AttackOutcome {
        let target_health = current_health.saturating_sub(ATTACK_DAMAGE);
        AttackOutcome {
            target_health,
            defeated: current_health > 0 && target_health == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_is_fixed() {
        let outcome = CombatSystem::apply_damage(MAX_HEALTH);
        assert_eq!(outcome.target_health, MAX_HEALTH - ATTACK_DAMAGE);
        assert!(!outcome.defeated);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let outcome = CombatSystem::apply_damage(4);
        assert_eq!(outcome.target_health, 0);
        assert!(outcome.defeated);
    }

    #[test]
    fn test_defeat_signalled_once() {
        let mut health = MAX_HEALTH;
        let mut defeats = 0;
        for _ in 0..15 {
            let outcome = CombatSystem::apply_damage(health);
            health = outcome.target_health;
            if outcome.defeated {
                defeats += 1;
            }
        }
        assert_eq!(health, 0);
        assert_eq!(defeats, 1);
    }
}
