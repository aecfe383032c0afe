//! Opening, ticking and dropping battles across the world.

use std::collections::BTreeMap;

use tracing::debug;

use crate::battle::{Battle, BattleConfig, BattleContext, BattleId};
use crate::error::Result;
use crate::factions::{FactionId, Relation};
use crate::forces::{Fleet, FleetId, Forces, LocationId};
use crate::notifications::NotificationSink;

/// Every running battle, keyed by id.
///
/// Idle fleets sharing a location with a hostile idle fleet start a battle.
/// A fleet arriving where a battle is already being fought joins it if it
/// sides with one of the parties.
#[derive(Debug, Clone, Default)]
pub struct Engagements {
    config: BattleConfig,
    battles: BTreeMap<BattleId, Battle>,
    next_id: u64,
}

impl Engagements {
    /// Create a manager opening battles with the given configuration.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        Self {
            config,
            battles: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Configuration given to new battles.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Look up a battle.
    #[must_use]
    pub fn battle(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    /// Battles in id order.
    pub fn battles(&self) -> impl Iterator<Item = &Battle> {
        self.battles.values()
    }

    /// Open battle at a location, if any.
    #[must_use]
    pub fn battle_at(&self, location: LocationId) -> Option<&Battle> {
        self.battles
            .values()
            .find(|battle| battle.location() == location && is_open(battle))
    }

    /// Number of battles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.battles.len()
    }

    /// Check if no battle is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    /// Match idle fleets against open battles and against each other.
    ///
    /// Returns the ids of newly opened battles.
    pub fn detect(
        &mut self,
        forces: &mut Forces,
        now: u64,
        notifications: &mut dyn NotificationSink,
    ) -> Result<Vec<BattleId>> {
        let idle: Vec<(FleetId, LocationId, FactionId)> = forces
            .fleets()
            .filter(|fleet| is_idle(fleet))
            .map(|fleet| (fleet.id(), fleet.location(), fleet.owner()))
            .collect();

        let mut opened = Vec::new();
        for (fleet, location, owner) in idle {
            if !forces.fleet(fleet).is_some_and(is_idle) {
                continue;
            }

            if let Some(battle) = self
                .battles
                .values_mut()
                .find(|battle| battle.location() == location && is_open(battle))
            {
                if battle
                    .join_if_possible(fleet, forces, notifications)?
                    .is_some()
                {
                    continue;
                }
            }

            let enemy = forces
                .fleets()
                .find(|other| {
                    other.id() != fleet
                        && other.location() == location
                        && is_idle(other)
                        && forces.relation(owner, other.owner()) == Relation::Hostile
                })
                .map(Fleet::id);

            if let Some(enemy) = enemy {
                self.next_id += 1;
                let id = BattleId::new(self.next_id);
                let battle = Battle::new(id, location, fleet, enemy, forces, now, self.config)?;
                self.battles.insert(id, battle);
                opened.push(id);
            }
        }
        Ok(opened)
    }

    /// Tick every battle and drop the dead ones. Returns the ids dropped.
    pub fn tick(&mut self, forces: &mut Forces, ctx: &mut BattleContext<'_>) -> Result<Vec<BattleId>> {
        for battle in self.battles.values_mut() {
            battle.tick(forces, ctx)?;
        }
        let dead: Vec<BattleId> = self
            .battles
            .values()
            .filter(|battle| battle.is_dead())
            .map(Battle::id)
            .collect();
        for id in &dead {
            self.battles.remove(id);
            debug!(battle = %id, "Battle removed");
        }
        Ok(dead)
    }

    /// Pull a fleet out of whichever battle it fights in.
    pub fn retreat(&mut self, fleet: FleetId, forces: &mut Forces) -> Result<bool> {
        match self
            .battles
            .values_mut()
            .find(|battle| battle.is_participant(fleet))
        {
            Some(battle) => battle.retreat_fleet(fleet, forces),
            None => Ok(false),
        }
    }
}

fn is_idle(fleet: &Fleet) -> bool {
    !fleet.is_dead() && fleet.engaged().is_none()
}

fn is_open(battle: &Battle) -> bool {
    !battle.is_dead() && !battle.resolution().is_resolved()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleSide;
    use crate::factions::Faction;
    use crate::metrics::BattleMetrics;
    use crate::notifications::{NotificationCategory, RecordingNotifications};
    use crate::random::WorldRng;
    use crate::report::BattleHistory;
    use crate::testing::{hostile_pair, raise, sample_class};

    #[test]
    fn test_hostile_fleets_open_battle() {
        let mut sides = hostile_pair();
        let mut engagements = Engagements::default();
        let mut notes = RecordingNotifications::new();

        let opened = engagements
            .detect(&mut sides.forces, 0, &mut notes)
            .unwrap();
        assert_eq!(opened.len(), 1);
        let battle = engagements.battle(opened[0]).unwrap();
        assert!(battle.is_participant(sides.attacker_fleet));
        assert!(battle.is_participant(sides.defender_fleet));

        let again = engagements
            .detect(&mut sides.forces, 1, &mut notes)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(engagements.len(), 1);
    }

    #[test]
    fn test_neutral_fleets_ignore_each_other() {
        let mut sides = hostile_pair();
        sides.forces.set_relation(
            sides.attacker_faction,
            sides.defender_faction,
            Relation::Neutral,
        );
        let mut engagements = Engagements::default();
        let mut notes = RecordingNotifications::new();
        assert!(engagements
            .detect(&mut sides.forces, 0, &mut notes)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_separate_locations_do_not_fight() {
        let mut sides = hostile_pair();
        sides
            .forces
            .fleet_mut(sides.defender_fleet)
            .unwrap()
            .set_location(LocationId::new(2));
        let mut engagements = Engagements::default();
        let mut notes = RecordingNotifications::new();
        assert!(engagements
            .detect(&mut sides.forces, 0, &mut notes)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_arriving_ally_joins_open_battle() {
        let mut sides = hostile_pair();
        let mut engagements = Engagements::default();
        let mut notes = RecordingNotifications::new();
        engagements
            .detect(&mut sides.forces, 0, &mut notes)
            .unwrap();

        let ally = FactionId::new(3);
        sides.forces.add_faction(Faction::new(ally, "Free Worlds"));
        sides
            .forces
            .set_relation(ally, sides.defender_faction, Relation::Allied);
        sides
            .forces
            .set_relation(ally, sides.attacker_faction, Relation::Hostile);
        let relief = sides.forces.create_fleet(ally, "Relief", LocationId::new(1));

        let opened = engagements
            .detect(&mut sides.forces, 5, &mut notes)
            .unwrap();
        assert!(opened.is_empty());
        let battle = engagements.battle_at(LocationId::new(1)).unwrap();
        assert_eq!(battle.side_of(relief), Some(BattleSide::Defender));
        assert_eq!(notes.of_category(NotificationCategory::Allegiance).count(), 1);
    }

    #[test]
    fn test_dead_battles_are_dropped() {
        let mut sides = hostile_pair();
        raise(&mut sides.forces, sides.attacker_levy, &sample_class(), 2);
        raise(&mut sides.forces, sides.defender_levy, &sample_class(), 2);

        let mut engagements = Engagements::new(BattleConfig {
            undead_turns: 1,
            ..BattleConfig::default()
        });
        let mut notes = RecordingNotifications::new();
        let mut rng = WorldRng::new(4);
        let mut history = BattleHistory::new();
        let mut metrics = BattleMetrics::default();

        engagements
            .detect(&mut sides.forces, 0, &mut notes)
            .unwrap();
        engagements
            .retreat(sides.defender_fleet, &mut sides.forces)
            .unwrap();

        let mut dropped = Vec::new();
        for now in 0..=10 {
            let mut ctx = BattleContext::new(now, &mut rng, &mut notes, &mut history, &mut metrics);
            dropped.extend(engagements.tick(&mut sides.forces, &mut ctx).unwrap());
        }
        assert_eq!(dropped.len(), 1);
        assert!(engagements.is_empty());
        assert_eq!(history.len(), 1);
        assert!(sides.forces.fleets().all(|f| f.engaged().is_none()));
    }
}
