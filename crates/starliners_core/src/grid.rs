//! One side's positional combat grid.
//!
//! A [`BattleGrid`] has [`GRID_CAPACITY`] slots laid out in [`GRID_COLUMNS`]
//! columns. Slots hold [`ShipRef`] handles; the ships themselves stay in
//! their levies. Target selection favours higher columns: a column with
//! `count` live ships at index `i` weighs `(i + 1) * count`.
//!
//! Reinforcement is two-phase. A ship picked from the supply fleets is first
//! queued as a [`PendingShip`] and only takes a slot on the following turn.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::battle::BattleSide;
use crate::damage::{DamageKind, Layer};
use crate::effects::{Regen, Salvo};
use crate::error::{GameError, Result};
use crate::forces::{FleetId, Forces, LevyId, ShipRef};
use crate::random::WorldRng;
use crate::ship::{Deployment, ShipInstance, ShipSize};

/// Number of slots in a grid.
pub const GRID_CAPACITY: usize = 45;

/// Number of targeting columns.
pub const GRID_COLUMNS: usize = 5;

/// Column of every slot. Slots are laid out row by row.
pub const COLUMN_MAP: [usize; GRID_CAPACITY] = column_map();

const fn column_map() -> [usize; GRID_CAPACITY] {
    let mut map = [0; GRID_CAPACITY];
    let mut slot = 0;
    while slot < GRID_CAPACITY {
        map[slot] = slot % GRID_COLUMNS;
        slot += 1;
    }
    map
}

/// Column weights for target selection, stored as a cumulative array.
///
/// Drawing an index below [`total`](Self::total) and mapping it through the
/// cumulative bounds selects a column with probability proportional to its
/// weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetDistribution {
    cumulative: [usize; GRID_COLUMNS],
}

impl TargetDistribution {
    /// Build from live ship counts per column.
    #[must_use]
    pub fn from_counts(counts: [usize; GRID_COLUMNS]) -> Self {
        let mut cumulative = [0; GRID_COLUMNS];
        let mut total = 0;
        for (column, count) in counts.iter().enumerate() {
            total += (column + 1) * count;
            cumulative[column] = total;
        }
        Self { cumulative }
    }

    /// Build from the slots of live ships.
    #[must_use]
    pub fn from_slots(slots: impl IntoIterator<Item = usize>) -> Self {
        let mut counts = [0; GRID_COLUMNS];
        for slot in slots {
            counts[COLUMN_MAP[slot]] += 1;
        }
        Self::from_counts(counts)
    }

    /// Sum of all column weights.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.cumulative[GRID_COLUMNS - 1]
    }

    /// Weight of one column.
    #[must_use]
    pub fn weight(&self, column: usize) -> usize {
        match column {
            0 => self.cumulative[0],
            c if c < GRID_COLUMNS => self.cumulative[c] - self.cumulative[c - 1],
            _ => 0,
        }
    }

    /// Column owning a drawn index.
    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<usize> {
        self.cumulative.iter().position(|&end| index < end)
    }

    /// Draw a column, `None` when nothing can be targeted.
    pub fn pick(&self, rng: &mut WorldRng) -> Option<usize> {
        if self.total() == 0 {
            return None;
        }
        self.column_at(rng.below(self.total()))
    }
}

/// A reinforcement selected on one turn and placed on a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingShip {
    /// Queued ship.
    pub ship: ShipRef,
    /// Tick at which it was queued.
    pub queued_at: u64,
}

/// What one call to [`BattleGrid::reenforce`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reinforcement {
    /// Ships placed into slots this turn.
    pub placed: Vec<(usize, ShipRef)>,
    /// Ships newly queued for the next turn.
    pub queued: Vec<ShipRef>,
    /// Queue entries that no longer pointed at a deployable ship.
    pub dropped: usize,
}

/// Ships taken off a grid.
#[derive(Debug, Clone, Default)]
pub struct Departures {
    /// Intact ships returned to their levy's reserve.
    pub retreated: Vec<ShipRef>,
    /// Wrecks removed from their levy.
    pub destroyed: Vec<ShipInstance>,
}

impl Departures {
    /// Check if nothing left the grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retreated.is_empty() && self.destroyed.is_empty()
    }
}

/// Fixed-capacity grid of one side's deployed ships.
#[derive(Debug, Clone)]
pub struct BattleGrid {
    side: BattleSide,
    slots: [Option<ShipRef>; GRID_CAPACITY],
    salvos: Vec<Salvo>,
    regens: Vec<Regen>,
    pending: VecDeque<PendingShip>,
}

impl BattleGrid {
    /// Create an empty grid for one side.
    #[must_use]
    pub fn new(side: BattleSide) -> Self {
        Self {
            side,
            slots: [None; GRID_CAPACITY],
            salvos: Vec::new(),
            regens: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Side this grid belongs to.
    #[must_use]
    pub const fn side(&self) -> BattleSide {
        self.side
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn ship_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Slot capacity.
    #[must_use]
    pub const fn max_count(&self) -> usize {
        GRID_CAPACITY
    }

    /// Check if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupant of a slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<ShipRef> {
        self.slots.get(index).copied().flatten()
    }

    /// Occupied slots in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, ShipRef)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, handle)| handle.map(|handle| (slot, handle)))
    }

    /// Check if a ship holds a slot here.
    #[must_use]
    pub fn contains(&self, handle: ShipRef) -> bool {
        self.slots.contains(&Some(handle))
    }

    /// Salvos fired by this grid on its last turn.
    #[must_use]
    pub fn salvos(&self) -> &[Salvo] {
        &self.salvos
    }

    /// Repairs made by this grid on its last turn.
    #[must_use]
    pub fn regens(&self) -> &[Regen] {
        &self.regens
    }

    /// Reinforcements waiting for a slot, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingShip> {
        self.pending.iter()
    }

    /// Number of queued reinforcements.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Occupied slots whose ship is still intact.
    pub fn live_ships(&self, forces: &Forces) -> Result<Vec<(usize, ShipRef)>> {
        let mut live = Vec::with_capacity(GRID_CAPACITY);
        for (slot, handle) in self.occupied() {
            if !forces.require_ship(handle)?.is_wreck() {
                live.push((slot, handle));
            }
        }
        Ok(live)
    }

    /// Place a ship into the first empty slot.
    ///
    /// # Errors
    /// [`GameError::GridFull`] when no slot is free,
    /// [`GameError::AlreadyDeployed`] when the ship holds a slot already.
    pub fn push(&mut self, handle: ShipRef, forces: &mut Forces, now: u64) -> Result<usize> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(GameError::GridFull {
                capacity: GRID_CAPACITY,
            })?;
        let ship = forces.require_ship_mut(handle)?;
        if matches!(ship.deployment(), Deployment::Deployed { .. }) {
            return Err(GameError::AlreadyDeployed(handle.ship));
        }
        ship.mark_joined(self.side, slot, now);
        self.slots[slot] = Some(handle);
        Ok(slot)
    }

    /// Produce this turn's salvos: one per ship per damage kind with firepower.
    ///
    /// Timestamps are spread over `[now, now + timespan)`.
    pub fn fire(
        &mut self,
        forces: &Forces,
        now: u64,
        timespan: u64,
        rng: &mut WorldRng,
    ) -> Result<usize> {
        self.salvos.clear();
        let shooters: Vec<_> = self.occupied().collect();
        for (slot, handle) in shooters {
            let ship = forces.require_ship(handle)?;
            let colour = forces
                .owner_of(handle.levy)
                .and_then(|owner| forces.faction(owner))
                .map(|faction| faction.weapon_colour)
                .unwrap_or_default();
            for kind in DamageKind::ALL {
                let volley = ship.fire(kind);
                if volley.damage == 0 {
                    continue;
                }
                let timestamp = rng.within(now, timespan);
                self.salvos
                    .push(Salvo::new(timestamp, slot, handle, volley, colour));
            }
        }
        trace!(side = ?self.side, salvos = self.salvos.len(), "Grid fired");
        Ok(self.salvos.len())
    }

    /// Apply the opposing grid's salvos to this grid's ships.
    ///
    /// Each salvo picks a weighted column, then a uniform live ship within
    /// it. A destroyed ship leaves the candidate list at once and the
    /// weights are rebuilt. Once no candidate is left the remaining salvos
    /// are dropped untouched. Returns the number of salvos that landed.
    pub fn receive_fire(
        &mut self,
        incoming: &mut [Salvo],
        forces: &mut Forces,
        rng: &mut WorldRng,
    ) -> Result<usize> {
        let mut candidates = self.live_ships(forces)?;
        let mut distribution = TargetDistribution::from_slots(candidates.iter().map(|c| c.0));
        let mut landed = 0;

        for salvo in incoming.iter_mut() {
            let Some(column) = distribution.pick(rng) else {
                break;
            };
            let in_column: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, (slot, _))| COLUMN_MAP[*slot] == column)
                .map(|(index, _)| index)
                .collect();
            let index = in_column[rng.below(in_column.len())];
            let (slot, handle) = candidates[index];

            let ship = forces.require_ship_mut(handle)?;
            let report = ship.absorb_volley(&salvo.volley, rng);
            salvo.target = Some(slot);
            salvo.target_ship = Some(handle);
            salvo.report = Some(report);
            landed += 1;

            if report.final_hit {
                salvo.loot = ship.class().loot_value();
                trace!(side = ?self.side, slot, ship = %handle.ship, "Ship destroyed");
                candidates.remove(index);
                distribution = TargetDistribution::from_slots(candidates.iter().map(|c| c.0));
            }
        }

        if landed < incoming.len() {
            trace!(
                side = ?self.side,
                dropped = incoming.len() - landed,
                "No targets left, salvos dropped"
            );
        }
        Ok(landed)
    }

    /// Repair this grid's own ships.
    ///
    /// Every live ship offers one repair per layer it supports. Each repair
    /// goes to a random live ship missing health on that layer, or is
    /// discarded when there is none. Returns the number of repairs applied.
    pub fn do_support(
        &mut self,
        forces: &mut Forces,
        now: u64,
        timespan: u64,
        rng: &mut WorldRng,
    ) -> Result<usize> {
        self.regens.clear();
        let live = self.live_ships(forces)?;
        for &(slot, handle) in &live {
            let ship = forces.require_ship(handle)?;
            for layer in Layer::ALL {
                let amount = ship.support(layer);
                if amount > 0 {
                    let timestamp = rng.within(now, timespan);
                    self.regens
                        .push(Regen::new(timestamp, slot, handle, layer, amount));
                }
            }
        }

        let mut applied = 0;
        for regen in &mut self.regens {
            let mut damaged = Vec::new();
            for &(slot, handle) in &live {
                if forces.require_ship(handle)?.requires_healing(regen.layer) > 0 {
                    damaged.push((slot, handle));
                }
            }
            if damaged.is_empty() {
                continue;
            }
            let (slot, handle) = damaged[rng.below(damaged.len())];
            regen.applied = forces
                .require_ship_mut(handle)?
                .apply_healing(regen.layer, regen.amount);
            regen.target = Some(slot);
            regen.target_ship = Some(handle);
            applied += 1;
        }
        Ok(applied)
    }

    /// Pull reinforcements from the supply fleets.
    ///
    /// At most `max_per_turn` ships, and never more than the free slots.
    /// Queued ships are placed first. The rest of the budget selects new
    /// ships by a random size among those the supply can still provide and
    /// queues them for the next turn.
    pub fn reenforce(
        &mut self,
        supply: &[FleetId],
        forces: &mut Forces,
        now: u64,
        max_per_turn: usize,
        rng: &mut WorldRng,
    ) -> Result<Reinforcement> {
        let mut outcome = Reinforcement::default();
        let available = GRID_CAPACITY.saturating_sub(self.ship_count());
        if available == 0 {
            return Ok(outcome);
        }
        let cap = max_per_turn.min(available);

        while outcome.placed.len() < cap {
            let Some(pending) = self.pending.pop_front() else {
                break;
            };
            let deployable = forces.ship(pending.ship).is_some_and(|ship| {
                ship.deployment() == Deployment::Queued(self.side) && !ship.is_wreck()
            });
            if !deployable {
                warn!(
                    side = ?self.side,
                    ship = %pending.ship.ship,
                    queued_at = pending.queued_at,
                    "Dropping stale reinforcement"
                );
                outcome.dropped += 1;
                continue;
            }
            let slot = self.push(pending.ship, forces, now)?;
            outcome.placed.push((slot, pending.ship));
        }

        for _ in outcome.placed.len()..cap {
            let sizes = available_sizes(supply, forces);
            if sizes.is_empty() {
                break;
            }
            let size = sizes[rng.below(sizes.len())];
            let Some(handle) = find_pending(supply, forces, size) else {
                break;
            };
            forces
                .require_ship_mut(handle)?
                .set_deployment(Deployment::Queued(self.side));
            self.pending.push_back(PendingShip {
                ship: handle,
                queued_at: now,
            });
            outcome.queued.push(handle);
        }

        Ok(outcome)
    }

    /// Remove every ship of a fleet from the grid and from the queue.
    pub fn recall(&mut self, fleet: FleetId, forces: &mut Forces) -> Result<Departures> {
        let levies = forces
            .fleet(fleet)
            .ok_or(GameError::FleetNotFound(fleet))?
            .levies()
            .to_vec();
        self.recall_levies(&levies, forces)
    }

    /// Remove every ship of the given levies from the grid and from the queue.
    ///
    /// Intact ships stand down to their levy's reserve. Wrecks are lost.
    pub fn recall_levies(&mut self, levies: &[LevyId], forces: &mut Forces) -> Result<Departures> {
        let mut departures = Departures::default();
        let leaving: Vec<_> = self
            .occupied()
            .filter(|(_, handle)| levies.contains(&handle.levy))
            .collect();

        for (slot, handle) in leaving {
            self.slots[slot] = None;
            let levy = forces
                .levy_mut(handle.levy)
                .ok_or(GameError::LevyNotFound(handle.levy))?;
            let wrecked = levy
                .ship(handle.ship)
                .ok_or(GameError::ShipNotFound(handle.ship))?
                .is_wreck();
            if wrecked {
                departures.destroyed.extend(levy.on_ship_lost(handle.ship));
            } else {
                levy.on_ship_stood_down(handle.ship);
                departures.retreated.push(handle);
            }
        }

        let mut unqueued = Vec::new();
        self.pending.retain(|pending| {
            let keep = !levies.contains(&pending.ship.levy);
            if !keep {
                unqueued.push(pending.ship);
            }
            keep
        });
        for handle in unqueued {
            if let Some(ship) = forces.ship_mut(handle) {
                ship.set_deployment(Deployment::Reserve);
            }
        }

        Ok(departures)
    }

    /// Clear the slots of wrecked ships and remove them from their levies.
    ///
    /// Running it again without new damage in between changes nothing.
    pub fn cleanup_hulks(&mut self, forces: &mut Forces) -> Result<Vec<ShipInstance>> {
        let mut hulks = Vec::new();
        for (slot, handle) in self.occupied() {
            if forces.require_ship(handle)?.is_wreck() {
                hulks.push((slot, handle));
            }
        }

        let mut removed = Vec::with_capacity(hulks.len());
        for (slot, handle) in hulks {
            self.slots[slot] = None;
            let levy = forces
                .levy_mut(handle.levy)
                .ok_or(GameError::LevyNotFound(handle.levy))?;
            removed.extend(levy.on_ship_lost(handle.ship));
        }
        Ok(removed)
    }

    /// Take the salvos fired this turn so they can be applied to the other grid.
    pub(crate) fn take_salvos(&mut self) -> Vec<Salvo> {
        std::mem::take(&mut self.salvos)
    }

    /// Hand resolved salvos back to the grid that fired them.
    pub(crate) fn restore_salvos(&mut self, salvos: Vec<Salvo>) {
        self.salvos = salvos;
    }

    /// Forget last turn's salvos and repairs.
    pub fn clear_effects(&mut self) {
        self.salvos.clear();
        self.regens.clear();
    }
}

/// Sizes for which some supply levy has a deployable ship, smallest first.
fn available_sizes(supply: &[FleetId], forces: &Forces) -> Vec<ShipSize> {
    ShipSize::ALL
        .into_iter()
        .filter(|&size| find_pending(supply, forces, size).is_some())
        .collect()
}

/// First deployable ship of a size, in fleet then levy order.
fn find_pending(supply: &[FleetId], forces: &Forces, size: ShipSize) -> Option<ShipRef> {
    supply
        .iter()
        .filter_map(|&id| forces.fleet(id))
        .filter(|fleet| !fleet.is_dead())
        .flat_map(|fleet| fleet.levies().iter())
        .find_map(|&levy_id| {
            forces
                .levy(levy_id)?
                .get_pending(size)
                .map(|ship| ShipRef::new(levy_id, ship))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{PerKind, PerLayer};
    use crate::testing::{class_with, hostile_pair, raise, sample_class};

    #[test]
    fn test_column_map_balanced() {
        for column in 0..GRID_COLUMNS {
            let slots = COLUMN_MAP.iter().filter(|&&c| c == column).count();
            assert_eq!(slots, GRID_CAPACITY / GRID_COLUMNS);
        }
        assert_eq!(COLUMN_MAP[0], 0);
        assert_eq!(COLUMN_MAP[4], 4);
        assert_eq!(COLUMN_MAP[5], 0);
    }

    #[test]
    fn test_distribution_weights() {
        let distribution = TargetDistribution::from_counts([1, 0, 2, 0, 1]);
        assert_eq!(distribution.weight(0), 1);
        assert_eq!(distribution.weight(1), 0);
        assert_eq!(distribution.weight(2), 6);
        assert_eq!(distribution.weight(4), 5);
        assert_eq!(distribution.total(), 12);

        assert_eq!(distribution.column_at(0), Some(0));
        assert_eq!(distribution.column_at(1), Some(2));
        assert_eq!(distribution.column_at(6), Some(2));
        assert_eq!(distribution.column_at(7), Some(4));
        assert_eq!(distribution.column_at(12), None);
    }

    #[test]
    fn test_empty_distribution_picks_nothing() {
        let mut rng = WorldRng::new(1);
        let distribution = TargetDistribution::from_slots(std::iter::empty());
        assert_eq!(distribution.pick(&mut rng), None);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_push_fills_first_empty_slot() {
        let mut sides = hostile_pair();
        let ships = raise(&mut sides.forces, sides.attacker_levy, &sample_class(), 2);
        let mut grid = BattleGrid::new(BattleSide::Attacker);

        assert_eq!(grid.push(ships[0], &mut sides.forces, 10).unwrap(), 0);
        assert_eq!(grid.push(ships[1], &mut sides.forces, 10).unwrap(), 1);
        assert_eq!(grid.ship_count(), 2);

        let ship = sides.forces.ship(ships[1]).unwrap();
        assert_eq!(
            ship.deployment(),
            Deployment::Deployed {
                side: BattleSide::Attacker,
                slot: 1
            }
        );
        assert_eq!(ship.last_joined(), Some(10));
    }

    #[test]
    fn test_push_twice_fails() {
        let mut sides = hostile_pair();
        let ships = raise(&mut sides.forces, sides.attacker_levy, &sample_class(), 1);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        grid.push(ships[0], &mut sides.forces, 0).unwrap();
        assert!(matches!(
            grid.push(ships[0], &mut sides.forces, 0),
            Err(GameError::AlreadyDeployed(_))
        ));
    }

    #[test]
    fn test_push_onto_full_grid_fails() {
        let mut sides = hostile_pair();
        let ships = raise(
            &mut sides.forces,
            sides.attacker_levy,
            &sample_class(),
            GRID_CAPACITY + 1,
        );
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        for &ship in &ships[..GRID_CAPACITY] {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }
        assert_eq!(grid.ship_count(), grid.max_count());
        assert!(matches!(
            grid.push(ships[GRID_CAPACITY], &mut sides.forces, 0),
            Err(GameError::GridFull { capacity: 45 })
        ));
    }

    #[test]
    fn test_fire_one_salvo_per_kind_with_firepower() {
        let mut sides = hostile_pair();
        let class = class_with(
            "lancer",
            ShipSize::Destroyer,
            PerKind::new(10, 5, 0),
            PerLayer::new(10, 10, 10),
            0,
            10_000,
        );
        let ships = raise(&mut sides.forces, sides.attacker_levy, &class, 2);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        for &ship in &ships {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }

        let mut rng = WorldRng::new(3);
        assert_eq!(grid.fire(&sides.forces, 100, 5, &mut rng).unwrap(), 4);
        for salvo in grid.salvos() {
            assert!((100..105).contains(&salvo.timestamp));
            assert!(salvo.volley.damage > 0);
            assert!(!salvo.landed());
        }
        assert_eq!(grid.salvos()[0].origin, 0);
        assert_eq!(grid.salvos()[2].origin, 1);
    }

    #[test]
    fn test_salvos_on_empty_grid_are_dropped() {
        let mut sides = hostile_pair();
        let class = class_with(
            "sniper",
            ShipSize::Frigate,
            PerKind::new(10, 0, 0),
            PerLayer::new(10, 10, 10),
            0,
            10_000,
        );
        let ships = raise(&mut sides.forces, sides.attacker_levy, &class, 1);
        let mut shooter = BattleGrid::new(BattleSide::Attacker);
        let mut target = BattleGrid::new(BattleSide::Defender);
        shooter.push(ships[0], &mut sides.forces, 0).unwrap();

        let mut rng = WorldRng::new(11);
        assert_eq!(shooter.fire(&sides.forces, 0, 5, &mut rng).unwrap(), 1);
        let mut salvos = shooter.take_salvos();
        let landed = target
            .receive_fire(&mut salvos, &mut sides.forces, &mut rng)
            .unwrap();
        shooter.restore_salvos(salvos);

        assert_eq!(landed, 0);
        assert!(shooter.salvos().iter().all(|s| s.report.is_none()));
        assert!(shooter.salvos().iter().all(|s| s.target.is_none()));
    }

    #[test]
    fn test_destroyed_ship_not_targeted_twice() {
        let mut sides = hostile_pair();
        let fragile = class_with(
            "drone",
            ShipSize::Frigate,
            PerKind::default(),
            PerLayer::new(0, 0, 1),
            0,
            0,
        );
        let targets = raise(&mut sides.forces, sides.defender_levy, &fragile, 3);
        let mut grid = BattleGrid::new(BattleSide::Defender);
        for &ship in &targets {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }

        let shooter = ShipRef::new(sides.attacker_levy, crate::forces::ShipId::new(999));
        let volley = crate::damage::Volley::new(DamageKind::Kinetic, 10_000, 100);
        let mut salvos: Vec<Salvo> = (0..10)
            .map(|i| Salvo::new(i, 0, shooter, volley, crate::factions::Colour::default()))
            .collect();

        let mut rng = WorldRng::new(5);
        let landed = grid
            .receive_fire(&mut salvos, &mut sides.forces, &mut rng)
            .unwrap();

        assert_eq!(landed, 3);
        let finals: Vec<_> = salvos
            .iter()
            .filter(|s| s.was_final())
            .filter_map(|s| s.target_ship)
            .collect();
        assert_eq!(finals.len(), 3);
        for target in &targets {
            assert_eq!(finals.iter().filter(|&&t| t == *target).count(), 1);
        }
        assert!(salvos.iter().filter(|s| s.was_final()).all(|s| s.loot == 10));
        assert!(salvos[3..].iter().all(|s| !s.landed()));
    }

    #[test]
    fn test_cleanup_hulks_idempotent() {
        let mut sides = hostile_pair();
        let fragile = class_with(
            "drone",
            ShipSize::Frigate,
            PerKind::default(),
            PerLayer::new(0, 0, 1),
            0,
            0,
        );
        let ships = raise(&mut sides.forces, sides.defender_levy, &fragile, 2);
        let mut grid = BattleGrid::new(BattleSide::Defender);
        for &ship in &ships {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }

        let mut rng = WorldRng::new(9);
        let volley = crate::damage::Volley::new(DamageKind::Heat, 10_000, 50);
        sides
            .forces
            .ship_mut(ships[0])
            .unwrap()
            .absorb_volley(&volley, &mut rng);

        let removed = grid.cleanup_hulks(&mut sides.forces).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), ships[0].ship);
        assert_eq!(grid.ship_count(), 1);
        assert!(sides.forces.ship(ships[0]).is_none());
        assert_eq!(sides.forces.levy(sides.defender_levy).unwrap().losses(), 1);

        let slots_before: Vec<_> = grid.occupied().collect();
        assert!(grid.cleanup_hulks(&mut sides.forces).unwrap().is_empty());
        assert_eq!(grid.occupied().collect::<Vec<_>>(), slots_before);
        assert_eq!(sides.forces.levy(sides.defender_levy).unwrap().losses(), 1);
    }

    #[test]
    fn test_first_turn_reinforcements_are_deferred() {
        let mut sides = hostile_pair();
        let class = sample_class();
        let occupants = raise(&mut sides.forces, sides.defender_levy, &class, 35);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        for &ship in &occupants {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }
        raise(&mut sides.forces, sides.attacker_levy, &class, 12);

        let mut rng = WorldRng::new(42);
        let supply = [sides.attacker_fleet];
        let first = grid
            .reenforce(&supply, &mut sides.forces, 5, 4, &mut rng)
            .unwrap();
        assert_eq!(first.queued.len(), 4);
        assert!(first.placed.is_empty());
        assert_eq!(grid.ship_count(), 35);
        assert_eq!(grid.pending_count(), 4);
        for handle in &first.queued {
            assert_eq!(
                sides.forces.ship(*handle).unwrap().deployment(),
                Deployment::Queued(BattleSide::Attacker)
            );
        }

        let second = grid
            .reenforce(&supply, &mut sides.forces, 10, 4, &mut rng)
            .unwrap();
        assert_eq!(
            second.placed.iter().map(|p| p.1).collect::<Vec<_>>(),
            first.queued
        );
        assert!(second.queued.is_empty());
        assert_eq!(grid.ship_count(), 39);
        assert_eq!(grid.pending_count(), 0);
    }

    #[test]
    fn test_reenforce_limited_by_free_slots() {
        let mut sides = hostile_pair();
        let class = sample_class();
        let occupants = raise(&mut sides.forces, sides.defender_levy, &class, 43);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        for &ship in &occupants {
            grid.push(ship, &mut sides.forces, 0).unwrap();
        }
        raise(&mut sides.forces, sides.attacker_levy, &class, 10);

        let mut rng = WorldRng::new(1);
        let supply = [sides.attacker_fleet];
        let outcome = grid
            .reenforce(&supply, &mut sides.forces, 0, 4, &mut rng)
            .unwrap();
        assert_eq!(outcome.queued.len(), 2);
    }

    #[test]
    fn test_reenforce_with_empty_supply() {
        let mut sides = hostile_pair();
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        let mut rng = WorldRng::new(1);
        let outcome = grid
            .reenforce(&[sides.attacker_fleet], &mut sides.forces, 0, 4, &mut rng)
            .unwrap();
        assert_eq!(outcome, Reinforcement::default());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_recall_retreats_and_purges_queue() {
        let mut sides = hostile_pair();
        let class = sample_class();
        let ships = raise(&mut sides.forces, sides.attacker_levy, &class, 6);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        grid.push(ships[0], &mut sides.forces, 0).unwrap();
        grid.push(ships[1], &mut sides.forces, 0).unwrap();

        let mut rng = WorldRng::new(2);
        let outcome = grid
            .reenforce(&[sides.attacker_fleet], &mut sides.forces, 0, 4, &mut rng)
            .unwrap();
        assert_eq!(outcome.queued.len(), 4);

        let departures = grid.recall(sides.attacker_fleet, &mut sides.forces).unwrap();
        assert_eq!(departures.retreated.len(), 2);
        assert!(departures.destroyed.is_empty());
        assert!(grid.is_empty());
        assert_eq!(grid.pending_count(), 0);

        let levy = sides.forces.levy(sides.attacker_levy).unwrap();
        assert_eq!(levy.standdowns(), 2);
        assert!(levy.ships().all(|ship| ship.deployment() == Deployment::Reserve));
    }

    #[test]
    fn test_recall_counts_wreck_once() {
        let mut sides = hostile_pair();
        let fragile = class_with(
            "drone",
            ShipSize::Frigate,
            PerKind::default(),
            PerLayer::new(0, 0, 1),
            0,
            0,
        );
        let ships = raise(&mut sides.forces, sides.attacker_levy, &fragile, 1);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        grid.push(ships[0], &mut sides.forces, 0).unwrap();

        let mut rng = WorldRng::new(4);
        let volley = crate::damage::Volley::new(DamageKind::Heat, 10_000, 50);
        sides
            .forces
            .ship_mut(ships[0])
            .unwrap()
            .absorb_volley(&volley, &mut rng);

        let departures = grid.recall(sides.attacker_fleet, &mut sides.forces).unwrap();
        assert!(departures.retreated.is_empty());
        assert_eq!(departures.destroyed.len(), 1);
        assert!(grid.cleanup_hulks(&mut sides.forces).unwrap().is_empty());
        assert_eq!(sides.forces.levy(sides.attacker_levy).unwrap().losses(), 1);
    }

    #[test]
    fn test_support_heals_damaged_ship() {
        let mut sides = hostile_pair();
        let medic = class_with(
            "tender",
            ShipSize::Cruiser,
            PerKind::default(),
            PerLayer::new(40, 40, 40),
            0,
            0,
        );
        let mut medic = (*medic).clone();
        medic.support = PerLayer::new(5, 0, 0);
        let medic = std::sync::Arc::new(medic);
        let ships = raise(&mut sides.forces, sides.attacker_levy, &medic, 1);
        let mut grid = BattleGrid::new(BattleSide::Attacker);
        grid.push(ships[0], &mut sides.forces, 0).unwrap();

        let mut rng = WorldRng::new(6);
        assert_eq!(grid.do_support(&mut sides.forces, 0, 5, &mut rng).unwrap(), 0);
        assert_eq!(grid.regens().len(), 1);
        assert!(!grid.regens()[0].applied_to_target());

        let volley = crate::damage::Volley::new(DamageKind::Heat, 10_000, 8);
        let report = sides
            .forces
            .ship_mut(ships[0])
            .unwrap()
            .absorb_volley(&volley, &mut rng);
        assert!(report.shield_damage > 0);

        assert_eq!(grid.do_support(&mut sides.forces, 5, 5, &mut rng).unwrap(), 1);
        let regen = grid.regens()[0];
        assert_eq!(regen.target, Some(0));
        assert_eq!(regen.applied, report.shield_damage.min(5));
    }
}
