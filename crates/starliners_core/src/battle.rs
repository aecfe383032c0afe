//! The turn driver of a battle between two sides.
//!
//! A [`Battle`] owns two [`BattleGrid`]s and the rosters of fleets fighting
//! on each side. It is ticked once per game tick and runs a combat turn on
//! every `ticks_per_turn` boundary:
//!
//! 1. Verify: drop depleted levies, withdraw fleets that are dead or empty
//! 2. Cleanup: remove last turn's wrecks
//! 3. Fire: both grids produce salvos
//! 4. Damage: each side's salvos hit the other grid, loot is paid out
//! 5. Support: both grids repair themselves
//! 6. Verify again
//! 7. Reinforce: each grid draws from its own side's fleets
//! 8. Resolve: an empty roster ends the battle
//!
//! Once resolved the battle lingers for `undead_turns` turns so the outcome
//! can still be shown, then archives its report, disengages what is left and
//! flags itself dead.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::effects::{Effect, Salvo};
use crate::error::{GameError, Result};
use crate::factions::{FactionId, Relation};
use crate::forces::{FleetId, Forces, LevyId, LocationId};
use crate::grid::{BattleGrid, Departures};
use crate::metrics::BattleMetrics;
use crate::notifications::{Notification, NotificationCategory, NotificationSink};
use crate::random::WorldRng;
use crate::report::{BattleReport, HistoryArchive};
use crate::ship::{Deployment, ShipInstance};

/// Unique identifier for battles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BattleId(pub u64);

impl BattleId {
    /// Create a new battle ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battle#{}", self.0)
    }
}

/// One of the two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattleSide {
    /// The side that opened the battle.
    Attacker,
    /// The side that was attacked.
    Defender,
}

impl BattleSide {
    /// Both sides, attacker first.
    pub const ALL: [Self; 2] = [Self::Attacker, Self::Defender];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

impl fmt::Display for BattleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => write!(f, "attacker"),
            Self::Defender => write!(f, "defender"),
        }
    }
}

/// Outcome of a battle. [`BattleResolution::None`] is the only open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattleResolution {
    /// Still being fought.
    #[default]
    None,
    /// Both sides were emptied on the same turn.
    Draw,
    /// The defenders are gone.
    VictoryAttacker,
    /// The attackers are gone.
    VictoryDefender,
}

impl BattleResolution {
    /// Outcome for the given roster states.
    #[must_use]
    pub const fn from_rosters(attackers_empty: bool, defenders_empty: bool) -> Self {
        match (attackers_empty, defenders_empty) {
            (false, false) => Self::None,
            (false, true) => Self::VictoryAttacker,
            (true, false) => Self::VictoryDefender,
            (true, true) => Self::Draw,
        }
    }

    /// Check if the battle is over.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Winning side, if there is one.
    #[must_use]
    pub const fn winner(self) -> Option<BattleSide> {
        match self {
            Self::VictoryAttacker => Some(BattleSide::Attacker),
            Self::VictoryDefender => Some(BattleSide::Defender),
            Self::None | Self::Draw => None,
        }
    }
}

/// Tunables of the battle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Game ticks per combat turn.
    pub ticks_per_turn: u64,
    /// Most ships a grid takes in per turn.
    pub max_reinforcements_per_turn: usize,
    /// Turns a resolved battle lingers before it is removed.
    pub undead_turns: u32,
}

impl BattleConfig {
    /// Default game ticks per combat turn.
    pub const DEFAULT_TICKS_PER_TURN: u64 = 5;
    /// Default reinforcement cap per turn.
    pub const DEFAULT_MAX_REINFORCEMENTS: usize = 4;
    /// Default lingering time after resolution.
    pub const DEFAULT_UNDEAD_TURNS: u32 = 20;
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            ticks_per_turn: Self::DEFAULT_TICKS_PER_TURN,
            max_reinforcements_per_turn: Self::DEFAULT_MAX_REINFORCEMENTS,
            undead_turns: Self::DEFAULT_UNDEAD_TURNS,
        }
    }
}

/// Everything a battle borrows from its surroundings for one tick.
pub struct BattleContext<'a> {
    /// Current game tick.
    pub now: u64,
    /// World random source.
    pub rng: &'a mut WorldRng,
    /// Receiver of outcome notifications.
    pub notifications: &'a mut dyn NotificationSink,
    /// Receiver of finished reports.
    pub history: &'a mut dyn HistoryArchive,
    /// Counters.
    pub metrics: &'a mut BattleMetrics,
}

impl<'a> BattleContext<'a> {
    /// Bundle the collaborators for one tick.
    pub fn new(
        now: u64,
        rng: &'a mut WorldRng,
        notifications: &'a mut dyn NotificationSink,
        history: &'a mut dyn HistoryArchive,
        metrics: &'a mut BattleMetrics,
    ) -> Self {
        Self {
            now,
            rng,
            notifications,
            history,
            metrics,
        }
    }
}

/// A battle between two groups of fleets at one location.
#[derive(Debug, Clone)]
pub struct Battle {
    id: BattleId,
    location: LocationId,
    config: BattleConfig,
    attacker: BattleGrid,
    defender: BattleGrid,
    attackers: Vec<FleetId>,
    defenders: Vec<FleetId>,
    attacking_factions: BTreeSet<FactionId>,
    defending_factions: BTreeSet<FactionId>,
    turn: u32,
    resolution: BattleResolution,
    undead: u32,
    dead: bool,
    report: BattleReport,
}

impl Battle {
    /// Open a battle between two fleets.
    ///
    /// # Errors
    /// Fails when either fleet is unknown or both are the same fleet.
    pub fn new(
        id: BattleId,
        location: LocationId,
        attacker: FleetId,
        defender: FleetId,
        forces: &mut Forces,
        now: u64,
        config: BattleConfig,
    ) -> Result<Self> {
        if attacker == defender {
            return Err(GameError::InvalidState(format!(
                "{attacker} cannot fight itself"
            )));
        }
        let mut battle = Self {
            id,
            location,
            config,
            attacker: BattleGrid::new(BattleSide::Attacker),
            defender: BattleGrid::new(BattleSide::Defender),
            attackers: Vec::new(),
            defenders: Vec::new(),
            attacking_factions: BTreeSet::new(),
            defending_factions: BTreeSet::new(),
            turn: 0,
            resolution: BattleResolution::None,
            undead: 0,
            dead: false,
            report: BattleReport::new(id, location, now),
        };
        battle.join_attacker(attacker, forces)?;
        battle.join_defender(defender, forces)?;
        info!(battle = %id, %location, %attacker, %defender, "Battle opened");
        Ok(battle)
    }

    /// Battle identifier.
    #[must_use]
    pub const fn id(&self) -> BattleId {
        self.id
    }

    /// Where the battle is fought.
    #[must_use]
    pub const fn location(&self) -> LocationId {
        self.location
    }

    /// Driver tunables.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Grid of one side.
    #[must_use]
    pub const fn grid(&self, side: BattleSide) -> &BattleGrid {
        match side {
            BattleSide::Attacker => &self.attacker,
            BattleSide::Defender => &self.defender,
        }
    }

    fn grid_mut(&mut self, side: BattleSide) -> &mut BattleGrid {
        match side {
            BattleSide::Attacker => &mut self.attacker,
            BattleSide::Defender => &mut self.defender,
        }
    }

    /// Fleets fighting on one side.
    #[must_use]
    pub fn roster(&self, side: BattleSide) -> &[FleetId] {
        match side {
            BattleSide::Attacker => &self.attackers,
            BattleSide::Defender => &self.defenders,
        }
    }

    fn roster_mut(&mut self, side: BattleSide) -> &mut Vec<FleetId> {
        match side {
            BattleSide::Attacker => &mut self.attackers,
            BattleSide::Defender => &mut self.defenders,
        }
    }

    /// Factions that have fought on one side.
    #[must_use]
    pub const fn factions(&self, side: BattleSide) -> &BTreeSet<FactionId> {
        match side {
            BattleSide::Attacker => &self.attacking_factions,
            BattleSide::Defender => &self.defending_factions,
        }
    }

    /// Combat turns fought so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current outcome.
    #[must_use]
    pub const fn resolution(&self) -> BattleResolution {
        self.resolution
    }

    /// Check if the battle has finished lingering and can be dropped.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Statistics so far.
    #[must_use]
    pub const fn report(&self) -> &BattleReport {
        &self.report
    }

    /// Check if a fleet is on either roster.
    #[must_use]
    pub fn is_participant(&self, fleet: FleetId) -> bool {
        self.side_of(fleet).is_some()
    }

    /// Side a fleet fights on.
    #[must_use]
    pub fn side_of(&self, fleet: FleetId) -> Option<BattleSide> {
        BattleSide::ALL
            .into_iter()
            .find(|&side| self.roster(side).contains(&fleet))
    }

    /// Add a fleet to the attackers. Returns `false` if it already takes part.
    pub fn join_attacker(&mut self, fleet: FleetId, forces: &mut Forces) -> Result<bool> {
        self.join(BattleSide::Attacker, fleet, forces)
    }

    /// Add a fleet to the defenders. Returns `false` if it already takes part.
    pub fn join_defender(&mut self, fleet: FleetId, forces: &mut Forces) -> Result<bool> {
        self.join(BattleSide::Defender, fleet, forces)
    }

    fn join(&mut self, side: BattleSide, fleet: FleetId, forces: &mut Forces) -> Result<bool> {
        if self.is_participant(fleet) {
            return Ok(false);
        }
        let entry = forces
            .fleet_mut(fleet)
            .ok_or(GameError::FleetNotFound(fleet))?;
        entry.set_engaged(Some(self.id));
        let owner = entry.owner();

        self.roster_mut(side).push(fleet);
        match side {
            BattleSide::Attacker => self.attacking_factions.insert(owner),
            BattleSide::Defender => self.defending_factions.insert(owner),
        };
        let report = self.report.side_mut(side);
        report.factions.insert(owner);
        report.fleets.insert(fleet);

        debug!(battle = %self.id, %fleet, %side, faction = %owner, "Fleet joined");
        Ok(true)
    }

    /// Side a faction would fight on: allied with every faction of that side
    /// and hostile to every faction of the other.
    #[must_use]
    pub fn determine_allied(&self, faction: FactionId, forces: &Forces) -> Option<BattleSide> {
        let all = |factions: &BTreeSet<FactionId>, relation: Relation| {
            !factions.is_empty() && factions.iter().all(|&f| forces.relation(faction, f) == relation)
        };
        BattleSide::ALL.into_iter().find(|&side| {
            all(self.factions(side), Relation::Allied)
                && all(self.factions(side.opponent()), Relation::Hostile)
        })
    }

    /// Let a fleet arriving at the location join the side it is allied with.
    ///
    /// Fleets that fit neither side, dead fleets, and any fleet once the
    /// battle is resolved are ignored.
    pub fn join_if_possible(
        &mut self,
        fleet: FleetId,
        forces: &mut Forces,
        notifications: &mut dyn NotificationSink,
    ) -> Result<Option<BattleSide>> {
        if self.dead || self.resolution.is_resolved() || self.is_participant(fleet) {
            return Ok(None);
        }
        let entry = forces.fleet(fleet).ok_or(GameError::FleetNotFound(fleet))?;
        if entry.is_dead() {
            return Ok(None);
        }
        let owner = entry.owner();
        let Some(side) = self.determine_allied(owner, forces) else {
            return Ok(None);
        };

        self.join(side, fleet, forces)?;
        notifications.notify(
            Notification::new(NotificationCategory::Allegiance, owner, "battle.joined")
                .with_arg(self.location)
                .with_arg(side),
        );
        Ok(Some(side))
    }

    /// Pull a fleet out of the battle. Returns `false` if it was not taking part.
    pub fn retreat_fleet(&mut self, fleet: FleetId, forces: &mut Forces) -> Result<bool> {
        let Some(side) = self.side_of(fleet) else {
            return Ok(false);
        };
        self.withdraw(side, fleet, forces)?;
        Ok(true)
    }

    /// Tear the battle down at once: every fleet retreats and the battle is
    /// flagged dead without archiving.
    pub fn dissolve(&mut self, forces: &mut Forces) -> Result<()> {
        for side in BattleSide::ALL {
            for fleet in self.roster(side).to_vec() {
                self.withdraw(side, fleet, forces)?;
            }
        }
        self.attacker.clear_effects();
        self.defender.clear_effects();
        self.dead = true;
        info!(battle = %self.id, "Battle dissolved");
        Ok(())
    }

    /// Advance the battle by one game tick.
    pub fn tick(&mut self, forces: &mut Forces, ctx: &mut BattleContext<'_>) -> Result<()> {
        if self.dead {
            return Ok(());
        }
        let period = self.config.ticks_per_turn.max(1);
        if ctx.now % period != 0 {
            return Ok(());
        }

        if self.resolution.is_resolved() {
            self.undead += 1;
            if self.undead >= self.config.undead_turns {
                self.wrap_up(forces, ctx)?;
            }
            return Ok(());
        }

        self.run_turn(forces, ctx, period)?;

        #[cfg(feature = "debug-validation")]
        self.validate(forces)?;

        Ok(())
    }

    fn run_turn(
        &mut self,
        forces: &mut Forces,
        ctx: &mut BattleContext<'_>,
        period: u64,
    ) -> Result<()> {
        self.turn += 1;
        ctx.metrics.turns += 1;
        let now = ctx.now;
        debug!(battle = %self.id, turn = self.turn, tick = now, "Combat turn");

        self.verify(forces, ctx.metrics)?;

        for side in BattleSide::ALL {
            let removed = self.grid_mut(side).cleanup_hulks(forces)?;
            ctx.metrics.ships_destroyed += removed.len() as u64;
            self.record_losses(side, &removed);
        }

        for side in BattleSide::ALL {
            let fired = self.grid_mut(side).fire(forces, now, period, ctx.rng)?;
            ctx.metrics.salvos_fired += fired as u64;
        }

        for side in BattleSide::ALL {
            self.exchange_fire(side, forces, ctx)?;
        }

        for side in BattleSide::ALL {
            let applied = self.grid_mut(side).do_support(forces, now, period, ctx.rng)?;
            ctx.metrics.regens_applied += applied as u64;
            self.record_repairs(side, forces);
        }

        self.verify(forces, ctx.metrics)?;

        for side in BattleSide::ALL {
            let supply = self.roster(side).to_vec();
            let max = self.config.max_reinforcements_per_turn;
            let outcome = self
                .grid_mut(side)
                .reenforce(&supply, forces, now, max, ctx.rng)?;
            ctx.metrics.ships_reinforced += outcome.placed.len() as u64;
            let report = self.report.side_mut(side);
            for (_, handle) in &outcome.placed {
                if let Some(ship) = forces.ship(*handle) {
                    report.ship_mut(&ship.class().id).deployed += 1;
                }
            }
            debug!(
                battle = %self.id,
                %side,
                placed = outcome.placed.len(),
                queued = outcome.queued.len(),
                "Reinforcements"
            );
        }

        let resolution =
            BattleResolution::from_rosters(self.attackers.is_empty(), self.defenders.is_empty());
        if resolution.is_resolved() {
            self.resolve(resolution, ctx);
        }
        Ok(())
    }

    /// Drop depleted levies and withdraw fleets that are dead or left empty.
    fn verify(&mut self, forces: &mut Forces, metrics: &mut BattleMetrics) -> Result<()> {
        for side in BattleSide::ALL {
            for fleet_id in self.roster(side).to_vec() {
                let fleet = forces
                    .fleet(fleet_id)
                    .ok_or(GameError::FleetNotFound(fleet_id))?;
                let depleted: Vec<LevyId> = fleet
                    .levies()
                    .iter()
                    .copied()
                    .filter(|&levy| forces.levy(levy).map_or(true, |l| l.is_depleted()))
                    .collect();

                let fleet = forces
                    .fleet_mut(fleet_id)
                    .ok_or(GameError::FleetNotFound(fleet_id))?;
                if !depleted.is_empty() {
                    fleet.retain_levies(|levy| !depleted.contains(levy));
                    debug!(battle = %self.id, fleet = %fleet_id, depleted = depleted.len(), "Depleted levies dropped");
                }
                if fleet.levies().is_empty() && !fleet.is_dead() {
                    fleet.mark_dead();
                }
                if fleet.is_dead() {
                    let departures = self.withdraw(side, fleet_id, forces)?;
                    metrics.ships_retreated += departures.retreated.len() as u64;
                    metrics.ships_destroyed += departures.destroyed.len() as u64;
                }
            }
        }
        Ok(())
    }

    fn withdraw(&mut self, side: BattleSide, fleet: FleetId, forces: &mut Forces) -> Result<Departures> {
        self.roster_mut(side).retain(|&f| f != fleet);
        let levies = forces
            .fleet(fleet)
            .ok_or(GameError::FleetNotFound(fleet))?
            .levies()
            .to_vec();

        let mut departures = Departures::default();
        for grid_side in BattleSide::ALL {
            let recalled = self.grid_mut(grid_side).recall_levies(&levies, forces)?;
            departures.retreated.extend(recalled.retreated);
            departures.destroyed.extend(recalled.destroyed);
        }

        let report = self.report.side_mut(side);
        for handle in &departures.retreated {
            if let Some(ship) = forces.ship(*handle) {
                report.ship_mut(&ship.class().id).retreated += 1;
            }
        }
        self.record_losses(side, &departures.destroyed);

        if let Some(entry) = forces.fleet_mut(fleet) {
            entry.set_engaged(None);
        }
        info!(
            battle = %self.id,
            %fleet,
            %side,
            retreated = departures.retreated.len(),
            lost = departures.destroyed.len(),
            "Fleet withdrawn"
        );
        Ok(departures)
    }

    fn record_losses(&mut self, side: BattleSide, removed: &[ShipInstance]) {
        let report = self.report.side_mut(side);
        for ship in removed {
            report.ship_mut(&ship.class().id).destroyed += 1;
        }
    }

    /// Apply one side's salvos to the opposing grid, tally them and pay out loot.
    fn exchange_fire(
        &mut self,
        side: BattleSide,
        forces: &mut Forces,
        ctx: &mut BattleContext<'_>,
    ) -> Result<()> {
        let mut salvos = self.grid_mut(side).take_salvos();
        let landed = self
            .grid_mut(side.opponent())
            .receive_fire(&mut salvos, forces, ctx.rng)?;
        ctx.metrics.salvos_landed += landed as u64;
        ctx.metrics.salvos_dropped += (salvos.len() - landed) as u64;

        self.record_salvos(side, &salvos, forces);
        distribute_loot(&salvos, forces);

        self.grid_mut(side).restore_salvos(salvos);
        Ok(())
    }

    fn record_salvos(&mut self, side: BattleSide, salvos: &[Salvo], forces: &Forces) {
        for salvo in salvos {
            let (Some(report), Some(target)) = (salvo.report, salvo.target_ship) else {
                continue;
            };
            if let Some(shooter) = forces.ship(salvo.shooter) {
                let entry = self.report.side_mut(side).ship_mut(&shooter.class().id);
                entry.damage_dealt += points(report.total_damage());
                if report.final_hit {
                    entry.kills += 1;
                    entry.loot += u64::from(salvo.loot);
                }
            }
            if let Some(target) = forces.ship(target) {
                let entry = self
                    .report
                    .side_mut(side.opponent())
                    .ship_mut(&target.class().id);
                entry.damage_taken += points(report.total_damage());
                entry.damage_resisted += points(report.total_resisted());
            }
        }
    }

    fn record_repairs(&mut self, side: BattleSide, forces: &Forces) {
        let grid = match side {
            BattleSide::Attacker => &self.attacker,
            BattleSide::Defender => &self.defender,
        };
        let report = match side {
            BattleSide::Attacker => &mut self.report.attacker,
            BattleSide::Defender => &mut self.report.defender,
        };
        for regen in grid.regens().iter().filter(|r| r.applied > 0) {
            if let Some(source) = forces.ship(regen.source) {
                report.ship_mut(&source.class().id).repairs += points(regen.applied);
            }
        }
    }

    fn resolve(&mut self, resolution: BattleResolution, ctx: &mut BattleContext<'_>) {
        self.resolution = resolution;
        self.report.finalize(resolution, self.turn, ctx.now);
        ctx.metrics.battles_resolved += 1;
        info!(battle = %self.id, ?resolution, turns = self.turn, "Battle resolved");

        let mut send = |category, faction, key: &str| {
            ctx.notifications
                .notify(Notification::new(category, faction, key).with_arg(self.location));
        };
        match resolution.winner() {
            Some(winner) => {
                for &faction in self.factions(winner) {
                    send(NotificationCategory::Victory, faction, "battle.victory");
                }
                for &faction in self.factions(winner.opponent()) {
                    send(NotificationCategory::Defeat, faction, "battle.defeat");
                }
            }
            None => {
                for &faction in self.attacking_factions.union(&self.defending_factions) {
                    send(NotificationCategory::Draw, faction, "battle.draw");
                }
            }
        }
    }

    fn wrap_up(&mut self, forces: &mut Forces, ctx: &mut BattleContext<'_>) -> Result<()> {
        for side in BattleSide::ALL {
            for fleet in self.roster(side).to_vec() {
                let departures = self.withdraw(side, fleet, forces)?;
                ctx.metrics.ships_retreated += departures.retreated.len() as u64;
                ctx.metrics.ships_destroyed += departures.destroyed.len() as u64;
            }
        }
        self.attacker.clear_effects();
        self.defender.clear_effects();
        ctx.history.archive(self.report.clone());
        self.dead = true;
        info!(battle = %self.id, "Battle archived");
        Ok(())
    }

    /// Salvos and repairs whose timestamp falls on `tick`.
    #[must_use]
    pub fn effects_at(&self, tick: u64) -> Vec<Effect<'_>> {
        let salvos = self
            .attacker
            .salvos()
            .iter()
            .chain(self.defender.salvos())
            .filter(|s| s.timestamp == tick)
            .map(Effect::Salvo);
        let regens = self
            .attacker
            .regens()
            .iter()
            .chain(self.defender.regens())
            .filter(|r| r.timestamp == tick)
            .map(Effect::Regen);
        salvos.chain(regens).collect()
    }

    /// Hash of the battle state, for desync and determinism checks.
    ///
    /// Two battles driven through identical inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self, forces: &Forces) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.id.hash(&mut hasher);
        self.turn.hash(&mut hasher);
        self.resolution.hash(&mut hasher);
        self.undead.hash(&mut hasher);
        self.dead.hash(&mut hasher);
        self.attackers.hash(&mut hasher);
        self.defenders.hash(&mut hasher);

        for grid in [&self.attacker, &self.defender] {
            for (slot, handle) in grid.occupied() {
                slot.hash(&mut hasher);
                handle.hash(&mut hasher);
                if let Some(ship) = forces.ship(handle) {
                    ship.layers().hash(&mut hasher);
                    ship.experience().hash(&mut hasher);
                    ship.state().hash(&mut hasher);
                }
            }
            for pending in grid.pending() {
                pending.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Check the structural invariants of the battle.
    ///
    /// # Errors
    /// [`GameError::InvalidState`] naming the first violation found.
    pub fn validate(&self, forces: &Forces) -> Result<()> {
        if let Some(fleet) = self.attackers.iter().find(|f| self.defenders.contains(f)) {
            return Err(GameError::InvalidState(format!(
                "{fleet} is on both sides of {}",
                self.id
            )));
        }

        let mut seen = BTreeSet::new();
        for side in BattleSide::ALL {
            let grid = self.grid(side);
            if grid.ship_count() > grid.max_count() {
                return Err(GameError::InvalidState(format!(
                    "{side} grid of {} holds {} ships",
                    self.id,
                    grid.ship_count()
                )));
            }
            for (slot, handle) in grid.occupied() {
                if !seen.insert(handle) {
                    return Err(GameError::InvalidState(format!(
                        "{} occupies more than one slot",
                        handle.ship
                    )));
                }
                let ship = forces.require_ship(handle)?;
                if ship.deployment() != (Deployment::Deployed { side, slot }) {
                    return Err(GameError::InvalidState(format!(
                        "{} in {side} slot {slot} has deployment {:?}",
                        handle.ship,
                        ship.deployment()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn distribute_loot(salvos: &[Salvo], forces: &mut Forces) {
    for salvo in salvos.iter().filter(|s| s.loot > 0) {
        if let Some(shooter) = forces.ship_mut(salvo.shooter) {
            shooter.gain_experience(salvo.loot);
        }
        let owner = forces.owner_of(salvo.shooter.levy);
        if let Some(faction) = owner.and_then(|owner| forces.faction_mut(owner)) {
            faction.score += u64::from(salvo.loot);
        }
    }
}

fn points(value: i32) -> u64 {
    value.max(0) as u64
}
