//! Scenario loading and configuration.
//!
//! A scenario describes the factions, their standing toward each other and
//! the fleets they bring to one location. Building a scenario produces the
//! [`Forces`] registry a headless run fights over.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use starliners_core::battle::BattleConfig;
use starliners_core::error::GameError;
use starliners_core::factions::{Colour, CombatProperties, Faction, FactionId, Relation};
use starliners_core::forces::{Forces, LocationId};
use starliners_core::ship::{OriginAttributes, ShipClassRegistry};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A fleet or relation names a faction the scenario does not define.
    #[error("Scenario references unknown faction {0}")]
    UnknownFaction(u32),
    /// Building the forces failed.
    #[error(transparent)]
    Core(#[from] GameError),
}

/// A faction taking part in the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSetup {
    /// Numeric faction id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Faction-wide strengths and weaknesses.
    #[serde(default)]
    pub combat: CombatProperties,
    /// Weapon effect colour.
    #[serde(default)]
    pub colour: Colour,
    /// Factions this one fights on sight.
    #[serde(default)]
    pub hostile: Vec<u32>,
    /// Factions this one fights alongside.
    #[serde(default)]
    pub allied: Vec<u32>,
}

/// Ships of one class in a levy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipCount {
    /// Ship class id.
    pub class: String,
    /// Number of ships.
    pub count: u32,
}

impl ShipCount {
    /// Create a ship count.
    pub fn new(class: impl Into<String>, count: u32) -> Self {
        Self {
            class: class.into(),
            count,
        }
    }
}

/// A levy and the ships it starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevySetup {
    /// Levy name.
    pub name: String,
    /// Damage-kind affinities of the levy's origin.
    #[serde(default)]
    pub origin: OriginAttributes,
    /// Finished ships.
    #[serde(default)]
    pub ships: Vec<ShipCount>,
    /// Ships still under construction.
    #[serde(default)]
    pub building: Vec<ShipCount>,
}

/// A fleet at the scenario location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSetup {
    /// Fleet name.
    pub name: String,
    /// Owning faction id.
    pub faction: u32,
    /// Levies attached to the fleet.
    pub levies: Vec<LevySetup>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Location id every fleet starts at.
    #[serde(default = "default_location")]
    pub location: u64,
    /// Seed used when none is given on the command line.
    #[serde(default)]
    pub seed: u64,
    /// Tick limit for a run.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Construction progress per combat turn, in whole percent.
    #[serde(default)]
    pub construction_percent: u32,
    /// Battle tuning.
    #[serde(default)]
    pub battle: BattleConfig,
    /// Participating factions.
    pub factions: Vec<FactionSetup>,
    /// Fleets present at the start.
    pub fleets: Vec<FleetSetup>,
}

const fn default_location() -> u64 {
    1
}

const fn default_max_ticks() -> u64 {
    5_000
}

impl Default for Scenario {
    fn default() -> Self {
        Self::frontier_clash()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Two evenly matched fleets of the bundled ship classes.
    #[must_use]
    pub fn frontier_clash() -> Self {
        Self {
            name: "Frontier Clash".to_string(),
            description: "Line fleet against an escort screen with tenders".to_string(),
            location: default_location(),
            seed: 0,
            max_ticks: default_max_ticks(),
            construction_percent: 0,
            battle: BattleConfig::default(),
            factions: vec![
                FactionSetup {
                    id: 1,
                    name: "Concord".to_string(),
                    combat: CombatProperties::default(),
                    colour: Colour::rgb(80, 160, 255),
                    hostile: vec![2],
                    allied: Vec::new(),
                },
                FactionSetup {
                    id: 2,
                    name: "Hegemony".to_string(),
                    combat: CombatProperties::default(),
                    colour: Colour::rgb(255, 90, 60),
                    hostile: vec![1],
                    allied: Vec::new(),
                },
            ],
            fleets: vec![
                FleetSetup {
                    name: "Third Line".to_string(),
                    faction: 1,
                    levies: vec![LevySetup {
                        name: "Core Worlds Levy".to_string(),
                        origin: OriginAttributes::default(),
                        ships: vec![ShipCount::new("lancer", 12), ShipCount::new("bastion", 3)],
                        building: Vec::new(),
                    }],
                },
                FleetSetup {
                    name: "Raider Screen".to_string(),
                    faction: 2,
                    levies: vec![LevySetup {
                        name: "Rim Levy".to_string(),
                        origin: OriginAttributes::default(),
                        ships: vec![
                            ShipCount::new("interceptor", 24),
                            ShipCount::new("tender", 4),
                        ],
                        building: Vec::new(),
                    }],
                },
            ],
        }
    }

    /// Ship class ids the scenario refers to.
    pub fn class_ids(&self) -> impl Iterator<Item = &str> {
        self.fleets
            .iter()
            .flat_map(|fleet| &fleet.levies)
            .flat_map(|levy| levy.ships.iter().chain(&levy.building))
            .map(|count| count.class.as_str())
    }

    /// Create the factions, fleets, levies and ships the scenario describes.
    pub fn build(&self, classes: &ShipClassRegistry) -> Result<Forces, ScenarioError> {
        let known = |id: u32| self.factions.iter().any(|f| f.id == id);
        let mut forces = Forces::new();

        for setup in &self.factions {
            forces.add_faction(
                Faction::new(FactionId::new(setup.id), setup.name.clone())
                    .with_combat(setup.combat)
                    .with_colour(setup.colour),
            );
        }
        for setup in &self.factions {
            let id = FactionId::new(setup.id);
            for (others, relation) in [
                (&setup.hostile, Relation::Hostile),
                (&setup.allied, Relation::Allied),
            ] {
                for &other in others {
                    if !known(other) {
                        return Err(ScenarioError::UnknownFaction(other));
                    }
                    forces.set_relation(id, FactionId::new(other), relation);
                }
            }
        }

        let location = LocationId::new(self.location);
        for setup in &self.fleets {
            if !known(setup.faction) {
                return Err(ScenarioError::UnknownFaction(setup.faction));
            }
            let owner = FactionId::new(setup.faction);
            let fleet = forces.create_fleet(owner, setup.name.clone(), location);
            for levy_setup in &setup.levies {
                let levy = forces.create_levy(owner, levy_setup.name.clone(), levy_setup.origin);
                forces.attach_levy(fleet, levy)?;
                for count in &levy_setup.ships {
                    let class = classes.require(&count.class)?;
                    for _ in 0..count.count {
                        forces.raise_ship(levy, &class)?;
                    }
                }
                for count in &levy_setup.building {
                    let class = classes.require(&count.class)?;
                    for _ in 0..count.count {
                        forces.lay_down_ship(levy, &class)?;
                    }
                }
            }
            debug!(
                scenario = %self.name,
                %fleet,
                ships = forces.fleet_ship_count(fleet),
                "Fleet assembled"
            );
        }

        Ok(forces)
    }
}
