pub mod agent;
pub mod capture;
pub mod economy;
pub mod eggs;
pub mod events;
pub mod movement;
pub mod state;
pub mod statistics;
pub mod turn;
pub mod visibility;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::generation::GenerationParams;
use crate::config::simulation::SimulationConfig;
use crate::error::{SimError, SimResult, Warning};
use crate::simulation::agent::PlayerAgent;
use crate::simulation::events::{BiomeCaptureEvent, DisplacementEvent, SpawnEvent};
use crate::simulation::statistics::{compute_statistics, RoundStatistics};
use crate::world::coord::Coordinate;
use crate::world::entities::{AnimalId, BiomeId, EggId, PlayerId};
use crate::world::generation::{generate_world, GeneratedWorld};

pub use state::GameState;
pub use turn::TurnPhase;

/// Outcome of a player action: the snapshot it published plus any
/// degenerate-state warnings raised along the way.
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub snapshot: Arc<GameState>,
    pub warnings: Vec<Warning>,
}

/// Owner of the current snapshot.
///
/// Every successful operation publishes a new `Arc<GameState>` with a higher
/// version; a failed one leaves the current snapshot in place. Readers hold
/// on to whichever snapshot they cloned.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    state: Arc<GameState>,
}

impl Simulation {
    /// Seed resources for a generated world and open the first turn.
    pub fn new(world: GeneratedWorld, config: SimulationConfig) -> SimResult<Self> {
        let density = world.params.resource_density;
        let mut state = GameState::from_generated(world, config.fog_of_war);
        let reset = economy::reset_resources(
            &state.board,
            &state.biomes,
            density,
            &config.economy,
            &mut state.rng,
        )?;
        state.biomes = reset.biomes;
        state.resources = reset.resources;
        state.next_resource_id = reset.next_resource_id;
        let state = turn::start_game(&state, &config)?;
        Ok(Self {
            config,
            state: Arc::new(state),
        })
    }

    /// Generate a world from `params` and start a game on it.
    pub fn generate(params: &GenerationParams, config: SimulationConfig) -> SimResult<Self> {
        let world = generate_world(params, config.economy.production_rate);
        Self::new(world, config)
    }

    /// Continue from an existing snapshot as-is.
    pub fn from_state(state: GameState, config: SimulationConfig) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.state.version
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.sequencer.phase
    }

    fn publish(&mut self, mut next: GameState) -> Arc<GameState> {
        next.version = self.state.version + 1;
        self.state = Arc::new(next);
        Arc::clone(&self.state)
    }

    fn report(&mut self, next: GameState, warnings: Vec<Warning>) -> ActionReport {
        ActionReport {
            snapshot: self.publish(next),
            warnings,
        }
    }

    fn ensure_turn(&self, player: PlayerId) -> SimResult<()> {
        self.state.player(player)?;
        if self.state.current_player() != Some(player) {
            return Err(SimError::NotCurrentPlayer(player));
        }
        Ok(())
    }

    /// Recompute derived state after an action.
    fn refresh(&self, state: &mut GameState) {
        state.biomes = economy::recalculate_lushness(
            &state.biomes,
            &state.board,
            &state.resources,
            &state.eggs,
            &self.config.economy,
        );
        state.players = visibility::compute_visibility(
            &state.players,
            &state.board,
            &state.animals,
            &state.biomes,
            state.fog_of_war,
        );
    }

    pub fn valid_moves(&self, animal: AnimalId) -> SimResult<Vec<Coordinate>> {
        movement::calculate_valid_moves(animal, &self.state.board, &self.state.animals, &self.config.movement)
    }

    pub fn move_animal(
        &mut self,
        player: PlayerId,
        animal: AnimalId,
        destination: Coordinate,
    ) -> SimResult<ActionReport> {
        self.ensure_turn(player)?;
        if self.state.animal(animal)?.owner_id != Some(player) {
            return Err(SimError::NotOwner(player));
        }
        let mut next = (*self.state).clone();
        let stamp = next.clock + 1;
        let outcome = movement::move_animal(
            animal,
            destination,
            &next.board,
            &next.animals,
            &self.config.movement,
            stamp,
            &mut next.rng,
        )?;
        next.animals = outcome.animals;
        if let Some(event) = outcome.displacement {
            next.clock = stamp;
            next.events.displacement = Some(event);
        }
        self.refresh(&mut next);
        Ok(self.report(next, outcome.warnings))
    }

    pub fn harvest(&mut self, player: PlayerId, at: Coordinate, amount: f32) -> SimResult<ActionReport> {
        self.ensure_turn(player)?;
        if !self.state.board.in_bounds(at) {
            return Err(SimError::OutOfBounds(at));
        }
        let outcome = economy::harvest(
            at,
            amount,
            &self.state.resources,
            &self.state.biomes,
            self.state.player(player)?,
        )?;
        if outcome.harvested == 0.0 {
            debug!(x = at.x, y = at.y, "Nothing to harvest");
            return Ok(ActionReport {
                snapshot: self.snapshot(),
                warnings: Vec::new(),
            });
        }
        let mut next = (*self.state).clone();
        next.resources = outcome.resources;
        next.biomes = outcome.biomes;
        next.replace_player(outcome.player)?;
        self.refresh(&mut next);
        Ok(self.report(next, Vec::new()))
    }

    pub fn hatch_egg(&mut self, player: PlayerId, egg: EggId) -> SimResult<ActionReport> {
        self.ensure_turn(player)?;
        if self.state.egg(egg)?.owner_id != player {
            return Err(SimError::NotOwner(player));
        }
        let hatched = eggs::hatch_egg(&self.state, egg, &self.config)?;
        if hatched.animal_id.is_none() {
            return Ok(ActionReport {
                snapshot: self.snapshot(),
                warnings: hatched.warnings,
            });
        }
        let mut next = hatched.state;
        self.refresh(&mut next);
        Ok(self.report(next, hatched.warnings))
    }

    pub fn can_capture(&self, player: PlayerId, biome: BiomeId) -> SimResult<bool> {
        capture::can_capture_biome(biome, &self.state.board, &self.state.animals, &self.state.biomes, player)
    }

    pub fn capture_biome(&mut self, player: PlayerId, biome: BiomeId) -> SimResult<ActionReport> {
        self.ensure_turn(player)?;
        let mut next = capture::capture_biome(&self.state, biome, player, &self.config)?;
        self.refresh(&mut next);
        Ok(self.report(next, Vec::new()))
    }

    /// Throw away the current resources and scatter a fresh set.
    pub fn reset_resources(&mut self, density: f32) -> SimResult<ActionReport> {
        let mut next = (*self.state).clone();
        let reset = economy::reset_resources(
            &next.board,
            &next.biomes,
            density,
            &self.config.economy,
            &mut next.rng,
        )?;
        next.biomes = reset.biomes;
        next.resources = reset.resources;
        next.next_resource_id = reset.next_resource_id;
        self.refresh(&mut next);
        Ok(self.report(next, reset.warnings))
    }

    pub fn set_fog_of_war(&mut self, enabled: bool) -> Arc<GameState> {
        let mut next = (*self.state).clone();
        next.fog_of_war = enabled;
        self.refresh(&mut next);
        self.publish(next)
    }

    /// Step the sequencer once.
    pub fn advance_turn(&mut self) -> SimResult<TurnPhase> {
        let next = turn::advance_turn(&self.state, &self.config)?;
        Ok(self.publish(next).sequencer.phase)
    }

    /// Step until some player is awaited again.
    pub fn end_turn(&mut self) -> SimResult<TurnPhase> {
        loop {
            match self.advance_turn()? {
                TurnPhase::AwaitingPlayerAction(_) => return Ok(self.phase()),
                TurnPhase::EndPlayerTurn(_) | TurnPhase::StartNewRound => {}
            }
        }
    }

    fn take_event<T>(&mut self, take: impl FnOnce(&mut GameState) -> Option<T>) -> Option<T> {
        let mut next = (*self.state).clone();
        let event = take(&mut next)?;
        self.publish(next);
        Some(event)
    }

    pub fn take_displacement_event(&mut self) -> Option<DisplacementEvent> {
        self.take_event(|s| s.events.displacement.take())
    }

    pub fn take_spawn_event(&mut self) -> Option<SpawnEvent> {
        self.take_event(|s| s.events.spawn.take())
    }

    pub fn take_capture_event(&mut self) -> Option<BiomeCaptureEvent> {
        self.take_event(|s| s.events.capture.take())
    }

    /// Clear every pending event.
    pub fn acknowledge_events(&mut self) {
        if self.state.events.is_empty() {
            return;
        }
        let mut next = (*self.state).clone();
        next.events.clear();
        self.publish(next);
    }

    /// Let each player's agent act once, then close the round.
    ///
    /// `agents[i]` plays for player `i`; players without an agent pass.
    /// Returns statistics of the round that just ended.
    pub fn run_round(&mut self, agents: &mut [Box<dyn PlayerAgent>]) -> SimResult<RoundStatistics> {
        loop {
            match self.phase() {
                TurnPhase::AwaitingPlayerAction(player) => {
                    if let Some(agent) = agents.get_mut(player.0 as usize) {
                        if let Err(e) = agent.take_turn(self, player) {
                            warn!(player = player.0, agent = agent.name(), error = %e, "Agent action rejected");
                        }
                    }
                    // Agents do not animate anything.
                    self.acknowledge_events();
                    self.advance_turn()?;
                }
                TurnPhase::EndPlayerTurn(_) => {
                    self.advance_turn()?;
                }
                TurnPhase::StartNewRound => {
                    let stats = compute_statistics(&self.state);
                    self.advance_turn()?;
                    return Ok(stats);
                }
            }
        }
    }
}
