use serde::Serialize;
use tracing::{debug, info};

use crate::config::simulation::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::simulation::economy::{recalculate_lushness, regenerate};
use crate::simulation::eggs::{merge_production, produce_eggs};
use crate::simulation::state::GameState;
use crate::simulation::statistics::compute_statistics;
use crate::simulation::visibility::compute_visibility;
use crate::world::entities::PlayerId;

/// Where the sequencer is in the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "player", rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingPlayerAction(PlayerId),
    EndPlayerTurn(PlayerId),
    StartNewRound,
}

/// Sequencer state carried inside the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnState {
    pub phase: TurnPhase,
    /// The opening turn's units were seeded by generation; its reset step
    /// is skipped once.
    pub initial_turn_pending: bool,
}

impl TurnState {
    pub fn new(phase: TurnPhase) -> Self {
        Self {
            phase,
            initial_turn_pending: true,
        }
    }
}

fn active_players(state: &GameState) -> impl Iterator<Item = PlayerId> + '_ {
    state.players.iter().filter(|p| p.is_active).map(|p| p.id)
}

fn first_active(state: &GameState) -> SimResult<PlayerId> {
    active_players(state)
        .min()
        .ok_or_else(|| SimError::Invariant("no active players".to_string()))
}

fn next_active_after(state: &GameState, player: PlayerId) -> Option<PlayerId> {
    active_players(state).filter(|&p| p > player).min()
}

/// Run the start-of-turn pipeline for `player` on a working copy.
///
/// Order matters; each step sees the previous step's output:
/// 1. reset the player's animals and clear events (skipped on the opening turn)
/// 2. regrow resources in the player's biomes
/// 3. lay eggs
/// 4. merge the eggs and production stamps
/// 5. recompute lushness everywhere
///
/// Visibility is refreshed last.
///
/// The opening turn skips all of step 1, not only the animal reset:
/// generation has just seeded the units and no event can be pending yet.
/// Every later turn, including the first player's turns in later rounds,
/// runs the full pipeline.
pub fn begin_player_turn(state: &mut GameState, player: PlayerId, config: &SimulationConfig) {
    if state.sequencer.initial_turn_pending {
        state.sequencer.initial_turn_pending = false;
        debug!(player = player.0, "Opening turn, skipping reset");
    } else {
        for animal in state.animals.values_mut().filter(|a| a.owner_id == Some(player)) {
            animal.has_moved = false;
        }
        state.events.clear();
    }

    let regrowth = regenerate(&state.resources, &state.biomes, Some(player), &config.economy);
    state.resources = regrowth.resources;
    state.biomes = regrowth.biomes;

    let production = produce_eggs(state, player, config);
    let laid = production.eggs.len();
    merge_production(state, production);

    state.biomes = recalculate_lushness(
        &state.biomes,
        &state.board,
        &state.resources,
        &state.eggs,
        &config.economy,
    );
    state.players = compute_visibility(
        &state.players,
        &state.board,
        &state.animals,
        &state.biomes,
        state.fog_of_war,
    );

    debug!(player = player.0, turn = state.turn, eggs = laid, "Player turn started");
}

/// Open the first turn of a fresh game.
pub fn start_game(state: &GameState, config: &SimulationConfig) -> SimResult<GameState> {
    let mut next = state.clone();
    let first = first_active(&next)?;
    next.sequencer.phase = TurnPhase::AwaitingPlayerAction(first);
    begin_player_turn(&mut next, first, config);
    Ok(next)
}

/// Move the sequencer one step.
///
/// `AwaitingPlayerAction(p)` → `EndPlayerTurn(p)` → the next active player's
/// turn, or `StartNewRound` after the last one → the first player's turn of
/// the next round.
pub fn advance_turn(state: &GameState, config: &SimulationConfig) -> SimResult<GameState> {
    let mut next = state.clone();
    match state.sequencer.phase {
        TurnPhase::AwaitingPlayerAction(player) => {
            if config.require_event_ack && !state.events.is_empty() {
                return Err(SimError::PendingEvents);
            }
            next.sequencer.phase = TurnPhase::EndPlayerTurn(player);
        }
        TurnPhase::EndPlayerTurn(player) => match next_active_after(state, player) {
            Some(following) => {
                next.sequencer.phase = TurnPhase::AwaitingPlayerAction(following);
                begin_player_turn(&mut next, following, config);
            }
            None => next.sequencer.phase = TurnPhase::StartNewRound,
        },
        TurnPhase::StartNewRound => {
            let first = first_active(state)?;
            let stats = compute_statistics(state);
            info!(
                turn = stats.turn,
                biomes_owned = stats.owned_biomes,
                avg_lushness = stats.avg_lushness,
                active_resources = stats.active_resources,
                eggs = stats.eggs,
                animals = stats.animals,
                diversity = stats.diversity_index,
                "Round complete"
            );
            next.turn += 1;
            next.sequencer.phase = TurnPhase::AwaitingPlayerAction(first);
            begin_player_turn(&mut next, first, config);
        }
    }
    Ok(next)
}
