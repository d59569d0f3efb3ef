use crate::error::SimResult;
use crate::simulation::Simulation;
use crate::world::entities::PlayerId;

/// Decision-maker for one player. Called once per turn while the sequencer
/// waits on that player; returning ends the turn.
pub trait PlayerAgent {
    fn name(&self) -> &str;

    fn take_turn(&mut self, simulation: &mut Simulation, player: PlayerId) -> SimResult<()>;
}

/// Ends every turn without acting.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassAgent;

impl PlayerAgent for PassAgent {
    fn name(&self) -> &str {
        "pass"
    }

    fn take_turn(&mut self, _simulation: &mut Simulation, _player: PlayerId) -> SimResult<()> {
        Ok(())
    }
}
