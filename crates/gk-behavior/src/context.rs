use gk_core::Tick;
use gk_setup::SimulationSetup;
use gk_world::World;

/// The committed world as of the start of the tick.  Shared by every
/// decision made during the tick.
#[derive(Clone, Copy)]
pub struct DecisionContext<'a> {
    pub tick:  Tick,
    pub world: &'a World,
}

impl<'a> DecisionContext<'a> {
    #[inline]
    pub fn new(world: &'a World) -> Self {
        Self { tick: world.now(), world }
    }

    #[inline]
    pub fn setup(&self) -> &'a SimulationSetup {
        self.world.setup()
    }
}
