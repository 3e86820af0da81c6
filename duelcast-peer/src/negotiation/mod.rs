mod candidate_queue;
mod close_signal;
mod negotiation_actor;
mod state_machine;

pub use candidate_queue::*;
pub use close_signal::*;
pub use negotiation_actor::*;
pub use state_machine::*;
