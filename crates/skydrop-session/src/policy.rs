//! The `DecisionPolicy` trait — the pluggable scheduling brain.
//!
//! The session layer owns the protocol; a policy only answers one question
//! per tick: given the scenario and the current state, which drones should
//! launch with which orders? Everything it needs comes in as arguments and
//! everything it decides goes out as the returned launches.
//!
//! The state record is only valid for the duration of one call.

use skydrop_protocol::{Launch, Record, Value};

use crate::PolicyError;

/// Produces launch decisions for one tick.
///
/// Implemented for [`GreedyPolicy`] and for any
/// `FnMut(&Record, &Record) -> Result<Vec<Launch>, PolicyError>`, so a
/// closure works as a policy too.
///
/// A policy should be fast: the server enforces the tick deadline and the
/// client has no way to cancel a slow call.
pub trait DecisionPolicy: Send {
    /// Decides the launches for the current tick.
    ///
    /// # Arguments
    /// - `scenario` — static parameters received with `StartScenarioRun`
    /// - `state` — the simulation state received with `GetMoves`
    fn decide(
        &mut self,
        scenario: &Record,
        state: &Record,
    ) -> Result<Vec<Launch>, PolicyError>;
}

impl<F> DecisionPolicy for F
where
    F: FnMut(&Record, &Record) -> Result<Vec<Launch>, PolicyError> + Send,
{
    fn decide(
        &mut self,
        scenario: &Record,
        state: &Record,
    ) -> Result<Vec<Launch>, PolicyError> {
        self(scenario, state)
    }
}

/// Pairs pending orders with available drones, first with first.
///
/// Each drone carries exactly one order. Whatever is left over on the
/// longer side waits for a later tick. Reads `State.PendingOrders` as a
/// keyed collection (order id → order) and `State.AvailableDroneIds` as a
/// sequence of drone ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl DecisionPolicy for GreedyPolicy {
    fn decide(
        &mut self,
        _scenario: &Record,
        state: &Record,
    ) -> Result<Vec<Launch>, PolicyError> {
        let pending = state.collection("PendingOrders")?;
        let drones = state.sequence("AvailableDroneIds")?;

        Ok(pending
            .iter()
            .zip(drones)
            .map(|((order_id, _order), drone_id)| {
                Launch::new(drone_id.clone(), vec![Value::from(order_id.as_str())])
            })
            .collect())
    }
}
