//! Query / ECU-emulation exchange, one iteration per bus cycle.
//!
//! Per cycle, depending on the role:
//! 1. query side sends the RPM request
//! 2. ECU side waits for an inbound frame and answers RPM queries with a
//!    random value
//! 3. query side waits for the reply and decodes the RPM value
//!
//! Query and loopback runs stop after one cycle. The ECU role repeats until
//! a transport error ends it.

use obdx_protocol::{RpmReading, decode, encode_request, encode_response};
use rand::Rng;

use crate::config::Role;
use crate::endpoint::BusEndpoint;
use crate::error::{CanError, CanResult};
use crate::mux::{Multiplexer, REPLY_TIMEOUT, TimeoutPolicy, WaitOutcome};

/// Where the exchange currently is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    SendQuery,
    AwaitIncomingQuery,
    ValidateAndRespond,
    SendResponse,
    AwaitQueryReply,
    /// A one-shot run finished, or any run failed.
    Done,
}

/// What one cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The query side got its reply; `None` when it was not an RPM response.
    Reading(Option<RpmReading>),
    /// The emulated ECU answered a query with this value.
    Responded(u8),
    /// The emulated ECU received a frame that was not a query.
    Ignored(Option<u8>),
    /// The emulated ECU's idle wait expired with nothing received.
    Idle,
}

/// Drives the exchange for one role over borrowed endpoints.
pub struct Exchange<'a, R> {
    role: Role,
    query: Option<&'a dyn BusEndpoint>,
    ecu: Option<&'a dyn BusEndpoint>,
    mux: Multiplexer<'a>,
    rng: R,
    state: ExchangeState,
    cycles: u64,
}

impl<'a, R: Rng> Exchange<'a, R> {
    /// Set up the exchange. The endpoints given must match the role's sides.
    pub fn new(
        role: Role,
        query: Option<&'a dyn BusEndpoint>,
        ecu: Option<&'a dyn BusEndpoint>,
        rng: R,
    ) -> CanResult<Self> {
        if role.has_query_side() != query.is_some() || role.has_ecu_side() != ecu.is_some() {
            return Err(CanError::Config(format!(
                "{role} role needs query endpoint: {}, ecu endpoint: {}",
                role.has_query_side(),
                role.has_ecu_side()
            )));
        }

        let mux = Multiplexer::new(ecu.into_iter().chain(query).collect(), REPLY_TIMEOUT);
        Ok(Self {
            role,
            query,
            ecu,
            mux,
            rng,
            state: ExchangeState::Idle,
            cycles: 0,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run until the role is finished.
    ///
    /// Returns the reading for query and loopback runs. The ECU role only
    /// returns when a cycle fails.
    pub async fn run(&mut self) -> CanResult<Option<RpmReading>> {
        tracing::info!(role = %self.role, "exchange starting");
        loop {
            let outcome = match self.run_cycle().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(role = %self.role, cycle = self.cycles, error = %e, "exchange aborted");
                    return Err(e);
                }
            };

            match outcome {
                CycleOutcome::Reading(reading) if self.role.is_one_shot() => return Ok(reading),
                _ if self.role.is_one_shot() => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Run one cycle. Any error leaves the exchange in `Done`.
    pub async fn run_cycle(&mut self) -> CanResult<CycleOutcome> {
        if self.state == ExchangeState::Done {
            return Err(CanError::Config(format!(
                "{} exchange already completed",
                self.role
            )));
        }

        self.cycles += 1;
        let result = self.cycle().await;
        let next = match &result {
            Ok(_) if !self.role.is_one_shot() => ExchangeState::Idle,
            _ => ExchangeState::Done,
        };
        self.transition(next);
        result
    }

    async fn cycle(&mut self) -> CanResult<CycleOutcome> {
        if let Some(query) = self.query {
            self.transition(ExchangeState::SendQuery);
            let request = encode_request();
            query.send(&request).await?;
            tracing::debug!(interface = query.interface(), %request, "query sent");
        }

        let mut outcome = CycleOutcome::Idle;
        if let Some(ecu) = self.ecu {
            outcome = self.serve_query(ecu).await?;
            if outcome == CycleOutcome::Idle {
                return Ok(outcome);
            }
        }

        if let Some(query) = self.query {
            outcome = CycleOutcome::Reading(self.await_reply(query).await?);
        }
        Ok(outcome)
    }

    /// ECU side: wait for a frame and answer it if it is an RPM query.
    async fn serve_query(&mut self, ecu: &'a dyn BusEndpoint) -> CanResult<CycleOutcome> {
        self.transition(ExchangeState::AwaitIncomingQuery);

        // Loopback must see its own query answered; a lone ECU just idles.
        let policy = if self.query.is_some() {
            TimeoutPolicy::Escalate
        } else {
            TimeoutPolicy::Retry
        };
        match self.mux.wait(ecu.handle(), policy).await {
            WaitOutcome::Ready(_) => {}
            WaitOutcome::Timeout => return Ok(CycleOutcome::Idle),
            WaitOutcome::Error(e) => return Err(e),
        }

        let received = ecu.receive().await?;
        self.transition(ExchangeState::ValidateAndRespond);
        let decoded = decode(&received.frame);
        if !decoded.is_rpm_query() {
            tracing::debug!(
                interface = ecu.interface(),
                frame = %received.frame,
                "ignoring frame that is not an RPM query"
            );
            return Ok(CycleOutcome::Ignored(decoded.discriminator));
        }

        self.transition(ExchangeState::SendResponse);
        let value = self.rng.gen_range(0..=u8::MAX);
        let response = encode_response(value);
        ecu.send(&response).await?;
        tracing::info!(interface = ecu.interface(), rpm = value, "answered RPM query");
        Ok(CycleOutcome::Responded(value))
    }

    /// Query side: wait for the reply and pull the RPM value out of it.
    async fn await_reply(&mut self, query: &'a dyn BusEndpoint) -> CanResult<Option<RpmReading>> {
        self.transition(ExchangeState::AwaitQueryReply);

        match self.mux.wait(query.handle(), TimeoutPolicy::Escalate).await {
            WaitOutcome::Ready(_) => {}
            WaitOutcome::Timeout => {
                return Err(CanError::Timeout {
                    interface: query.interface().to_string(),
                    timeout_ms: self.mux.timeout().as_millis() as u64,
                });
            }
            WaitOutcome::Error(e) => return Err(e),
        }

        let received = query.receive().await?;
        let decoded = decode(&received.frame);
        match decoded.rpm() {
            Some(rpm) => {
                tracing::info!(interface = query.interface(), rpm, "RPM reply received");
                Ok(Some(RpmReading::new(
                    rpm,
                    query.interface(),
                    received.timestamp,
                )))
            }
            None => {
                tracing::debug!(
                    interface = query.interface(),
                    frame = %received.frame,
                    "reply is not an RPM response"
                );
                Ok(None)
            }
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        tracing::debug!(role = %self.role, from = ?self.state, to = ?next, "exchange transition");
        self.state = next;
    }
}
