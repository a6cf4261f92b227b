//! Scripted RSS check
//!
//! Implements `SafetyEvaluator` with a queue of scripted outcomes, supports
//! injecting faults, panics, delays and gates that hold a check in flight.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use contracts::{
    ActorId, DynamicsProfile, EvaluationFault, EvaluationRequest, ProperResponse,
    SafetyEvaluator, SafetyVerdict,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted outcome of one check
#[derive(Debug, Clone)]
enum Outcome {
    Verdict(SafetyVerdict),
    Fail(String),
    Panic(String),
}

/// Inputs observed by one check
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub ego: ActorId,
    pub actor_ids: Vec<ActorId>,
    pub map: String,
    pub ego_dynamics: DynamicsProfile,
    pub other_dynamics: DynamicsProfile,
    pub visualize_results: bool,
}

impl RecordedCall {
    fn from_request(request: &EvaluationRequest<'_>) -> Self {
        Self {
            frame: request.timestamp.frame,
            elapsed_seconds: request.timestamp.elapsed_seconds,
            ego: request.ego,
            actor_ids: request.actors.ids(),
            map: request.map.name.clone(),
            ego_dynamics: *request.ego_dynamics,
            other_dynamics: *request.other_dynamics,
            visualize_results: request.visualize_results,
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    entered: Mutex<bool>,
    entered_cv: Condvar,
    released: Mutex<bool>,
    released_cv: Condvar,
}

/// Holds one check in flight until released
///
/// Obtained from [`ScriptedEvaluator::hold_next`].
#[derive(Debug, Clone, Default)]
pub struct EvaluationGate {
    state: Arc<GateState>,
}

impl EvaluationGate {
    /// Block until the held check has started
    pub fn wait_entered(&self) {
        let mut entered = lock(&self.state.entered);
        while !*entered {
            entered = self
                .state
                .entered_cv
                .wait(entered)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`EvaluationGate::wait_entered`], false on timeout
    pub fn wait_entered_timeout(&self, timeout: Duration) -> bool {
        let entered = lock(&self.state.entered);
        let (entered, _) = self
            .state
            .entered_cv
            .wait_timeout_while(entered, timeout, |entered| !*entered)
            .unwrap_or_else(PoisonError::into_inner);
        *entered
    }

    pub fn is_entered(&self) -> bool {
        *lock(&self.state.entered)
    }

    /// Let the held check finish
    pub fn release(&self) {
        *lock(&self.state.released) = true;
        self.state.released_cv.notify_all();
    }

    fn enter_and_wait(&self) {
        *lock(&self.state.entered) = true;
        self.state.entered_cv.notify_all();

        let mut released = lock(&self.state.released);
        while !*released {
            released = self
                .state
                .released_cv
                .wait(released)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Decrements the in-flight counter on every exit path
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted `SafetyEvaluator`
///
/// Outcomes are consumed in order; when the script is empty the fallback
/// verdict (successful, safe) is returned.
pub struct ScriptedEvaluator {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<SafetyVerdict>,
    gates: Mutex<VecDeque<EvaluationGate>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(SafetyVerdict {
                success: true,
                proper_response: ProperResponse {
                    is_safe: true,
                    ..ProperResponse::default()
                },
                ..SafetyVerdict::default()
            }),
            gates: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue a verdict
    pub fn push_verdict(&self, verdict: SafetyVerdict) {
        lock(&self.script).push_back(Outcome::Verdict(verdict));
    }

    /// Queue an error result
    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.script).push_back(Outcome::Fail(message.into()));
    }

    /// Queue a panic
    pub fn panic_next(&self, message: impl Into<String>) {
        lock(&self.script).push_back(Outcome::Panic(message.into()));
    }

    /// Verdict returned once the script runs out
    pub fn set_fallback(&self, verdict: SafetyVerdict) {
        *lock(&self.fallback) = verdict;
    }

    /// Artificial duration of every check
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Hold the next check that starts until the returned gate is released
    pub fn hold_next(&self) -> EvaluationGate {
        let gate = EvaluationGate::default();
        lock(&self.gates).push_back(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of checks started so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Highest number of checks observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyEvaluator for ScriptedEvaluator {
    fn check_objects(&self, request: &EvaluationRequest<'_>) -> Result<SafetyVerdict, EvaluationFault> {
        lock(&self.calls).push(RecordedCall::from_request(request));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let gate = lock(&self.gates).pop_front();
        if let Some(gate) = gate {
            gate.enter_and_wait();
        }

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let outcome = lock(&self.script).pop_front();
        match outcome {
            Some(Outcome::Verdict(verdict)) => Ok(verdict),
            Some(Outcome::Fail(message)) => Err(EvaluationFault::check_failed(message)),
            Some(Outcome::Panic(message)) => panic!("{message}"),
            None => Ok(*lock(&self.fallback)),
        }
    }
}
