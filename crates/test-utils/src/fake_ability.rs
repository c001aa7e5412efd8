use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reasonloop::abilities::Ability;
use reasonloop::errors::{ReasonLoopError, Result};
use reasonloop::llm::Role;

/// An ability that plays back a scripted sequence of results and counts its
/// calls.
///
/// - Each call pops the next scripted response (Ok or Err).
/// - When the script runs out, the configured fallback is returned as a
///   success.
///
/// Useful for planner tests (script one plan JSON) and retry tests (script
/// N failures followed by a success). Grab the call counter with
/// [`ScriptedAbility::call_counter`] before moving the ability into a
/// registry.
pub struct ScriptedAbility {
    name: String,
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: String,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAbility {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: "ok".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_response(self, response: &str) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Ok(response.to_string()));
        self
    }

    pub fn with_failure(self, error: &str) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Err(error.to_string()));
        self
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback = fallback.to_string();
        self
    }

    /// Shared view of the call count, usable after the ability has been
    /// moved into a registry.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Ability for ScriptedAbility {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _input: &str, _role: Option<Role>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front();

        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(error)) => Err(ReasonLoopError::AbilityError {
                ability: self.name.clone(),
                message: error,
            }),
            None => Ok(self.fallback.clone()),
        }
    }
}
