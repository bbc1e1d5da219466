//! Scripted lookup for tests.
//!
//! Lives in the crate proper (not behind `cfg(test)`) so downstream crates
//! and the workspace integration tests can drive the pipeline without a
//! network.

use crate::{RawCoords, RawSystem, ResolveError, SystemLookup};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct FailOn {
    call: usize,
    status: u16,
    body: String,
}

/// In-memory `SystemLookup` with scripted behavior.
pub struct MockLookup {
    scripted: Mutex<VecDeque<Vec<RawSystem>>>,
    echo: bool,
    fail_on: Option<FailOn>,
    calls: Mutex<Vec<usize>>,
}

impl MockLookup {
    /// Resolves every requested name at a fixed position.
    pub fn echoing() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            echo: true,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the given responses in order; empty once the script runs dry.
    pub fn with_responses(responses: Vec<Vec<RawSystem>>) -> Self {
        Self {
            scripted: Mutex::new(responses.into()),
            echo: false,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Echoes like `echoing`, but the `call`-th request (1-based) fails with
    /// the given status and body.
    pub fn failing_on_call(call: usize, status: u16, body: &str) -> Self {
        Self {
            fail_on: Some(FailOn {
                call,
                status,
                body: body.to_string(),
            }),
            ..Self::echoing()
        }
    }

    /// Group sizes observed so far, in request order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }
}

#[async_trait]
impl SystemLookup for MockLookup {
    async fn fetch_group(&self, names: &[String]) -> Result<Vec<RawSystem>, ResolveError> {
        let call_index = {
            let mut calls = self.calls.lock().expect("mock call log poisoned");
            calls.push(names.len());
            calls.len()
        };

        if let Some(fail) = &self.fail_on {
            if fail.call == call_index {
                return Err(ResolveError::Service {
                    status: fail.status,
                    body: fail.body.clone(),
                });
            }
        }

        if self.echo {
            return Ok(names
                .iter()
                .map(|name| RawSystem {
                    name: name.clone(),
                    coords: Some(RawCoords {
                        x: 1.0,
                        y: 2.0,
                        z: 3.0,
                    }),
                })
                .collect());
        }

        let mut scripted = self.scripted.lock().expect("mock script poisoned");
        Ok(scripted.pop_front().unwrap_or_default())
    }
}
