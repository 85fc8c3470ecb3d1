//! Shared test support: a scripted, recording session backend and factory.
//!
//! Each `begin()` consumes one script entry. Session backends log every call
//! they receive, so tests assert the exact statement order a session saw.
//! Backend methods yield to the scheduler before acting, which gives
//! concurrency tests real interleaving.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use portico_gateway::application::lifecycle::SessionManager;
use portico_gateway::domain::envelope::ResolveCall;
use portico_gateway::domain::role::RoleName;
use portico_gateway::domain::session::{SessionBackend, SessionFactory};
use portico_gateway::GatewayError;

pub type SessionLog = Arc<Mutex<Vec<Op>>>;

/// One call received by a fake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Escalate(String),
    ResetRole,
    Setting(String, String),
    Resolve(ResolveCall),
    Commit,
    Rollback,
    /// The backend was dropped without commit or rollback (the driver would
    /// roll back here).
    DroppedOpen,
}

/// Injection point for a scripted failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Escalate,
    ResetRole,
    Setting,
    Resolve,
    Commit,
    Rollback,
}

enum Script {
    Session { result: Value, fail_at: Vec<FailAt> },
    PoolExhausted,
    Unreachable,
}

pub struct FakeFactory {
    scripts: Mutex<VecDeque<Script>>,
    logs: Mutex<Vec<SessionLog>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeFactory {
            scripts: Mutex::new(VecDeque::new()),
            logs: Mutex::new(Vec::new()),
        })
    }

    /// Factory pre-loaded with one clean session returning `result`.
    pub fn with_result(result: Value) -> Arc<Self> {
        let factory = Self::new();
        factory.push_session(result);
        factory
    }

    pub fn push_session(&self, result: Value) {
        self.scripts.lock().unwrap().push_back(Script::Session {
            result,
            fail_at: Vec::new(),
        });
    }

    pub fn push_failing_session(&self, result: Value, fail_at: &[FailAt]) {
        self.scripts.lock().unwrap().push_back(Script::Session {
            result,
            fail_at: fail_at.to_vec(),
        });
    }

    pub fn push_pool_exhausted(&self) {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::PoolExhausted);
    }

    pub fn push_unreachable(&self) {
        self.scripts.lock().unwrap().push_back(Script::Unreachable);
    }

    /// Number of sessions actually handed out.
    pub fn sessions_opened(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    /// Calls received by the n-th session, in order.
    pub fn ops(&self, session: usize) -> Vec<Op> {
        self.logs.lock().unwrap()[session].lock().unwrap().clone()
    }

    pub fn all_ops(&self) -> Vec<Vec<Op>> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|log| log.lock().unwrap().clone())
            .collect()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn begin(&self) -> Result<Box<dyn SessionBackend>, GatewayError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("test script exhausted: unexpected session acquisition");
        match script {
            Script::PoolExhausted => Err(GatewayError::PoolExhausted(
                "no connection became available within the acquisition timeout".to_string(),
            )),
            Script::Unreachable => {
                Err(GatewayError::Connection("connection refused".to_string()))
            }
            Script::Session { result, fail_at } => {
                let log: SessionLog = Arc::new(Mutex::new(Vec::new()));
                self.logs.lock().unwrap().push(log.clone());
                Ok(Box::new(FakeBackend {
                    log,
                    result,
                    fail_at,
                    finalized: false,
                }))
            }
        }
    }
}

pub struct FakeBackend {
    log: SessionLog,
    result: Value,
    fail_at: Vec<FailAt>,
    finalized: bool,
}

impl FakeBackend {
    fn record(&self, op: Op) {
        self.log.lock().unwrap().push(op);
    }

    fn injected(&self, point: FailAt, what: &str) -> Result<(), GatewayError> {
        if self.fail_at.contains(&point) {
            Err(GatewayError::RemoteExecution(format!(
                "injected {what} failure"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionBackend for FakeBackend {
    async fn escalate_role(&mut self, role: &RoleName) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.record(Op::Escalate(role.as_str().to_string()));
        self.injected(FailAt::Escalate, "escalate")
    }

    async fn reset_role(&mut self) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.record(Op::ResetRole);
        self.injected(FailAt::ResetRole, "reset")
    }

    async fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.record(Op::Setting(key.to_string(), value.to_string()));
        self.injected(FailAt::Setting, "setting")
    }

    async fn resolve(&mut self, call: &ResolveCall) -> Result<Value, GatewayError> {
        tokio::task::yield_now().await;
        self.record(Op::Resolve(call.clone()));
        self.injected(FailAt::Resolve, "resolve")?;
        Ok(self.result.clone())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.finalized = true;
        self.record(Op::Commit);
        self.injected(FailAt::Commit, "commit")
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        self.finalized = true;
        self.record(Op::Rollback);
        self.injected(FailAt::Rollback, "rollback")
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        if !self.finalized {
            self.record(Op::DroppedOpen);
        }
    }
}

/// Manager over a fake factory with the default restricted role.
pub fn manager(factory: Arc<FakeFactory>) -> SessionManager {
    SessionManager::new(factory, RoleName::default_restricted())
}
