//! The uniform runtime every agent recipe returns.
//!
//! A run moves `Idle → Running → {Succeeded, Failed, StoppedByLimit}`:
//!
//! 1. **Plan**: the agent proposes a tool call or a final answer
//! 2. **Act**: an allowed tool is invoked with the proposed input
//! 3. **Observe**: the result is recorded as a step and fed into the next plan
//!
//! Malformed model output and calls to tools outside the allow-list are not
//! failures: the model gets a corrective observation and tries again. Running
//! out of iterations ends the run with a marked partial answer. Only model,
//! tool and memory errors fail a run, and the failure carries the steps taken.

use agentry_core::agent::{AgentKind, EarlyStopping, ExecutorLimits, ExecutorState};
use agentry_core::error::{Error, Result};
use agentry_core::event::{AgentEvent, Callbacks, RunCallback};
use agentry_core::memory::ConversationMemory;
use agentry_core::tool::ToolRegistry;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agents::{Agent, AgentAction, AgentDecision, AgentStep, AgentStrategy, PlanError};
use crate::templates;

/// Tool name recorded for steps that recovered from malformed output.
pub const EXCEPTION_TOOL: &str = "_Exception";

/// A finished run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub answer: String,
    /// Steps taken, in order; empty unless the executor returns them.
    pub steps: Vec<AgentStep>,
    /// `Succeeded` or `StoppedByLimit`.
    pub state: ExecutorState,
    pub iterations: u32,
}

/// A run that ended in an unrecoverable error.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: Error,
    /// Steps completed before the failure.
    pub steps: Vec<AgentStep>,
}

impl RunFailure {
    fn new(error: Error, steps: Vec<AgentStep>) -> Self {
        Self { error, steps }
    }
}

enum Outcome {
    Finished(String),
    OutOfIterations,
}

/// Callbacks for one run: the executor's own followed by the caller's.
struct Observers<'a> {
    agent: &'a str,
    callbacks: Vec<&'a Arc<dyn RunCallback>>,
}

impl Observers<'_> {
    fn emit(&self, event: AgentEvent) {
        for callback in &self.callbacks {
            callback.on_event(&event);
        }
    }

    fn state(&self, state: ExecutorState) {
        self.emit(AgentEvent::StateChanged {
            agent: self.agent.to_string(),
            state,
            timestamp: Utc::now(),
        });
    }
}

pub struct AgentExecutor {
    kind: AgentKind,
    agent: Box<dyn Agent>,
    tools: ToolRegistry,
    limits: ExecutorLimits,
    verbose: bool,
    memory: Option<Arc<dyn ConversationMemory>>,
    return_intermediate_steps: bool,
    callbacks: Callbacks,
}

impl AgentExecutor {
    /// Bind an agent to its tools. Every tool the agent may call must be
    /// present in `tools`.
    pub fn new(kind: AgentKind, agent: Box<dyn Agent>, tools: ToolRegistry) -> Result<Self> {
        let missing: Vec<&str> = agent
            .allowed_tools()
            .iter()
            .filter(|name| !tools.contains(name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidToolset {
                strategy: agent.strategy().to_string(),
                reason: format!("allowed tools not provided: {}", missing.join(", ")),
            });
        }

        Ok(Self {
            kind,
            agent,
            tools,
            limits: ExecutorLimits::default(),
            verbose: false,
            memory: None,
            return_intermediate_steps: false,
            callbacks: Vec::new(),
        })
    }

    pub fn with_limits(mut self, limits: ExecutorLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Log every step at `info` instead of `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Load conversation variables before each run and save `(input, answer)`
    /// after each successful one.
    pub fn with_memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_return_intermediate_steps(mut self, enabled: bool) -> Self {
        self.return_intermediate_steps = enabled;
        self
    }

    /// Attach a callback notified on every run.
    pub fn with_callback(mut self, callback: Arc<dyn RunCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    pub fn strategy(&self) -> AgentStrategy {
        self.agent.strategy()
    }

    pub fn allowed_tools(&self) -> &BTreeSet<String> {
        self.agent.allowed_tools()
    }

    pub fn prompt_text(&self) -> &str {
        self.agent.prompt_text()
    }

    pub fn limits(&self) -> ExecutorLimits {
        self.limits
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn returns_intermediate_steps(&self) -> bool {
        self.return_intermediate_steps
    }

    async fn prepare_inputs(&self, input: &str) -> Result<HashMap<String, String>> {
        let mut inputs = match &self.memory {
            Some(memory) => memory.load().await?,
            None => HashMap::new(),
        };
        inputs.insert("input".into(), input.to_string());
        Ok(inputs)
    }

    fn log_step(&self, step: &AgentStep) {
        if self.verbose {
            info!(
                agent = %self.kind,
                tool = %step.tool,
                tool_input = %step.tool_input,
                observation = %step.observation,
                "Agent step"
            );
        } else {
            debug!(agent = %self.kind, tool = %step.tool, "Agent step");
        }
    }

    /// Observation for a proposed action, or the tool error that ends the run.
    async fn act(&self, action: &AgentAction) -> std::result::Result<String, Error> {
        if !self.agent.allowed_tools().contains(&action.tool) {
            warn!(agent = %self.kind, tool = %action.tool, "Model proposed a tool outside the allow-list");
            let names: Vec<&str> = self.agent.allowed_tools().iter().map(String::as_str).collect();
            return Ok(format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                names.join(", ")
            ));
        }
        Ok(self.tools.call(&action.tool, &action.tool_input).await?)
    }

    /// Run the reasoning loop on `input` until a final answer, the iteration
    /// limit, or an unrecoverable error.
    pub async fn run(
        &self,
        input: &str,
        callbacks: &[Arc<dyn RunCallback>],
    ) -> std::result::Result<RunResult, RunFailure> {
        let observers = Observers {
            agent: self.kind.as_str(),
            callbacks: self.callbacks.iter().chain(callbacks).collect(),
        };
        let fail = |error: Error, steps: Vec<AgentStep>| {
            warn!(agent = %self.kind, error = %error, steps = steps.len(), "Agent run failed");
            observers.state(ExecutorState::Failed);
            RunFailure::new(error, steps)
        };

        observers.state(ExecutorState::Running);
        info!(agent = %self.kind, strategy = %self.agent.strategy(), max_iterations = ?self.limits.max_iterations, "Agent run starting");

        let mut steps: Vec<AgentStep> = Vec::new();
        let inputs = match self.prepare_inputs(input).await {
            Ok(inputs) => inputs,
            Err(e) => return Err(fail(e, steps)),
        };

        let mut iterations = 0u32;
        let outcome = loop {
            if !self.limits.allows(iterations) {
                break Outcome::OutOfIterations;
            }
            iterations += 1;

            match self.agent.plan(&inputs, &steps).await {
                Ok(AgentDecision::Finish(finish)) => break Outcome::Finished(finish.answer),
                Ok(AgentDecision::Act(action)) => {
                    observers.emit(AgentEvent::ActionProposed {
                        agent: self.kind.to_string(),
                        tool: action.tool.clone(),
                        tool_input: action.tool_input.clone(),
                        timestamp: Utc::now(),
                    });
                    let started = Instant::now();
                    let observation = match self.act(&action).await {
                        Ok(observation) => observation,
                        Err(e) => return Err(fail(e, steps)),
                    };
                    observers.emit(AgentEvent::ToolFinished {
                        agent: self.kind.to_string(),
                        tool: action.tool.clone(),
                        observation: observation.clone(),
                        duration_ms: started.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                    let step = AgentStep::new(action, observation);
                    self.log_step(&step);
                    steps.push(step);
                }
                Err(PlanError::Parse(e)) => {
                    debug!(agent = %self.kind, error = %e, "Recovering from malformed output");
                    observers.emit(AgentEvent::ParseErrorRecovered {
                        agent: self.kind.to_string(),
                        error: e.message.clone(),
                        timestamp: Utc::now(),
                    });
                    let action = AgentAction {
                        tool: EXCEPTION_TOOL.into(),
                        tool_input: e.observation.clone(),
                        log: e.llm_output,
                    };
                    let step = AgentStep::new(action, e.observation);
                    self.log_step(&step);
                    steps.push(step);
                }
                Err(PlanError::Fatal(e)) => return Err(fail(e, steps)),
            }
        };

        let (answer, state) = match outcome {
            Outcome::Finished(answer) => (answer, ExecutorState::Succeeded),
            Outcome::OutOfIterations => {
                warn!(agent = %self.kind, iterations, "Iteration limit reached");
                let answer = match self.limits.early_stopping {
                    EarlyStopping::Force => templates::FORCE_STOP_ANSWER.to_string(),
                    EarlyStopping::Generate => match self.agent.finish_early(&inputs, &steps).await {
                        Ok(finish) => finish.answer,
                        Err(e) => return Err(fail(e, steps)),
                    },
                };
                (answer, ExecutorState::StoppedByLimit)
            }
        };

        if state == ExecutorState::Succeeded
            && let Some(memory) = &self.memory
            && let Err(e) = memory.save_context(input, &answer).await
        {
            return Err(fail(e.into(), steps));
        }

        observers.emit(AgentEvent::Finished {
            agent: self.kind.to_string(),
            answer: answer.clone(),
            iterations,
            timestamp: Utc::now(),
        });
        observers.state(state);
        info!(agent = %self.kind, iterations, state = ?state, "Agent run finished");

        Ok(RunResult {
            answer,
            steps: if self.return_intermediate_steps { steps } else { Vec::new() },
            state,
            iterations,
        })
    }

    /// [`run`](Self::run), abandoned as soon as `signal` completes.
    ///
    /// A cancelled run fails with [`Error::Cancelled`]; steps in flight are
    /// dropped with it.
    pub async fn run_until_cancelled<F>(
        &self,
        input: &str,
        callbacks: &[Arc<dyn RunCallback>],
        signal: F,
    ) -> std::result::Result<RunResult, RunFailure>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run(input, callbacks) => result,
            () = signal => {
                info!(agent = %self.kind, "Agent run cancelled");
                let observers = Observers {
                    agent: self.kind.as_str(),
                    callbacks: self.callbacks.iter().chain(callbacks).collect(),
                };
                observers.state(ExecutorState::Failed);
                Err(RunFailure::new(Error::Cancelled, Vec::new()))
            }
        }
    }

    /// Wrap this executor for callers without an async runtime.
    pub fn into_blocking(self) -> Result<BlockingAgentExecutor> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Internal(format!("failed to start runtime: {e}")))?;
        Ok(BlockingAgentExecutor {
            executor: self,
            runtime,
        })
    }
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("kind", &self.kind)
            .field("strategy", &self.agent.strategy())
            .field("allowed_tools", self.agent.allowed_tools())
            .field("limits", &self.limits)
            .field("verbose", &self.verbose)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

/// An executor with its own single-threaded runtime and a synchronous `run`.
///
/// Must not be used from inside another Tokio runtime.
pub struct BlockingAgentExecutor {
    executor: AgentExecutor,
    runtime: tokio::runtime::Runtime,
}

impl BlockingAgentExecutor {
    pub fn run(
        &self,
        input: &str,
        callbacks: &[Arc<dyn RunCallback>],
    ) -> std::result::Result<RunResult, RunFailure> {
        self.runtime.block_on(self.executor.run(input, callbacks))
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    pub fn into_inner(self) -> AgentExecutor {
        self.executor
    }
}
