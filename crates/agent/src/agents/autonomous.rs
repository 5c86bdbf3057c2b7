//! Persona-driven agent that answers with JSON commands.
//!
//! Every turn the model receives a system prompt describing its persona, goal
//! and commands, followed by the conversation so far: its own previous
//! responses and what each command returned. It answers with a JSON object
//! naming the next command; the `finish` command ends the run. Anything the
//! executor's memory recalled goes in a second system message.

use agentry_core::agent::Persona;
use agentry_core::error::Result;
use agentry_core::message::{Conversation, Message};
use agentry_core::prompt::PromptTemplate;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{Agent, AgentAction, AgentDecision, AgentFinish, AgentStep, AgentStrategy, PlanError};
use crate::output_parser::ParseError;
use crate::templates::{self, FINISH_COMMAND};

pub struct AutonomousAgent {
    llm: LanguageModel,
    persona: Persona,
    system: PromptTemplate,
    commands: String,
    allowed: BTreeSet<String>,
    /// Messages sent on the latest model call of any run. Runs sharing one
    /// agent overwrite each other's entry.
    transcript: Mutex<Conversation>,
}

/// Numbered command list shown to the model, `finish` last.
fn command_list(tools: &[Arc<dyn Tool>]) -> String {
    let mut lines: Vec<String> = tools
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}. {}: {}, args json schema: {{\"input\": {{\"type\": \"string\"}}}}",
                i + 1,
                t.name(),
                t.description()
            )
        })
        .collect();
    lines.push(format!(
        "{}. {FINISH_COMMAND}: use this to signal that you have finished all your objectives, \
         args: \"response\": \"final response to let people know you have finished your objectives\"",
        tools.len() + 1
    ));
    lines.join("\n")
}

/// The outermost JSON object in `text`, tolerating fences and prose around it.
fn json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn invalid_json(text: &str) -> ParseError {
    ParseError {
        message: "Could not parse invalid json".into(),
        observation: format!("Could not parse invalid json: {text}"),
        llm_output: text.to_string(),
    }
}

/// Parse a response into the next command.
fn parse_command(text: &str) -> std::result::Result<AgentDecision, ParseError> {
    let response = json_object(text).ok_or_else(|| invalid_json(text))?;
    let command = &response["command"];
    let Some(name) = command["name"].as_str() else {
        return Err(ParseError {
            message: "Incomplete command args".into(),
            observation: "Incomplete command args: a command needs a \"name\" and \"args\"".into(),
            llm_output: text.to_string(),
        });
    };
    let args = &command["args"];

    if name == FINISH_COMMAND {
        let answer = match &args["response"] {
            Value::String(s) => s.clone(),
            Value::Null => args.to_string(),
            other => other.to_string(),
        };
        return Ok(AgentDecision::Finish(AgentFinish {
            answer,
            log: text.to_string(),
        }));
    }

    let tool_input = match args {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => match &other["input"] {
            Value::String(s) => s.clone(),
            _ => other.to_string(),
        },
    };
    Ok(AgentDecision::Act(AgentAction {
        tool: name.to_string(),
        tool_input,
        log: text.to_string(),
    }))
}

/// Memory variables loaded for this run, in key order, or `None` when
/// nothing has been remembered yet.
fn remembered(inputs: &HashMap<String, String>) -> Option<String> {
    let mut vars: Vec<(&String, &String)> = inputs
        .iter()
        .filter(|(key, value)| key.as_str() != "input" && !value.trim().is_empty())
        .collect();
    if vars.is_empty() {
        return None;
    }
    vars.sort();
    Some(vars.into_iter().map(|(_, value)| value.trim()).collect::<Vec<_>>().join("\n"))
}

impl AutonomousAgent {
    pub fn new(llm: LanguageModel, persona: Persona, tools: &[Arc<dyn Tool>]) -> Self {
        Self {
            llm,
            persona,
            system: PromptTemplate::from_template(templates::AUTONOMOUS_SYSTEM),
            commands: command_list(tools),
            allowed: tools.iter().map(|t| t.name().to_string()).collect(),
            transcript: Mutex::new(Conversation::new()),
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Messages sent on the latest model call made by this agent.
    ///
    /// This is not scoped to a run: when several runs of one executor are in
    /// flight it holds whichever call happened last. Use run events to follow
    /// a single run.
    pub fn transcript(&self) -> Conversation {
        self.transcript
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    fn conversation(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
        last_turn: &str,
    ) -> Result<Conversation> {
        let goal = inputs.get("input").map(String::as_str).unwrap_or_default();
        let values = HashMap::from([
            ("ai_name".to_string(), self.persona.name.clone()),
            ("ai_role".to_string(), self.persona.role.clone()),
            ("goals".to_string(), format!("1. {goal}")),
            ("commands".to_string(), self.commands.clone()),
        ]);
        let mut conversation = Conversation::new();
        conversation.push(Message::system(self.system.format(&values)?));
        if let Some(past) = remembered(inputs) {
            conversation.push(Message::system(format!("{}\n{past}", templates::AUTONOMOUS_MEMORY)));
        }
        for step in steps {
            conversation.push(Message::assistant(step.log.clone()));
            conversation.push(Message::system(format!(
                "Command {} returned: {}",
                step.tool, step.observation
            )));
        }
        conversation.push(Message::user(last_turn));
        Ok(conversation)
    }

    async fn respond(&self, conversation: Conversation) -> Result<String> {
        debug!(agent = %self.persona.name, messages = conversation.len(), "Autonomous turn");
        let messages = conversation.messages.clone();
        if let Ok(mut transcript) = self.transcript.lock() {
            *transcript = conversation;
        }
        Ok(self.llm.chat(messages, &[]).await?)
    }
}

#[async_trait]
impl Agent for AutonomousAgent {
    fn strategy(&self) -> AgentStrategy {
        AgentStrategy::Autonomous
    }

    fn prompt_text(&self) -> &str {
        self.system.template()
    }

    fn allowed_tools(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    async fn plan(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> std::result::Result<AgentDecision, PlanError> {
        let conversation = self.conversation(inputs, steps, templates::AUTONOMOUS_USER_INPUT)?;
        let text = self.respond(conversation).await?;
        Ok(parse_command(&text)?)
    }

    async fn finish_early(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<AgentFinish> {
        let last_turn = format!(
            "{} Respond with the \"{FINISH_COMMAND}\" command.",
            templates::GENERATE_FINAL_ANSWER.trim()
        );
        let text = self.respond(self.conversation(inputs, steps, &last_turn)?).await?;
        match parse_command(&text) {
            Ok(AgentDecision::Finish(finish)) => Ok(finish),
            _ => Ok(AgentFinish {
                answer: text.clone(),
                log: text,
            }),
        }
    }
}
