//! Parsers turning raw model text into the next agent decision.

use crate::agents::{AgentAction, AgentDecision, AgentFinish};

/// Observation fed back when the output is unusable and no better hint exists.
pub const INVALID_RESPONSE: &str = "Invalid or incomplete response";

const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";

/// Model output that could not be turned into a decision.
///
/// The executor recovers by recording a step whose observation is
/// [`ParseError::observation`], so the model sees what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub observation: String,
    pub llm_output: String,
}

impl ParseError {
    fn unparseable(text: &str) -> Self {
        Self {
            message: format!("Could not parse LLM output: `{text}`"),
            observation: INVALID_RESPONSE.into(),
            llm_output: text.to_string(),
        }
    }

    fn with_hint(text: &str, hint: &str) -> Self {
        Self {
            message: format!("Could not parse LLM output: `{text}`"),
            observation: hint.to_string(),
            llm_output: text.to_string(),
        }
    }
}

pub trait OutputParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<AgentDecision, ParseError>;
}

/// Text after the last occurrence of `marker`, trimmed.
fn after_last<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.rfind(marker).map(|i| text[i + marker.len()..].trim())
}

fn finish(answer: &str, text: &str) -> AgentDecision {
    AgentDecision::Finish(AgentFinish {
        answer: answer.to_string(),
        log: text.to_string(),
    })
}

fn act(tool: &str, tool_input: &str, text: &str) -> AgentDecision {
    AgentDecision::Act(AgentAction {
        tool: tool.to_string(),
        tool_input: tool_input.to_string(),
        log: text.to_string(),
    })
}

/// Split `Action: x ... Action Input: y` into `(x, y)`.
fn action_and_input(text: &str) -> Option<(&str, &str)> {
    let start = text.find("Action:")? + "Action:".len();
    let rest = &text[start..];
    let split = rest.find("Action Input:")?;
    let tool = rest[..split].trim();
    let mut input = &rest[split + "Action Input:".len()..];
    if let Some(cut) = input.find("\nObservation") {
        input = &input[..cut];
    }
    Some((tool, input.trim().trim_matches('"')))
}

// ── Zero-shot ReAct ─────────────────────────────────────────────────────────

/// `Thought / Action / Action Input` or `Final Answer:`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MrklOutputParser;

const FINAL_ANSWER: &str = "Final Answer:";

impl OutputParser for MrklOutputParser {
    fn parse(&self, text: &str) -> Result<AgentDecision, ParseError> {
        let includes_answer = text.contains(FINAL_ANSWER);
        match action_and_input(text) {
            Some(_) if includes_answer => Err(ParseError {
                message: format!(
                    "Parsing LLM output produced both a final answer and a parse-able action: {text}"
                ),
                observation: INVALID_RESPONSE.into(),
                llm_output: text.to_string(),
            }),
            Some((tool, input)) if !tool.is_empty() => Ok(act(tool, input, text)),
            _ if includes_answer => {
                Ok(finish(after_last(text, FINAL_ANSWER).unwrap_or_default(), text))
            }
            _ if !text.contains("Action:") => Err(ParseError::with_hint(text, MISSING_ACTION)),
            _ if !text.contains("Action Input:") => {
                Err(ParseError::with_hint(text, MISSING_ACTION_INPUT))
            }
            _ => Err(ParseError::unparseable(text)),
        }
    }
}

// ── Conversational ──────────────────────────────────────────────────────────

/// Like [`MrklOutputParser`] but finishes on `{ai_prefix}:`.
#[derive(Debug, Clone)]
pub struct ConversationalOutputParser {
    ai_prefix: String,
}

impl ConversationalOutputParser {
    pub fn new(ai_prefix: impl Into<String>) -> Self {
        Self {
            ai_prefix: ai_prefix.into(),
        }
    }
}

impl Default for ConversationalOutputParser {
    fn default() -> Self {
        Self::new("AI")
    }
}

impl OutputParser for ConversationalOutputParser {
    fn parse(&self, text: &str) -> Result<AgentDecision, ParseError> {
        let marker = format!("{}:", self.ai_prefix);
        if let Some(answer) = after_last(text, &marker) {
            return Ok(finish(answer, text));
        }
        match action_and_input(text) {
            Some((tool, input)) if !tool.is_empty() => Ok(act(tool, input, text)),
            _ => Err(ParseError::unparseable(text)),
        }
    }
}

// ── Self-ask with search ────────────────────────────────────────────────────

/// Name of the single tool a self-ask agent may use.
pub const INTERMEDIATE_ANSWER: &str = "Intermediate Answer";

const FOLLOW_UPS: [&str; 2] = ["Follow up:", "Followup:"];
const SELF_ASK_FINISH: &str = "So the final answer is: ";

/// Reads only the last line: a follow-up question or the final answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfAskOutputParser;

impl OutputParser for SelfAskOutputParser {
    fn parse(&self, text: &str) -> Result<AgentDecision, ParseError> {
        let last_line = text.trim_end().rsplit('\n').next().unwrap_or_default();
        if FOLLOW_UPS.iter().any(|f| last_line.contains(f)) {
            let question = last_line.rsplit(':').next().unwrap_or_default().trim();
            return Ok(act(INTERMEDIATE_ANSWER, question, text));
        }
        match last_line.find(SELF_ASK_FINISH) {
            Some(i) => Ok(finish(last_line[i + SELF_ASK_FINISH.len()..].trim(), text)),
            None => Err(ParseError::unparseable(text)),
        }
    }
}

// ── Chat zero-shot ──────────────────────────────────────────────────────────

/// A fenced JSON blob `{"action": ..., "action_input": ...}` or `Final Answer:`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatOutputParser;

impl ChatOutputParser {
    fn blob(text: &str) -> Option<serde_json::Value> {
        let mut fences = text.split("```");
        fences.next()?;
        let body = fences.next()?.trim();
        let body = body.strip_prefix("json").unwrap_or(body);
        serde_json::from_str(body.trim()).ok()
    }
}

impl OutputParser for ChatOutputParser {
    fn parse(&self, text: &str) -> Result<AgentDecision, ParseError> {
        if let Some(answer) = after_last(text, FINAL_ANSWER) {
            return Ok(finish(answer, text));
        }
        let blob = Self::blob(text).ok_or_else(|| ParseError::unparseable(text))?;
        let tool = blob["action"]
            .as_str()
            .ok_or_else(|| ParseError::unparseable(text))?;
        let input = match &blob["action_input"] {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(act(tool, &input, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(decision: AgentDecision) -> AgentAction {
        match decision {
            AgentDecision::Act(a) => a,
            AgentDecision::Finish(f) => panic!("expected action, got finish: {}", f.answer),
        }
    }

    fn answer(decision: AgentDecision) -> String {
        match decision {
            AgentDecision::Finish(f) => f.answer,
            AgentDecision::Act(a) => panic!("expected finish, got action: {}", a.tool),
        }
    }

    #[test]
    fn mrkl_action() {
        let text = " I should look at the tables.\nAction: sql_db_list_tables\nAction Input: \"\"";
        let a = action(MrklOutputParser.parse(text).unwrap());
        assert_eq!(a.tool, "sql_db_list_tables");
        assert_eq!(a.tool_input, "");
        assert_eq!(a.log, text);
    }

    #[test]
    fn mrkl_action_input_stops_at_observation() {
        let text = "Action: table_query\nAction Input: df['value'].sum()\nObservation: 30";
        let a = action(MrklOutputParser.parse(text).unwrap());
        assert_eq!(a.tool_input, "df['value'].sum()");
    }

    #[test]
    fn mrkl_final_answer() {
        let text = " I now know the final answer\nFinal Answer: The sum is 30.";
        assert_eq!(answer(MrklOutputParser.parse(text).unwrap()), "The sum is 30.");
    }

    #[test]
    fn mrkl_both_is_an_error() {
        let text = "Action: search\nAction Input: x\nFinal Answer: y";
        let err = MrklOutputParser.parse(text).unwrap_err();
        assert!(err.message.contains("both a final answer"));
        assert_eq!(err.observation, INVALID_RESPONSE);
    }

    #[test]
    fn mrkl_missing_labels_give_hints() {
        let err = MrklOutputParser.parse("I am thinking").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION);
        let err = MrklOutputParser.parse("Action: search").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION_INPUT);
        assert_eq!(err.llm_output, "Action: search");
    }

    #[test]
    fn conversational_finishes_on_ai_prefix() {
        let parser = ConversationalOutputParser::default();
        let text = "Thought: Do I need to use a tool? No\nAI: Hello Bob!";
        assert_eq!(answer(parser.parse(text).unwrap()), "Hello Bob!");

        let text = "Thought: Do I need to use a tool? Yes\nAction: calculator\nAction Input: 2+2";
        let a = action(parser.parse(text).unwrap());
        assert_eq!((a.tool.as_str(), a.tool_input.as_str()), ("calculator", "2+2"));

        assert!(parser.parse("no idea").is_err());
    }

    #[test]
    fn self_ask_reads_last_line() {
        let text = " Yes.\nFollow up: Who was the founder of craigslist?";
        let a = action(SelfAskOutputParser.parse(text).unwrap());
        assert_eq!(a.tool, INTERMEDIATE_ANSWER);
        assert_eq!(a.tool_input, "Who was the founder of craigslist?");

        let text = "Intermediate answer: 1952.\nSo the final answer is: December 6, 1952";
        assert_eq!(answer(SelfAskOutputParser.parse(text).unwrap()), "December 6, 1952");

        assert!(SelfAskOutputParser.parse("Yes.").is_err());
    }

    #[test]
    fn chat_parses_json_blob() {
        let text = "Thought: use the calculator\nAction:\n```json\n{\"action\": \"calculator\", \"action_input\": \"3 * 4\"}\n```";
        let a = action(ChatOutputParser.parse(text).unwrap());
        assert_eq!((a.tool.as_str(), a.tool_input.as_str()), ("calculator", "3 * 4"));

        let text = "```\n{\"action\": \"lookup\", \"action_input\": {\"id\": 3}}\n```";
        assert_eq!(action(ChatOutputParser.parse(text).unwrap()).tool_input, "{\"id\":3}");
    }

    #[test]
    fn chat_final_answer_and_garbage() {
        assert_eq!(answer(ChatOutputParser.parse("Final Answer: 12").unwrap()), "12");
        assert!(ChatOutputParser.parse("```not json```").is_err());
        assert!(ChatOutputParser.parse("plain words").is_err());
    }
}
