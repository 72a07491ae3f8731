use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::registry::ToolRegistry;

const MAX_TOOL_ROUNDS: usize = 8;
pub const INSTRUCTIONS: &str = "You are a helpful movie assistant that answers using live TMDb data. \
Use the date tools to turn relative periods into ISO dates before discovering movies, \
and look up ids with the search tools before asking for details.";

/// Answers one free-text question.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String>;
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// One chat-completion round trip with function calling enabled.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Value], tools: &[Value]) -> Result<AssistantMessage>;
}

#[derive(Debug, Clone)]
pub struct AzureChatModel {
    client: Client,
    url: String,
    api_key: String,
}

impl AzureChatModel {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build Azure OpenAI HTTP client")?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint,
            urlencoding::encode(&config.deployment),
            urlencoding::encode(&config.api_version)
        );
        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for AzureChatModel {
    async fn complete(&self, messages: &[Value], tools: &[Value]) -> Result<AssistantMessage> {
        #[derive(Deserialize)]
        struct Choice {
            message: AssistantMessage,
        }
        #[derive(Deserialize)]
        struct Completion {
            #[serde(default)]
            choices: Vec<Choice>,
        }

        let mut body = json!({ "messages": messages });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
        }
        let res = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Chat completion request failed")?;
        let status = res.status();
        let text = res.text().await.context("Reading chat completion body failed")?;
        if !status.is_success() {
            return Err(anyhow!("Chat completion HTTP error (status {}): {}", status, text));
        }
        let parsed: Completion =
            serde_json::from_str(&text).context("Failed to parse chat completion JSON")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| anyhow!("Chat completion returned no choices"))
    }
}

/// Runs the model, executing requested tools through the registry until it answers.
pub struct ToolAgent {
    name: String,
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
}

impl ToolAgent {
    pub fn new(name: impl Into<String>, model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            model,
            tools,
        }
    }

    fn tool_definitions(&self) -> Vec<Value> {
        self.tools
            .specs()
            .into_iter()
            .map(|spec| {
                json!({
                    "type": "function",
                    "function": {
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.parameters,
                    }
                })
            })
            .collect()
    }
}

#[async_trait]
impl Agent for ToolAgent {
    async fn ask(&self, question: &str) -> Result<String> {
        let tools = self.tool_definitions();
        let mut messages = vec![
            json!({ "role": "system", "content": INSTRUCTIONS }),
            json!({ "role": "user", "content": question }),
        ];

        for round in 0..MAX_TOOL_ROUNDS {
            let reply = self.model.complete(&messages, &tools).await?;
            if reply.tool_calls.is_empty() {
                info!(agent = %self.name, rounds = round, "Answered question");
                return Ok(reply.content.unwrap_or_default());
            }

            let requested: Vec<Value> = reply
                .tool_calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": { "name": c.function.name, "arguments": c.function.arguments },
                    })
                })
                .collect();
            messages.push(json!({
                "role": "assistant",
                "content": reply.content,
                "tool_calls": requested,
            }));

            for call in &reply.tool_calls {
                debug!(agent = %self.name, tool = %call.function.name, "Invoking tool");
                let content = match self.tools.call(&call.function.name, &call.function.arguments).await {
                    Ok(out) => out,
                    Err(e) => {
                        warn!(tool = %call.function.name, "Tool error returned to model: {}", e);
                        format!("Error: {e}")
                    }
                };
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": content,
                }));
            }
        }

        bail!("Agent did not produce an answer within {} tool rounds", MAX_TOOL_ROUNDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use std::future::ready;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<AssistantMessage>>,
        seen: Mutex<Vec<Vec<Value>>>,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[Value], _tools: &[Value]) -> Result<AssistantMessage> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Ok(AssistantMessage {
                    content: None,
                    tool_calls: vec![call("loop", "today", "{}")],
                });
            }
            Ok(replies.remove(0))
        }
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: args.to_string(),
            },
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        r.register("today", "Today", json!({"type": "object"}), |_| {
            ready(Ok("2025-06-13".to_string()))
        });
        r.register("fails", "Always fails", json!({"type": "object"}), |_| {
            ready(Err(ToolError::validation("bad input")))
        });
        Arc::new(r)
    }

    #[tokio::test]
    async fn feeds_tool_results_back_until_answer() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![
                AssistantMessage {
                    content: None,
                    tool_calls: vec![call("c1", "today", "{}"), call("c2", "fails", "{}")],
                },
                AssistantMessage {
                    content: Some("It is 2025-06-13.".to_string()),
                    tool_calls: vec![],
                },
            ]),
            seen: Mutex::new(Vec::new()),
        });
        let agent = ToolAgent::new("test", model.clone(), registry());
        let answer = agent.ask("What day is it?").await.unwrap();
        assert_eq!(answer, "It is 2025-06-13.");

        let seen = model.seen.lock().unwrap();
        let second = &seen[1];
        assert_eq!(second.len(), 5);
        assert_eq!(second[3]["tool_call_id"], "c1");
        assert_eq!(second[3]["content"], "2025-06-13");
        assert_eq!(second[4]["content"], "Error: invalid argument: bad input");
    }

    #[tokio::test]
    async fn gives_up_after_round_limit() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        });
        let agent = ToolAgent::new("test", model, registry());
        assert!(agent.ask("loop forever").await.is_err());
    }

    #[test]
    fn decodes_tool_call_messages() {
        let msg: AssistantMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "search_movies", "arguments": "{\"movieTitle\":\"Heat\"}" }
            }]
        }))
        .unwrap();
        assert_eq!(msg.tool_calls[0].function.name, "search_movies");
        assert!(msg.content.is_none());
    }
}
