//! LLM-backed persona agent
//!
//! Renders each phase's prompt from the template provider, sends it
//! through an [`LlmGateway`] session seeded with the persona's system
//! prompt, and turns the raw response into the phase's result type.

use crate::ports::agent::{AgentError, DeltaSender, PersonaAgent};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::template_provider::TemplateProvider;
use async_trait::async_trait;
use council_domain::core::string::truncate;
use council_domain::{
    DebateRequest, DebateResult, Persona, PromptTemplate, TemplateName, ThinkingResult,
    VoteResult, extract_vote_payload, parse_debate_sections, parse_vote_payload,
};
use std::sync::Arc;
use tracing::debug;

/// One persona answered by one model
pub struct LlmPersonaAgent {
    persona: Persona,
    model: String,
    gateway: Arc<dyn LlmGateway>,
    templates: Arc<dyn TemplateProvider>,
}

impl LlmPersonaAgent {
    pub fn new(
        persona: Persona,
        model: impl Into<String>,
        gateway: Arc<dyn LlmGateway>,
        templates: Arc<dyn TemplateProvider>,
    ) -> Self {
        Self {
            persona,
            model: model.into(),
            gateway,
            templates,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `content` in a fresh session.
    async fn ask(&self, content: &str) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(&self.model, PromptTemplate::persona_system(self.persona))
            .await?;
        debug!(persona = %self.persona, model = %session.model(), "Sending prompt");
        let reply = session.send(content).await?;
        debug!(
            persona = %self.persona,
            chars = reply.chars().count(),
            preview = %truncate(&reply, 80),
            "Received response"
        );
        Ok(reply)
    }

    /// Send `content`, forwarding every partial chunk to `deltas`.
    async fn ask_streaming(&self, content: &str, deltas: DeltaSender) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(&self.model, PromptTemplate::persona_system(self.persona))
            .await?;
        let handle = session.send_streaming(content).await?;
        handle
            .collect_with(|chunk| {
                deltas.send(chunk);
            })
            .await
    }
}

#[async_trait]
impl PersonaAgent for LlmPersonaAgent {
    fn persona(&self) -> Persona {
        self.persona
    }

    async fn think(&self, prompt: &str) -> Result<ThinkingResult, AgentError> {
        let template = self.templates.get_or_builtin(TemplateName::Think);
        let content = PromptTemplate::think_prompt(&template.body, prompt);
        let text = self.ask(&content).await?;
        Ok(ThinkingResult::new(self.persona, text.trim()))
    }

    async fn debate(
        &self,
        request: &DebateRequest,
        deltas: Option<DeltaSender>,
    ) -> Result<DebateResult, AgentError> {
        let template = self.templates.get_or_builtin(TemplateName::Debate);
        let content = PromptTemplate::debate_prompt(&template.body, request);

        let text = match deltas {
            Some(deltas) => self.ask_streaming(&content, deltas).await?,
            None => self.ask(&content).await?,
        };

        let responses = parse_debate_sections(&text, &request.targets());
        Ok(DebateResult::new(self.persona, request.round, responses))
    }

    async fn vote(&self, context: &str) -> Result<VoteResult, AgentError> {
        let template = self.templates.get_or_builtin(TemplateName::Vote);
        let content = PromptTemplate::vote_prompt(&template.body, context);
        let text = self.ask(&content).await?;

        let Some(payload) = extract_vote_payload(&text) else {
            return Err(AgentError::SchemaValidation(vec![
                "response contains no JSON object".to_string(),
            ]));
        };
        parse_vote_payload(self.persona, &payload).map_err(AgentError::SchemaValidation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{LlmSession, StreamHandle};
    use crate::ports::template_provider::BuiltinTemplates;
    use council_domain::{StreamEvent, Vote};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Gateway whose sessions answer every message with a fixed reply
    struct FixedGateway {
        reply: String,
        system_prompts: Mutex<Vec<String>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl FixedGateway {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                system_prompts: Mutex::new(Vec::new()),
                messages: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    struct FixedSession {
        model: String,
        reply: String,
        messages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &str,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            if model == "missing" {
                return Err(GatewayError::ModelNotAvailable(model.to_string()));
            }
            self.system_prompts
                .lock()
                .unwrap()
                .push(system_prompt.to_string());
            Ok(Box::new(FixedSession {
                model: model.to_string(),
                reply: self.reply.clone(),
                messages: self.messages.clone(),
            }))
        }
    }

    #[async_trait]
    impl LlmSession for FixedSession {
        fn model(&self) -> &str {
            &self.model
        }

        async fn send(&self, content: &str) -> Result<String, GatewayError> {
            self.messages.lock().unwrap().push(content.to_string());
            Ok(self.reply.clone())
        }

        async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
            self.messages.lock().unwrap().push(content.to_string());
            let (tx, rx) = mpsc::channel(16);
            let words: Vec<String> = self
                .reply
                .split_inclusive(' ')
                .map(str::to_string)
                .collect();
            for word in words {
                let _ = tx.send(StreamEvent::Delta(word)).await;
            }
            let _ = tx.send(StreamEvent::Completed(self.reply.clone())).await;
            Ok(StreamHandle::new(rx))
        }
    }

    fn agent(persona: Persona, gateway: Arc<FixedGateway>) -> LlmPersonaAgent {
        LlmPersonaAgent::new(persona, "test-model", gateway, Arc::new(BuiltinTemplates))
    }

    fn request(persona: Persona) -> DebateRequest {
        let others_thinking = persona
            .others()
            .into_iter()
            .map(|p| (p, format!("{} thinks", p)))
            .collect();
        DebateRequest {
            persona,
            round: 1,
            prompt: "ship it?".to_string(),
            others_thinking,
            previous_round: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_think_uses_persona_system_prompt() {
        let gateway = Arc::new(FixedGateway::new("  careful numbers  "));
        let result = agent(Persona::Skeptic, gateway.clone())
            .think("ship it?")
            .await
            .unwrap();

        assert_eq!(result.persona, Persona::Skeptic);
        assert_eq!(result.text, "careful numbers");
        assert_eq!(
            gateway.system_prompts.lock().unwrap()[0],
            PromptTemplate::persona_system(Persona::Skeptic)
        );
        assert!(gateway.messages.lock().unwrap()[0].contains("ship it?"));
    }

    #[tokio::test]
    async fn test_debate_parses_sections() {
        let reply = "### To Skeptic\nThe risk is priced in.\n\n### To Advocate\nAgreed on upside.";
        let gateway = Arc::new(FixedGateway::new(reply));
        let result = agent(Persona::Analyst, gateway)
            .debate(&request(Persona::Analyst), None)
            .await
            .unwrap();

        assert_eq!(result.round, 1);
        assert_eq!(result.responses[&Persona::Skeptic], "The risk is priced in.");
        assert_eq!(result.responses[&Persona::Advocate], "Agreed on upside.");
    }

    #[tokio::test]
    async fn test_debate_streams_deltas() {
        let gateway = Arc::new(FixedGateway::new("short reply"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let deltas = DeltaSender::new(Persona::Advocate, tx);

        let result = agent(Persona::Advocate, gateway)
            .debate(&request(Persona::Advocate), Some(deltas))
            .await
            .unwrap();

        let mut streamed = String::new();
        while let Ok((persona, text)) = rx.try_recv() {
            assert_eq!(persona, Persona::Advocate);
            streamed.push_str(&text);
        }
        assert_eq!(streamed, "short reply");
        // No sections: every target receives the whole reply
        assert_eq!(result.responses[&Persona::Analyst], "short reply");
    }

    #[tokio::test]
    async fn test_vote_parses_fenced_payload() {
        let reply = "Here is my vote:\n```json\n{\"vote\": \"CONDITIONAL\", \"reason\": \"ok\", \"conditions\": [\"add monitoring\"]}\n```";
        let gateway = Arc::new(FixedGateway::new(reply));
        let vote = agent(Persona::Skeptic, gateway).vote("ctx").await.unwrap();

        assert_eq!(vote.vote, Vote::Conditional);
        assert_eq!(vote.condition_list(), ["add monitoring".to_string()]);
    }

    #[tokio::test]
    async fn test_vote_without_json_is_schema_error() {
        let gateway = Arc::new(FixedGateway::new("I approve."));
        let err = agent(Persona::Analyst, gateway).vote("ctx").await.unwrap_err();
        assert!(err.is_schema_error());
    }

    #[tokio::test]
    async fn test_vote_with_invalid_payload_is_schema_error() {
        let gateway = Arc::new(FixedGateway::new("{\"vote\": \"MAYBE\", \"reason\": \"\"}"));
        let err = agent(Persona::Analyst, gateway).vote("ctx").await.unwrap_err();
        assert!(!err.schema_errors().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let gateway = Arc::new(FixedGateway::new("x"));
        let agent = LlmPersonaAgent::new(
            Persona::Analyst,
            "missing",
            gateway,
            Arc::new(BuiltinTemplates),
        );
        let err = agent.think("q").await.unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(_)));
    }
}
