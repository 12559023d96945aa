use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
use super::prompt::*;
use super::{DraftingError, DraftingModel, LlmClient, Provider};
use crate::config::AppConfig;

/// Production `LlmClient`: dispatches on the caller's provider choice and
/// injects the server-held key for that provider.
///
/// Provider HTTP clients are built per call, inside the blocking context
/// the call runs in.
#[derive(Debug, Clone)]
pub struct HttpDraftingClient {
    openai_api_key: Option<String>,
    openai_base_url: String,
    gemini_api_key: Option<String>,
    gemini_base_url: String,
    timeout_secs: u64,
}

impl HttpDraftingClient {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            openai_api_key: config.openai_api_key.clone(),
            openai_base_url: config.openai_base_url.clone(),
            gemini_api_key: config.gemini_api_key.clone(),
            gemini_base_url: config.gemini_base_url.clone(),
            timeout_secs: config.ai_timeout_secs,
        }
    }

    fn key_for(&self, provider: Provider) -> Result<&str, DraftingError> {
        let key = match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
            .ok_or(DraftingError::MissingApiKey(provider))
    }

    fn openai(&self) -> Result<OpenAiClient, DraftingError> {
        let key = self.key_for(Provider::OpenAi)?;
        OpenAiClient::new(&self.openai_base_url, key, self.timeout_secs)
    }
}

impl LlmClient for HttpDraftingClient {
    fn complete(
        &self,
        model: &DraftingModel,
        system: &str,
        prompt: &str,
    ) -> Result<String, DraftingError> {
        if model.model.trim().is_empty() {
            return Err(DraftingError::InvalidInput("Modelo de IA não informado".into()));
        }
        tracing::info!(provider = %model.provider, model = %model.model, "Drafting request");

        match model.provider {
            Provider::OpenAi => self.openai()?.chat(&model.model, system, prompt),
            Provider::Gemini => {
                let key = self.key_for(Provider::Gemini)?;
                GeminiClient::new(&self.gemini_base_url, key, self.timeout_secs)?
                    .generate(&model.model, system, prompt)
            }
        }
    }

    fn proxy_chat(&self, body: &serde_json::Value) -> Result<serde_json::Value, DraftingError> {
        let has_messages = body
            .get("messages")
            .and_then(|m| m.as_array())
            .is_some_and(|m| !m.is_empty());
        if !has_messages {
            return Err(DraftingError::InvalidInput(
                "O corpo da requisição deve conter 'messages'".into(),
            ));
        }
        self.openai()?.post_json(body)
    }
}

/// Diagnosis drafted from an intake form, with the options parsed out of it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosisDraft {
    pub diagnosis: String,
    pub options: Vec<TreatmentOption>,
}

/// Stage 1: validate the intake, then draft the initial diagnosis.
pub fn generate_diagnosis(
    client: &dyn LlmClient,
    model: &DraftingModel,
    intake: &IntakeForm,
) -> Result<DiagnosisDraft, DraftingError> {
    intake.validate()?;
    let prompt = build_diagnosis_prompt(intake);
    let diagnosis = client.complete(model, ORTHODONTIST_SYSTEM_PROMPT, &prompt)?;
    let options = parse_treatment_options(&diagnosis);
    tracing::debug!(options = options.len(), "Diagnosis drafted");
    Ok(DiagnosisDraft { diagnosis, options })
}

/// Stage 2: draft the phased plan for the selected option.
pub fn generate_phased_plan(
    client: &dyn LlmClient,
    model: &DraftingModel,
    intake: &IntakeForm,
    diagnosis: &str,
    selected_option: &str,
) -> Result<String, DraftingError> {
    let prompt = build_phased_plan_prompt(intake, diagnosis, selected_option)?;
    client.complete(model, ORTHODONTIST_SYSTEM_PROMPT, &prompt)
}

/// Contract step: summary of the stored plan for the contract body.
pub fn generate_contract_summary(
    client: &dyn LlmClient,
    model: &DraftingModel,
    patient_name: &str,
    plan: &str,
) -> Result<String, DraftingError> {
    let prompt = build_contract_summary_prompt(patient_name, plan)?;
    client.complete(model, CONTRACT_SYSTEM_PROMPT, &prompt)
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Records prompts and answers from a fixed script.
    pub struct ScriptedLlm {
        pub answer: Result<String, (u16, String)>,
        pub prompts: Mutex<Vec<(DraftingModel, String)>>,
    }

    impl ScriptedLlm {
        pub fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16, message: &str) -> Self {
            Self {
                answer: Err((status, message.to_string())),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn reply(&self, provider: Provider) -> Result<String, DraftingError> {
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err((status, message)) => Err(DraftingError::Upstream {
                    provider,
                    status: *status,
                    message: message.clone(),
                }),
            }
        }
    }

    impl LlmClient for ScriptedLlm {
        fn complete(
            &self,
            model: &DraftingModel,
            _system: &str,
            prompt: &str,
        ) -> Result<String, DraftingError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.clone(), prompt.to_string()));
            self.reply(model.provider)
        }

        fn proxy_chat(
            &self,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DraftingError> {
            self.prompts
                .lock()
                .unwrap()
                .push((DraftingModel::default(), body.to_string()));
            let text = self.reply(Provider::OpenAi)?;
            Ok(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": text}}]
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedLlm;
    use super::*;

    fn intake() -> IntakeForm {
        IntakeForm {
            patient_name: "Lucas".into(),
            chief_complaint: "Mordida aberta".into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let client = HttpDraftingClient::from_config(&AppConfig::from_lookup(|_| None));
        let err = client
            .complete(&DraftingModel::new(Provider::Gemini, "gemini-1.5-pro"), "", "oi")
            .unwrap_err();
        assert!(matches!(err, DraftingError::MissingApiKey(Provider::Gemini)));

        let body = serde_json::json!({"messages": [{"role": "user", "content": "oi"}]});
        let err = client.proxy_chat(&body).unwrap_err();
        assert!(matches!(err, DraftingError::MissingApiKey(Provider::OpenAi)));
    }

    #[test]
    fn proxy_requires_messages() {
        let client = HttpDraftingClient::from_config(&AppConfig::from_lookup(|_| None));
        for body in [serde_json::json!({}), serde_json::json!({"messages": []})] {
            let err = client.proxy_chat(&body).unwrap_err();
            assert!(matches!(err, DraftingError::InvalidInput(_)));
        }
    }

    #[test]
    fn empty_model_name_is_invalid() {
        let client = HttpDraftingClient::from_config(&AppConfig::from_lookup(|_| None));
        let err = client
            .complete(&DraftingModel::new(Provider::OpenAi, " "), "", "oi")
            .unwrap_err();
        assert!(matches!(err, DraftingError::InvalidInput(_)));
    }

    #[test]
    fn diagnosis_validates_before_calling() {
        let llm = ScriptedLlm::answering("irrelevante");
        let mut form = intake();
        form.chief_complaint.clear();
        let err = generate_diagnosis(&llm, &DraftingModel::default(), &form).unwrap_err();
        assert!(matches!(err, DraftingError::InvalidInput(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn diagnosis_returns_text_and_options() {
        let llm = ScriptedLlm::answering(
            "# Diagnóstico\nMordida aberta anterior\n# Opções de tratamento\n\
             Opção 1: Grade palatina\nOpção 2: Alinhadores",
        );
        let draft = generate_diagnosis(&llm, &DraftingModel::default(), &intake()).unwrap();
        assert!(draft.diagnosis.contains("Mordida aberta anterior"));
        assert_eq!(draft.options.len(), 2);
        assert_eq!(llm.calls(), 1);
    }

    #[test]
    fn phased_plan_uses_selected_provider() {
        let llm = ScriptedLlm::answering("# Fase 1 - Alinhamento");
        let model = DraftingModel::new(Provider::Gemini, "gemini-1.5-flash");
        let plan =
            generate_phased_plan(&llm, &model, &intake(), "Mordida aberta", "Opção 1: Grade")
                .unwrap();
        assert_eq!(plan, "# Fase 1 - Alinhamento");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts[0].0.provider, Provider::Gemini);
        assert!(prompts[0].1.contains("Opção 1: Grade"));
    }

    #[test]
    fn upstream_failure_propagates() {
        let llm = ScriptedLlm::failing(429, "Rate limit reached");
        let err = generate_contract_summary(&llm, &DraftingModel::default(), "Lucas", "# Fase 1")
            .unwrap_err();
        match err {
            DraftingError::Upstream { status, message, .. } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
