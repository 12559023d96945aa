//! Prompt templates for the planning stages.
//!
//! Every template is plain Portuguese text with the patient facts embedded
//! line by line. Missing optional fields are rendered as "Não informado" so
//! the model never sees an empty label.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::DraftingError;

pub const ORTHODONTIST_SYSTEM_PROMPT: &str = "Você é um ortodontista experiente que auxilia \
clínicos no planejamento de tratamentos. Responda em português do Brasil, com linguagem \
técnica, objetiva e organizada em seções com títulos iniciados por '#'.";

pub const CONTRACT_SYSTEM_PROMPT: &str = "Você redige cláusulas de contratos de prestação de \
serviços odontológicos. Responda em português do Brasil, com linguagem clara e formal, sem \
inventar valores ou datas que não foram informados.";

const NOT_INFORMED: &str = "Não informado";

/// Intake form submitted with the diagnosis request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeForm {
    pub patient_name: String,
    pub age: Option<u32>,
    pub chief_complaint: String,
    pub medical_history: Option<String>,
    pub dental_history: Option<String>,
    pub facial_profile: Option<String>,
    pub molar_relationship: Option<String>,
    pub canine_relationship: Option<String>,
    pub overjet_mm: Option<f32>,
    pub overbite_mm: Option<f32>,
    pub crowding: Option<String>,
    pub crossbite: Option<String>,
    pub habits: Option<String>,
    pub radiographic_findings: Option<String>,
    pub observations: Option<String>,
}

impl IntakeForm {
    /// Reject forms missing the fields every prompt depends on.
    pub fn validate(&self) -> Result<(), DraftingError> {
        if self.patient_name.trim().is_empty() {
            return Err(DraftingError::InvalidInput(
                "O nome do paciente é obrigatório".into(),
            ));
        }
        if self.chief_complaint.trim().is_empty() {
            return Err(DraftingError::InvalidInput(
                "A queixa principal é obrigatória".into(),
            ));
        }
        Ok(())
    }

    fn facts(&self) -> String {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_INFORMED)
                .to_string()
        };
        let mm = |v: Option<f32>| {
            v.map(|n| format!("{n:.1} mm"))
                .unwrap_or_else(|| NOT_INFORMED.to_string())
        };

        [
            format!("- Paciente: {}", self.patient_name.trim()),
            format!(
                "- Idade: {}",
                self.age
                    .map(|a| format!("{a} anos"))
                    .unwrap_or_else(|| NOT_INFORMED.to_string())
            ),
            format!("- Queixa principal: {}", self.chief_complaint.trim()),
            format!("- Histórico médico: {}", text(&self.medical_history)),
            format!("- Histórico odontológico: {}", text(&self.dental_history)),
            format!("- Perfil facial: {}", text(&self.facial_profile)),
            format!("- Relação molar: {}", text(&self.molar_relationship)),
            format!("- Relação de caninos: {}", text(&self.canine_relationship)),
            format!("- Sobressaliência (overjet): {}", mm(self.overjet_mm)),
            format!("- Sobremordida (overbite): {}", mm(self.overbite_mm)),
            format!("- Apinhamento: {}", text(&self.crowding)),
            format!("- Mordida cruzada: {}", text(&self.crossbite)),
            format!("- Hábitos: {}", text(&self.habits)),
            format!("- Achados radiográficos: {}", text(&self.radiographic_findings)),
            format!("- Observações: {}", text(&self.observations)),
        ]
        .join("\n")
    }
}

/// Stage 1: initial diagnosis with numbered treatment options.
pub fn build_diagnosis_prompt(intake: &IntakeForm) -> String {
    format!(
        "Com base nos dados clínicos abaixo, elabore um diagnóstico ortodôntico inicial.\n\n\
         DADOS DO PACIENTE:\n{facts}\n\n\
         Estruture a resposta em:\n\
         # Diagnóstico\n\
         Resumo esquelético, dentário e funcional.\n\
         # Problemas identificados\n\
         Lista objetiva.\n\
         # Opções de tratamento\n\
         Liste de 2 a 4 opções, uma por linha, no formato \
         'Opção N: <abordagem> - <justificativa resumida>'.",
        facts = intake.facts()
    )
}

/// Stage 2: phased plan for the option the clinician selected.
pub fn build_phased_plan_prompt(
    intake: &IntakeForm,
    diagnosis: &str,
    selected_option: &str,
) -> Result<String, DraftingError> {
    if diagnosis.trim().is_empty() {
        return Err(DraftingError::InvalidInput(
            "Gere o diagnóstico antes do plano de tratamento".into(),
        ));
    }
    if selected_option.trim().is_empty() {
        return Err(DraftingError::InvalidInput(
            "Selecione uma opção de tratamento".into(),
        ));
    }

    Ok(format!(
        "Elabore um plano de tratamento ortodôntico detalhado, dividido em fases, para a \
         opção escolhida pelo clínico.\n\n\
         DADOS DO PACIENTE:\n{facts}\n\n\
         DIAGNÓSTICO:\n{diagnosis}\n\n\
         OPÇÃO ESCOLHIDA:\n{option}\n\n\
         Para cada fase use um título '# Fase N - <nome>' e descreva objetivos, aparelhos e \
         dispositivos, procedimentos, duração estimada em meses e frequência de consultas. \
         Termine com '# Contenção' e '# Prognóstico'.",
        facts = intake.facts(),
        diagnosis = diagnosis.trim(),
        option = selected_option.trim()
    ))
}

/// Contract step: plain-language treatment summary for the contract body.
pub fn build_contract_summary_prompt(
    patient_name: &str,
    plan: &str,
) -> Result<String, DraftingError> {
    if plan.trim().is_empty() {
        return Err(DraftingError::InvalidInput(
            "O planejamento ainda não possui plano de tratamento".into(),
        ));
    }
    Ok(format!(
        "Resuma o plano de tratamento abaixo para compor a cláusula de objeto de um contrato \
         de prestação de serviços ortodônticos do paciente {patient}. Descreva as fases, a \
         duração total estimada e as obrigações do paciente (comparecimento, higiene, uso dos \
         aparelhos). Não inclua valores.\n\n\
         PLANO DE TRATAMENTO:\n{plan}",
        patient = patient_name.trim(),
        plan = plan.trim()
    ))
}

fn option_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:[-*]\s*)?(?:\*\*)?(?:op[çc][ãa]o|option)\s*(\d+)\s*(?:\*\*)?\s*[:.)\-–]\s*(?:\*\*)?\s*(.+?)\s*$")
            .expect("option pattern is valid")
    })
}

/// Numbered treatment options found in a diagnosis, in order of number.
/// Duplicated numbers keep their first occurrence.
pub fn parse_treatment_options(diagnosis: &str) -> Vec<TreatmentOption> {
    let mut options: Vec<TreatmentOption> = Vec::new();
    for caps in option_pattern().captures_iter(diagnosis) {
        let Some(number) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let text = caps
            .get(2)
            .map(|m| m.as_str().trim_end_matches("**").trim().to_string())
            .unwrap_or_default();
        if text.is_empty() || options.iter().any(|o| o.number == number) {
            continue;
        }
        options.push(TreatmentOption { number, text });
    }
    options.sort_by_key(|o| o.number);
    options
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentOption {
    pub number: u32,
    pub text: String,
}
