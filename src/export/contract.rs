//! Contract text assembly and the document headers shared by both exports.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

use super::layout::{DocumentHeader, SignatureBlock};
use crate::models::{Clinic, Contract, Patient};

pub const PLAN_TITLE: &str = "Plano de Tratamento Ortodôntico";
pub const CONTRACT_TITLE: &str = "Contrato de Prestação de Serviços Ortodônticos";

const PLACEHOLDER_PLAN: &str = "{{plano}}";

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Contract body from the clinic's template (or the default one) with the
/// AI-drafted treatment summary in the object clause.
///
/// Template placeholders: `{{paciente}}`, `{{cpf}}`, `{{responsavel}}`,
/// `{{clinica}}`, `{{razao_social}}`, `{{cnpj}}`, `{{endereco}}`,
/// `{{profissional}}`, `{{cro}}`, `{{data}}` and `{{plano}}`. A template
/// without `{{plano}}` gets the summary appended as its own section.
pub fn build_contract_text(
    clinic: &Clinic,
    patient: &Patient,
    summary: &str,
    date: NaiveDate,
) -> String {
    let template = clinic
        .contract_template
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_CONTRACT_TEMPLATE);

    let legal_name = clinic
        .legal_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&clinic.name);
    let guardian = guardian_line(patient);

    let date = br_date(date);
    let summary = summary.trim();

    // Single pass: substituted values are never scanned again.
    let text = placeholder_pattern().replace_all(template, |caps: &Captures<'_>| {
        let value = match &caps[1] {
            "paciente" => patient.name.trim(),
            "cpf" => or_blank(&patient.document_number),
            "responsavel" => guardian,
            "clinica" => clinic.name.trim(),
            "razao_social" => legal_name.trim(),
            "cnpj" => or_blank(&clinic.document_number),
            "endereco" => or_blank(&clinic.address),
            "profissional" => or_blank(&clinic.responsible_professional),
            "cro" => or_blank(&clinic.professional_registration),
            "data" => date.as_str(),
            "plano" => summary,
            _ => &caps[0],
        };
        value.to_string()
    });

    if template.contains(PLACEHOLDER_PLAN) {
        text.into_owned()
    } else {
        format!("{}\n\n# Objeto do tratamento\n{}\n", text.trim_end(), summary)
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

fn guardian_line(patient: &Patient) -> &str {
    patient
        .guardian_name
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or("o próprio paciente")
}

const DEFAULT_CONTRACT_TEMPLATE: &str = "\
# Partes
CONTRATADA: {{razao_social}}, inscrita no CNPJ {{cnpj}}, com endereço em {{endereco}}, \
representada por {{profissional}} (CRO {{cro}}).
CONTRATANTE: {{paciente}}, CPF {{cpf}}, representado(a) por {{responsavel}}.

# Objeto
{{plano}}

# Obrigações do paciente
Comparecer às consultas agendadas, manter a higiene bucal, utilizar os aparelhos conforme \
orientação e comunicar à clínica qualquer quebra ou desconforto.

# Obrigações da clínica
Executar o tratamento descrito com zelo técnico, informar o paciente sobre a evolução e \
eventuais alterações do planejamento.

# Rescisão
O contrato pode ser rescindido por qualquer das partes mediante comunicação por escrito, \
com acerto dos procedimentos já realizados.

# Foro
Fica eleito o foro da comarca da sede da CONTRATADA.

{{clinica}}, {{data}}.";

/// Header for the plan export.
pub fn plan_header(clinic: Option<&Clinic>, patient: &Patient, date: NaiveDate) -> DocumentHeader {
    let mut subtitle_lines = vec![format!("Paciente: {}", patient.name.trim())];
    if let Some(clinic) = clinic {
        subtitle_lines.push(format!("Clínica: {}", clinic.name.trim()));
    }
    subtitle_lines.push(format!("Emitido em {}", br_date(date)));
    DocumentHeader {
        title: PLAN_TITLE.to_string(),
        subtitle_lines,
    }
}

/// Signature marker shown under the contract title.
pub fn signature_status(contract: &Contract) -> String {
    match (contract.is_signed, contract.signed_at) {
        (true, Some(at)) => format!("Situação: ASSINADO em {}", br_date(at.date())),
        (true, None) => "Situação: ASSINADO".to_string(),
        (false, _) => "Situação: NÃO ASSINADO".to_string(),
    }
}

/// Header for the contract export, with the signature marker.
pub fn contract_header(
    clinic: Option<&Clinic>,
    patient: &Patient,
    contract: &Contract,
) -> DocumentHeader {
    let mut subtitle_lines = vec![format!("Paciente: {}", patient.name.trim())];
    if let Some(clinic) = clinic {
        subtitle_lines.push(format!("Clínica: {}", clinic.name.trim()));
    }
    subtitle_lines.push(signature_status(contract));
    DocumentHeader {
        title: CONTRACT_TITLE.to_string(),
        subtitle_lines,
    }
}

/// Patient, guardian and professional signature lines, in that order.
pub fn signature_blocks(clinic: Option<&Clinic>, patient: &Patient) -> Vec<SignatureBlock> {
    let professional = clinic.and_then(|c| {
        let name = c.responsible_professional.as_deref()?.trim();
        match c.professional_registration.as_deref().map(str::trim) {
            Some(cro) if !cro.is_empty() => Some(format!("{name} - CRO {cro}")),
            _ => Some(name.to_string()),
        }
    });

    vec![
        SignatureBlock::new("Paciente", Some(&patient.name)),
        SignatureBlock::new("Responsável", patient.guardian_name.as_deref()),
        SignatureBlock::new("Profissional", professional.as_deref()),
    ]
}
