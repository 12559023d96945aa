//! Planning lifecycle stage.
//!
//! The stage is derived from persisted facts on every read and never
//! stored. Precedence, first match wins:
//! 1. any signed contract → `CONTRATO_ASSINADO`
//! 2. any contract → `CONTRATO_GERADO`
//! 3. finished status or a stored plan → `PLANEJAMENTO_GERADO`
//! 4. otherwise → `DOCUMENTACAO_ENVIADA`

use serde::{Deserialize, Serialize};

use crate::models::{Contract, PatientPlanning, PlanningStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    DocumentacaoEnviada,
    PlanejamentoGerado,
    ContratoGerado,
    ContratoAssinado,
}

impl Stage {
    /// Lifecycle order.
    pub const ALL: [Stage; 4] = [
        Stage::DocumentacaoEnviada,
        Stage::PlanejamentoGerado,
        Stage::ContratoGerado,
        Stage::ContratoAssinado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DocumentacaoEnviada => "DOCUMENTACAO_ENVIADA",
            Stage::PlanejamentoGerado => "PLANEJAMENTO_GERADO",
            Stage::ContratoGerado => "CONTRATO_GERADO",
            Stage::ContratoAssinado => "CONTRATO_ASSINADO",
        }
    }

    /// Label shown in progress trackers.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::DocumentacaoEnviada => "Documentação enviada",
            Stage::PlanejamentoGerado => "Planejamento gerado",
            Stage::ContratoGerado => "Contrato gerado",
            Stage::ContratoAssinado => "Contrato assinado",
        }
    }
}

/// The contract facts stage derivation looks at.
pub trait ContractFacts {
    fn is_signed(&self) -> bool;
}

impl ContractFacts for Contract {
    fn is_signed(&self) -> bool {
        self.is_signed
    }
}

impl ContractFacts for bool {
    fn is_signed(&self) -> bool {
        *self
    }
}

/// Derive the stage from status, stored plan text and contracts.
///
/// A blank `ai_response` counts as absent. Contract order is irrelevant.
pub fn compute_stage<C: ContractFacts>(
    status: PlanningStatus,
    ai_response: Option<&str>,
    contracts: &[C],
) -> Stage {
    if contracts.iter().any(ContractFacts::is_signed) {
        return Stage::ContratoAssinado;
    }
    if !contracts.is_empty() {
        return Stage::ContratoGerado;
    }
    let has_plan = ai_response.is_some_and(|text| !text.trim().is_empty());
    if status.is_finished() || has_plan {
        return Stage::PlanejamentoGerado;
    }
    Stage::DocumentacaoEnviada
}

/// Convenience wrapper over a loaded planning and its contracts.
pub fn planning_stage(planning: &PatientPlanning, contracts: &[Contract]) -> Stage {
    compute_stage(planning.status, planning.ai_response.as_deref(), contracts)
}

/// One step of the progress tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStep {
    pub stage: Stage,
    pub label: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// Ordered tracker for `current`: earlier steps completed, later ones pending.
pub fn stage_progress(current: Stage) -> Vec<StageStep> {
    Stage::ALL
        .iter()
        .map(|&stage| StageStep {
            stage,
            label: stage.label(),
            completed: stage <= current,
            current: stage == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[bool] = &[];

    #[test]
    fn draft_without_plan_or_contracts_is_documentation_sent() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, None, NONE),
            Stage::DocumentacaoEnviada
        );
    }

    #[test]
    fn completed_without_contracts_is_plan_generated() {
        assert_eq!(
            compute_stage(PlanningStatus::Completed, None, NONE),
            Stage::PlanejamentoGerado
        );
        assert_eq!(
            compute_stage(PlanningStatus::Reviewed, None, NONE),
            Stage::PlanejamentoGerado
        );
    }

    #[test]
    fn draft_with_plan_text_is_plan_generated() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, Some("# Fase 1"), NONE),
            Stage::PlanejamentoGerado
        );
    }

    #[test]
    fn blank_plan_text_counts_as_absent() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, Some("  \n"), NONE),
            Stage::DocumentacaoEnviada
        );
    }

    #[test]
    fn unsigned_contract_is_contract_generated() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, None, &[false]),
            Stage::ContratoGerado
        );
    }

    #[test]
    fn any_signed_contract_wins_regardless_of_order() {
        for contracts in [[true, false], [false, true]] {
            assert_eq!(
                compute_stage(PlanningStatus::Completed, Some("plano"), &contracts),
                Stage::ContratoAssinado
            );
        }
    }

    #[test]
    fn signed_contract_beats_plan_text() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, Some("plano"), &[true]),
            Stage::ContratoAssinado
        );
    }

    #[test]
    fn clearing_plan_after_contract_keeps_contract_stage() {
        assert_eq!(
            compute_stage(PlanningStatus::Draft, None, &[false]),
            Stage::ContratoGerado
        );
    }

    #[test]
    fn every_input_maps_to_exactly_one_stage() {
        let statuses = [
            PlanningStatus::Draft,
            PlanningStatus::Completed,
            PlanningStatus::Reviewed,
        ];
        let responses = [None, Some(""), Some("plano")];
        let contract_sets: [&[bool]; 5] = [&[], &[false], &[true], &[false, false], &[false, true]];

        for status in statuses {
            for response in responses {
                for contracts in contract_sets {
                    let stage = compute_stage(status, response, contracts);
                    let expected = if contracts.contains(&true) {
                        Stage::ContratoAssinado
                    } else if !contracts.is_empty() {
                        Stage::ContratoGerado
                    } else if status != PlanningStatus::Draft
                        || response.is_some_and(|r| !r.is_empty())
                    {
                        Stage::PlanejamentoGerado
                    } else {
                        Stage::DocumentacaoEnviada
                    };
                    assert_eq!(stage, expected, "{status:?} {response:?} {contracts:?}");
                    // deterministic
                    assert_eq!(stage, compute_stage(status, response, contracts));
                }
            }
        }
    }

    #[test]
    fn stage_serializes_with_wire_name() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn progress_marks_completed_and_current() {
        let steps = stage_progress(Stage::ContratoGerado);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].completed && steps[1].completed && steps[2].completed);
        assert!(!steps[3].completed);
        assert!(steps[2].current);
        assert_eq!(steps.iter().filter(|s| s.current).count(), 1);
    }
}
