use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serialized with the same wire names stored in the database.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(PlanningStatus {
    Draft => "DRAFT",
    Completed => "COMPLETED",
    Reviewed => "REVIEWED",
});

str_enum!(TreatmentStatus {
    EmAndamento => "EM_ANDAMENTO",
    Concluido => "CONCLUIDO",
    Cancelado => "CANCELADO",
});

impl PlanningStatus {
    /// Statuses that mean the clinician has a finished plan in hand.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Reviewed)
    }
}

impl Default for PlanningStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl Default for TreatmentStatus {
    fn default() -> Self {
        Self::EmAndamento
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn planning_status_round_trip() {
        for (variant, s) in [
            (PlanningStatus::Draft, "DRAFT"),
            (PlanningStatus::Completed, "COMPLETED"),
            (PlanningStatus::Reviewed, "REVIEWED"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(PlanningStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn treatment_status_serializes_with_wire_name() {
        let json = serde_json::to_string(&TreatmentStatus::EmAndamento).unwrap();
        assert_eq!(json, "\"EM_ANDAMENTO\"");
        let parsed: TreatmentStatus = serde_json::from_str("\"CANCELADO\"").unwrap();
        assert_eq!(parsed, TreatmentStatus::Cancelado);
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = PlanningStatus::from_str("ARCHIVED").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn finished_statuses() {
        assert!(!PlanningStatus::Draft.is_finished());
        assert!(PlanningStatus::Completed.is_finished());
        assert!(PlanningStatus::Reviewed.is_finished());
    }
}
