//! Condition DSL evaluated against a fact snapshot.
//!
//! Facts are three-valued (complete-true, complete-false, incomplete); each
//! operator maps those states to a plain boolean. Evaluation is total: missing
//! data resolves to the operator's "incomplete" answer and never errors.

use crate::flow::facts::{FactResult, FactValue, Snapshot};
use crate::flow::import::{ImportOperator, ImportSection};
use serde::{Deserialize, Deserializer, Serialize};

const EXPERIMENTAL: &str = "experimental";
const SUBMISSION_BLOCKING_FACTS_ARE_FALSE: &str = "submissionBlockingFactsAreFalse";
const ESSAR_SIGNING_PATH: &str = "isEssarSigningPath";
const LEGACY_SIGNING_PATH_FACT: &str = "/isLegacySigningPath";
const RESUBMITTING_FACT: &str = "/isResubmitting";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    #[default]
    IsTrue,
    IsFalse,
    IsTrueAndComplete,
    IsFalseAndComplete,
    IsTrueOrIncomplete,
    IsFalseOrIncomplete,
    IsComplete,
    IsIncomplete,
}

impl ConditionOperator {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::IsTrue,
            Self::IsFalse,
            Self::IsTrueAndComplete,
            Self::IsFalseAndComplete,
            Self::IsTrueOrIncomplete,
            Self::IsFalseOrIncomplete,
            Self::IsComplete,
            Self::IsIncomplete,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IsTrue => "isTrue",
            Self::IsFalse => "isFalse",
            Self::IsTrueAndComplete => "isTrueAndComplete",
            Self::IsFalseAndComplete => "isFalseAndComplete",
            Self::IsTrueOrIncomplete => "isTrueOrIncomplete",
            Self::IsFalseOrIncomplete => "isFalseOrIncomplete",
            Self::IsComplete => "isComplete",
            Self::IsIncomplete => "isIncomplete",
        }
    }

    /// `isTrue`/`isFalse` accept placeholder values; the `AndComplete`
    /// variants do not.
    pub fn apply(self, fact: &FactResult) -> bool {
        let truthy = fact.is_truthy();
        match self {
            Self::IsTrue => fact.has_value() && truthy,
            Self::IsFalse => fact.has_value() && !truthy,
            Self::IsTrueAndComplete => fact.complete && truthy,
            Self::IsFalseAndComplete => fact.complete && !truthy,
            Self::IsTrueOrIncomplete => !fact.complete || truthy,
            Self::IsFalseOrIncomplete => !fact.complete || !truthy,
            Self::IsComplete => fact.complete,
            Self::IsIncomplete => !fact.complete,
        }
    }

    /// Answer of the signing-path condition while electronic signing is off.
    const fn signing_disabled_value(self) -> bool {
        !matches!(
            self,
            Self::IsTrue | Self::IsTrueAndComplete | Self::IsTrueOrIncomplete | Self::IsIncomplete
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// Operator applied to one fact, bound to the repetition context.
    Fact {
        path: String,
        operator: ConditionOperator,
    },
    /// Deployment feature switch.
    Experimental,
    /// Every configured blocking fact currently holds `false`.
    SubmissionBlockingFactsAreFalse,
    /// Whether the filer signs through the electronic signing path.
    EssarSigningPath { operator: ConditionOperator },
    /// Lookup against the data-import profile instead of the fact store.
    DataImport {
        section: ImportSection,
        operator: ImportOperator,
    },
}

impl Condition {
    pub fn is_true(path: impl Into<String>) -> Self {
        Self::fact(path, ConditionOperator::IsTrue)
    }

    pub fn fact(path: impl Into<String>, operator: ConditionOperator) -> Self {
        Condition::Fact {
            path: path.into(),
            operator,
        }
    }

    pub fn data_import(section: ImportSection, operator: ImportOperator) -> Self {
        Condition::DataImport { section, operator }
    }

    pub fn evaluate(&self, snapshot: &Snapshot<'_>, item_id: Option<&str>) -> bool {
        match self {
            Condition::Fact { path, operator } => snapshot
                .lookup(path, item_id)
                .is_some_and(|fact| operator.apply(&fact)),
            Condition::Experimental => snapshot.settings().experimental,
            Condition::SubmissionBlockingFactsAreFalse => snapshot
                .settings()
                .submission_blocking_facts
                .iter()
                .all(|path| {
                    snapshot.lookup(path, item_id).is_some_and(|fact| {
                        matches!(fact.value, Some(FactValue::Boolean(false)))
                    })
                }),
            Condition::EssarSigningPath { operator } => {
                if !snapshot.settings().essar_signing {
                    return operator.signing_disabled_value();
                }
                !Condition::fact(LEGACY_SIGNING_PATH_FACT, *operator).evaluate(snapshot, item_id)
            }
            Condition::DataImport { section, operator } => {
                let resubmitting = snapshot
                    .lookup(RESUBMITTING_FACT, item_id)
                    .is_some_and(|fact| fact.complete && fact.is_truthy());
                operator.apply(snapshot.imports().section_value(*section, resubmitting))
            }
        }
    }
}

/// Conjunction over a condition list; an empty list passes.
pub fn conditions_pass(
    conditions: &[Condition],
    snapshot: &Snapshot<'_>,
    item_id: Option<&str>,
) -> bool {
    conditions
        .iter()
        .all(|condition| condition.evaluate(snapshot, item_id))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConditionParseError {
    #[error("condition `{0}` must be an absolute fact path or a known condition name")]
    UnknownCondition(String),
    #[error("`{name}` does not take an operator")]
    UnexpectedOperator { name: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum DataImportTag {
    #[serde(rename = "data-import")]
    DataImport,
}

/// Wire form: a bare string, `{operator, condition}` or a data-import lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Bare(String),
    DataImport {
        condition: DataImportTag,
        section: ImportSection,
        #[serde(default)]
        operator: Option<ImportOperator>,
    },
    WithOperator {
        #[serde(default)]
        operator: Option<ConditionOperator>,
        condition: String,
    },
}

impl TryFrom<RawCondition> for Condition {
    type Error = ConditionParseError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        match raw {
            RawCondition::Bare(name) => named_condition(name, None),
            RawCondition::DataImport {
                section, operator, ..
            } => Ok(Condition::DataImport {
                section,
                operator: operator.unwrap_or_default(),
            }),
            RawCondition::WithOperator {
                operator,
                condition,
            } => named_condition(condition, operator),
        }
    }
}

fn named_condition(
    name: String,
    operator: Option<ConditionOperator>,
) -> Result<Condition, ConditionParseError> {
    match name.as_str() {
        EXPERIMENTAL | SUBMISSION_BLOCKING_FACTS_ARE_FALSE if operator.is_some() => {
            Err(ConditionParseError::UnexpectedOperator { name })
        }
        EXPERIMENTAL => Ok(Condition::Experimental),
        SUBMISSION_BLOCKING_FACTS_ARE_FALSE => Ok(Condition::SubmissionBlockingFactsAreFalse),
        ESSAR_SIGNING_PATH => Ok(Condition::EssarSigningPath {
            operator: operator.unwrap_or_default(),
        }),
        path if path.starts_with('/') => Ok(Condition::Fact {
            path: name,
            operator: operator.unwrap_or_default(),
        }),
        _ => Err(ConditionParseError::UnknownCondition(name)),
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Fact {
                path,
                operator: ConditionOperator::IsTrue,
            } => RawCondition::Bare(path),
            Condition::Fact { path, operator } => RawCondition::WithOperator {
                operator: Some(operator),
                condition: path,
            },
            Condition::Experimental => RawCondition::Bare(EXPERIMENTAL.to_string()),
            Condition::SubmissionBlockingFactsAreFalse => {
                RawCondition::Bare(SUBMISSION_BLOCKING_FACTS_ARE_FALSE.to_string())
            }
            Condition::EssarSigningPath { operator } => RawCondition::WithOperator {
                operator: Some(operator),
                condition: ESSAR_SIGNING_PATH.to_string(),
            },
            Condition::DataImport { section, operator } => RawCondition::DataImport {
                condition: DataImportTag::DataImport,
                section,
                operator: Some(operator),
            },
        }
    }
}

/// Accepts either a single condition or a list of them.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Condition>),
        One(Condition),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(conditions) => conditions,
        OneOrMany::One(condition) => vec![condition],
    })
}
