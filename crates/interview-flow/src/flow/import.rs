//! Read-only view of the data-import profile consulted by `data-import`
//! conditions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportSection {
    #[serde(rename = "about-you")]
    AboutYou,
    #[serde(rename = "ip-pin-taxpayer-has-ip-pin")]
    IpPinTaxpayerHasIpPin,
    #[serde(rename = "form-w2s")]
    FormW2s,
    #[serde(rename = "has-one-form-w2")]
    HasOneFormW2,
    #[serde(rename = "has-multiple-forms-w2")]
    HasMultipleFormsW2,
    #[serde(rename = "1099-ints")]
    Form1099Ints,
    #[serde(rename = "has-one-1099-int")]
    HasOne1099Int,
    #[serde(rename = "has-multiple-1099-ints")]
    HasMultiple1099Ints,
    #[serde(rename = "has-at-least-one-1095-a")]
    HasAtLeastOne1095A,
    #[serde(rename = "has-no-1095-a")]
    HasNo1095A,
}

impl ImportSection {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::AboutYou,
            Self::IpPinTaxpayerHasIpPin,
            Self::FormW2s,
            Self::HasOneFormW2,
            Self::HasMultipleFormsW2,
            Self::Form1099Ints,
            Self::HasOne1099Int,
            Self::HasMultiple1099Ints,
            Self::HasAtLeastOne1095A,
            Self::HasNo1095A,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AboutYou => "about-you",
            Self::IpPinTaxpayerHasIpPin => "ip-pin-taxpayer-has-ip-pin",
            Self::FormW2s => "form-w2s",
            Self::HasOneFormW2 => "has-one-form-w2",
            Self::HasMultipleFormsW2 => "has-multiple-forms-w2",
            Self::Form1099Ints => "1099-ints",
            Self::HasOne1099Int => "has-one-1099-int",
            Self::HasMultiple1099Ints => "has-multiple-1099-ints",
            Self::HasAtLeastOne1095A => "has-at-least-one-1095-a",
            Self::HasNo1095A => "has-no-1095-a",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportOperator {
    #[default]
    IsTrue,
    IsFalse,
    IsUnknown,
}

/// Three-valued answer of an import section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportValue {
    True,
    False,
    NotLoaded,
}

impl ImportValue {
    fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    /// Collapses "not loaded" into `false`.
    fn or_false(self) -> Self {
        match self {
            Self::NotLoaded => Self::False,
            other => other,
        }
    }
}

impl ImportOperator {
    pub fn apply(self, value: ImportValue) -> bool {
        match self {
            ImportOperator::IsTrue => value == ImportValue::True,
            ImportOperator::IsFalse => value == ImportValue::False,
            ImportOperator::IsUnknown => value == ImportValue::NotLoaded,
        }
    }
}

/// Load state of one section of the import profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "payload", rename_all = "snake_case")]
pub enum SectionState<T> {
    #[default]
    Pending,
    Failed,
    Success(T),
}

impl<T> SectionState<T> {
    fn loaded(&self) -> Option<&T> {
        match self {
            SectionState::Success(payload) => Some(payload),
            SectionState::Pending | SectionState::Failed => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutYouBasic {
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpPinPayload {
    pub has_ip_pin: bool,
    #[serde(default)]
    pub pin: Option<String>,
}

impl IpPinPayload {
    /// A usable identity protection PIN is exactly six digits once separators
    /// are stripped.
    pub fn normalized_pin(&self) -> Option<String> {
        let digits: String = self
            .pin
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (digits.len() == 6).then_some(digits)
    }
}

/// Summary of an imported information return (W-2, 1099-INT).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form1095APayload {
    pub has_1095a: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportProfile {
    #[serde(default)]
    pub about_you: SectionState<AboutYouBasic>,
    #[serde(default)]
    pub ip_pin: SectionState<IpPinPayload>,
    #[serde(default)]
    pub form_w2s: SectionState<Vec<ImportedForm>>,
    #[serde(default)]
    pub interest_income: SectionState<Vec<ImportedForm>>,
    #[serde(default)]
    pub form_1095a: SectionState<Form1095APayload>,
}

/// Overall state of the data-import profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "profile", rename_all = "snake_case")]
pub enum ImportProfileState {
    #[default]
    NotLoaded,
    Loading,
    Complete(ImportProfile),
}

impl ImportProfileState {
    /// Resolves a section. `resubmitting` reports whether the filer is
    /// resubmitting a rejected return, which hides imported PIN data.
    pub fn section_value(&self, section: ImportSection, resubmitting: bool) -> ImportValue {
        let profile = match self {
            ImportProfileState::Complete(profile) => profile,
            ImportProfileState::NotLoaded | ImportProfileState::Loading => {
                return ImportValue::NotLoaded
            }
        };

        match section {
            ImportSection::AboutYou => {
                ImportValue::from_bool(profile.about_you.loaded().is_some())
            }
            ImportSection::IpPinTaxpayerHasIpPin => {
                if resubmitting {
                    return ImportValue::NotLoaded;
                }
                match profile.ip_pin.loaded() {
                    Some(payload) if !payload.has_ip_pin => ImportValue::False,
                    Some(payload) if payload.normalized_pin().is_some() => ImportValue::True,
                    _ => ImportValue::NotLoaded,
                }
            }
            ImportSection::FormW2s => count_value(&profile.form_w2s, |count| count > 0),
            ImportSection::HasOneFormW2 => count_value(&profile.form_w2s, |count| count == 1),
            ImportSection::HasMultipleFormsW2 => count_value(&profile.form_w2s, |count| count > 1),
            ImportSection::Form1099Ints => {
                count_value(&profile.interest_income, |count| count > 0)
            }
            ImportSection::HasOne1099Int => {
                count_value(&profile.interest_income, |count| count == 1)
            }
            ImportSection::HasMultiple1099Ints => {
                count_value(&profile.interest_income, |count| count > 1)
            }
            ImportSection::HasAtLeastOne1095A => match profile.form_1095a.loaded() {
                Some(payload) if payload.has_1095a => ImportValue::True,
                _ => ImportValue::NotLoaded,
            },
            ImportSection::HasNo1095A => match profile.form_1095a.loaded() {
                Some(payload) if !payload.has_1095a => ImportValue::True,
                _ => ImportValue::NotLoaded,
            },
        }
    }
}

fn count_value(
    state: &SectionState<Vec<ImportedForm>>,
    predicate: impl Fn(usize) -> bool,
) -> ImportValue {
    state
        .loaded()
        .map(|forms| ImportValue::from_bool(predicate(forms.len())))
        .unwrap_or(ImportValue::NotLoaded)
        .or_false()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_w2s(count: usize) -> ImportProfileState {
        ImportProfileState::Complete(ImportProfile {
            form_w2s: SectionState::Success(vec![ImportedForm::default(); count]),
            ..ImportProfile::default()
        })
    }

    #[test]
    fn every_section_is_unknown_until_the_profile_loads() {
        for state in [ImportProfileState::NotLoaded, ImportProfileState::Loading] {
            for section in ImportSection::ordered() {
                let value = state.section_value(section, false);
                assert_eq!(value, ImportValue::NotLoaded, "{}", section.label());
                assert!(ImportOperator::IsUnknown.apply(value));
                assert!(!ImportOperator::IsTrue.apply(value));
                assert!(!ImportOperator::IsFalse.apply(value));
            }
        }
    }

    #[test]
    fn w2_counts_drive_count_sections() {
        let single = profile_with_w2s(1);
        assert_eq!(single.section_value(ImportSection::FormW2s, false), ImportValue::True);
        assert_eq!(single.section_value(ImportSection::HasOneFormW2, false), ImportValue::True);
        assert_eq!(
            single.section_value(ImportSection::HasMultipleFormsW2, false),
            ImportValue::False
        );

        let none = profile_with_w2s(0);
        assert_eq!(none.section_value(ImportSection::FormW2s, false), ImportValue::False);
    }

    #[test]
    fn failed_sections_read_as_false_once_the_profile_is_complete() {
        let state = ImportProfileState::Complete(ImportProfile {
            interest_income: SectionState::Failed,
            ..ImportProfile::default()
        });
        assert_eq!(state.section_value(ImportSection::Form1099Ints, false), ImportValue::False);
        assert_eq!(state.section_value(ImportSection::AboutYou, false), ImportValue::False);
        assert_eq!(
            state.section_value(ImportSection::HasAtLeastOne1095A, false),
            ImportValue::NotLoaded
        );
    }

    #[test]
    fn ip_pin_requires_a_valid_pin_and_no_resubmission() {
        let with_pin = ImportProfileState::Complete(ImportProfile {
            ip_pin: SectionState::Success(IpPinPayload {
                has_ip_pin: true,
                pin: Some("123-456".into()),
            }),
            ..ImportProfile::default()
        });
        assert_eq!(
            with_pin.section_value(ImportSection::IpPinTaxpayerHasIpPin, false),
            ImportValue::True
        );
        assert_eq!(
            with_pin.section_value(ImportSection::IpPinTaxpayerHasIpPin, true),
            ImportValue::NotLoaded
        );

        let malformed = ImportProfileState::Complete(ImportProfile {
            ip_pin: SectionState::Success(IpPinPayload {
                has_ip_pin: true,
                pin: Some("12".into()),
            }),
            ..ImportProfile::default()
        });
        assert_eq!(
            malformed.section_value(ImportSection::IpPinTaxpayerHasIpPin, false),
            ImportValue::NotLoaded
        );
    }

    #[test]
    fn deserializes_profile_json() {
        let state: ImportProfileState = serde_json::from_str(
            r#"{
                "status": "complete",
                "profile": {
                    "form_1095a": { "state": "success", "payload": { "has_1095a": false } }
                }
            }"#,
        )
        .expect("profile parses");
        assert_eq!(state.section_value(ImportSection::HasNo1095A, false), ImportValue::True);
    }
}
