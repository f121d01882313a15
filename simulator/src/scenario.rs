//! Simulation scenarios.

use std::path::Path;

use ratepair_common::MainCurrency;
use ratepair_fx::Field;
use ratepair_widget::WidgetStatus;
use serde::{Deserialize, Serialize};

use crate::bank::FaultType;

/// A scripted widget session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Replace the text of a field, as if typed.
    Type { field: Field, text: String },
    /// Click the main-currency button.
    Toggle,
    /// Move the session clock forward.
    Advance { minutes: i64 },
    /// Change the bank's quote.
    SetRates { buy_rate: String, sell_rate: String },
    /// Inject a fault.
    InjectFault { fault_type: FaultType },
    /// Clear a fault.
    ClearFault,
    /// Wait for the next fetch to complete.
    AwaitFetch,
    /// Convert through the bank's full rate book and compare the result.
    CrossConvert {
        amount: String,
        from: String,
        to: String,
        expect: String,
    },
    /// Assert a condition.
    Assert { condition: AssertCondition },
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssertCondition {
    /// Both fields hold exactly these strings.
    FieldsEqual { sell: String, buy: String },
    /// Main currency equals.
    MainIs { main: MainCurrency },
    /// Widget status equals.
    StatusIs { status: WidgetStatus },
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "basic-conversion" => Ok(Self::basic_conversion()),
            "placeholder-zero" => Ok(Self::placeholder_zero()),
            "stale-refresh" => Ok(Self::stale_refresh()),
            "bank-outage" => Ok(Self::bank_outage()),
            "cross-rates" => Ok(Self::cross_rates()),
            path if path.ends_with(".json") => Self::from_file(Path::new(path)),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> &'static [&'static str] {
        &[
            "basic-conversion",
            "placeholder-zero",
            "stale-refresh",
            "bank-outage",
            "cross-rates",
        ]
    }

    /// Read a scenario from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read scenario {}: {}", path.display(), e))?;
        let scenario = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Malformed scenario {}: {}", path.display(), e))?;
        Ok(scenario)
    }

    fn type_into(field: Field, text: &str) -> ScenarioStep {
        ScenarioStep::Type {
            field,
            text: text.to_string(),
        }
    }

    fn expect_fields(sell: &str, buy: &str) -> ScenarioStep {
        ScenarioStep::Assert {
            condition: AssertCondition::FieldsEqual {
                sell: sell.to_string(),
                buy: buy.to_string(),
            },
        }
    }

    /// Typing and toggling with 2.5 / 2.4 rates.
    fn basic_conversion() -> Self {
        Self {
            name: "basic-conversion".to_string(),
            description: "Sell-side edit, toggle, buy-side edit".to_string(),
            steps: vec![
                Self::type_into(Field::Sell, "1"),
                Self::type_into(Field::Sell, "10"),
                Self::expect_fields("10", "25"),
                ScenarioStep::Toggle,
                ScenarioStep::Assert {
                    condition: AssertCondition::MainIs {
                        main: MainCurrency::Quote,
                    },
                },
                Self::expect_fields("10", "4.1667"),
                Self::type_into(Field::Buy, "10"),
                Self::expect_fields("24", "10"),
                Self::type_into(Field::Buy, ""),
                Self::expect_fields("", ""),
            ],
        }
    }

    /// A digit typed after a lone zero replaces it.
    fn placeholder_zero() -> Self {
        Self {
            name: "placeholder-zero".to_string(),
            description: "Leading zero collapse and rejected keystrokes".to_string(),
            steps: vec![
                Self::type_into(Field::Sell, "0"),
                Self::type_into(Field::Sell, "05"),
                Self::type_into(Field::Sell, "5.12345"),
                Self::type_into(Field::Sell, "5a"),
                Self::expect_fields("5", "12.5"),
            ],
        }
    }

    /// Old rates keep converting until the refresh lands.
    fn stale_refresh() -> Self {
        Self {
            name: "stale-refresh".to_string(),
            description: "Stale rates trigger a background refresh".to_string(),
            steps: vec![
                Self::type_into(Field::Sell, "10"),
                Self::expect_fields("10", "25"),
                ScenarioStep::SetRates {
                    buy_rate: "3".to_string(),
                    sell_rate: "2.9".to_string(),
                },
                ScenarioStep::Advance { minutes: 4 * 60 },
                Self::type_into(Field::Sell, "100"),
                Self::expect_fields("100", "250"),
                ScenarioStep::AwaitFetch,
                Self::type_into(Field::Sell, "10"),
                Self::expect_fields("10", "30"),
            ],
        }
    }

    /// Conversions through the rate book agree with the widget.
    fn cross_rates() -> Self {
        let cross = |amount: &str, from: &str, to: &str, expect: &str| ScenarioStep::CrossConvert {
            amount: amount.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            expect: expect.to_string(),
        };

        Self {
            name: "cross-rates".to_string(),
            description: "Rate book conversions match the two-field widget".to_string(),
            steps: vec![
                cross("10", "USD", "BYN", "25"),
                cross("24", "BYN", "USD", "10"),
                cross("7.5", "USD", "USD", "7.5"),
                Self::type_into(Field::Sell, "10"),
                Self::expect_fields("10", "25"),
            ],
        }
    }

    /// The bank drops out after the first load, then before any load.
    fn bank_outage() -> Self {
        Self {
            name: "bank-outage".to_string(),
            description: "Failed refresh keeps old rates with a warning".to_string(),
            steps: vec![
                ScenarioStep::InjectFault {
                    fault_type: FaultType::BankOffline,
                },
                ScenarioStep::Advance { minutes: 4 * 60 },
                Self::type_into(Field::Sell, "2"),
                ScenarioStep::AwaitFetch,
                ScenarioStep::Assert {
                    condition: AssertCondition::StatusIs {
                        status: WidgetStatus::Outdated,
                    },
                },
                Self::type_into(Field::Sell, "4"),
                Self::expect_fields("4", "10"),
                ScenarioStep::ClearFault,
                ScenarioStep::Advance { minutes: 1 },
                Self::type_into(Field::Sell, "8"),
                ScenarioStep::AwaitFetch,
                ScenarioStep::Assert {
                    condition: AssertCondition::StatusIs {
                        status: WidgetStatus::Ready,
                    },
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios_load() {
        for name in Scenario::builtin_names() {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(&scenario.name, name);
            assert!(!scenario.steps.is_empty());
        }
        assert!(Scenario::load("no-such-scenario").is_err());
    }

    #[test]
    fn test_scenario_json_shape() {
        let json = r#"{
            "name": "custom",
            "description": "from a file",
            "steps": [
                { "Type": { "field": "sell", "text": "10" } },
                "Toggle",
                { "Advance": { "minutes": 5 } },
                { "CrossConvert": { "amount": "10", "from": "USD", "to": "EUR", "expect": "9" } },
                { "InjectFault": { "fault_type": { "SlowResponse": { "delay_ms": 100 } } } },
                { "Assert": { "condition": { "StatusIs": { "status": "ready" } } } }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 6);
        assert!(matches!(
            scenario.steps[0],
            ScenarioStep::Type { field: Field::Sell, .. }
        ));
        assert!(matches!(scenario.steps[1], ScenarioStep::Toggle));
    }
}
