use crate::config::choices::Choice;
use crate::covariance::EmaEstimator;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

fn default_dimension() -> usize {
    1
}

fn default_decay_rate() -> f64 {
    EmaEstimator::DEFAULT_DECAY_RATE
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EmpiricalParameters {
    #[serde(default = "default_dimension")]
    #[schemars(
        title = "Dimension",
        description = "Length of every observation vector",
        range(min = 1),
        default = "default_dimension"
    )]
    pub dimension: usize,
}

impl Default for EmpiricalParameters {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EmaParameters {
    #[serde(default = "default_dimension")]
    #[schemars(
        title = "Dimension",
        description = "Length of every observation vector",
        range(min = 1),
        default = "default_dimension"
    )]
    pub dimension: usize,

    #[serde(default = "default_decay_rate")]
    #[schemars(
        title = "Decay rate",
        description = "Weight of the newest observation once bootstrapped; smaller means longer memory",
        range(min = 0.0, max = 1.0),
        default = "default_decay_rate"
    )]
    pub decay_rate: f64,

    #[serde(default)]
    #[schemars(
        title = "Bootstrap count",
        description = "Observations averaged with equal weight before decaying (defaults to round(1 / decay rate))",
        range(min = 0)
    )]
    pub bootstrap_count: Option<usize>,
}

impl Default for EmaParameters {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            decay_rate: default_decay_rate(),
            bootstrap_count: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PartialMomentParameters {
    #[serde(default = "default_dimension")]
    #[schemars(
        title = "Dimension",
        description = "Length of every observation vector",
        range(min = 1),
        default = "default_dimension"
    )]
    pub dimension: usize,

    #[serde(default = "default_decay_rate")]
    #[schemars(
        title = "Decay rate",
        description = "Weight of the newest observation in each quadrant accumulator",
        range(min = 0.0, max = 1.0),
        default = "default_decay_rate"
    )]
    pub decay_rate: f64,

    #[serde(default)]
    #[schemars(
        title = "Target",
        description = "Fixed reference point; a running mean is used when omitted"
    )]
    pub target: Option<Vec<f64>>,
}

impl Default for PartialMomentParameters {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            decay_rate: default_decay_rate(),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, EnumDiscriminants, PartialEq)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(EstimatorKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum EstimatorChoice {
    #[strum_discriminants(strum(
        message = "Empirical",
        detailed_message = "Equal-weight population covariance over every observation; mergeable."
    ))]
    Empirical(EmpiricalParameters),
    #[strum_discriminants(strum(
        message = "Exponentially weighted",
        detailed_message = "Empirical bootstrap followed by exponential forgetting."
    ))]
    Ema(EmaParameters),
    #[strum_discriminants(strum(
        message = "Partial moments (experimental)",
        detailed_message = "Quadrant-split scatter; output is not a standard covariance."
    ))]
    PartialMoment(PartialMomentParameters),
}

impl Choice for EstimatorChoice {
    type Kind = EstimatorKind;

    fn schema() -> Schema {
        schema_for!(EstimatorChoice)
    }

    fn default_params(kind: Self::Kind) -> Value {
        let params = match kind {
            EstimatorKind::Empirical => serde_json::to_value(EmpiricalParameters::default()),
            EstimatorKind::Ema => serde_json::to_value(EmaParameters::default()),
            EstimatorKind::PartialMoment => serde_json::to_value(PartialMomentParameters::default()),
        };
        params.unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::{EnumMessage, IntoEnumIterator};

    #[test]
    fn tagged_serialization() {
        let choice = EstimatorChoice::Ema(EmaParameters {
            dimension: 3,
            decay_rate: 0.1,
            bootstrap_count: Some(5),
        });
        let v = serde_json::to_value(&choice).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "ema",
                "params": { "dimension": 3, "decay_rate": 0.1, "bootstrap_count": 5 }
            })
        );
        let back: EstimatorChoice = serde_json::from_value(v).unwrap();
        assert_eq!(back, choice);
    }

    #[test]
    fn missing_fields_apply_defaults() {
        let choice: EstimatorChoice =
            serde_json::from_value(json!({ "type": "partial-moment", "params": {} })).unwrap();
        assert_eq!(
            choice,
            EstimatorChoice::PartialMoment(PartialMomentParameters::default())
        );
        let EstimatorChoice::PartialMoment(p) = choice else {
            panic!("wrong variant");
        };
        assert_eq!(p.decay_rate, 0.025);
        assert_eq!(p.dimension, 1);
    }

    #[test]
    fn default_params_round_trip_for_every_kind() {
        for kind in EstimatorKind::iter() {
            let v = EstimatorChoice::default_params(kind);
            let rebuilt = EstimatorChoice::from_parts(kind, v).unwrap();
            assert_eq!(EstimatorKind::from(&rebuilt), kind);
        }
    }

    #[test]
    fn kinds_are_kebab_case() {
        let names: Vec<&'static str> = EstimatorKind::iter().map(Into::into).collect();
        assert_eq!(names, vec!["empirical", "ema", "partial-moment"]);
    }

    #[test]
    fn experimental_kind_is_labelled() {
        let msg = EstimatorKind::PartialMoment.get_message().unwrap();
        assert!(msg.contains("experimental"));
        assert!(EstimatorKind::Empirical.get_detailed_message().is_some());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let r: Result<EstimatorChoice, _> =
            serde_json::from_value(json!({ "type": "kalman", "params": {} }));
        assert!(r.is_err());
    }
}
