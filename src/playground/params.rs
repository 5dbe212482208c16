//! Query request parameters and pre-submission validation.
//!
//! A query is routed either automatically — priority weights plus optional
//! numeric ceilings/floors — or manually by naming a model. Constraints are
//! validated against the backend's last-fetched valid ranges *before* any
//! connection is opened; a violation is recoverable user input, not an I/O
//! fault, so it is a typed [`ValidationError`] rather than `anyhow`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority weights use the backend's 0–10 slider scale.
pub const PRIORITY_MIN: f64 = 0.0;
pub const PRIORITY_MAX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Constraint ranges
// ---------------------------------------------------------------------------

/// Backend-supplied valid numeric intervals for routing constraints.
///
/// Mirrors the `GET /query/get_ranges` response body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRanges {
    pub cost_min: f64,
    pub cost_max: f64,
    pub performance_min: f64,
    pub performance_max: f64,
    pub latency_min: f64,
    pub latency_max: f64,
}

impl ConstraintRanges {
    fn check(
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ValidationError> {
        if value < min || value > max || !value.is_finite() {
            return Err(ValidationError::ConstraintOutOfRange {
                name,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters for automatic model selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoParams {
    pub cost_priority: f64,
    pub accuracy_priority: f64,
    pub latency_priority: f64,
    /// Cost ceiling, if constrained.
    pub cost_max: Option<f64>,
    /// Performance floor, if constrained.
    pub perf_min: Option<f64>,
    /// Latency ceiling, if constrained.
    pub lat_max: Option<f64>,
}

impl AutoParams {
    /// Balanced weights, no constraints.
    pub fn balanced() -> Self {
        Self {
            cost_priority: 5.0,
            accuracy_priority: 5.0,
            latency_priority: 5.0,
            cost_max: None,
            perf_min: None,
            lat_max: None,
        }
    }

    /// Seed constraints to the permissive extreme of each fetched range:
    /// the highest allowed cost and latency, the lowest allowed performance.
    pub fn seed_constraints(&mut self, ranges: &ConstraintRanges) {
        self.cost_max.get_or_insert(ranges.cost_max);
        self.perf_min.get_or_insert(ranges.performance_min);
        self.lat_max.get_or_insert(ranges.latency_max);
    }
}

/// How the backend should pick a model for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParams {
    /// Backend chooses; weights and constraints steer the choice.
    Auto(AutoParams),
    /// User names the model explicitly.
    Manual { model_id: String },
}

impl QueryParams {
    /// Validate parameters against the last-fetched ranges.
    ///
    /// Priorities are always bounds-checked. Constraints can only be checked
    /// when ranges have been fetched; without ranges they pass through and
    /// the backend has the final word.
    pub fn validate(&self, ranges: Option<&ConstraintRanges>) -> Result<(), ValidationError> {
        match self {
            Self::Manual { model_id } => {
                if model_id.trim().is_empty() {
                    return Err(ValidationError::EmptyModelId);
                }
                Ok(())
            }
            Self::Auto(auto) => {
                check_priority("cost_priority", auto.cost_priority)?;
                check_priority("accuracy_priority", auto.accuracy_priority)?;
                check_priority("latency_priority", auto.latency_priority)?;

                let Some(r) = ranges else {
                    return Ok(());
                };
                if let Some(v) = auto.cost_max {
                    ConstraintRanges::check("cost_max", v, r.cost_min, r.cost_max)?;
                }
                if let Some(v) = auto.perf_min {
                    ConstraintRanges::check("perf_min", v, r.performance_min, r.performance_max)?;
                }
                if let Some(v) = auto.lat_max {
                    ConstraintRanges::check("lat_max", v, r.latency_min, r.latency_max)?;
                }
                Ok(())
            }
        }
    }
}

fn check_priority(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&value) || !value.is_finite() {
        return Err(ValidationError::PriorityOutOfRange { name, value });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Why a submission was rejected before any connection was opened.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Query text is empty after trimming.
    EmptyQuery,
    /// A query is already in flight on this session.
    QueryInFlight,
    /// Manual mode with a blank model identifier.
    EmptyModelId,
    /// A priority weight is outside the 0–10 scale.
    PriorityOutOfRange { name: &'static str, value: f64 },
    /// A constraint falls outside its fetched valid range.
    ConstraintOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "query is empty"),
            Self::QueryInFlight => write!(f, "a query is already in flight"),
            Self::EmptyModelId => write!(f, "model id is empty"),
            Self::PriorityOutOfRange { name, value } => write!(
                f,
                "{name} = {value} is outside the valid range [{PRIORITY_MIN}, {PRIORITY_MAX}]"
            ),
            Self::ConstraintOutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{name} = {value} is outside the valid range [{min}, {max}]"),
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> ConstraintRanges {
        ConstraintRanges {
            cost_min: 0.0,
            cost_max: 100.0,
            performance_min: 10.0,
            performance_max: 95.0,
            latency_min: 50.0,
            latency_max: 2000.0,
        }
    }

    #[test]
    fn balanced_auto_params_validate_without_ranges() {
        let params = QueryParams::Auto(AutoParams::balanced());
        assert_eq!(params.validate(None), Ok(()));
        assert_eq!(params.validate(Some(&ranges())), Ok(()));
    }

    #[test]
    fn priority_bounds_are_enforced() {
        let mut auto = AutoParams::balanced();
        auto.latency_priority = 11.0;
        let err = QueryParams::Auto(auto).validate(None).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PriorityOutOfRange {
                name: "latency_priority",
                ..
            }
        ));
    }

    #[test]
    fn constraint_above_ceiling_is_rejected() {
        let mut auto = AutoParams::balanced();
        auto.cost_max = Some(150.0);
        let err = QueryParams::Auto(auto).validate(Some(&ranges())).unwrap_err();
        match err {
            ValidationError::ConstraintOutOfRange { name, min, max, .. } => {
                assert_eq!(name, "cost_max");
                assert_eq!((min, max), (0.0, 100.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn constraint_below_floor_is_rejected() {
        let mut auto = AutoParams::balanced();
        auto.perf_min = Some(5.0);
        assert!(QueryParams::Auto(auto).validate(Some(&ranges())).is_err());
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut auto = AutoParams::balanced();
        auto.cost_max = Some(100.0);
        auto.perf_min = Some(10.0);
        auto.lat_max = Some(2000.0);
        assert_eq!(QueryParams::Auto(auto).validate(Some(&ranges())), Ok(()));
    }

    #[test]
    fn constraints_pass_when_ranges_unavailable() {
        // Range fetch failure is non-blocking: the backend gets final say.
        let mut auto = AutoParams::balanced();
        auto.cost_max = Some(999_999.0);
        assert_eq!(QueryParams::Auto(auto).validate(None), Ok(()));
    }

    #[test]
    fn seed_constraints_uses_permissive_extremes() {
        let mut auto = AutoParams::balanced();
        auto.seed_constraints(&ranges());
        assert_eq!(auto.cost_max, Some(100.0));
        assert_eq!(auto.perf_min, Some(10.0));
        assert_eq!(auto.lat_max, Some(2000.0));
    }

    #[test]
    fn seed_constraints_keeps_user_values() {
        let mut auto = AutoParams::balanced();
        auto.cost_max = Some(40.0);
        auto.seed_constraints(&ranges());
        assert_eq!(auto.cost_max, Some(40.0));
        assert_eq!(auto.lat_max, Some(2000.0));
    }

    #[test]
    fn manual_mode_requires_a_model_id() {
        let params = QueryParams::Manual {
            model_id: "  ".to_string(),
        };
        assert_eq!(params.validate(None), Err(ValidationError::EmptyModelId));

        let params = QueryParams::Manual {
            model_id: "claude-sonnet".to_string(),
        };
        assert_eq!(params.validate(Some(&ranges())), Ok(()));
    }

    #[test]
    fn validation_errors_render_readably() {
        let err = ValidationError::ConstraintOutOfRange {
            name: "lat_max",
            value: 9000.0,
            min: 50.0,
            max: 2000.0,
        };
        assert_eq!(
            err.to_string(),
            "lat_max = 9000 is outside the valid range [50, 2000]"
        );
        assert_eq!(ValidationError::EmptyQuery.to_string(), "query is empty");
    }
}
