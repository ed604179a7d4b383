//! Built-in attribute validators
//!
//! Validators only see known, non-null values; the schema skips them for
//! absent or unknown configuration.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};
use regex::Regex;

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();
        if let Some(s) = request.config_value.value.as_str() {
            let len = s.chars().count();
            if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value length",
                        format!(
                            "{} must be between {} and {} characters, got {}",
                            request.path,
                            self.min.unwrap_or(0),
                            self.max.map_or("unlimited".to_string(), |m| m.to_string()),
                            len
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

/// Matches strings against a regular expression
pub struct StringPatternValidator {
    pattern: String,
    description: String,
}

impl StringPatternValidator {
    pub fn create(pattern: &str, description: &str) -> Box<dyn Validator> {
        Box::new(Self {
            pattern: pattern.to_string(),
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();
        let Some(s) = request.config_value.value.as_str() else {
            return ValidatorResponse { diagnostics };
        };
        match Regex::new(&self.pattern) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => diagnostics.push(
                Diagnostic::error(
                    "Invalid attribute value",
                    format!(
                        "{} must match {}: value {:?} does not match {}",
                        request.path, self.description, s, self.pattern
                    ),
                )
                .with_attribute(request.path),
            ),
            Err(e) => diagnostics.push(Diagnostic::error(
                "Invalid validation pattern",
                format!("pattern {} for {} does not compile: {}", self.pattern, request.path, e),
            )),
        }
        ValidatorResponse { diagnostics }
    }
}

/// Restricts a string to a fixed set of values
pub struct OneOfValidator {
    allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn create(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("one of {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();
        if let Some(s) = request.config_value.value.as_str() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value",
                        format!(
                            "{} must be one of [{}], got {:?}",
                            request.path,
                            self.allowed.join(", "),
                            s
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        format!("number between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();
        if let Some(n) = request.config_value.value.as_number() {
            if let Some(min) = self.min.filter(|min| n < *min) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value",
                        format!("{} must be at least {}, got {}", request.path, min, n),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value",
                        format!("{} must be at most {}, got {}", request.path, max, n),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("list length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = Vec::new();
        if let Dynamic::List(items) = &request.config_value.value {
            if self.min.is_some_and(|min| items.len() < min)
                || self.max.is_some_and(|max| items.len() > max)
            {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid list length",
                        format!(
                            "{} must have between {:?} and {:?} items, got {}",
                            request.path,
                            self.min,
                            self.max,
                            items.len()
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DynamicValue};

    fn run(validator: &dyn Validator, value: Dynamic) -> Vec<Diagnostic> {
        validator
            .validate(ValidatorRequest {
                config_value: DynamicValue::new(value),
                path: AttributePath::new("name"),
            })
            .diagnostics
    }

    #[test]
    fn string_length_validator_bounds() {
        let validator = StringLengthValidator::between(1, 63);
        assert!(run(validator.as_ref(), Dynamic::from("subnet-a")).is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::from("")).len(), 1);
        assert_eq!(run(validator.as_ref(), Dynamic::from("a".repeat(64))).len(), 1);
    }

    #[test]
    fn pattern_validator_matches_vpc_names() {
        let validator = StringPatternValidator::create(
            r"^([a-z]|[a-z][-a-z0-9]*[a-z0-9])$",
            "a lowercase name",
        );
        assert!(run(validator.as_ref(), Dynamic::from("my-subnet-1")).is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::from("My_Subnet")).len(), 1);
        assert_eq!(run(validator.as_ref(), Dynamic::from("trailing-")).len(), 1);
    }

    #[test]
    fn pattern_validator_reports_bad_pattern() {
        let validator = StringPatternValidator::create("(", "broken");
        let diags = run(validator.as_ref(), Dynamic::from("x"));
        assert_eq!(diags[0].summary, "Invalid validation pattern");
    }

    #[test]
    fn one_of_validator() {
        let validator = OneOfValidator::create(&["route", "policy"]);
        assert!(run(validator.as_ref(), Dynamic::from("route")).is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::from("static")).len(), 1);
    }

    #[test]
    fn number_range_validator() {
        let validator = NumberRangeValidator::between(1.0, 10.0);
        assert!(run(validator.as_ref(), Dynamic::Number(5.0)).is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::Number(0.0)).len(), 1);
        assert_eq!(run(validator.as_ref(), Dynamic::Number(11.0)).len(), 1);
    }

    #[test]
    fn list_length_validator() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: Some(2),
        };
        assert!(run(&validator, Dynamic::List(vec![Dynamic::from("a")])).is_empty());
        assert_eq!(run(&validator, Dynamic::List(vec![])).len(), 1);
    }
}
