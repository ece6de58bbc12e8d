use crate::function::ModelFunction;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while describing or querying a function signature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("Unknown function property `{0}'.")]
    UnknownProperty(String),

    #[error("Function name must not be empty.")]
    EmptyName,

    #[error("Parameter at position {position} has an empty name.")]
    EmptyParameterName { position: usize },

    #[error("Parameter `{0}' is declared more than once.")]
    DuplicateParameter(String),

    #[error("Default value of parameter `{name}' must be finite, but was {value}.")]
    NonFiniteDefault { name: String, value: f64 },
}

/// One declared parameter: its name and the default value used as a fit start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub default: f64,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }
}

/// Declared shape of a fit function `f(x, p1=d1, p2=d2, ...)`.
///
/// The independent variable is implicit and never listed in `parameters`;
/// the variable tuple a function evaluates on is therefore one entry longer
/// than `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionSignature {
    /// Builds and validates a signature from `(name, default)` pairs in declaration order.
    pub fn new(name: impl Into<String>, parameters: &[(&str, f64)]) -> Result<Self, SignatureError> {
        let signature = Self {
            name: name.into(),
            parameters: parameters
                .iter()
                .map(|&(name, default)| ParameterSpec::new(name, default))
                .collect(),
        };
        signature.validate()?;
        Ok(signature)
    }

    /// Checks the descriptor contract: a name, distinct non-empty parameter
    /// names and finite defaults. Deserialized signatures should pass through
    /// here before use.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.name.trim().is_empty() {
            return Err(SignatureError::EmptyName);
        }
        let mut seen = HashSet::with_capacity(self.parameters.len());
        for (position, param) in self.parameters.iter().enumerate() {
            if param.name.trim().is_empty() {
                return Err(SignatureError::EmptyParameterName { position });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SignatureError::DuplicateParameter(param.name.clone()));
            }
            if !param.default.is_finite() {
                return Err(SignatureError::NonFiniteDefault {
                    name: param.name.clone(),
                    value: param.default,
                });
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared arguments minus the independent variable.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn parameter_defaults(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.default).collect()
    }

    /// Defaults as a parameter vector, ready to seed a fit.
    pub fn default_parameters(&self) -> Array1<f64> {
        self.parameters.iter().map(|p| p.default).collect()
    }

    pub fn property(&self, prop: FunctionProperty) -> PropertyValue {
        match prop {
            FunctionProperty::Name => PropertyValue::Name(self.name.clone()),
            FunctionProperty::NumberOfParameters => PropertyValue::Count(self.parameter_count()),
            FunctionProperty::ParameterNames => PropertyValue::Names(self.parameter_names()),
            FunctionProperty::ParameterDefaults => {
                PropertyValue::Defaults(self.parameter_defaults())
            }
        }
    }
}

/// The closed set of properties a signature can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionProperty {
    Name,
    NumberOfParameters,
    ParameterNames,
    ParameterDefaults,
}

impl FunctionProperty {
    pub const ALL: [FunctionProperty; 4] = [
        FunctionProperty::Name,
        FunctionProperty::NumberOfParameters,
        FunctionProperty::ParameterNames,
        FunctionProperty::ParameterDefaults,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            FunctionProperty::Name => "name",
            FunctionProperty::NumberOfParameters => "number of parameters",
            FunctionProperty::ParameterNames => "parameter names",
            FunctionProperty::ParameterDefaults => "parameter defaults",
        }
    }
}

impl fmt::Display for FunctionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FunctionProperty {
    type Err = SignatureError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|prop| prop.tag() == tag)
            .ok_or_else(|| SignatureError::UnknownProperty(tag.to_string()))
    }
}

/// Value returned by a property lookup; the variant follows the requested property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Name(String),
    Count(usize),
    Names(Vec<String>),
    Defaults(Vec<f64>),
}

/// Looks up a signature property of `func` by its string tag.
///
/// Recognized tags are `"name"`, `"number of parameters"`, `"parameter names"`
/// and `"parameter defaults"`; anything else fails with
/// [`SignatureError::UnknownProperty`].
pub fn function_property<F>(func: &F, tag: &str) -> Result<PropertyValue, SignatureError>
where
    F: ModelFunction + ?Sized,
{
    let prop = tag.parse::<FunctionProperty>()?;
    Ok(func.signature().property(prop))
}
