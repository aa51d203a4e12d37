//! Declared remote actions and their typed arguments.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ARGUMENT TYPES
// ============================================================================

/// Primitive type of an action argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArgType {
    Int,
    Float,
    Str,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Str => "string",
        }
    }

    /// Parse a raw path segment as this type.
    pub fn parse_value(&self, raw: &str) -> Option<ArgValue> {
        match self {
            ArgType::Int => raw.parse::<i64>().ok().map(ArgValue::Int),
            ArgType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ArgValue::Float),
            ArgType::Str => Some(ArgValue::Str(raw.to_string())),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an argument type name that is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown argument type '{0}' (expected int, float or string)")]
pub struct UnknownArgType(pub String);

impl FromStr for ArgType {
    type Err = UnknownArgType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ArgType::Int),
            "float" => Ok(ArgType::Float),
            "str" | "string" => Ok(ArgType::Str),
            _ => Err(UnknownArgType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ArgType {
    type Error = UnknownArgType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArgType> for String {
    fn from(value: ArgType) -> Self {
        value.as_str().to_string()
    }
}

/// A parsed argument value, handed to handlers in declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{}", v),
            ArgValue::Float(v) => write!(f, "{}", v),
            ArgValue::Str(v) => f.write_str(v),
        }
    }
}

/// Arguments supplied for one invocation, keyed by name.
pub type ArgumentMap = BTreeMap<String, ArgValue>;

// ============================================================================
// ACTION
// ============================================================================

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            name: name.into(),
            arg_type,
        }
    }
}

/// A raw argument that does not parse as its declared type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("argument '{name}' is not a valid {expected}: '{raw}'")]
pub struct ArgParseError {
    pub name: String,
    pub expected: ArgType,
    pub raw: String,
}

/// A parameterized operation exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub rest_route: String,
    /// Name of the handler in the catalog.
    pub handler: String,
    pub arguments: Vec<ArgumentSpec>,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        rest_route: impl Into<String>,
        handler: impl Into<String>,
        arguments: Vec<ArgumentSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            rest_route: rest_route.into(),
            handler: handler.into(),
            arguments,
        }
    }

    /// Route with one `/:name` segment appended per declared argument.
    pub fn route_template(&self) -> String {
        let mut route = self.rest_route.clone();
        for arg in &self.arguments {
            route.push_str("/:");
            route.push_str(&arg.name);
        }
        route
    }

    /// Route with argument names stripped, used to detect routes that
    /// would match the same requests.
    pub fn route_shape(&self) -> String {
        let mut route = self.rest_route.clone();
        for _ in &self.arguments {
            route.push_str("/:");
        }
        route
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Convert raw request values into typed arguments.
    ///
    /// Declared arguments are parsed as their declared type. Undeclared
    /// names are passed through as strings so dispatch can report them.
    pub fn parse_arguments(
        &self,
        raw: &HashMap<String, String>,
    ) -> Result<ArgumentMap, ArgParseError> {
        let mut parsed = ArgumentMap::new();
        for (name, value) in raw {
            let typed = match self.argument(name) {
                Some(spec) => spec.arg_type.parse_value(value).ok_or_else(|| ArgParseError {
                    name: name.clone(),
                    expected: spec.arg_type,
                    raw: value.clone(),
                })?,
                None => ArgValue::Str(value.clone()),
            };
            parsed.insert(name.clone(), typed);
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn power_on() -> Action {
        Action::new(
            "power_on",
            "/power_on",
            "power_on",
            vec![ArgumentSpec::new("node_number", ArgType::Int)],
        )
    }

    #[test]
    fn test_arg_type_names_are_case_insensitive() {
        assert_eq!("INT".parse(), Ok(ArgType::Int));
        assert_eq!("integer".parse(), Ok(ArgType::Int));
        assert_eq!("Float".parse(), Ok(ArgType::Float));
        assert_eq!("str".parse(), Ok(ArgType::Str));
        assert_eq!("String".parse(), Ok(ArgType::Str));
        assert!("bool".parse::<ArgType>().is_err());
    }

    #[test]
    fn test_argument_spec_deserializes_type_field() -> Result<(), serde_json::Error> {
        let spec: ArgumentSpec = serde_json::from_value(json!({"name": "n", "type": "int"}))?;
        assert_eq!(spec, ArgumentSpec::new("n", ArgType::Int));

        let bad = serde_json::from_value::<ArgumentSpec>(json!({"name": "n", "type": "list"}));
        assert!(bad.is_err());
        Ok(())
    }

    #[test]
    fn test_parse_value_by_type() {
        assert_eq!(ArgType::Int.parse_value("3"), Some(ArgValue::Int(3)));
        assert_eq!(ArgType::Int.parse_value("three"), None);
        assert_eq!(ArgType::Float.parse_value("2.5"), Some(ArgValue::Float(2.5)));
        assert_eq!(ArgType::Float.parse_value("NaN"), None);
        assert_eq!(
            ArgType::Str.parse_value("alice"),
            Some(ArgValue::Str("alice".to_string()))
        );
    }

    #[test]
    fn test_route_template_appends_argument_segments() {
        assert_eq!(power_on().route_template(), "/power_on/:node_number");
        assert_eq!(power_on().route_shape(), "/power_on/:");

        let nodes = Action::new("nodes", "/nodes", "nodes", vec![]);
        assert_eq!(nodes.route_template(), "/nodes");
    }

    #[test]
    fn test_parse_arguments_types_declared_and_passes_through_extras() {
        let raw = HashMap::from([
            ("node_number".to_string(), "3".to_string()),
            ("foo".to_string(), "1".to_string()),
        ]);
        let parsed = power_on().parse_arguments(&raw).expect("valid arguments");
        assert_eq!(parsed.get("node_number"), Some(&ArgValue::Int(3)));
        assert_eq!(parsed.get("foo"), Some(&ArgValue::Str("1".to_string())));
    }

    #[test]
    fn test_parse_arguments_rejects_mistyped_value() {
        let raw = HashMap::from([("node_number".to_string(), "x".to_string())]);
        let err = power_on().parse_arguments(&raw).unwrap_err();
        assert_eq!(err.expected, ArgType::Int);
        assert_eq!(err.raw, "x");
    }

    #[test]
    fn test_arg_value_serializes_bare() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_value(ArgValue::Int(3))?, json!(3));
        assert_eq!(serde_json::to_value(ArgValue::Str("a".into()))?, json!("a"));
        Ok(())
    }
}
