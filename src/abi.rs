use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::GatewayError;

pub const GET_COUNTER: &str = "get_counter";
pub const INCREASE_COUNTER: &str = "increase_counter";
pub const RESET_COUNTER: &str = "reset_counter";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// Read-only, reached through `call`.
    View,
    /// State-changing, reached through `invoke`.
    External,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FunctionAbi {
    pub kind: FunctionKind,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// The subset of a contract ABI the frontend needs: function name to signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ContractAbi {
    functions: BTreeMap<String, FunctionAbi>,
}

impl ContractAbi {
    pub fn function(&self, name: &str) -> Option<&FunctionAbi> {
        self.functions.get(name)
    }

    /// Looks up `name` and checks that it can be reached as `kind`.
    pub fn ensure(&self, name: &str, kind: FunctionKind) -> Result<&FunctionAbi, GatewayError> {
        let function = self
            .function(name)
            .ok_or_else(|| GatewayError::UnknownFunction(name.to_owned()))?;
        if function.kind != kind {
            return Err(GatewayError::WrongFunctionKind {
                name: name.to_owned(),
                expected: kind,
                found: function.kind,
            });
        }
        Ok(function)
    }

    /// The functions this frontend calls, with the kind each must have.
    pub fn required() -> [(&'static str, FunctionKind); 3] {
        [
            (GET_COUNTER, FunctionKind::View),
            (INCREASE_COUNTER, FunctionKind::External),
            (RESET_COUNTER, FunctionKind::External),
        ]
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn abi() -> ContractAbi {
        serde_json::from_str(
            r#"{
                "get_counter": { "kind": "view", "outputs": ["felt"] },
                "increase_counter": { "kind": "external" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn ensure_accepts_matching_kind() {
        let abi = abi();
        let function = abi.ensure(GET_COUNTER, FunctionKind::View).unwrap();
        assert_eq!(function.outputs, vec!["felt".to_owned()]);
        assert!(abi.ensure(INCREASE_COUNTER, FunctionKind::External).is_ok());
    }

    #[test]
    fn ensure_rejects_unknown_and_mismatched_functions() {
        let abi = abi();
        assert_matches!(
            abi.ensure(RESET_COUNTER, FunctionKind::External),
            Err(GatewayError::UnknownFunction(name)) if name == RESET_COUNTER
        );
        assert_matches!(
            abi.ensure(INCREASE_COUNTER, FunctionKind::View),
            Err(GatewayError::WrongFunctionKind { found: FunctionKind::External, .. })
        );
    }
}
