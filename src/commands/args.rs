use crate::error::DispatchError;
use std::collections::BTreeMap;

/// Operation arguments given as `key:value,key:value`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(BTreeMap<String, String>);

impl Arguments {
    pub fn parse(input: &str) -> Result<Self, DispatchError> {
        let mut map = BTreeMap::new();

        for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once(':')
                .ok_or_else(|| DispatchError::InvalidArguments(format!("'{}' is not a key:value pair", pair)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DispatchError::InvalidArguments(format!("'{}' has an empty key", pair)));
            }
            if map.insert(key.to_string(), value.trim().to_string()).is_some() {
                return Err(DispatchError::InvalidArguments(format!("'{}' given more than once", key)));
            }
        }

        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<_> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", rendered.join(", "))
    }
}
