// STD Dependencies -----------------------------------------------------------
use std::collections::HashMap;


// Define Storage -------------------------------------------------------------
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Define {
    value: String,
    params: String
}

impl Define {

    pub fn new<S: Into<String>, P: Into<String>>(value: S, params: P) -> Self {
        let params = params.into();
        Self {
            value: value.into(),
            // An empty formal list marks an object-like macro
            params: if params.is_empty() {
                "0".to_string()

            } else {
                params
            }
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn params(&self) -> &str {
        &self.params
    }

    pub fn is_object_like(&self) -> bool {
        self.params == "0"
    }

}

/// Macro symbol table keyed by define name. Hosts embed one of these to back
/// the `def_*` half of the `PreprocHost` trait.
#[derive(Debug, Default)]
pub struct DefineMap {
    defines: HashMap<String, Define>
}

impl DefineMap {

    pub fn new() -> Self {
        Self {
            defines: HashMap::new()
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// "" when undefined, "0" for object-like macros, otherwise the formal
    /// parameter source beginning with a `(`.
    pub fn params(&self, name: &str) -> String {
        self.defines.get(name).map(|def| def.params.clone()).unwrap_or_default()
    }

    pub fn value(&self, name: &str) -> String {
        self.defines.get(name).map(|def| def.value.clone()).unwrap_or_default()
    }

    /// Returns the previous definition when the name was already defined.
    pub fn define(&mut self, name: &str, value: &str, params: &str) -> Option<Define> {
        self.defines.insert(name.to_string(), Define::new(value, params))
    }

    pub fn undef(&mut self, name: &str) -> bool {
        self.defines.remove(name).is_some()
    }

    pub fn undefineall(&mut self) {
        self.defines.clear();
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

}


// Tests ----------------------------------------------------------------------
#[cfg(test)]
mod test {
    use super::DefineMap;

    #[test]
    fn test_params_encoding() {
        let mut map = DefineMap::new();
        assert_eq!(map.params("X"), "");
        map.define("X", "42", "");
        assert_eq!(map.params("X"), "0");
        map.define("P", "a+b", "(a,b=9)");
        assert_eq!(map.params("P"), "(a,b=9)");
        assert_eq!(map.value("P"), "a+b");
        assert!(map.exists("X"));
        assert!(!map.exists("Y"));
    }

    #[test]
    fn test_redefine_returns_previous() {
        let mut map = DefineMap::new();
        assert!(map.define("X", "1", "").is_none());
        let previous = map.define("X", "2", "").expect("Expected previous definition");
        assert_eq!(previous.value(), "1");
        assert!(previous.is_object_like());
        assert_eq!(map.value("X"), "2");
    }

    #[test]
    fn test_undef() {
        let mut map = DefineMap::new();
        map.define("X", "1", "");
        assert!(map.undef("X"));
        assert!(!map.undef("X"));
        assert_eq!(map.params("X"), "");
    }

    #[test]
    fn test_undefineall() {
        let mut map = DefineMap::new();
        map.define("A", "1", "");
        map.define("B", "2", "");
        assert_eq!(map.len(), 2);
        map.undefineall();
        assert!(map.is_empty());
    }

}
