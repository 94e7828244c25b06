//! Variables and vectors available to a template run.
//!
//! A [`Context`] holds two disjoint tables: scalar *variables* and ordered
//! *vectors* of scalars.  A name lives in at most one of them.  Breaking that
//! rule is a bug in the host that built the context, not a problem with the
//! template text, so the mutators `assert!` instead of returning an error.
//!
//! Lookups used while evaluating directives return [`SyntaxError`] because the
//! names they receive come straight from the template.

use std::collections::HashMap;

use super::error::SyntaxError;

/// Named variables and vectors used to instantiate a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    variables: HashMap<String, String>,
    vectors: HashMap<String, Vec<String>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    ///
    /// # Panics
    ///
    /// If `name` is already a vector.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        assert!(
            !self.vectors.contains_key(&name),
            "'{name}' is already defined as a vector"
        );
        self.variables.insert(name, value.into());
    }

    /// Remove a variable.  Only loop iterators need this.
    ///
    /// # Panics
    ///
    /// If `name` is not a variable.
    pub fn remove_variable(&mut self, name: &str) {
        assert!(
            self.variables.remove(name).is_some(),
            "variable '{name}' is not defined"
        );
    }

    /// Declare a vector, clearing it if it already exists.
    ///
    /// # Panics
    ///
    /// If `name` is already a variable.
    pub fn add_vector(&mut self, name: impl Into<String>) {
        let name = name.into();
        assert!(
            !self.variables.contains_key(&name),
            "'{name}' is already defined as a variable"
        );
        self.vectors.insert(name, Vec::new());
    }

    /// Append a value to a vector declared with [`Context::add_vector`].
    ///
    /// # Panics
    ///
    /// If `name` is not a vector.
    pub fn add_to_vector(&mut self, name: &str, value: impl Into<String>) {
        match self.vectors.get_mut(name) {
            Some(values) => values.push(value.into()),
            None => panic!("vector '{name}' is not defined"),
        }
    }

    /// Returns `true` if `name` is either a variable or a vector.
    pub fn exists(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.vectors.contains_key(name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn is_vector(&self, name: &str) -> bool {
        self.vectors.contains_key(name)
    }

    pub fn get_variable(&self, name: &str) -> Result<&str, SyntaxError> {
        self.variables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SyntaxError::UnknownVariable(name.to_owned()))
    }

    pub fn get_vector(&self, name: &str) -> Result<&[String], SyntaxError> {
        self.vectors
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SyntaxError::UnknownVector(name.to_owned()))
    }

    /// Index vector `name` by the value of the variable `index_name`.
    ///
    /// The index variable must hold a non-negative decimal integer below the
    /// vector's length.
    pub fn get_vector_element(&self, name: &str, index_name: &str) -> Result<&str, SyntaxError> {
        let values = self.get_vector(name)?;
        let index = self.get_index(index_name)?;
        values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| SyntaxError::IndexOutOfRange {
                index: index_name.to_owned(),
                position: index,
            })
    }

    /// Read the variable `name` as a zero-based position.
    pub fn get_index(&self, name: &str) -> Result<usize, SyntaxError> {
        let text = self.get_variable(name)?;
        text.parse().map_err(|_| SyntaxError::IndexNotInteger {
            index: name.to_owned(),
            value: text.to_owned(),
        })
    }

    /// Iterate over all variables.
    pub fn variables(&self) -> impl Iterator<Item = (&String, &String)> {
        self.variables.iter()
    }

    /// Iterate over all vectors.
    pub fn vectors(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.vectors.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_variable() {
        let mut ctx = Context::new();
        ctx.add_variable("name", "kyua");
        assert_eq!(ctx.get_variable("name"), Ok("kyua"));
        assert!(ctx.is_variable("name"));
        assert!(!ctx.is_vector("name"));
    }

    #[test]
    fn overwrite_variable() {
        let mut ctx = Context::new();
        ctx.add_variable("x", "old");
        ctx.add_variable("x", "new");
        assert_eq!(ctx.get_variable("x"), Ok("new"));
        assert_eq!(ctx.variables().count(), 1);
    }

    #[test]
    fn remove_variable() {
        let mut ctx = Context::new();
        ctx.add_variable("i", "0");
        ctx.remove_variable("i");
        assert!(!ctx.exists("i"));
    }

    #[test]
    #[should_panic(expected = "not defined")]
    fn remove_missing_variable_panics() {
        Context::new().remove_variable("nope");
    }

    #[test]
    fn missing_variable_is_error() {
        let ctx = Context::new();
        assert_eq!(
            ctx.get_variable("nope"),
            Err(SyntaxError::UnknownVariable("nope".to_owned()))
        );
    }

    #[test]
    fn vector_append_and_get() {
        let mut ctx = Context::new();
        ctx.add_vector("items");
        ctx.add_to_vector("items", "a");
        ctx.add_to_vector("items", "b");
        assert_eq!(ctx.get_vector("items"), Ok(&["a".to_owned(), "b".to_owned()][..]));
    }

    #[test]
    fn redeclaring_vector_clears_it() {
        let mut ctx = Context::new();
        ctx.add_vector("items");
        ctx.add_to_vector("items", "a");
        ctx.add_vector("items");
        assert_eq!(ctx.get_vector("items").map(<[String]>::len), Ok(0));
    }

    #[test]
    fn missing_vector_is_error() {
        let mut ctx = Context::new();
        ctx.add_variable("scalar", "1");
        assert_eq!(
            ctx.get_vector("scalar"),
            Err(SyntaxError::UnknownVector("scalar".to_owned()))
        );
    }

    #[test]
    fn exists_covers_both_tables() {
        let mut ctx = Context::new();
        ctx.add_variable("var", "");
        ctx.add_vector("vec");
        assert!(ctx.exists("var"));
        assert!(ctx.exists("vec"));
        assert!(!ctx.exists("other"));
    }

    #[test]
    #[should_panic(expected = "already defined as a vector")]
    fn variable_over_vector_panics() {
        let mut ctx = Context::new();
        ctx.add_vector("name");
        ctx.add_variable("name", "x");
    }

    #[test]
    #[should_panic(expected = "already defined as a variable")]
    fn vector_over_variable_panics() {
        let mut ctx = Context::new();
        ctx.add_variable("name", "x");
        ctx.add_vector("name");
    }

    #[test]
    #[should_panic(expected = "not defined")]
    fn append_to_undeclared_vector_panics() {
        Context::new().add_to_vector("items", "a");
    }

    fn indexed() -> Context {
        let mut ctx = Context::new();
        ctx.add_vector("v");
        for value in ["first", "second", "third"] {
            ctx.add_to_vector("v", value);
        }
        ctx
    }

    #[test]
    fn element_at_last_position() {
        let mut ctx = indexed();
        ctx.add_variable("i", "2");
        assert_eq!(ctx.get_vector_element("v", "i"), Ok("third"));
    }

    #[test]
    fn element_at_length_is_out_of_range() {
        let mut ctx = indexed();
        ctx.add_variable("i", "3");
        assert_eq!(
            ctx.get_vector_element("v", "i"),
            Err(SyntaxError::IndexOutOfRange {
                index: "i".to_owned(),
                position: 3
            })
        );
    }

    #[test]
    fn non_integer_index() {
        let mut ctx = indexed();
        ctx.add_variable("i", "-1");
        assert_eq!(
            ctx.get_vector_element("v", "i"),
            Err(SyntaxError::IndexNotInteger {
                index: "i".to_owned(),
                value: "-1".to_owned()
            })
        );
    }

    #[test]
    fn missing_index_variable() {
        let ctx = indexed();
        assert_eq!(
            ctx.get_vector_element("v", "i"),
            Err(SyntaxError::UnknownVariable("i".to_owned()))
        );
    }
}
