//! Step templates and the index/value bookkeeping shared by multi-step forms.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Tel,
    Email,
    Password,
    TextArea,
}

impl FieldKind {
    /// HTML `type` attribute for `<input>` fields; `None` for a textarea.
    #[must_use]
    pub const fn input_type(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("text"),
            Self::Tel => Some("tel"),
            Self::Email => Some("email"),
            Self::Password => Some("password"),
            Self::TextArea => None,
        }
    }
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct StepTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Current step plus collected values over a fixed, non-empty list of steps.
#[derive(Clone, Debug)]
pub struct Wizard {
    steps: &'static [StepTemplate],
    current: usize,
    values: HashMap<String, String>,
}

impl Wizard {
    /// # Panics
    /// Panics if `steps` is empty.
    #[must_use]
    pub fn new(steps: &'static [StepTemplate]) -> Self {
        assert!(!steps.is_empty(), "a wizard needs at least one step");
        Self {
            steps,
            current: 0,
            values: HashMap::new(),
        }
    }

    #[must_use]
    pub fn steps(&self) -> &'static [StepTemplate] {
        self.steps
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_step(&self) -> &'static StepTemplate {
        &self.steps[self.current]
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current == self.last_index()
    }

    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    /// Store submitted values for fields of the current step; other names are ignored.
    pub fn fill<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let step = self.current_step();
        for (name, value) in pairs {
            if let Some(field) = step.fields.iter().find(|field| field.name == name.as_ref()) {
                self.values.insert(field.name.to_string(), value.into());
            }
        }
    }

    /// Names of current-step fields with no value. Whitespace counts as a value.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.current_step()
            .fields
            .iter()
            .filter(|field| self.value(field.name).is_empty())
            .map(|field| field.name)
            .collect()
    }

    pub fn forward(&mut self) {
        self.current = (self.current + 1).min(self.last_index());
    }

    pub fn back(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }
}
