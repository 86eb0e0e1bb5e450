//! Data models for workflow definitions.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Source-state sentinel meaning "any current state".
pub const WILDCARD: &str = "*";

/// A named, guarded move from a set of source states to one destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionDefinition {
    /// Action identifier a caller requests (e.g. "confirm")
    pub name: String,
    /// Source states; `*` matches any state
    #[serde(deserialize_with = "one_or_many")]
    pub from: Vec<String>,
    /// Destination state
    pub to: String,
    /// Name of the validator consulted before the move
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    /// Authorization tag, interpreted by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

impl TransitionDefinition {
    pub fn new<I, S>(name: impl Into<String>, from: I, to: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            from: from.into_iter().map(Into::into).collect(),
            to: to.into(),
            validator: None,
            permission: None,
        }
    }

    /// A transition legal from every state.
    pub fn from_any(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(name, [WILDCARD], to)
    }

    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Whether `from` contains the wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.from.iter().any(|s| s == WILDCARD)
    }

    /// Whether this transition may fire while the entity is in `state`.
    pub fn allows_from(&self, state: &str) -> bool {
        self.from.iter().any(|s| s == state || s == WILDCARD)
    }
}

/// An immutable workflow: the closed set of states and the transitions between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowDefinition {
    /// Unique lookup key
    #[serde(rename = "workflow_id")]
    pub id: String,
    /// Entity type the workflow governs (informational)
    #[serde(default)]
    pub model: String,
    /// State a fresh entity starts in
    #[serde(rename = "initial")]
    pub initial_state: String,
    /// Legal state names, in declaration order
    #[serde(default)]
    pub states: Vec<String>,
    /// Transitions, matched by name in declaration order
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkflowDefinition {
    /// Create a workflow whose only state is the initial one.
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        initial_state: impl Into<String>,
    ) -> Self {
        let initial_state = initial_state.into();
        Self {
            id: id.into(),
            model: model.into(),
            states: vec![initial_state.clone()],
            initial_state,
            transitions: Vec::new(),
            description: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Declare a state (ignored if already declared).
    pub fn state(mut self, state: impl Into<String>) -> Self {
        let state = state.into();
        if !self.has_state(&state) {
            self.states.push(state);
        }
        self
    }

    pub fn states<I, S>(self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        states.into_iter().fold(self, |wf, s| wf.state(s))
    }

    pub fn transition(mut self, transition: TransitionDefinition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Check if `state` is one of the declared states.
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// First transition named `name`, in declaration order.
    pub fn find_transition(&self, name: &str) -> Option<&TransitionDefinition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Transitions a caller could request while in `state`.
    ///
    /// Only the first definition of each name counts, since later ones are
    /// never selected by a lookup.
    pub fn transitions_from(&self, state: &str) -> Vec<&TransitionDefinition> {
        let mut seen = HashSet::new();
        self.transitions
            .iter()
            .filter(|t| seen.insert(t.name.as_str()))
            .filter(|t| t.allows_from(state))
            .collect()
    }

    /// Distinct validator names referenced by any transition.
    pub fn validator_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.transitions
            .iter()
            .filter_map(|t| t.validator.as_deref())
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_order() -> WorkflowDefinition {
        WorkflowDefinition::new("sales_order", "sale.order", "draft")
            .states(["quotation", "confirmed", "cancelled", "closed"])
            .transition(TransitionDefinition::new("confirm", ["draft", "quotation"], "confirmed"))
            .transition(TransitionDefinition::new("cancel", ["draft", "confirmed"], "cancelled"))
            .transition(TransitionDefinition::from_any("force_close", "closed"))
            .transition(TransitionDefinition::new("confirm", ["cancelled"], "draft"))
    }

    #[test]
    fn test_allows_from() {
        let t = TransitionDefinition::new("confirm", ["draft", "quotation"], "confirmed");
        assert!(t.allows_from("draft"));
        assert!(t.allows_from("quotation"));
        assert!(!t.allows_from("cancelled"));
        assert!(!t.is_wildcard());

        let any = TransitionDefinition::from_any("force_close", "closed");
        assert!(any.is_wildcard());
        assert!(any.allows_from("whatever"));
    }

    #[test]
    fn test_find_transition_first_match_wins() {
        let wf = sales_order();
        let t = wf.find_transition("confirm").unwrap();
        assert_eq!(t.from, vec!["draft", "quotation"]);
        assert!(wf.find_transition("ship").is_none());
    }

    #[test]
    fn test_transitions_from_ignores_shadowed() {
        let wf = sales_order();
        // The second "confirm" would match "cancelled" but is never reachable by name.
        let names: Vec<_> = wf
            .transitions_from("cancelled")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["force_close"]);

        let names: Vec<_> = wf
            .transitions_from("draft")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["confirm", "cancel", "force_close"]);
    }

    #[test]
    fn test_builder_dedupes_states() {
        let wf = WorkflowDefinition::new("wf", "m", "a").states(["a", "b", "b"]);
        assert_eq!(wf.states, vec!["a", "b"]);
    }

    #[test]
    fn test_validator_names_distinct() {
        let wf = WorkflowDefinition::new("wf", "m", "a")
            .state("b")
            .transition(TransitionDefinition::new("x", ["a"], "b").with_validator("credit"))
            .transition(TransitionDefinition::new("y", ["b"], "a").with_validator("credit"))
            .transition(TransitionDefinition::new("z", ["b"], "b").with_validator("stock"));
        assert_eq!(wf.validator_names(), vec!["credit", "stock"]);
    }

    #[test]
    fn test_from_accepts_scalar() {
        let yaml = r#"
workflow_id: wf
initial: a
states: [a, b]
transitions:
  - name: go
    from: a
    to: b
    permission: sales.manager
"#;
        let wf: WorkflowDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(wf.transitions[0].from, vec!["a"]);
        assert_eq!(wf.transitions[0].permission.as_deref(), Some("sales.manager"));
        assert_eq!(wf.model, "");
    }
}
