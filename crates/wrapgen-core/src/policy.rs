//! Binding policy interface.
//!
//! The binding generator is configured by an external script that can drop
//! classes and methods, rename them, suppress base-class imports, and mark
//! ownership transfer or property/signal roles. The semantic core never sees
//! that script; it only queries an opaque [`Policy`] handle with a class name
//! and a rendered method signature (e.g. `"resize(int, int)"` or
//! `"name() const"`).
//!
//! Two implementations ship here:
//! - [`NullPolicy`] includes everything, used as the default and in tests.
//! - [`TablePolicy`] is a JSON-loadable rule table for the CLI.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Property accessor role assigned to a method by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyRole {
    Getter,
    Setter,
}

/// The answer for one (class, signature) query.
///
/// `Default` means: include the method, no renames, no ownership transfer,
/// plain method (not a property accessor, not a signal).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyAnswer {
    /// Method is dropped from the binding entirely.
    #[serde(default)]
    pub drop: bool,
    /// Target-language aliases for the method (multiple allowed).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// The receiver takes ownership of the object when this method is called.
    #[serde(default)]
    pub owning_receiver: bool,
    /// Zero-based argument positions whose ownership passes to the callee.
    #[serde(default)]
    pub owning_args: Vec<usize>,
    /// Property accessor classification, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyRole>,
    /// Method is recognized as an event signal.
    #[serde(default)]
    pub signal: bool,
}

/// Opaque per-class/per-method rule lookup.
///
/// Class names are fully qualified (`"gui::Widget"`); signatures are the
/// method name followed by its call signature (`"resize(int, int)"`).
/// Implementations must be pure lookups: the core queries freely and caches
/// nothing.
pub trait Policy {
    /// Rules for one method of one class.
    fn query(&self, class: &str, signature: &str) -> PolicyAnswer;

    /// Whether the class is sealed: no adaptor may be generated for it.
    fn is_final(&self, class: &str) -> bool {
        let _ = class;
        false
    }

    /// Whether `class` imports members of `base` (two-layer import
    /// suppression). Defaults to importing every base.
    fn import_base(&self, class: &str, base: &str) -> bool {
        let _ = (class, base);
        true
    }
}

/// A policy that includes everything and renames nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPolicy;

impl Policy for NullPolicy {
    fn query(&self, _class: &str, _signature: &str) -> PolicyAnswer {
        PolicyAnswer::default()
    }
}

/// Per-class rule set for [`TablePolicy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRules {
    /// Class is sealed; never generate an adaptor.
    #[serde(default, rename = "final")]
    pub final_: bool,
    /// Rendered signatures of methods to drop.
    #[serde(default)]
    pub drop: Vec<String>,
    /// Rendered signature -> target-language aliases.
    #[serde(default)]
    pub rename: HashMap<String, Vec<String>>,
    /// Base class names whose members are not imported.
    #[serde(default)]
    pub no_import: Vec<String>,
    /// Rendered signatures recognized as event signals.
    #[serde(default)]
    pub signals: Vec<String>,
    /// Rendered signature -> property accessor role.
    #[serde(default)]
    pub properties: HashMap<String, PropertyRole>,
    /// Rendered signatures where the receiver takes ownership.
    #[serde(default)]
    pub owning: Vec<String>,
}

/// Rule table loaded from JSON, keyed by fully qualified class name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablePolicy {
    #[serde(default)]
    pub classes: HashMap<String, ClassRules>,
}

impl TablePolicy {
    /// Load a rule table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn rules(&self, class: &str) -> Option<&ClassRules> {
        self.classes.get(class)
    }
}

impl Policy for TablePolicy {
    fn query(&self, class: &str, signature: &str) -> PolicyAnswer {
        let Some(rules) = self.rules(class) else {
            return PolicyAnswer::default();
        };
        PolicyAnswer {
            drop: rules.drop.iter().any(|s| s == signature),
            aliases: rules.rename.get(signature).cloned().unwrap_or_default(),
            owning_receiver: rules.owning.iter().any(|s| s == signature),
            owning_args: Vec::new(),
            property: rules.properties.get(signature).copied(),
            signal: rules.signals.iter().any(|s| s == signature),
        }
    }

    fn is_final(&self, class: &str) -> bool {
        self.rules(class).is_some_and(|r| r.final_)
    }

    fn import_base(&self, class: &str, base: &str) -> bool {
        !self
            .rules(class)
            .is_some_and(|r| r.no_import.iter().any(|b| b == base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_policy_includes_everything() {
        let policy = NullPolicy;
        let answer = policy.query("gui::Widget", "resize(int, int)");
        assert!(!answer.drop);
        assert!(answer.aliases.is_empty());
        assert!(!policy.is_final("gui::Widget"));
        assert!(policy.import_base("gui::Widget", "gui::Object"));
    }

    #[test]
    fn table_policy_drops_listed_signatures() {
        let json = r#"{
            "classes": {
                "gui::Widget": {
                    "drop": ["internalHook()"],
                    "rename": {"resize(int, int)": ["set_size", "setSize"]},
                    "final": false
                }
            }
        }"#;
        let policy = TablePolicy::from_json(json).unwrap();
        assert!(policy.query("gui::Widget", "internalHook()").drop);
        assert!(!policy.query("gui::Widget", "resize(int, int)").drop);
        assert_eq!(
            policy.query("gui::Widget", "resize(int, int)").aliases,
            vec!["set_size", "setSize"]
        );
        // Unknown class falls back to defaults.
        assert!(!policy.query("gui::Other", "internalHook()").drop);
    }

    #[test]
    fn table_policy_final_and_import() {
        let json = r#"{
            "classes": {
                "Sealed": {"final": true},
                "Derived": {"no_import": ["NoisyBase"]}
            }
        }"#;
        let policy = TablePolicy::from_json(json).unwrap();
        assert!(policy.is_final("Sealed"));
        assert!(!policy.is_final("Derived"));
        assert!(!policy.import_base("Derived", "NoisyBase"));
        assert!(policy.import_base("Derived", "OtherBase"));
    }

    #[test]
    fn table_policy_signal_and_property_roles() {
        let json = r#"{
            "classes": {
                "Button": {
                    "signals": ["clicked()"],
                    "properties": {"text() const": "getter", "setText(const char*)": "setter"},
                    "owning": ["addChild(Widget*)"]
                }
            }
        }"#;
        let policy = TablePolicy::from_json(json).unwrap();
        assert!(policy.query("Button", "clicked()").signal);
        assert_eq!(
            policy.query("Button", "text() const").property,
            Some(PropertyRole::Getter)
        );
        assert!(policy.query("Button", "addChild(Widget*)").owning_receiver);
    }
}
