//! Priority-ordered rule collection

use tracing::debug;

use super::rule::{RuleMeta, SyncRule};

/// Rules kept sorted by descending priority.
///
/// Equal priorities keep insertion order. Names are not required to be
/// unique: removal drops every rule with the name, while enabling and
/// disabling touch only the first.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn SyncRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule and restore priority order
    pub fn add_rule(&mut self, rule: Box<dyn SyncRule>) {
        debug!(rule = rule.name(), priority = rule.priority(), "Added rule");
        self.rules.push(rule);
        // sort_by is stable, so equal priorities stay in insertion order
        self.rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Builder-style [`RuleSet::add_rule`]
    pub fn with_rule(mut self, rule: impl SyncRule + 'static) -> Self {
        self.add_rule(Box::new(rule));
        self
    }

    /// Remove every rule with this name, returning how many were removed
    pub fn remove_rule(&mut self, name: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        let removed = before - self.rules.len();
        if removed > 0 {
            debug!(rule = name, removed, "Removed rule");
        }
        removed
    }

    /// Enable the first rule with this name; false if there is none
    pub fn enable_rule(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable the first rule with this name; false if there is none
    pub fn disable_rule(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|rule| rule.name() == name) {
            Some(rule) => {
                rule.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Name, priority and state of every rule, in evaluation order
    pub fn list_rules(&self) -> Vec<RuleMeta> {
        self.rules.iter().map(|rule| rule.meta().clone()).collect()
    }

    /// First rule with this name
    pub fn get(&self, name: &str) -> Option<&dyn SyncRule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .map(|rule| rule.as_ref())
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &dyn SyncRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Enabled rules in evaluation order
    pub fn enabled(&self) -> impl Iterator<Item = &dyn SyncRule> {
        self.iter().filter(|rule| rule.is_enabled())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

impl FromIterator<Box<dyn SyncRule>> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn SyncRule>>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for rule in iter {
            set.add_rule(rule);
        }
        set
    }
}
