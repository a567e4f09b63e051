//! Exclusion leaf strategies.
//!
//! Both return `true` for stacks that remain removal candidates, so they
//! compose with the age strategies under a conjunction. Neither marks.

use crate::core::stack::Stack;
use crate::core::strategy::Strategy;

/// Keeps stacks that do not carry `tag_name`, whatever its value.
#[derive(Debug, Clone)]
pub struct ExcludeTag {
    tag_name: String,
}

impl ExcludeTag {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }
}

impl Strategy for ExcludeTag {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        !stack.tags.contains_key(&self.tag_name)
    }

    fn describe(&self) -> String {
        format!("ExcludeTag({})", self.tag_name)
    }
}

/// Keeps stacks whose name is not listed and does not start with a listed prefix.
///
/// Prefixes are literal; a name equal to a prefix is excluded too.
#[derive(Debug, Clone, Default)]
pub struct ExcludeNames {
    exclude_names: Vec<String>,
    exclude_name_prefixes: Vec<String>,
}

impl ExcludeNames {
    pub fn new(exclude_names: Vec<String>, exclude_name_prefixes: Vec<String>) -> Self {
        Self {
            exclude_names,
            exclude_name_prefixes,
        }
    }

    pub fn exclude_names(&self) -> &[String] {
        &self.exclude_names
    }

    pub fn exclude_name_prefixes(&self) -> &[String] {
        &self.exclude_name_prefixes
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude_names.iter().any(|excluded| excluded == name)
            || self
                .exclude_name_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl Strategy for ExcludeNames {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        !self.is_excluded(&stack.name)
    }

    fn describe(&self) -> String {
        format!(
            "ExcludeNames(exclude_names={}, exclude_name_prefixes={})",
            list_or_none(&self.exclude_names),
            list_or_none(&self.exclude_name_prefixes)
        )
    }
}

fn list_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        format!("[{}]", values.join(", "))
    }
}
