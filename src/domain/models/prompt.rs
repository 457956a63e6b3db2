//! Prompt kinds, context fields and placeholder templating.
//!
//! Templating is a pure function of `(template, context)` so that the retry
//! state machines above it never deal with string assembly.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Placeholder keys understood by the built-in templates.
pub mod placeholders {
    pub const INPUT_CLASS: &str = "inputclass";
    pub const TEST_CLASS: &str = "testclass";
    pub const ERROR_OUTPUT: &str = "erroroutput";
    pub const TEST_SCENARIO: &str = "testscenario";
    pub const TEST_CLASS_NAME: &str = "testclassname";
    pub const CONTEXT_CLASSES: &str = "contextclasses";
    pub const ADDITIONAL_TEST_CLASSES: &str = "additionaltestclasses";
}

/// The kind of oracle call being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Derive test scenarios from the CUT
    Scenarios,
    /// Produce one test class for one scenario
    SingleTest,
    /// Merge accepted scenario classes into the final test class
    AggregateTestClass,
}

impl PromptKind {
    pub const ALL: [Self; 3] = [Self::Scenarios, Self::SingleTest, Self::AggregateTestClass];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scenarios => "get-scenarios-prompt",
            Self::SingleTest => "get-single-test-prompt",
            Self::AggregateTestClass => "aggregate-test-class-prompt",
        }
    }

    /// Whether the oracle may attach additional context identifiers.
    pub const fn returns_context_paths(self) -> bool {
        matches!(self, Self::SingleTest)
    }

    pub const fn default_template(self) -> &'static str {
        match self {
            Self::Scenarios => DEFAULT_SCENARIOS_TEMPLATE,
            Self::SingleTest => DEFAULT_SINGLE_TEST_TEMPLATE,
            Self::AggregateTestClass => DEFAULT_AGGREGATE_TEMPLATE,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named context fields supplied to a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    fields: BTreeMap<String, String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A prompt template with `{{key}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn builtin(kind: PromptKind) -> Self {
        Self::new(kind.default_template())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute every `{{key}}` present in `context`.
    ///
    /// Placeholders without a matching field are left untouched. Values are
    /// inserted verbatim and never re-scanned for placeholders.
    pub fn render(&self, context: &PromptContext) -> String {
        render(&self.text, context)
    }
}

/// Pure placeholder substitution over a template string.
pub fn render(template: &str, context: &PromptContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match context.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render a list of sources the way the prompts expect: `[a, b, c]`.
pub fn render_list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// One template per prompt kind, built-in unless overridden.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<PromptKind, PromptTemplate>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            templates: PromptKind::ALL
                .into_iter()
                .map(|kind| (kind, PromptTemplate::builtin(kind)))
                .collect(),
        }
    }
}

impl PromptLibrary {
    #[must_use]
    pub fn with_template(mut self, kind: PromptKind, template: PromptTemplate) -> Self {
        self.templates.insert(kind, template);
        self
    }

    pub fn template(&self, kind: PromptKind) -> PromptTemplate {
        self.templates
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| PromptTemplate::builtin(kind))
    }

    pub fn render(&self, kind: PromptKind, context: &PromptContext) -> String {
        match self.templates.get(&kind) {
            Some(template) => template.render(context),
            None => render(kind.default_template(), context),
        }
    }
}

const DEFAULT_SCENARIOS_TEMPLATE: &str = r#"You are an expert Java test engineer.
List the unit test scenarios needed to thoroughly test the class below.
Cover normal behavior, boundary values, error handling and interactions with collaborators.
Only include public or package-visible methods. Skip constructors and trivial accessors.

Respond with JSON of the form:
{ "testScenarios": [ { "methodname": "...", "returntype": "...", "scenario": "..." } ] }

Class under test:
{{inputclass}}
"#;

const DEFAULT_SINGLE_TEST_TEMPLATE: &str = r"You are an expert Java test engineer writing JUnit 5 tests with Mockito.
Write a complete, compilable test class named {{testclassname}} covering exactly this scenario:
{{testscenario}}

Class under test:
{{inputclass}}

Previous attempt of the test class (may be empty):
{{testclass}}

Compiler or test output from the previous attempt (may be empty):
{{erroroutput}}

Source of additional classes you asked for (may be empty):
{{contextclasses}}

Fix every reported error. Use the same package as the class under test.
Respond with JSON containing `outputTestClass` (the full source) and
`outputRequiredClassContextPaths` (fully qualified names of classes whose source you need to see, may be empty).
";

const DEFAULT_AGGREGATE_TEMPLATE: &str = r"You are an expert Java test engineer.
Merge the following individual JUnit 5 test classes into one test class named {{testclassname}}.
Keep every test method, deduplicate setup code and imports, and make sure the result compiles.

Existing test class (may be empty, keep its tests):
{{testclass}}

Individual test classes:
{{additionaltestclasses}}

Compiler or test output from the previous attempt (may be empty):
{{erroroutput}}

Respond with JSON containing `outputTestClass` (the full source).
";
