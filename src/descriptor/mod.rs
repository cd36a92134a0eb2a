//! Detectable object metadata and its text rendering.
//!
//! An [`ObjectDescriptor`] describes one detectable entity: static properties,
//! mutable named variables, and invokable actions. The descriptor and every
//! action get a fresh random ID on each [`ObjectDescriptor::activate`] call —
//! identifiers are scoped to a single activation and must not be used as
//! stable cross-session keys.

use rand::Rng;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::warn;

#[cfg(test)]
mod tests;

/// Descriptors are shared between the scene, the simulation and perception;
/// perception never owns entity lifetime.
pub type SharedDescriptor = Arc<RwLock<ObjectDescriptor>>;

/// Callback invoked when a variable's value changes
pub type VariableObserver = Box<dyn Fn(&str) + Send + Sync>;

/// Callable bound to an action. Receives positional string arguments.
pub type ActionFn = Box<dyn Fn(&[String]) -> anyhow::Result<Option<String>> + Send + Sync>;

/// Draw a fresh opaque ID (uniform over the full u32 range)
fn fresh_id() -> String {
    rand::thread_rng().gen::<u32>().to_string()
}

/// Immutable static fact about an object
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' = '{}'", self.name, self.value)
    }
}

/// Named mutable value with synchronously invoked observers
pub struct Variable {
    name: String,
    value: String,
    observers: Vec<VariableObserver>,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            observers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and notify every registered observer
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        for observer in &self.observers {
            observer(&self.value);
        }
    }

    /// Register an observer called on every subsequent `set`
    pub fn observe(&mut self, observer: VariableObserver) {
        self.observers.push(observer);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' = '{}'", self.name, self.value)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Invokable action with declared parameter names and a bound callable
pub struct Action {
    id: String,
    name: String,
    description: Option<String>,
    parameters: Vec<String>,
    callable: Option<ActionFn>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            callable: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Bind the callable invoked by `try_invoke`
    pub fn bind(mut self, callable: ActionFn) -> Self {
        self.callable = Some(callable);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Replace the ID with a fresh random one
    pub fn regenerate_id(&mut self) {
        self.id = fresh_id();
    }

    /// Invoke the bound callable. Failures are logged, never propagated.
    pub fn try_invoke(&self, args: &[String]) -> Option<String> {
        let callable = match &self.callable {
            Some(c) => c,
            None => {
                warn!(action = %self.name, "Action has no bound callable");
                return None;
            }
        };

        match callable(args) {
            Ok(result) => result,
            Err(e) => {
                warn!(action = %self.name, error = %e, "Action invocation failed");
                None
            }
        }
    }

    /// Text form used inside the `Possible actions` section.
    ///
    /// Format: `'<name>': { ID: '<id>'; [Description: '<d>';] [Parameters:  'p1', 'p2'; }`
    pub fn render(&self) -> String {
        let mut out = format!("'{}': {{ ID: '{}';", self.name, self.id);

        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&format!(" Description: '{}';", description));
        }

        if self.parameters.is_empty() {
            out.push_str(" }");
            return out;
        }

        out.push_str(" Parameters: ");
        for (i, parameter) in self.parameters.iter().enumerate() {
            out.push_str(&format!(" '{}'", parameter));
            if i != self.parameters.len() - 1 {
                out.push(',');
            } else {
                out.push_str("; }");
            }
        }

        out
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("bound", &self.callable.is_some())
            .finish()
    }
}

/// Metadata describing one detectable entity
#[derive(Debug)]
pub struct ObjectDescriptor {
    id: String,
    object_type: String,
    name: Option<String>,
    description: Option<String>,
    properties: Vec<Property>,
    variables: Vec<Variable>,
    actions: Vec<Action>,
}

impl ObjectDescriptor {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            object_type: object_type.into(),
            name: None,
            description: None,
            properties: Vec::new(),
            variables: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push(Variable::new(name, value));
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Wrap into the shared handle used by scene and perception
    pub fn into_shared(self) -> SharedDescriptor {
        Arc::new(RwLock::new(self))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Regenerate the descriptor ID and every action ID.
    ///
    /// Called when the owning entity becomes active. Identifiers are
    /// per-activation by design: consumers that cached an old ID across
    /// reactivation will simply miss — an accepted limitation.
    pub fn activate(&mut self) {
        self.id = fresh_id();
        for action in &mut self.actions {
            action.regenerate_id();
        }
    }

    fn header(&self) -> String {
        match self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => format!("Object '{}' ({}); ", name, self.object_type),
            None => format!("Object '{}'; ", self.object_type),
        }
    }

    fn push_section<T: fmt::Display>(out: &mut String, label: &str, items: &[T]) {
        if items.is_empty() {
            return;
        }
        out.push_str(label);
        out.push_str(": {");
        for (i, item) in items.iter().enumerate() {
            out.push_str(&format!(" {}", item));
            if i != items.len() - 1 {
                out.push(',');
            } else {
                out.push_str(" }; ");
            }
        }
    }

    /// Full text summary: header, ID, description, properties, variables,
    /// possible actions. Sections appear only when non-empty.
    pub fn render_full(&self) -> String {
        let mut out = self.header();

        out.push_str(&format!("ID = '{}'; ", self.id));
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&format!("Description = '{}'; ", description));
        }

        Self::push_section(&mut out, "Properties", &self.properties);
        Self::push_section(&mut out, "Variables", &self.variables);

        if !self.actions.is_empty() {
            out.push_str("Possible actions: { ");
            let rendered: Vec<String> = self.actions.iter().map(Action::render).collect();
            out.push_str(&rendered.join(", "));
            out.push_str(" }; ");
        }

        out
    }

    /// Short summary used when composing dialogue context: header,
    /// description and properties only — no ID, variables or actions.
    pub fn render_short(&self) -> String {
        let mut out = self.header();

        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&format!("Description = '{}'; ", description));
        }

        Self::push_section(&mut out, "Properties", &self.properties);

        out
    }
}
