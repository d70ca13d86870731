use std::fmt;

use crate::environment::Environment;
use crate::error::Error;
use crate::model::Model;
use crate::value::Value;

/// Bounds the amount of expansion a single render may perform.
///
/// Every include that grows the text and every additional pass over the
/// output consumes one unit.  Once the maximum is reached the render is
/// aborted, which is how circular includes terminate.
#[derive(Debug)]
pub(crate) struct PassBudget {
    used: u32,
    max: u32,
}

impl PassBudget {
    pub fn new(max: u32) -> PassBudget {
        PassBudget { used: 0, max }
    }

    /// Consumes one pass.
    pub fn consume(&mut self) -> Result<(), Error> {
        self.used = self.used.saturating_add(1);
        self.check()
    }

    /// Fails if the budget is used up.
    #[inline(always)]
    pub fn check(&self) -> Result<(), Error> {
        if self.used >= self.max {
            Err(Error::new_pass_limit(self.max))
        } else {
            Ok(())
        }
    }

    /// Uses up the remaining budget.
    pub fn exhaust(&mut self) {
        self.used = self.max;
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

/// Records how nested loop sources relate to the enclosing iteration.
///
/// Each entry maps the `val` name of an enclosing loop to the path of the
/// entry currently being iterated (`through.key`).
///
/// Loop bodies are scanned with a model that already binds the enclosing
/// `val`, so a relative source like `row.cells` normally resolves against
/// the model.  The stack is only consulted when that lookup misses, and
/// then resolves the path through the recorded entries from the root.
#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    entries: Vec<(String, String)>,
}

impl ContextStack {
    pub fn push(&mut self, name: &str, path: String) {
        self.entries.push((name.to_string(), path));
    }

    pub fn pop(&mut self) {
        self.entries.pop();
    }

    /// Resolves a path whose first segment is a loop variable that is not
    /// bound in the model.
    pub fn resolve(&self, path: &str, model: &Model<'_>) -> Option<Value> {
        self.resolve_below(path, model, self.entries.len())
    }

    /// Entry paths may themselves start with the variable of an outer loop,
    /// so resolution continues with the entries below the one that matched.
    fn resolve_below(&self, path: &str, model: &Model<'_>, limit: usize) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let idx = some!(self.entries[..limit]
            .iter()
            .rposition(|(name, _)| name == head));
        let base = &self.entries[idx].1;
        let full = match rest {
            Some(rest) => format!("{base}.{rest}"),
            None => base.clone(),
        };
        model
            .lookup(&full)
            .or_else(|| self.resolve_below(&full, model, idx))
    }
}

/// Per-render state threaded through every scan.
pub(crate) struct State<'env, 'source> {
    pub env: &'env Environment<'source>,
    pub budget: PassBudget,
    pub contexts: ContextStack,
}

impl<'env, 'source> fmt::Debug for State<'env, 'source> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("budget", &self.budget)
            .field("contexts", &self.contexts)
            .finish()
    }
}

impl<'env, 'source> State<'env, 'source> {
    pub fn new(env: &'env Environment<'source>) -> State<'env, 'source> {
        State {
            env,
            budget: PassBudget::new(env.max_passes()),
            contexts: ContextStack::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context;
    use crate::error::ErrorKind;
    use similar_asserts::assert_eq;

    #[test]
    fn test_budget_aborts_at_max() {
        let mut budget = PassBudget::new(3);
        assert!(budget.check().is_ok());
        assert!(budget.consume().is_ok());
        assert!(budget.consume().is_ok());
        let err = budget.consume().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PassLimitExceeded);
        assert_eq!(err.pass_limit(), Some(3));
        assert_eq!(budget.used(), 3);
    }

    #[test]
    fn test_budget_exhaust() {
        let mut budget = PassBudget::new(100);
        budget.exhaust();
        assert!(budget.check().is_err());
    }

    #[test]
    fn test_context_stack_resolution() {
        let model = Model::new(context!(
            sections => vec![context!(items => vec!["a", "b"])]
        ));
        let mut stack = ContextStack::default();
        assert_eq!(stack.resolve("section.items", &model), None);
        stack.push("section", "sections.0".into());
        assert_eq!(
            stack.resolve("section.items.1", &model),
            Some(Value::from("b"))
        );
        stack.push("item", "section.items.0".into());
        assert_eq!(stack.resolve("item", &model), Some(Value::from("a")));
        stack.pop();
        assert_eq!(stack.resolve("item", &model), None);
    }
}
