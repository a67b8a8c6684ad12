use std::sync::Arc;

use crate::{AssignCode, Location, NodeRef, RuntimeErrorKind, SendCode, Value};

/// Pending work on the code stack.
#[derive(Debug, Clone)]
pub enum Step {
    /// Evaluate a node, pushing its result.
    Eval(NodeRef),
    /// Receiver (if explicit) and arguments are on the data stack.
    Send(Arc<SendCode>, Location),
    /// Receiver (if explicit) and value are on the data stack.
    Assign(Arc<AssignCode>, Location),
    /// Pop a value and bind it in the current space.
    Bind(Arc<str>),
    /// Drop the result of a non-final statement.
    Discard,
    Push(Value),
    RestoreSpace(Value),
    /// End of one evaluation: resolve its result channel.
    ReturnValue,
}

#[derive(Debug, Clone)]
pub struct ExecutionStateInfo {
    pub code_stack_limit: usize,
    pub data_stack_limit: usize,
}

impl Default for ExecutionStateInfo {
    fn default() -> Self {
        Self {
            code_stack_limit: 1 << 20,
            data_stack_limit: 1 << 20,
        }
    }
}

/// The two explicit stacks the cooperative engine runs on.
#[derive(Debug)]
pub struct ExecutionState {
    code: Vec<Step>,
    data: Vec<Value>,
    info: ExecutionStateInfo,
}

impl ExecutionState {
    pub fn new(info: &ExecutionStateInfo) -> Self {
        Self {
            code: Vec::new(),
            data: Vec::new(),
            info: info.clone(),
        }
    }

    pub fn push_code(&mut self, step: Step) -> Result<(), RuntimeErrorKind> {
        if self.code.len() >= self.info.code_stack_limit {
            return Err(RuntimeErrorKind::StackOverflow {
                limit: self.info.code_stack_limit,
            });
        }
        self.code.push(step);
        Ok(())
    }

    pub fn pop_code(&mut self) -> Option<Step> {
        self.code.pop()
    }

    pub fn peek_code(&self) -> Option<&Step> {
        self.code.last()
    }

    pub fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.data.len() >= self.info.data_stack_limit {
            return Err(RuntimeErrorKind::StackOverflow {
                limit: self.info.data_stack_limit,
            });
        }
        self.data.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.data.pop()
    }

    /// Pop the top `n` values, oldest first.
    pub fn pop_n(&mut self, n: usize) -> Vec<Value> {
        let at = self.data.len().saturating_sub(n);
        self.data.split_off(at)
    }

    pub fn code_depth(&self) -> usize {
        self.code.len()
    }

    pub fn data_depth(&self) -> usize {
        self.data.len()
    }

    pub fn is_idle(&self) -> bool {
        self.code.is_empty()
    }

    pub fn truncate(&mut self, code_depth: usize, data_depth: usize) {
        self.code.truncate(code_depth);
        self.data.truncate(data_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_stack_is_bounded() {
        let mut state = ExecutionState::new(&ExecutionStateInfo {
            code_stack_limit: 2,
            data_stack_limit: 2,
        });
        assert!(state.push_code(Step::Discard).is_ok());
        assert!(state.push_code(Step::Discard).is_ok());
        assert_eq!(
            state.push_code(Step::Discard),
            Err(RuntimeErrorKind::StackOverflow { limit: 2 })
        );
        assert_eq!(state.code_depth(), 2);
    }

    #[test]
    fn data_stack_is_bounded() {
        let mut state = ExecutionState::new(&ExecutionStateInfo {
            code_stack_limit: 1,
            data_stack_limit: 1,
        });
        assert!(state.push(Value(1)).is_ok());
        assert!(state.push(Value(2)).is_err());
        assert_eq!(state.pop(), Some(Value(1)));
        assert_eq!(state.pop(), None);
    }

    #[test]
    fn pop_n_keeps_order() {
        let mut state = ExecutionState::new(&ExecutionStateInfo::default());
        for i in 0..4 {
            state.push(Value(i)).unwrap();
        }
        assert_eq!(state.pop_n(2), vec![Value(2), Value(3)]);
        assert!(state.pop_n(0).is_empty());
        assert_eq!(state.data_depth(), 2);
        state.truncate(0, 0);
        assert!(state.is_idle());
        assert_eq!(state.data_depth(), 0);
    }
}
