// VM Stack: bounded word stack shared by push/pop and call/ret

use super::error::StackError;

/// Depth-capped stack for VM operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    data: Vec<u16>,
    max_depth: usize,
}

impl CallStack {
    /// Creates an empty stack with the specified maximum depth
    pub fn with_depth(max_depth: usize) -> Self {
        CallStack {
            data: Vec::new(),
            max_depth,
        }
    }

    /// Pushes a value onto the stack
    pub fn push(&mut self, value: u16) -> Result<(), StackError> {
        if self.data.len() >= self.max_depth {
            return Err(StackError::Overflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pops a value from the stack
    pub fn pop(&mut self) -> Result<u16, StackError> {
        self.data.pop().ok_or(StackError::Underflow)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the stack contents, bottom first
    pub fn view(&self) -> &[u16] {
        &self.data
    }
}
