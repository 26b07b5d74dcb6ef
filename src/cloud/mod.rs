pub mod layout;
pub mod seed;

/// Input to the layout engine: one label with its aggregated weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub value: u32,
}

impl Word {
    pub fn new(text: impl Into<String>, value: u32) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }
}
