//! Transport-neutral outgoing messages.

/// One button the user may press instead of typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown on the button.
    pub label: String,
    /// Text routed back as if the user had typed it.
    pub value: String,
}

impl Choice {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// What to do with the choices currently shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choices {
    /// Leave whatever is on screen alone.
    #[default]
    Keep,
    /// Offer these choices with this message.
    Offer(Vec<Choice>),
    /// Take previously offered choices away.
    Remove,
}

/// A message the core wants delivered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub choices: Choices,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Choices::Keep,
        }
    }

    #[must_use]
    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = Choices::Offer(choices);
        self
    }

    #[must_use]
    pub fn removing_choices(mut self) -> Self {
        self.choices = Choices::Remove;
        self
    }
}
