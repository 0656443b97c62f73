use super::AttributeList;

/// An error in a tag's markup.
///
/// Both of these mean a template author made a mistake, so rendering should
/// stop and tell them about it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkupError {
    /// The markup doesn't match the attribute grammar.
    Syntax {
        /// The offending markup, exactly as given.
        markup: String,

        /// An example of what the markup should look like.
        example: String,
    },

    /// The markup parsed, but a required parameter wasn't given.
    MissingParameters {
        /// Every parameter that was given, after resolution.
        parameters: AttributeList,

        /// All parameters the tag requires.
        required: Vec<&'static str>,
    },
}

impl core::fmt::Display for MarkupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Syntax { markup, example } => write!(
                f,
                "Invalid syntax for {tag} tag:\n\n{markup}\n\nValid syntax:\n\n{example}\n",
                tag = crate::tag::TAG_NAME,
            ),

            Self::MissingParameters {
                parameters,
                required,
            } => write!(
                f,
                "Invalid parameter list for {tag} tag:\n\n{parameters}\n\n\
                Required parameters:\n\n{required:?}\n",
                tag = crate::tag::TAG_NAME,
            ),
        }
    }
}

impl core::error::Error for MarkupError {}
