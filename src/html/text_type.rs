use crate::tokenizer::TokenizerState;

/// Text parsing modes that the tree construction stage switches
/// the tokenizer into after certain start tags.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TextType {
    PlainText,
    RcData,
    RawText,
    ScriptData,
    Data,
}

impl From<TextType> for TokenizerState {
    #[inline]
    fn from(text_type: TextType) -> Self {
        match text_type {
            TextType::PlainText => TokenizerState::PlainText,
            TextType::RcData => TokenizerState::RcData,
            TextType::RawText => TokenizerState::RawText,
            TextType::ScriptData => TokenizerState::ScriptData,
            TextType::Data => TokenizerState::Data,
        }
    }
}
