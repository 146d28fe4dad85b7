//! There are a few insertion modes in which the tree builder ignores start
//! tags that would otherwise switch the tokenizer into one of the text
//! parsing states: "in select" and "in frameset" / "after frameset". The
//! simulator doesn't maintain the stack of open elements, so it can't tell
//! reliably whether, e.g., `<style>` after `<select>` starts raw text or is
//! dropped.
//!
//! Instead of guessing, the guard watches for text parsing state switching
//! start tags between `<select>` start and end tags and anywhere after a
//! `<frameset>` start tag. When it trips, speculation pauses and the
//! consumer resumes it with the state of the real tree builder. Conforming
//! markup doesn't trip the guard, except for text parsing tags inside a
//! `<template>` nested in `<select>`.
//!
//! `<svg>` and `<math>` are guarded the same way: they are dropped in these
//! insertion modes, and the namespace they would open decides whether
//! CDATA sections are recognized.
use crate::html::{LocalNameHash, Tag};
use thiserror::Error;

/// The simulator can't decide which text parsing state follows a start tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmbiguityGuardError {
    #[error(
        "The parser has encountered a text content tag (`<{on_tag_name}>`) in the context where \
         it is ambiguous whether this tag should be ignored or not, so it's unclear whether the \
         following content is text or markup."
    )]
    TextParsingAmbiguity { on_tag_name: String },

    #[error(
        "The parser has encountered a foreign content tag (`<{on_tag_name}>`) in the context \
         where it is ambiguous whether this tag should be ignored or not, so it's unclear \
         whether CDATA sections are allowed in the following content."
    )]
    ForeignContentAmbiguity { on_tag_name: String },

    #[error(
        "The parser has encountered `{tag}` in or around SVG or MathML content, and its effect \
         on the open elements depends on the insertion mode."
    )]
    UnpredictableForeignContentTag { tag: String },

    #[error("The parser has encountered {depth_limit} nested `<template>` tags in `<select>`.")]
    MaxTemplateNestingReached { depth_limit: usize },
}

macro_rules! create_assert_for_tags {
    ( $($tag:ident),+ ) => {
        #[inline]
        fn assert_not_ambiguous_text_type_switch(
            tag_name_hash: LocalNameHash,
        ) -> Result<(), AmbiguityGuardError> {
            $(
                if tag_name_hash == Tag::$tag {
                    return Err(AmbiguityGuardError::TextParsingAmbiguity {
                        on_tag_name: Tag::$tag.name().to_string(),
                    });
                }
            )+

            Ok(())
        }
    };
}

create_assert_for_tags!(
    Textarea, Title, Plaintext, Script, Style, Iframe, Xmp, Noembed, Noframes, Noscript
);

#[inline]
fn assert_not_foreign_content_start(
    tag_name_hash: LocalNameHash,
) -> Result<(), AmbiguityGuardError> {
    for tag in [Tag::Svg, Tag::Math] {
        if tag_name_hash == tag {
            return Err(AmbiguityGuardError::ForeignContentAmbiguity {
                on_tag_name: tag.name().to_string(),
            });
        }
    }

    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum GuardState {
    #[default]
    Default,
    InSelect,
    InTemplateInSelect(u8),
    InOrAfterFrameset,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AmbiguityGuard {
    state: GuardState,
}

impl AmbiguityGuard {
    #[inline]
    pub fn new(state: GuardState) -> Self {
        AmbiguityGuard { state }
    }

    #[inline]
    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn track_start_tag(
        &mut self,
        tag_name_hash: LocalNameHash,
    ) -> Result<(), AmbiguityGuardError> {
        if tag_name_hash.is_empty() {
            return Ok(());
        }

        match self.state {
            GuardState::Default => {
                if tag_name_hash == Tag::Select {
                    self.state = GuardState::InSelect;
                } else if tag_name_hash == Tag::Frameset {
                    self.state = GuardState::InOrAfterFrameset;
                }
            }
            GuardState::InSelect => {
                // NOTE: these start tags close the select element.
                if tag_is_one_of!(tag_name_hash, [Select, Textarea, Input, Keygen]) {
                    self.state = GuardState::Default;
                } else if tag_name_hash == Tag::Template {
                    self.state = GuardState::InTemplateInSelect(1);
                }
                // NOTE: <script> is processed in "in select" insertion mode.
                else if tag_name_hash != Tag::Script {
                    assert_not_foreign_content_start(tag_name_hash)?;
                    assert_not_ambiguous_text_type_switch(tag_name_hash)?;
                }
            }
            GuardState::InTemplateInSelect(depth) => {
                if tag_name_hash == Tag::Template {
                    if depth == u8::MAX {
                        return Err(AmbiguityGuardError::MaxTemplateNestingReached {
                            depth_limit: usize::from(u8::MAX),
                        });
                    }

                    self.state = GuardState::InTemplateInSelect(depth + 1);
                } else {
                    assert_not_foreign_content_start(tag_name_hash)?;
                    assert_not_ambiguous_text_type_switch(tag_name_hash)?;
                }
            }
            GuardState::InOrAfterFrameset => {
                // NOTE: <noframes> is allowed in and after <frameset>.
                if tag_name_hash != Tag::Noframes {
                    assert_not_foreign_content_start(tag_name_hash)?;
                    assert_not_ambiguous_text_type_switch(tag_name_hash)?;
                }
            }
        }

        Ok(())
    }

    pub fn track_end_tag(&mut self, tag_name_hash: LocalNameHash) {
        match self.state {
            GuardState::InSelect if tag_name_hash == Tag::Select => {
                self.state = GuardState::Default;
            }
            GuardState::InTemplateInSelect(depth) if tag_name_hash == Tag::Template => {
                self.state = if depth == 1 {
                    GuardState::InSelect
                } else {
                    GuardState::InTemplateInSelect(depth - 1)
                };
            }
            _ => (),
        }
    }
}
