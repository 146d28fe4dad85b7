use super::char_ref::{consume_char_ref, CharRefResult};
use super::{Token, TokenKind, Tokenizer, TokenizerState};
use crate::input::{LookAheadResult, SegmentedString};

use TokenizerState::*;

// NOTE: yields `None` at the end of a closed input. If the input is just
// exhausted, the tokenizer waits for more of it: pending character data
// isn't emitted, so the produced tokens don't depend on how the input
// was split into chunks.
macro_rules! next_char {
    ($self:ident, $input:ident) => {
        match $self.peek($input) {
            Some(ch) => Some(ch),
            None if $input.is_closed() => None,
            None => return false,
        }
    };
}

macro_rules! ws {
    () => {
        ('\t' | '\n' | '\x0C' | ' ')
    };
}

impl Tokenizer {
    /// Tokenizes the input until a token is complete.
    ///
    /// Returns `false` if the input is exhausted first. In that case
    /// `token` holds the in-progress token and the same token must be
    /// passed to the next call. Once `true` is returned, the caller consumes
    /// the token and clears it before the next call.
    pub fn next_token(&mut self, input: &mut SegmentedString, token: &mut Token) -> bool {
        if self.reached_end {
            return false;
        }

        // NOTE: an end tag was completed during the previous call, but a
        // character token had to be emitted in front of it.
        if !self.buffered_end_tag_name.is_empty() && !self.state.is_end_tag_buffering() {
            self.begin_buffered_end_tag(token);

            if self.state == Data {
                return self.emit(input, token);
            }
        }

        loop {
            match self.state {
                Data => {
                    if self.consume_text_run(input, token, b'<', b'&') {
                        continue;
                    }

                    match next_char!(self, input) {
                        Some('&') => self.advance_to(input, '&', CharacterReferenceInData),
                        Some('<') => {
                            if token.kind() == TokenKind::Character {
                                return self.emit(input, token);
                            }

                            self.advance_to(input, '<', TagOpen);
                        }
                        Some(ch) => {
                            token.append_to_character(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_end_of_file(input, token),
                    }
                }

                CharacterReferenceInData => {
                    if !self.process_entity(input, token) {
                        return false;
                    }

                    self.set_state(Data);
                }

                RcData => {
                    if self.consume_text_run(input, token, b'<', b'&') {
                        continue;
                    }

                    match next_char!(self, input) {
                        Some('&') => self.advance_to(input, '&', CharacterReferenceInRcData),
                        Some('<') => {
                            self.mark_end_tag_start(input);
                            self.advance_to(input, '<', RcDataLessThanSign);
                        }
                        Some(ch) => {
                            token.append_to_character(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_end_of_file(input, token),
                    }
                }

                CharacterReferenceInRcData => {
                    if !self.process_entity(input, token) {
                        return false;
                    }

                    self.set_state(RcData);
                }

                RawText | ScriptData => {
                    if self.consume_text_run(input, token, b'<', b'<') {
                        continue;
                    }

                    match next_char!(self, input) {
                        Some('<') => {
                            let next = if self.state == RawText {
                                RawTextLessThanSign
                            } else {
                                ScriptDataLessThanSign
                            };

                            self.mark_end_tag_start(input);
                            self.advance_to(input, '<', next);
                        }
                        Some(ch) => {
                            token.append_to_character(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_end_of_file(input, token),
                    }
                }

                PlainText => {
                    if self.consume_text_run(input, token, 0, 0) {
                        continue;
                    }

                    match next_char!(self, input) {
                        Some(ch) => {
                            token.append_to_character(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_end_of_file(input, token),
                    }
                }

                TagOpen => match next_char!(self, input) {
                    Some('!') => self.advance_to(input, '!', MarkupDeclarationOpen),
                    Some('/') => self.advance_to(input, '/', EndTagOpen),
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        token.begin_start_tag(ch.to_ascii_lowercase());
                        self.advance_to(input, ch, TagName);
                    }
                    // NOTE: the bogus comment reconsumes the `?`, so it
                    // becomes part of the comment data.
                    Some('?') => self.set_state(BogusComment),
                    _ => {
                        token.append_to_character('<');
                        self.set_state(Data);
                    }
                },

                EndTagOpen => match next_char!(self, input) {
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        token.begin_end_tag(ch.to_ascii_lowercase().encode_utf8(&mut [0; 4]));
                        self.appropriate_end_tag_name.clear();
                        self.advance_to(input, ch, TagName);
                    }
                    Some('>') => {
                        self.advance_to(input, '>', Data);
                        self.discard_source(token);
                    }
                    None => {
                        token.append_to_character('<');
                        token.append_to_character('/');
                        self.set_state(Data);
                    }
                    Some(_) => self.set_state(BogusComment),
                },

                TagName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.advance_to(input, ch, BeforeAttributeName),
                    Some('/') => self.advance_to(input, '/', SelfClosingStartTag),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.append_to_name(ch.to_ascii_lowercase());
                        self.consume(input, ch);
                    }
                    None => self.set_state(Data),
                },

                RcDataLessThanSign | RawTextLessThanSign => match next_char!(self, input) {
                    Some('/') => {
                        self.temporary_buffer.clear();

                        let next = if self.state == RcDataLessThanSign {
                            RcDataEndTagOpen
                        } else {
                            RawTextEndTagOpen
                        };

                        self.advance_to(input, '/', next);
                    }
                    _ => {
                        token.append_to_character('<');

                        let text_state = if self.state == RcDataLessThanSign {
                            RcData
                        } else {
                            RawText
                        };

                        self.set_state(text_state);
                    }
                },

                RcDataEndTagOpen | RawTextEndTagOpen | ScriptDataEndTagOpen
                | ScriptDataEscapedEndTagOpen => {
                    let (name_state, text_state) = match self.state {
                        RcDataEndTagOpen => (RcDataEndTagName, RcData),
                        RawTextEndTagOpen => (RawTextEndTagName, RawText),
                        ScriptDataEndTagOpen => (ScriptDataEndTagName, ScriptData),
                        _ => (ScriptDataEscapedEndTagName, ScriptDataEscaped),
                    };

                    match next_char!(self, input) {
                        Some(ch) if ch.is_ascii_alphabetic() => {
                            self.temporary_buffer.push(ch);
                            self.add_to_possible_end_tag(ch);
                            self.advance_to(input, ch, name_state);
                        }
                        _ => {
                            token.append_to_character('<');
                            token.append_to_character('/');
                            self.set_state(text_state);
                        }
                    }
                }

                RcDataEndTagName | RawTextEndTagName | ScriptDataEndTagName
                | ScriptDataEscapedEndTagName => {
                    let text_state = match self.state {
                        RcDataEndTagName => RcData,
                        RawTextEndTagName => RawText,
                        ScriptDataEndTagName => ScriptData,
                        _ => ScriptDataEscaped,
                    };

                    match next_char!(self, input) {
                        Some(ch) if ch.is_ascii_alphabetic() => {
                            self.temporary_buffer.push(ch);
                            self.add_to_possible_end_tag(ch);
                            self.consume(input, ch);
                        }
                        Some(ch @ (ws!() | '/')) if self.is_appropriate_end_tag() => {
                            self.temporary_buffer.push(ch);

                            let next = if ch == '/' {
                                SelfClosingStartTag
                            } else {
                                BeforeAttributeName
                            };

                            self.set_state(next);

                            if self.flush_buffered_end_tag(input, ch, token) {
                                return self.emit(input, token);
                            }
                        }
                        Some('>') if self.is_appropriate_end_tag() => {
                            self.temporary_buffer.push('>');
                            self.set_state(Data);
                            self.flush_buffered_end_tag(input, '>', token);

                            return self.emit(input, token);
                        }
                        _ => {
                            self.abandon_possible_end_tag(token);
                            self.set_state(text_state);
                        }
                    }
                }

                ScriptDataLessThanSign => match next_char!(self, input) {
                    Some('/') => {
                        self.temporary_buffer.clear();
                        self.advance_to(input, '/', ScriptDataEndTagOpen);
                    }
                    Some('!') => {
                        token.append_to_character('<');
                        token.append_to_character('!');
                        self.advance_to(input, '!', ScriptDataEscapeStart);
                    }
                    _ => {
                        token.append_to_character('<');
                        self.set_state(ScriptData);
                    }
                },

                ScriptDataEscapeStart | ScriptDataEscapeStartDash => {
                    match next_char!(self, input) {
                        Some('-') => {
                            token.append_to_character('-');

                            let next = if self.state == ScriptDataEscapeStart {
                                ScriptDataEscapeStartDash
                            } else {
                                ScriptDataEscapedDashDash
                            };

                            self.advance_to(input, '-', next);
                        }
                        _ => self.set_state(ScriptData),
                    }
                }

                ScriptDataEscaped | ScriptDataEscapedDash | ScriptDataEscapedDashDash => {
                    match next_char!(self, input) {
                        Some('-') => {
                            token.append_to_character('-');

                            let next = if self.state == ScriptDataEscaped {
                                ScriptDataEscapedDash
                            } else {
                                ScriptDataEscapedDashDash
                            };

                            self.advance_to(input, '-', next);
                        }
                        Some('<') => {
                            self.mark_end_tag_start(input);
                            self.advance_to(input, '<', ScriptDataEscapedLessThanSign);
                        }
                        Some('>') if self.state == ScriptDataEscapedDashDash => {
                            token.append_to_character('>');
                            self.advance_to(input, '>', ScriptData);
                        }
                        Some(ch) => {
                            token.append_to_character(ch);
                            self.advance_to(input, ch, ScriptDataEscaped);
                        }
                        None => self.set_state(Data),
                    }
                }

                ScriptDataEscapedLessThanSign => match next_char!(self, input) {
                    Some('/') => {
                        self.temporary_buffer.clear();
                        self.advance_to(input, '/', ScriptDataEscapedEndTagOpen);
                    }
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        token.append_to_character('<');
                        token.append_to_character(ch);
                        self.temporary_buffer.clear();
                        self.temporary_buffer.push(ch.to_ascii_lowercase());
                        self.advance_to(input, ch, ScriptDataDoubleEscapeStart);
                    }
                    _ => {
                        token.append_to_character('<');
                        self.set_state(ScriptDataEscaped);
                    }
                },

                ScriptDataDoubleEscapeStart | ScriptDataDoubleEscapeEnd => {
                    let is_start = self.state == ScriptDataDoubleEscapeStart;

                    match next_char!(self, input) {
                        Some(ch @ (ws!() | '/' | '>')) => {
                            token.append_to_character(ch);

                            let next = match (self.temporary_buffer == "script", is_start) {
                                (true, true) | (false, false) => ScriptDataDoubleEscaped,
                                (true, false) | (false, true) => ScriptDataEscaped,
                            };

                            self.advance_to(input, ch, next);
                        }
                        Some(ch) if ch.is_ascii_alphabetic() => {
                            token.append_to_character(ch);
                            self.temporary_buffer.push(ch.to_ascii_lowercase());
                            self.consume(input, ch);
                        }
                        _ => self.set_state(if is_start {
                            ScriptDataEscaped
                        } else {
                            ScriptDataDoubleEscaped
                        }),
                    }
                }

                ScriptDataDoubleEscaped
                | ScriptDataDoubleEscapedDash
                | ScriptDataDoubleEscapedDashDash => match next_char!(self, input) {
                    Some('-') => {
                        token.append_to_character('-');

                        let next = if self.state == ScriptDataDoubleEscaped {
                            ScriptDataDoubleEscapedDash
                        } else {
                            ScriptDataDoubleEscapedDashDash
                        };

                        self.advance_to(input, '-', next);
                    }
                    Some('<') => {
                        token.append_to_character('<');
                        self.advance_to(input, '<', ScriptDataDoubleEscapedLessThanSign);
                    }
                    Some('>') if self.state == ScriptDataDoubleEscapedDashDash => {
                        token.append_to_character('>');
                        self.advance_to(input, '>', ScriptData);
                    }
                    Some(ch) => {
                        token.append_to_character(ch);
                        self.advance_to(input, ch, ScriptDataDoubleEscaped);
                    }
                    None => self.set_state(Data),
                },

                ScriptDataDoubleEscapedLessThanSign => match next_char!(self, input) {
                    Some('/') => {
                        token.append_to_character('/');
                        self.temporary_buffer.clear();
                        self.advance_to(input, '/', ScriptDataDoubleEscapeEnd);
                    }
                    _ => self.set_state(ScriptDataDoubleEscaped),
                },

                BeforeAttributeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some('/') => self.advance_to(input, '/', SelfClosingStartTag),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.begin_attribute(ch.to_ascii_lowercase(), self.source_offset());
                        self.advance_to(input, ch, AttributeName);
                    }
                    None => self.set_state(Data),
                },

                AttributeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => {
                        token.end_attribute_name(self.source_offset());
                        self.advance_to(input, ch, AfterAttributeName);
                    }
                    Some('/') => {
                        token.end_attribute_name(self.source_offset());
                        self.advance_to(input, '/', SelfClosingStartTag);
                    }
                    Some('=') => {
                        token.end_attribute_name(self.source_offset());
                        self.advance_to(input, '=', BeforeAttributeValue);
                    }
                    Some('>') => {
                        token.end_attribute_name(self.source_offset());
                        return self.emit_and_resume_in(input, '>', token, Data);
                    }
                    Some(ch) => {
                        token.append_to_attribute_name(ch.to_ascii_lowercase());
                        self.consume(input, ch);
                    }
                    None => {
                        token.end_attribute_name(self.source_offset());
                        self.set_state(Data);
                    }
                },

                AfterAttributeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some('/') => self.advance_to(input, '/', SelfClosingStartTag),
                    Some('=') => self.advance_to(input, '=', BeforeAttributeValue),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.begin_attribute(ch.to_ascii_lowercase(), self.source_offset());
                        self.advance_to(input, ch, AttributeName);
                    }
                    None => self.set_state(Data),
                },

                BeforeAttributeValue => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some(quote @ ('"' | '\'')) => {
                        let next = if quote == '"' {
                            AttributeValueDoubleQuoted
                        } else {
                            AttributeValueSingleQuoted
                        };

                        self.advance_to(input, quote, next);
                        token.begin_attribute_value(self.source_offset());
                    }
                    Some('&') => {
                        token.begin_attribute_value(self.source_offset());
                        self.set_state(AttributeValueUnquoted);
                    }
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.begin_attribute_value(self.source_offset());
                        token.append_to_attribute_value(ch);
                        self.advance_to(input, ch, AttributeValueUnquoted);
                    }
                    None => self.set_state(Data),
                },

                AttributeValueDoubleQuoted | AttributeValueSingleQuoted => {
                    let quote = if self.state == AttributeValueDoubleQuoted {
                        '"'
                    } else {
                        '\''
                    };

                    match next_char!(self, input) {
                        Some(ch) if ch == quote => {
                            token.end_attribute_value(self.source_offset());
                            self.advance_to(input, ch, AfterAttributeValueQuoted);
                        }
                        Some('&') => {
                            self.additional_allowed_character = Some(quote);
                            self.advance_to(input, '&', CharacterReferenceInAttributeValue);
                        }
                        Some(ch) => {
                            token.append_to_attribute_value(ch);
                            self.consume(input, ch);
                        }
                        None => {
                            token.end_attribute_value(self.source_offset());
                            self.set_state(Data);
                        }
                    }
                }

                AttributeValueUnquoted => match next_char!(self, input) {
                    Some(ch @ ws!()) => {
                        token.end_attribute_value(self.source_offset());
                        self.advance_to(input, ch, BeforeAttributeName);
                    }
                    Some('&') => {
                        self.additional_allowed_character = Some('>');
                        self.advance_to(input, '&', CharacterReferenceInAttributeValue);
                    }
                    Some('>') => {
                        token.end_attribute_value(self.source_offset());
                        return self.emit_and_resume_in(input, '>', token, Data);
                    }
                    Some(ch) => {
                        token.append_to_attribute_value(ch);
                        self.consume(input, ch);
                    }
                    None => {
                        token.end_attribute_value(self.source_offset());
                        self.set_state(Data);
                    }
                },

                CharacterReferenceInAttributeValue => {
                    let additional = self.additional_allowed_character;

                    match consume_char_ref(input.chars(), input.is_closed(), additional) {
                        CharRefResult::NotEnoughCharacters => return false,
                        CharRefResult::NotFound => token.append_to_attribute_value('&'),
                        CharRefResult::Found { consumed, value } => {
                            self.consume_raw(input, consumed);
                            token.append_to_attribute_value(value);
                        }
                    }

                    self.set_state(match additional {
                        Some('"') => AttributeValueDoubleQuoted,
                        Some('\'') => AttributeValueSingleQuoted,
                        _ => AttributeValueUnquoted,
                    });
                }

                AfterAttributeValueQuoted => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.advance_to(input, ch, BeforeAttributeName),
                    Some('/') => self.advance_to(input, '/', SelfClosingStartTag),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(_) => self.set_state(BeforeAttributeName),
                    None => self.set_state(Data),
                },

                SelfClosingStartTag => match next_char!(self, input) {
                    Some('>') => {
                        token.set_self_closing();
                        return self.emit_and_resume_in(input, '>', token, Data);
                    }
                    Some(_) => self.set_state(BeforeAttributeName),
                    None => self.set_state(Data),
                },

                BogusComment => {
                    token.begin_comment();
                    self.set_state(ContinueBogusComment);
                }

                ContinueBogusComment => match next_char!(self, input) {
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.append_to_comment(ch);
                        self.consume(input, ch);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                MarkupDeclarationOpen => {
                    let ch = next_char!(self, input);

                    let expected = match ch {
                        Some('-') => Some(("--", false)),
                        Some('D' | 'd') => Some(("doctype", true)),
                        Some('[') if self.should_allow_cdata => Some(("[CDATA[", false)),
                        _ => None,
                    };

                    let mut matched = false;

                    if let Some((expected, ignore_case)) = expected {
                        match input.look_ahead(expected, ignore_case) {
                            LookAheadResult::Match => {
                                self.consume_raw(input, expected.len());

                                match expected {
                                    "--" => {
                                        token.begin_comment();
                                        self.set_state(CommentStart);
                                    }
                                    "doctype" => self.set_state(Doctype),
                                    _ => self.set_state(CDataSection),
                                }

                                matched = true;
                            }
                            LookAheadResult::NotEnoughCharacters if !input.is_closed() => {
                                return false;
                            }
                            _ => (),
                        }
                    }

                    if !matched {
                        self.set_state(BogusComment);
                    }
                }

                CommentStart | CommentStartDash => match next_char!(self, input) {
                    Some('-') => {
                        let next = if self.state == CommentStart {
                            CommentStartDash
                        } else {
                            CommentEnd
                        };

                        self.advance_to(input, '-', next);
                    }
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        if self.state == CommentStartDash {
                            token.append_to_comment('-');
                        }

                        token.append_to_comment(ch);
                        self.advance_to(input, ch, Comment);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                Comment => match next_char!(self, input) {
                    Some('-') => self.advance_to(input, '-', CommentEndDash),
                    Some(ch) => {
                        token.append_to_comment(ch);
                        self.consume(input, ch);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                CommentEndDash => match next_char!(self, input) {
                    Some('-') => self.advance_to(input, '-', CommentEnd),
                    Some(ch) => {
                        token.append_to_comment('-');
                        token.append_to_comment(ch);
                        self.advance_to(input, ch, Comment);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                CommentEnd => match next_char!(self, input) {
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some('!') => self.advance_to(input, '!', CommentEndBang),
                    Some('-') => {
                        token.append_to_comment('-');
                        self.consume(input, '-');
                    }
                    Some(ch) => {
                        token.append_to_comment('-');
                        token.append_to_comment('-');
                        token.append_to_comment(ch);
                        self.advance_to(input, ch, Comment);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                CommentEndBang => match next_char!(self, input) {
                    Some('-') => {
                        "--!".chars().for_each(|ch| token.append_to_comment(ch));
                        self.advance_to(input, '-', CommentEndDash);
                    }
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        "--!".chars().for_each(|ch| token.append_to_comment(ch));
                        token.append_to_comment(ch);
                        self.advance_to(input, ch, Comment);
                    }
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                Doctype => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.advance_to(input, ch, BeforeDoctypeName),
                    Some(_) => self.set_state(BeforeDoctypeName),
                    None => {
                        token.begin_doctype();
                        token.set_force_quirks();
                        return self.emit_and_reconsume_in(input, token, Data);
                    }
                },

                BeforeDoctypeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some('>') => {
                        token.begin_doctype();
                        token.set_force_quirks();
                        return self.emit_and_resume_in(input, '>', token, Data);
                    }
                    Some(ch) => {
                        token.begin_doctype_with_name(ch.to_ascii_lowercase());
                        self.advance_to(input, ch, DoctypeName);
                    }
                    None => {
                        token.begin_doctype();
                        token.set_force_quirks();
                        return self.emit_and_reconsume_in(input, token, Data);
                    }
                },

                DoctypeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.advance_to(input, ch, AfterDoctypeName),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        token.append_to_name(ch.to_ascii_lowercase());
                        self.consume(input, ch);
                    }
                    None => return self.emit_doctype_at_end_of_file(input, token),
                },

                AfterDoctypeName => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => {
                        let keyword = match ch {
                            'P' | 'p' => Some(("public", AfterDoctypePublicKeyword)),
                            'S' | 's' => Some(("system", AfterDoctypeSystemKeyword)),
                            _ => None,
                        };

                        let mut matched = false;

                        if let Some((keyword, next)) = keyword {
                            match input.look_ahead_ignoring_case(keyword) {
                                LookAheadResult::Match => {
                                    self.consume_raw(input, keyword.len());
                                    self.set_state(next);
                                    matched = true;
                                }
                                LookAheadResult::NotEnoughCharacters if !input.is_closed() => {
                                    return false;
                                }
                                _ => (),
                            }
                        }

                        if !matched {
                            token.set_force_quirks();
                            self.advance_to(input, ch, BogusDoctype);
                        }
                    }
                    None => return self.emit_doctype_at_end_of_file(input, token),
                },

                AfterDoctypePublicKeyword | BeforeDoctypePublicIdentifier => {
                    match next_char!(self, input) {
                        Some(ch @ ws!()) => self.advance_to(input, ch, BeforeDoctypePublicIdentifier),
                        Some(quote @ ('"' | '\'')) => {
                            token.set_public_identifier_to_empty();

                            let next = if quote == '"' {
                                DoctypePublicIdentifierDoubleQuoted
                            } else {
                                DoctypePublicIdentifierSingleQuoted
                            };

                            self.advance_to(input, quote, next);
                        }
                        Some('>') => {
                            token.set_force_quirks();
                            return self.emit_and_resume_in(input, '>', token, Data);
                        }
                        Some(ch) => {
                            token.set_force_quirks();
                            self.advance_to(input, ch, BogusDoctype);
                        }
                        None => return self.emit_doctype_at_end_of_file(input, token),
                    }
                }

                DoctypePublicIdentifierDoubleQuoted | DoctypePublicIdentifierSingleQuoted => {
                    let quote = if self.state == DoctypePublicIdentifierDoubleQuoted {
                        '"'
                    } else {
                        '\''
                    };

                    match next_char!(self, input) {
                        Some(ch) if ch == quote => {
                            self.advance_to(input, ch, AfterDoctypePublicIdentifier);
                        }
                        Some('>') => {
                            token.set_force_quirks();
                            return self.emit_and_resume_in(input, '>', token, Data);
                        }
                        Some(ch) => {
                            token.append_to_public_identifier(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_doctype_at_end_of_file(input, token),
                    }
                }

                AfterDoctypePublicIdentifier | BetweenDoctypePublicAndSystemIdentifiers => {
                    match next_char!(self, input) {
                        Some(ch @ ws!()) => {
                            self.advance_to(input, ch, BetweenDoctypePublicAndSystemIdentifiers);
                        }
                        Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                        Some(quote @ ('"' | '\'')) => {
                            token.set_system_identifier_to_empty();
                            self.advance_to(input, quote, system_identifier_state(quote));
                        }
                        Some(ch) => {
                            token.set_force_quirks();
                            self.advance_to(input, ch, BogusDoctype);
                        }
                        None => return self.emit_doctype_at_end_of_file(input, token),
                    }
                }

                AfterDoctypeSystemKeyword | BeforeDoctypeSystemIdentifier => {
                    match next_char!(self, input) {
                        Some(ch @ ws!()) => self.advance_to(input, ch, BeforeDoctypeSystemIdentifier),
                        Some(quote @ ('"' | '\'')) => {
                            token.set_system_identifier_to_empty();
                            self.advance_to(input, quote, system_identifier_state(quote));
                        }
                        Some('>') => {
                            token.set_force_quirks();
                            return self.emit_and_resume_in(input, '>', token, Data);
                        }
                        Some(ch) => {
                            token.set_force_quirks();
                            self.advance_to(input, ch, BogusDoctype);
                        }
                        None => return self.emit_doctype_at_end_of_file(input, token),
                    }
                }

                DoctypeSystemIdentifierDoubleQuoted | DoctypeSystemIdentifierSingleQuoted => {
                    let quote = if self.state == DoctypeSystemIdentifierDoubleQuoted {
                        '"'
                    } else {
                        '\''
                    };

                    match next_char!(self, input) {
                        Some(ch) if ch == quote => {
                            self.advance_to(input, ch, AfterDoctypeSystemIdentifier);
                        }
                        Some('>') => {
                            token.set_force_quirks();
                            return self.emit_and_resume_in(input, '>', token, Data);
                        }
                        Some(ch) => {
                            token.append_to_system_identifier(ch);
                            self.consume(input, ch);
                        }
                        None => return self.emit_doctype_at_end_of_file(input, token),
                    }
                }

                AfterDoctypeSystemIdentifier => match next_char!(self, input) {
                    Some(ch @ ws!()) => self.consume(input, ch),
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => self.advance_to(input, ch, BogusDoctype),
                    None => return self.emit_doctype_at_end_of_file(input, token),
                },

                BogusDoctype => match next_char!(self, input) {
                    Some('>') => return self.emit_and_resume_in(input, '>', token, Data),
                    Some(ch) => self.consume(input, ch),
                    None => return self.emit_and_reconsume_in(input, token, Data),
                },

                CDataSection => match next_char!(self, input) {
                    Some(']') => self.advance_to(input, ']', CDataSectionRightSquareBracket),
                    Some(ch) => {
                        token.append_to_character(ch);
                        self.consume(input, ch);
                    }
                    None => self.set_state(Data),
                },

                CDataSectionRightSquareBracket => match next_char!(self, input) {
                    Some(']') => self.advance_to(input, ']', CDataSectionDoubleRightSquareBracket),
                    _ => {
                        token.append_to_character(']');
                        self.set_state(CDataSection);
                    }
                },

                CDataSectionDoubleRightSquareBracket => match next_char!(self, input) {
                    Some('>') => {
                        self.advance_to(input, '>', Data);
                        self.discard_source(token);
                    }
                    Some(']') => {
                        token.append_to_character(']');
                        self.consume(input, ']');
                    }
                    _ => {
                        token.append_to_character(']');
                        token.append_to_character(']');
                        self.set_state(CDataSection);
                    }
                },
            }
        }
    }

    /// Appends a run of ordinary characters of the current segment to the
    /// character token in one go. Returns `false` if there is no such run.
    fn consume_text_run(
        &mut self,
        input: &mut SegmentedString,
        token: &mut Token,
        stop1: u8,
        stop2: u8,
    ) -> bool {
        if self.skip_next_newline {
            return false;
        }

        let run = input.text_run(stop1, stop2);

        if run.is_empty() {
            return false;
        }

        self.start_source_if_empty(input);
        token.append_str_to_character(run);
        self.source.push_str(run);

        let len = run.len();

        input.advance_run(len);

        true
    }

    fn process_entity(&mut self, input: &mut SegmentedString, token: &mut Token) -> bool {
        match consume_char_ref(input.chars(), input.is_closed(), None) {
            CharRefResult::NotEnoughCharacters => return false,
            CharRefResult::NotFound => token.append_to_character('&'),
            CharRefResult::Found { consumed, value } => {
                self.consume_raw(input, consumed);
                token.append_to_character(value);
            }
        }

        true
    }

    fn emit_doctype_at_end_of_file(&mut self, input: &SegmentedString, token: &mut Token) -> bool {
        token.set_force_quirks();
        self.emit_and_reconsume_in(input, token, Data)
    }
}

#[inline]
fn system_identifier_state(quote: char) -> TokenizerState {
    if quote == '"' {
        DoctypeSystemIdentifierDoubleQuoted
    } else {
        DoctypeSystemIdentifierSingleQuoted
    }
}
