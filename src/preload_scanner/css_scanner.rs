use crate::html::is_html_whitespace;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
enum State {
    #[default]
    Initial,
    MaybeComment,
    Comment,
    MaybeCommentEnd,
    RuleStart,
    Rule,
    AfterRule,
    RuleValue,
    AfterRuleValue,
    DoneParsingImportRules,
}

/// Finds `@import` URLs at the start of a style sheet.
///
/// Only the leading `@import` and `@charset` rules are looked at: the first
/// other rule or any declaration block ends the scan, as imports are
/// ignored past that point anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssScanner {
    state: State,
    rule: String,
    rule_value: String,
}

/// Strips `url(...)` and quotes from an import rule value.
fn parse_css_string_or_url(value: &str) -> &str {
    let mut value = value.trim_matches(is_html_whitespace);

    if value.len() >= 5
        && value.as_bytes()[..4].eq_ignore_ascii_case(b"url(")
        && value.ends_with(')')
    {
        value = value[4..value.len() - 1].trim_matches(is_html_whitespace);
    }

    let bytes = value.as_bytes();

    if bytes.len() >= 2 && matches!(bytes[0], b'"' | b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        value = &value[1..value.len() - 1];
    }

    value
}

impl CssScanner {
    #[inline]
    pub fn reset(&mut self) {
        *self = CssScanner::default();
    }

    pub fn scan(&mut self, text: &str, mut on_import: impl FnMut(&str)) {
        for ch in text.chars() {
            if self.state == State::DoneParsingImportRules {
                break;
            }

            self.tokenize(ch, &mut on_import);
        }
    }

    fn tokenize(&mut self, ch: char, on_import: &mut impl FnMut(&str)) {
        match self.state {
            State::Initial => {
                if is_html_whitespace(ch) {
                    return;
                }

                self.state = match ch {
                    '/' => State::MaybeComment,
                    '@' => State::RuleStart,
                    _ => State::DoneParsingImportRules,
                };
            }
            State::MaybeComment => {
                self.state = if ch == '*' {
                    State::Comment
                } else {
                    State::Initial
                };
            }
            State::Comment => {
                if ch == '*' {
                    self.state = State::MaybeCommentEnd;
                }
            }
            State::MaybeCommentEnd => match ch {
                '*' => (),
                '/' => self.state = State::Initial,
                _ => self.state = State::Comment,
            },
            State::RuleStart => {
                if ch.is_ascii_alphabetic() {
                    self.rule.clear();
                    self.rule_value.clear();
                    self.rule.push(ch);
                    self.state = State::Rule;
                } else {
                    self.state = State::Initial;
                }
            }
            State::Rule => {
                if is_html_whitespace(ch) {
                    self.state = State::AfterRule;
                } else if ch == ';' {
                    self.state = State::Initial;
                } else {
                    self.rule.push(ch);
                }
            }
            State::AfterRule => {
                if is_html_whitespace(ch) {
                    return;
                }

                match ch {
                    ';' => self.state = State::Initial,
                    '{' => self.state = State::DoneParsingImportRules,
                    _ => {
                        self.state = State::RuleValue;
                        self.rule_value.push(ch);
                    }
                }
            }
            State::RuleValue => {
                if is_html_whitespace(ch) {
                    self.state = State::AfterRuleValue;
                } else if ch == ';' {
                    self.emit_rule(on_import);
                } else {
                    self.rule_value.push(ch);
                }
            }
            State::AfterRuleValue => {
                if is_html_whitespace(ch) {
                    return;
                }

                match ch {
                    ';' => self.emit_rule(on_import),
                    '{' => self.state = State::DoneParsingImportRules,
                    _ => {
                        // TODO: media queries after the URL are glued to the
                        // value instead of being parsed.
                        self.state = State::RuleValue;
                        self.rule_value.push(ch);
                    }
                }
            }
            State::DoneParsingImportRules => (),
        }
    }

    fn emit_rule(&mut self, on_import: &mut impl FnMut(&str)) {
        if self.rule.eq_ignore_ascii_case("import") {
            let url = parse_css_string_or_url(&self.rule_value);

            if !url.is_empty() {
                on_import(url);
            }

            self.state = State::Initial;
        } else if self.rule.eq_ignore_ascii_case("charset") {
            self.state = State::Initial;
        } else {
            self.state = State::DoneParsingImportRules;
        }

        self.rule.clear();
        self.rule_value.clear();
    }
}
