use super::*;
use crate::base::Range;

fn describe(token: &Token) -> String {
    match token.kind() {
        kind @ (TokenKind::StartTag | TokenKind::EndTag) => {
            let attrs = token
                .attributes()
                .iter()
                .map(|a| format!(" {}={}", a.name, a.value))
                .collect::<String>();

            format!(
                "{:?}({}{}{})",
                kind,
                token.name(),
                attrs,
                if token.self_closing() { " /" } else { "" }
            )
        }
        TokenKind::Character => format!("Character({})", token.characters()),
        TokenKind::Comment => format!("Comment({})", token.comment()),
        TokenKind::Doctype => format!(
            "Doctype({}, {:?}, {:?}, {})",
            token.name(),
            token.public_identifier(),
            token.system_identifier(),
            token.force_quirks()
        ),
        TokenKind::EndOfFile => "EndOfFile".into(),
        TokenKind::Uninitialized => unreachable!("Uninitialized token emitted"),
    }
}

struct Harness {
    tokenizer: Tokenizer,
    input: SegmentedString,
    token: Token,
    output: Vec<String>,
}

impl Harness {
    fn new() -> Self {
        Harness {
            tokenizer: Tokenizer::default(),
            input: SegmentedString::default(),
            token: Token::default(),
            output: Vec::new(),
        }
    }

    fn pump(&mut self) {
        while self.tokenizer.next_token(&mut self.input, &mut self.token) {
            // NOTE: stand-in for the tree builder switching text states.
            if self.token.kind() == TokenKind::StartTag {
                self.tokenizer.update_state_for(self.token.name());
            }

            self.output.push(describe(&self.token));
            self.token.clear();
        }
    }

    fn feed(&mut self, chunk: &str) -> &mut Self {
        self.input.append(chunk);
        self.pump();
        self
    }

    fn finish(&mut self) -> Vec<String> {
        self.input.close();
        self.pump();
        self.output.clone()
    }
}

fn tokenize(chunks: &[&str]) -> Vec<String> {
    let mut harness = Harness::new();

    for chunk in chunks {
        harness.feed(chunk);
    }

    harness.finish()
}

#[test]
fn tags_attributes_and_text() {
    assert_eq!(
        tokenize(&["<DIV id=a Class='b' data-x=\"c\">text</div><br/>"]),
        [
            "StartTag(div id=a class=b data-x=c)",
            "Character(text)",
            "EndTag(div)",
            "StartTag(br /)",
            "EndOfFile"
        ]
    );
}

#[test]
fn split_input_produces_same_tokens() {
    let html = "<!DOCTYPE html><html><head><title>T &amp; x</title>\
                <script>if (a<b) { x = \"</p>\"; }</script></head>\
                <body class=main>Hi&nbsp;th\u{E9}re<!-- c -->\
                <p id=\"x\" data-y='1'>text\r\nmore &#x41;</p>\
                <textarea>a</b></textarea></body></html>";

    let expected = tokenize(&[html]);

    assert_eq!(expected[0], "Doctype(html, None, None, false)");

    for (idx, _) in html.char_indices().skip(1) {
        assert_eq!(
            tokenize(&[&html[..idx], &html[idx..]]),
            expected,
            "split at {idx}"
        );
    }
}

#[test]
fn split_between_tag_parts() {
    assert_eq!(
        tokenize(&["<di", "v>text</div>"]),
        tokenize(&["<div>text</div>"])
    );
}

#[test]
fn waits_for_more_input() {
    let mut harness = Harness::new();

    harness.feed("abc");
    assert!(harness.output.is_empty());

    harness.feed("<p");
    assert_eq!(harness.output, ["Character(abc)"]);

    assert_eq!(harness.finish(), ["Character(abc)", "EndOfFile"]);
}

#[test]
fn newlines_are_normalized_across_chunks() {
    assert_eq!(
        tokenize(&["a\r", "\nb\rc\r\n"]),
        ["Character(a\nb\nc\n)", "EndOfFile"]
    );
}

#[test]
fn null_characters() {
    assert_eq!(
        tokenize(&["a\0b<p x=\"\0\">"]),
        ["Character(ab)", "StartTag(p x=\u{FFFD})", "EndOfFile"]
    );
}

#[test]
fn character_references() {
    assert_eq!(
        tokenize(&["a &amp; b &#x41; &notit; &foo;"]),
        ["Character(a & b A \u{AC}it; &foo;)", "EndOfFile"]
    );

    assert_eq!(
        tokenize(&["<a href=\"?a=1&copy=2&amp;b\">"]),
        ["StartTag(a href=?a=1&copy=2&b)", "EndOfFile"]
    );
}

#[test]
fn rcdata_and_end_tag_flush() {
    assert_eq!(
        tokenize(&["<title>a</b></title >x"]),
        [
            "StartTag(title)",
            "Character(a</b>)",
            "EndTag(title)",
            "Character(x)",
            "EndOfFile"
        ]
    );
}

#[test]
fn escaped_script_data() {
    assert_eq!(
        tokenize(&["<script><!--<script></script>--></script>"]),
        [
            "StartTag(script)",
            "Character(<!--<script></script>-->)",
            "EndTag(script)",
            "EndOfFile"
        ]
    );
}

#[test]
fn comments_and_bogus_markup() {
    assert_eq!(
        tokenize(&["<!-- a -- b --><?xml?>a</>b<!-->"]),
        [
            "Comment( a -- b )",
            "Comment(?xml?)",
            "Character(a)",
            "Character(b)",
            "Comment()",
            "EndOfFile"
        ]
    );
}

#[test]
fn doctypes() {
    assert_eq!(
        tokenize(&[
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" 'http://www.w3.org/TR/html4/strict.dtd'>"
        ]),
        [
            "Doctype(html, Some(\"-//W3C//DTD HTML 4.01//EN\"), \
             Some(\"http://www.w3.org/TR/html4/strict.dtd\"), false)",
            "EndOfFile"
        ]
    );

    assert_eq!(
        tokenize(&["<!doctype>"]),
        ["Doctype(, None, None, true)", "EndOfFile"]
    );

    assert_eq!(
        tokenize(&["<!DOCTYPE html bogus>"]),
        ["Doctype(html, None, None, true)", "EndOfFile"]
    );
}

#[test]
fn cdata_is_allowed_only_when_requested() {
    assert_eq!(
        tokenize(&["<![CDATA[x]]>"]),
        ["Comment([CDATA[x]])", "EndOfFile"]
    );

    let mut harness = Harness::new();

    harness.tokenizer.set_should_allow_cdata(true);

    assert_eq!(
        harness.feed("<![CDATA[a<b]]]>").finish(),
        ["Character(a<b])", "EndOfFile"]
    );
}

#[test]
fn unfinished_tag_is_dropped_at_end_of_input() {
    assert_eq!(tokenize(&["<div cla"]), ["EndOfFile"]);
    assert_eq!(
        tokenize(&["a<"]),
        ["Character(a)", "Character(<)", "EndOfFile"]
    );
}

#[test]
fn plaintext_consumes_everything() {
    assert_eq!(
        tokenize(&["<plaintext></plaintext><b>"]),
        [
            "StartTag(plaintext)",
            "Character(</plaintext><b>)",
            "EndOfFile"
        ]
    );
}

#[test]
fn token_sources_and_attribute_ranges() {
    let mut tokenizer = Tokenizer::default();
    let mut input = SegmentedString::new("ab\n<a href='y' title=z>");
    let mut token = Token::default();

    input.close();

    assert!(tokenizer.next_token(&mut input, &mut token));
    assert_eq!(token.source(), "ab\n");
    token.clear();

    assert!(tokenizer.next_token(&mut input, &mut token));
    assert_eq!(token.source(), "<a href='y' title=z>");
    assert_eq!(token.position(), TextPosition::new(1, 0));
    assert_eq!(token.start_offset(), 3);

    let attrs = token.attributes();

    assert_eq!(attrs[0].name_range, Range::new(3, 7));
    assert_eq!(attrs[0].value_range, Range::new(9, 10));
    assert_eq!(attrs[1].name_range, Range::new(12, 17));
    assert_eq!(attrs[1].value_range, Range::new(18, 19));
}

#[test]
fn flushed_character_token_excludes_end_tag_source() {
    let mut tokenizer = Tokenizer::default();
    let mut input = SegmentedString::new("<title>ab</title>");
    let mut token = Token::default();
    let mut sources = Vec::new();

    input.close();

    while tokenizer.next_token(&mut input, &mut token) {
        if token.kind() == TokenKind::StartTag {
            tokenizer.update_state_for(token.name());
        }

        sources.push((token.source().to_string(), token.start_offset()));
        token.clear();
    }

    assert_eq!(
        sources,
        [
            ("<title>".to_string(), 0),
            ("ab".to_string(), 7),
            ("</title>".to_string(), 9),
            (String::new(), 17)
        ]
    );
}

#[test]
fn text_states_for_start_tags() {
    let mut tokenizer = Tokenizer::new(false);

    tokenizer.update_state_for("noscript");
    assert_eq!(tokenizer.state(), TokenizerState::Data);

    tokenizer.update_state_for("STYLE");
    assert_eq!(tokenizer.state(), TokenizerState::RawText);

    tokenizer.switch_text_type(TextType::Data);
    tokenizer.update_state_for("div");
    assert_eq!(tokenizer.state(), TokenizerState::Data);

    let mut tokenizer = Tokenizer::new(true);

    tokenizer.update_state_for("noscript");
    assert_eq!(tokenizer.state(), TokenizerState::RawText);
}
