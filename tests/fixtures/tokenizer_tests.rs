use crate::harness::ChunkedInput;
use itertools::izip;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use tandem_html::html::TextType;
use tandem_html::input::SegmentedString;
use tandem_html::token::{AtomicToken, CompactToken};
use tandem_html::tokenizer::{Token, TokenKind, Tokenizer};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TokenizerTest {
    description: String,
    input: ChunkedInput,
    output: Vec<Value>,
    #[serde(default)]
    initial_states: Vec<String>,
    #[serde(default)]
    last_start_tag: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Suite {
    tests: Vec<TokenizerTest>,
}

fn load_suite() -> Suite {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/tokenizer.json");
    let file = File::open(path).unwrap();

    serde_json::from_reader(BufReader::new(file)).unwrap()
}

fn text_type(initial_state: &str) -> TextType {
    match initial_state {
        "Data state" => TextType::Data,
        "PLAINTEXT state" => TextType::PlainText,
        "RCDATA state" => TextType::RcData,
        "RAWTEXT state" => TextType::RawText,
        "Script data state" => TextType::ScriptData,
        _ => panic!("Unknown initial state: {initial_state}"),
    }
}

/// Converts a token to the html5lib JSON representation.
fn to_json(token: &Token) -> Value {
    match token.kind() {
        TokenKind::StartTag => {
            let attributes = token
                .unique_attributes()
                .map(|attr| (attr.name.clone(), Value::String(attr.value.clone())))
                .collect::<serde_json::Map<_, _>>();

            let mut json = vec![
                Value::from("StartTag"),
                Value::from(token.name()),
                Value::Object(attributes),
            ];

            if token.self_closing() {
                json.push(Value::Bool(true));
            }

            Value::Array(json)
        }
        TokenKind::EndTag => serde_json::json!(["EndTag", token.name()]),
        TokenKind::Comment => serde_json::json!(["Comment", token.comment()]),
        TokenKind::Character => serde_json::json!(["Character", token.characters()]),
        TokenKind::Doctype => serde_json::json!([
            "DOCTYPE",
            token.name(),
            token.public_identifier(),
            token.system_identifier(),
            !token.force_quirks()
        ]),
        TokenKind::EndOfFile | TokenKind::Uninitialized => Value::Null,
    }
}

/// Merges adjacent character tokens, as html5lib expectations do.
fn push_merged(output: &mut Vec<Value>, json: Value) {
    if let (Some(Value::Array(last)), Value::Array(next)) = (output.last_mut(), &json) {
        if last[0] == "Character" && next[0] == "Character" {
            let merged = format!("{}{}", last[1].as_str().unwrap(), next[1].as_str().unwrap());

            last[1] = Value::String(merged);
            return;
        }
    }

    output.push(json);
}

fn tokenize(chunks: &[&str], initial_state: &str, last_start_tag: Option<&str>) -> Vec<Value> {
    let mut tokenizer = Tokenizer::default();
    let mut input = SegmentedString::default();
    let mut token = Token::default();
    let mut output = Vec::new();

    tokenizer.switch_text_type(text_type(initial_state));

    if let Some(name) = last_start_tag {
        tokenizer.set_appropriate_end_tag_name(name);
    }

    for (idx, chunk) in chunks.iter().enumerate() {
        input.append(*chunk);

        if idx == chunks.len() - 1 {
            input.close();
        }

        while tokenizer.next_token(&mut input, &mut token) {
            // NOTE: the conversion must not lose anything the tree builder sees.
            let compact = CompactToken::new(&token, token.position());

            assert_eq!(AtomicToken::from(&compact), AtomicToken::from(&token));

            let json = to_json(&token);

            if !json.is_null() {
                push_merged(&mut output, json);
            }

            token.clear();
        }
    }

    output
}

#[test]
fn tokenizer_suite() {
    let suite = load_suite();

    assert!(!suite.tests.is_empty());

    for test in suite.tests {
        let initial_states = if test.initial_states.is_empty() {
            vec!["Data state".to_string()]
        } else {
            test.initial_states.clone()
        };

        for initial_state in &initial_states {
            let whole = tokenize(
                &[test.input.as_str()],
                initial_state,
                test.last_start_tag.as_deref(),
            );

            for (idx, actual, expected) in izip!(0.., &whole, &test.output) {
                assert_eq!(
                    actual,
                    expected,
                    "{} ({initial_state}), token #{idx}: {:?}",
                    test.description,
                    test.input.as_str()
                );
            }

            assert_eq!(
                whole.len(),
                test.output.len(),
                "{} ({initial_state}): {:?}",
                test.description,
                test.input.as_str()
            );

            let chunks = test.input.str_chunks();

            assert_eq!(
                tokenize(&chunks, initial_state, test.last_start_tag.as_deref()),
                whole,
                "{} ({initial_state}) split as {chunks:?}",
                test.description
            );
        }
    }
}

#[test]
fn attribute_order_does_not_matter() {
    let tokens = tokenize(&["<a b=1 c=2>", "<a c=2 b=1>"], "Data state", None);
    let attributes = tokens
        .iter()
        .map(|token| token[2].as_object().unwrap().clone().into_iter().collect::<BTreeMap<_, _>>())
        .collect::<Vec<_>>();

    assert_eq!(attributes[0], attributes[1]);
}
