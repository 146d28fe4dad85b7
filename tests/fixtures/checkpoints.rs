use rand::{thread_rng, Rng};
use tandem_html::input::BackgroundInputStream;
use tandem_html::tokenizer::{Token, TokenKind, Tokenizer};
use tandem_html::CheckpointError;

fn random_text(rng: &mut impl Rng) -> String {
    const ALPHABET: &[char] = &['a', 'b', '<', '>', '/', ' ', '\n', '&', 'ё', '☃'];

    let len = rng.gen_range(1..8);

    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

fn consume(stream: &mut BackgroundInputStream, count: usize) {
    for _ in 0..count {
        if stream.current().current_char().is_none() {
            return;
        }

        stream.current_mut().advance();
    }
}

#[test]
fn rewind_reproduces_the_input_at_the_checkpoint() {
    let mut rng = thread_rng();

    for _ in 0..100 {
        let mut stream = BackgroundInputStream::default();
        let append_count = rng.gen_range(1..10);
        let checkpoint_after = rng.gen_range(0..append_count);
        let mut checkpoint = None;
        let mut expected = String::new();

        for idx in 0..append_count {
            let text = random_text(&mut rng);

            stream.append(text.as_str());

            if checkpoint.is_some() {
                expected.push_str(&text);
            }

            consume(&mut stream, rng.gen_range(0..4));

            if idx == checkpoint_after {
                checkpoint = Some(stream.create_checkpoint());
                expected = stream.current().to_string();
            }

            if rng.gen_bool(0.3) {
                stream.create_checkpoint();
            }
        }

        consume(&mut stream, rng.gen_range(0..16));

        stream.rewind_to(checkpoint.unwrap(), "").unwrap();

        assert_eq!(stream.current().to_string(), expected);
    }
}

#[test]
fn unparsed_input_goes_before_the_replayed_input() {
    let mut stream = BackgroundInputStream::default();

    stream.append("abc");
    consume(&mut stream, 1);

    let checkpoint = stream.create_checkpoint();

    stream.append("def");
    consume(&mut stream, 4);
    stream.rewind_to(checkpoint, "xy").unwrap();

    assert_eq!(stream.current().to_string(), "xybcdef");
}

#[test]
fn invalidated_checkpoints_are_rejected() {
    let mut stream = BackgroundInputStream::default();
    let mut checkpoints = Vec::new();

    for text in ["a", "b", "c", "d"] {
        stream.append(text);
        checkpoints.push(stream.create_checkpoint());
    }

    stream.invalidate_checkpoints_before(checkpoints[2]);

    assert_eq!(stream.outstanding_checkpoint_count(), 2);

    for &checkpoint in &checkpoints[..2] {
        assert_eq!(
            stream.rewind_to(checkpoint, ""),
            Err(CheckpointError::Invalidated {
                checkpoint,
                first_valid: checkpoints[2],
            })
        );
    }

    assert_eq!(
        stream.rewind_to(42, ""),
        Err(CheckpointError::Unknown { checkpoint: 42 })
    );

    stream.rewind_to(checkpoints[2], "").unwrap();

    assert_eq!(stream.current().to_string(), "abcd");
    assert_eq!(stream.outstanding_checkpoint_count(), 0);
}

fn finish_tag(
    tokenizer: &mut Tokenizer,
    token: &mut Token,
    stream: &mut BackgroundInputStream,
) -> (TokenKind, String, Option<String>) {
    assert!(tokenizer.next_token(stream.current_mut(), token));

    let tag = (
        token.kind(),
        token.name().to_string(),
        token.get_attribute("src").map(|attr| attr.value.clone()),
    );

    token.clear();

    tag
}

#[test]
fn tags_split_by_a_chunk_boundary() {
    let mut stream = BackgroundInputStream::default();
    let mut tokenizer = Tokenizer::default();
    let mut token = Token::default();
    let mut kinds = Vec::new();

    stream.append("<p>a<scr");

    while tokenizer.next_token(stream.current_mut(), &mut token) {
        kinds.push(token.kind());
        token.clear();
    }

    assert_eq!(kinds, [TokenKind::StartTag, TokenKind::Character]);

    let checkpoint = stream.create_checkpoint();
    let saved = (tokenizer.clone(), token.clone());

    stream.append("ipt src=x>");

    let expected = (
        TokenKind::StartTag,
        "script".to_string(),
        Some("x".to_string()),
    );

    assert_eq!(finish_tag(&mut tokenizer, &mut token, &mut stream), expected);

    stream.rewind_to(checkpoint, "").unwrap();

    let (mut tokenizer, mut token) = saved;

    assert_eq!(finish_tag(&mut tokenizer, &mut token, &mut stream), expected);
}
