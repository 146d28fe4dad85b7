use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glob::glob;
use std::fs;
use std::hint::black_box;
use tandem_html::input::SegmentedString;
use tandem_html::tokenizer::{Token, Tokenizer};
use tandem_html::{DocumentParser, Dom, ParserSettings, PumpOutcome};

const CHUNK_SIZE: usize = 1024;

struct Input {
    pub name: String,
    pub length: usize,
    pub text: String,
    pub chunks: Vec<Vec<u8>>,
}

fn get_inputs() -> Vec<Input> {
    glob("benches/data/*.html")
        .unwrap()
        .map(|path| {
            let path = path.unwrap();
            let text = fs::read_to_string(&path).unwrap();

            Input {
                name: path.file_name().unwrap().to_string_lossy().to_string(),
                length: text.len(),
                chunks: text
                    .as_bytes()
                    .chunks(CHUNK_SIZE)
                    .map(<[u8]>::to_vec)
                    .collect(),
                text,
            }
        })
        .collect()
}

fn tokenize(input: &Input) {
    let mut tokenizer = Tokenizer::default();
    let mut segmented = SegmentedString::default();
    let mut token = Token::default();

    // NOTE: chunks are split on byte boundaries, which may fall inside a
    // character, so the text is fed in character-aligned pieces instead.
    let mut rest = input.text.as_str();

    while !rest.is_empty() {
        let mut end = rest.len().min(CHUNK_SIZE);

        while !rest.is_char_boundary(end) {
            end += 1;
        }

        segmented.append(&rest[..end]);
        rest = &rest[end..];

        while tokenizer.next_token(&mut segmented, &mut token) {
            black_box(&token);
            token.clear();
        }
    }

    segmented.close();

    while tokenizer.next_token(&mut segmented, &mut token) {
        black_box(&token);
        token.clear();
    }
}

fn parse(input: &Input, use_background_parser: bool) {
    let mut parser = DocumentParser::new(
        Dom::new(),
        ParserSettings {
            use_background_parser,
            ..ParserSettings::default()
        },
    );

    for chunk in &input.chunks {
        parser.write(chunk).unwrap();
    }

    parser.finish().unwrap();

    loop {
        match parser.run_until_blocked().unwrap() {
            PumpOutcome::BlockedOnScript => {
                black_box(parser.take_script_to_execute());
                parser.resume_after_script().unwrap();
            }
            outcome => {
                black_box(outcome);
                break;
            }
        }
    }

    black_box(parser.into_sink());
}

fn parsing_benchmark(c: &mut Criterion) {
    let inputs = get_inputs();
    let mut group = c.benchmark_group("Parsing");

    for input in &inputs {
        group.throughput(Throughput::Bytes(input.length as u64));

        group.bench_with_input(BenchmarkId::new("Tokenizer", &input.name), input, |b, i| {
            b.iter(|| tokenize(i))
        });

        group.bench_with_input(BenchmarkId::new("Synchronous", &input.name), input, |b, i| {
            b.iter(|| parse(i, false))
        });

        group.bench_with_input(BenchmarkId::new("Background", &input.name), input, |b, i| {
            b.iter(|| parse(i, true))
        });
    }

    group.finish();
}

criterion_group!(benches, parsing_benchmark);
criterion_main!(benches);
