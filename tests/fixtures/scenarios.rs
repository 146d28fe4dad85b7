use crate::harness::{parse_document, settings, ChunkedInput, Mode, ROUNDTRIP_ENCODINGS};
use tandem_html::tree_builder::InsertionMode;
use tandem_html::xss_auditor::{XssAuditorSettings, XssMode};
use tandem_html::{serialize_for_test, DocumentParser, Dom, ParserSettings, PumpOutcome};
use url::Url;

#[test]
fn simple_document() {
    for mode in Mode::all() {
        let mut parser = DocumentParser::new(Dom::new(), settings(mode));

        parser
            .append("<html><body><p>Hi</p></body></html>")
            .unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Finished);
        assert_eq!(
            parser.tree_builder().insertion_mode(),
            InsertionMode::AfterAfterBody
        );
        assert_eq!(
            serialize_for_test(parser.sink()),
            "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"Hi\"\n"
        );
    }
}

#[test]
fn tag_split_between_appends() {
    for mode in Mode::all() {
        let mut split = DocumentParser::new(Dom::new(), settings(mode));

        split.append("<di").unwrap();
        split.append("v>text</div>").unwrap();
        split.finish().unwrap();
        split.run_until_blocked().unwrap();

        let mut whole = DocumentParser::new(Dom::new(), settings(mode));

        whole.append("<div>text</div>").unwrap();
        whole.finish().unwrap();
        whole.run_until_blocked().unwrap();

        assert_eq!(
            serialize_for_test(split.sink()),
            serialize_for_test(whole.sink())
        );
    }
}

#[test]
fn text_in_tables_is_foster_parented() {
    let html = "<!DOCTYPE html><table>oops<tr><td>1</td></tr></table>";

    for encoding in ROUNDTRIP_ENCODINGS {
        let mut input = ChunkedInput::from(html);

        input.init(encoding).unwrap();

        for mode in Mode::all() {
            assert_eq!(
                parse_document(&input, settings(mode), &[]).tree,
                "| <!DOCTYPE html>\n\
                 | <html>\n\
                 |   <head>\n\
                 |   <body>\n\
                 |     \"oops\"\n\
                 |     <table>\n\
                 |       <tbody>\n\
                 |         <tr>\n\
                 |           <td>\n\
                 |             \"1\"\n"
            );
        }
    }
}

fn audited_parser(mode: Mode, xss_mode: XssMode) -> DocumentParser<Dom> {
    let url = Url::parse("http://example.com/search?q=<script>alert(1)</script>").unwrap();

    DocumentParser::new(
        Dom::new(),
        ParserSettings {
            xss_auditor: Some(XssAuditorSettings {
                mode: xss_mode,
                ..XssAuditorSettings::new(url)
            }),
            ..settings(mode)
        },
    )
}

#[test]
fn reflected_script_is_neutered() {
    for mode in Mode::all() {
        let mut parser = audited_parser(mode, XssMode::Filter);

        parser
            .append("<p>Results for <script>alert(1)</script></p>")
            .unwrap();
        parser.finish().unwrap();

        assert_eq!(
            parser.run_until_blocked().unwrap(),
            PumpOutcome::BlockedOnScript
        );

        let script = parser.take_script_to_execute().unwrap();

        assert_eq!(parser.sink().text_content(script.element), " ");
        assert_eq!(parser.resume_after_script().unwrap(), PumpOutcome::Finished);

        let findings = parser.xss_findings();

        assert_eq!(findings.len(), 1, "{mode:?}");
        assert!(findings[0].did_sanitize);
        assert!(!findings[0].did_block_entire_page);
    }
}

#[test]
fn reflected_script_blocks_the_page() {
    for mode in Mode::all() {
        let mut parser = audited_parser(mode, XssMode::Block);

        parser
            .append("<p>Results for <script>alert(1)</script></p>")
            .unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.run_until_blocked().unwrap(), PumpOutcome::Stopped);
        assert!(parser.is_stopped());
        assert!(parser.xss_findings()[0].did_block_entire_page);
        assert!(!serialize_for_test(parser.sink()).contains("alert"));
    }
}

#[test]
fn unreflected_scripts_are_left_alone() {
    for mode in Mode::all() {
        let mut parser = audited_parser(mode, XssMode::Block);

        parser.append("<script>track()</script>").unwrap();
        parser.finish().unwrap();

        assert_eq!(
            parser.run_until_blocked().unwrap(),
            PumpOutcome::BlockedOnScript
        );

        let script = parser.take_script_to_execute().unwrap();

        assert_eq!(parser.sink().text_content(script.element), "track()");
        assert!(parser.xss_findings().is_empty());
    }
}
