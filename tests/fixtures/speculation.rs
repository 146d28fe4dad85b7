use crate::harness::{parse_document, settings, ChunkedInput, Mode, ROUNDTRIP_ENCODINGS};

/// Documents with the texts their scripts write.
static DOCUMENTS: &[(&str, &[&str])] = &[
    ("<!DOCTYPE html><p>Hello<b>world</b></p>", &[]),
    ("<!DOCTYPE html><table>oops<tr><td>1</td></tr></table>", &[]),
    ("<!DOCTYPE html><b><p>x</b>y</p><i>z", &[]),
    (
        "<!DOCTYPE html><svg viewbox='0 0 1 1'><foreignobject><p>x</p></foreignobject>\
         <clippath/><script>no()</script></svg><math><mi><b>x</b></mi><div>y",
        &[],
    ),
    (
        "<title>a<b</title><style>p { x: '</p>' }</style><textarea>\n<i></textarea>\
         <noscript><p>n</p></noscript><xmp><b></xmp><iframe><p></iframe>",
        &[],
    ),
    ("<select><textarea>a</b></textarea><p>c", &[]),
    ("<select><option>a<input><p>b", &[]),
    ("<frameset><frame><noframes><p></noframes></frameset>", &[]),
    ("<svg><![CDATA[<p>]]></svg><p><![CDATA[x]]>", &[]),
    ("<p>a<script>w()</script>b</p>", &["<i>"]),
    ("<p>a<script>w()</script>b</p>", &["<textarea>"]),
    ("<script>w()</script>t\">b", &["<b title=\""]),
    ("<script>w()</script><p>a", &["<!-- c"]),
    ("<script>w()</script><p>a", &["<math><mi>"]),
    ("<script>w()</script><p>a", &["<svg><desc>d</desc>"]),
    ("<table><tr><td>1<script>w()</script>2</table>x", &["<plaintext>"]),
    ("<script>w()</script>z", &["<script>w()</script>y", "<b>"]),
    ("<script>w()</script><p>1<script>w()</script>2", &["", "<em>"]),
    (
        "<!DOCTYPE html><script src=a.js></script><img src=b.png><link rel=stylesheet href=c.css>",
        &["<style>@import 'd.css';</style>"],
    ),
];

#[test]
fn background_parsing_builds_the_same_tree() {
    for (html, writes) in DOCUMENTS {
        for encoding in ROUNDTRIP_ENCODINGS {
            let mut input = ChunkedInput::from(*html);

            let Ok(chunk_size) = input.init(encoding) else {
                continue;
            };

            let expected = parse_document(&input, settings(Mode::Synchronous), writes);

            for mode in Mode::all() {
                let actual = parse_document(&input, settings(mode), writes);

                assert_eq!(
                    actual.tree,
                    expected.tree,
                    "Input: {html:?}, writes: {writes:?}, mode: {mode:?}, encoding: {}, \
                     chunk size: {chunk_size}",
                    encoding.name()
                );

                assert_eq!(actual.executed_scripts, expected.executed_scripts);
            }
        }
    }
}

#[test]
fn cdata_after_foreign_content_changes_matches_synchronous_parsing() {
    for html in [
        "<select><svg><![CDATA[y]]>",
        "<frameset><svg><![CDATA[y]]>",
        "<math><mi><svg></math><![CDATA[y]]>",
        "<select><template><svg><![CDATA[t]]></svg></template></select>",
        "<p><svg></p><![CDATA[z]]>",
        "<svg><foreignObject><div>a</div><![CDATA[c]]></foreignObject></svg><![CDATA[d]]>",
        "<svg><desc><![CDATA[<b>]]></desc></svg>",
        "<math><mi><mglyph><![CDATA[g]]></mglyph></mi></math>",
    ] {
        let mut input = ChunkedInput::from(html);

        input.init(encoding_rs::UTF_8).unwrap();

        let expected = parse_document(&input, settings(Mode::Synchronous), &[]);

        for mode in Mode::all() {
            let actual = parse_document(&input, settings(mode), &[]);

            assert_eq!(actual.tree, expected.tree, "Input: {html:?}, mode: {mode:?}");
        }
    }
}

#[test]
fn preloads_are_found_in_every_mode() {
    let html = "<!DOCTYPE html><base href=http://cdn.example.com/>\
                <script src=a.js></script><img src=b.png>";

    for mode in Mode::all() {
        let mut input = ChunkedInput::from(html);

        input.init(encoding_rs::UTF_8).unwrap();

        let document = parse_document(&input, settings(mode), &[]);

        for url in ["http://cdn.example.com/a.js", "http://cdn.example.com/b.png"] {
            assert!(
                document.preload_urls.iter().any(|found| found == url),
                "{url} is missing in {mode:?}: {:?}",
                document.preload_urls
            );
        }
    }
}
