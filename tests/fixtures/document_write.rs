use crate::harness::{parse_document, settings, ChunkedInput, Mode};

fn assert_written_tree(html: &str, writes: &[&str], expected: &str) {
    for mode in Mode::all() {
        let mut input = ChunkedInput::from(html);
        let chunk_size = input.init(encoding_rs::UTF_8).unwrap();

        assert_eq!(
            parse_document(&input, settings(mode), writes).tree,
            expected,
            "Input: {html:?}, mode: {mode:?}, chunk size: {chunk_size}"
        );
    }
}

#[test]
fn written_markup_goes_after_the_script() {
    assert_written_tree(
        "<!DOCTYPE html><p>a<script>w()</script>b</p>",
        &["<i>"],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"a\"\n\
         |       <script>\n\
         |         \"w()\"\n\
         |       <i>\n\
         |         \"b\"\n",
    );
}

#[test]
fn written_text_element_swallows_the_rest() {
    assert_written_tree(
        "<!DOCTYPE html><p>a<script>w()</script>b</p>",
        &["<textarea>"],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"a\"\n\
         |       <script>\n\
         |         \"w()\"\n\
         |       <textarea>\n\
         |         \"b</p>\"\n",
    );
}

#[test]
fn written_unfinished_tag_is_completed_by_the_network_input() {
    assert_written_tree(
        "<!DOCTYPE html><body><script>w()</script>t\">b",
        &["<b title=\""],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <script>\n\
         |       \"w()\"\n\
         |     <b>\n\
         |       title=\"t\"\n\
         |       \"b\"\n",
    );
}

#[test]
fn written_comment_start() {
    assert_written_tree(
        "<!DOCTYPE html><body><script>w()</script>x-->y",
        &["<!--"],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <script>\n\
         |       \"w()\"\n\
         |     <!-- x -->\n\
         |     \"y\"\n",
    );
}

#[test]
fn written_foreign_content() {
    assert_written_tree(
        "<!DOCTYPE html><body><script>w()</script><rect/></svg>x",
        &["<svg>"],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <script>\n\
         |       \"w()\"\n\
         |     <svg svg>\n\
         |       <svg rect>\n\
         |     \"x\"\n",
    );
}

#[test]
fn nested_scripts_in_written_markup() {
    assert_written_tree(
        "<!DOCTYPE html><body><script>w()</script>z",
        &["<script>w()</script>y", "<b>"],
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <script>\n\
         |       \"w()\"\n\
         |     <script>\n\
         |       \"w()\"\n\
         |     <b>\n\
         |       \"yz\"\n",
    );
}
