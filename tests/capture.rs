// tests/capture.rs

use hookrun::exec::capture::{ellipsis, OutputCapture, TRUNCATION_MARKER};

#[test]
fn ellipsis_leaves_short_text_alone() {
    assert_eq!(ellipsis("hello\n", 80), "hello\n");
    assert_eq!(ellipsis("", 3), "");
    assert_eq!(ellipsis("abc", 3), "abc");
}

#[test]
fn ellipsis_counts_characters_not_bytes() {
    assert_eq!(ellipsis("héllo wörld", 5), "héllo...");
    assert_eq!(ellipsis("日本語テキスト", 3), "日本語...");
}

#[test]
fn summary_spans_chunks() {
    let mut capture = OutputCapture::new(10);
    capture.push(b"hello ");
    capture.push(b"world");
    assert_eq!(capture.summary(), "hello worl...");
}

#[test]
fn summary_is_bounded_for_large_output() {
    let mut capture = OutputCapture::new(4);
    for _ in 0..1000 {
        capture.push(&[b'x'; 1024]);
    }
    assert_eq!(capture.summary(), format!("xxxx{TRUNCATION_MARKER}"));
}

#[test]
fn multibyte_output_near_the_cap_is_not_mangled() {
    // 4 chars * 3 bytes fills the 16-byte cap only partially; the fifth char
    // crosses it.
    let mut capture = OutputCapture::new(4);
    capture.push("ああああ".as_bytes());
    capture.push("い".as_bytes());
    capture.push("う".as_bytes());
    assert_eq!(capture.summary(), "ああああ...");
}

#[test]
fn exact_length_output_has_no_marker() {
    let mut capture = OutputCapture::new(5);
    capture.push(b"12345");
    assert_eq!(capture.summary(), "12345");
}
