//! Property-based tests for reply framing.
//!
//! Uses proptest to generate replies and verify that:
//! 1. Chunking the byte stream arbitrarily never changes the response
//! 2. Bytes after the terminal line are never consumed
//! 3. Content lines interleaved with `S` lines keep their order
//!
//! Run with: `cargo test --test proptest_framing`

use std::task::Poll;

use proptest::prelude::*;
use srvx_qserver::{Assembler, LineFramer, Outcome, Response, Token};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Service nickname used as the origin field.
fn origin_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-zA-Z]{2,9}").expect("valid regex")
}

/// Payload text: no line breaks, never blank.
fn payload_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9#:.,!?-][a-zA-Z0-9 #:.,!?-]{0,60}").expect("valid regex")
}

/// A reply body: content payloads, with an `S` line before some of them.
fn body_strategy() -> impl Strategy<Value = Vec<(bool, String)>> {
    prop::collection::vec((any::<bool>(), payload_strategy()), 0..12)
}

fn render(token: &Token, origin: &str, body: &[(bool, String)]) -> String {
    let mut out = format!("{} S\n", token);
    for (continuation, payload) in body {
        if *continuation {
            out.push_str(&format!("{} S\n", token));
        }
        out.push_str(&format!("{} NOTICE admin :{}\n", origin, payload));
    }
    out.push_str(&format!("{} E\n", token));
    out
}

/// Feed `input` in chunks, advancing after each one.
fn assemble_chunked(token: &Token, input: &[u8], cuts: &[usize]) -> (Response, LineFramer, usize) {
    let mut framer = LineFramer::new();
    let mut assembler = Assembler::new(token.clone());

    let mut points: Vec<usize> = cuts.iter().map(|c| c % (input.len() + 1)).collect();
    points.push(input.len());
    points.sort_unstable();

    let mut start = 0;
    for end in points {
        framer.feed(&input[start..end]);
        start = end;
        if let Poll::Ready(outcome) = assembler.advance(&framer) {
            match outcome {
                Outcome::Complete(response) => {
                    let consumed = assembler.consumed();
                    return (response, framer, consumed);
                }
                Outcome::Rejected(line) => panic!("unexpected rejection: {}", line),
            }
        }
    }
    panic!("reply never completed");
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn chunking_does_not_change_response(
        n in any::<u16>(),
        origin in origin_strategy(),
        body in body_strategy(),
        cuts in prop::collection::vec(any::<usize>(), 0..20),
    ) {
        let token = Token::from_number(n);
        let input = render(&token, &origin, &body);

        let (whole, _, _) = assemble_chunked(&token, input.as_bytes(), &[]);
        let (split, _, _) = assemble_chunked(&token, input.as_bytes(), &cuts);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn content_order_is_preserved(
        origin in origin_strategy(),
        body in body_strategy(),
    ) {
        let token = Token::from_number(1);
        let input = render(&token, &origin, &body);
        let (response, _, _) = assemble_chunked(&token, input.as_bytes(), &[]);

        let expected: Vec<String> = body.iter().map(|(_, p)| p.trim().to_string()).collect();
        prop_assert_eq!(response.data, expected);
        if !body.is_empty() {
            prop_assert_eq!(response.origin, origin);
        }
    }

    #[test]
    fn trailing_bytes_are_never_consumed(
        body in body_strategy(),
        tail in "[a-zA-Z0-9 :]{0,40}",
        cuts in prop::collection::vec(any::<usize>(), 0..5),
    ) {
        let token = Token::from_number(7);
        let reply = render(&token, "ChanServ", &body);
        let input = format!("{}{}", reply, tail);

        let (_, mut framer, consumed) = assemble_chunked(&token, input.as_bytes(), &cuts);
        prop_assert_eq!(consumed, reply.len());

        framer.consume(consumed);
        let rest = input.as_bytes()[reply.len()..].to_vec();
        prop_assert!(framer.as_bytes().len() <= rest.len());
        prop_assert_eq!(framer.as_bytes(), &rest[..framer.as_bytes().len()]);
    }
}
