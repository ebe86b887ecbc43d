//! Fuzz target for reply assembly
//!
//! Feeds arbitrary bytes to the line framer in two pieces and drives the
//! assembler over them. It must never panic, and it must never claim more
//! bytes than the framer holds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use srvx_qserver::{Assembler, LineFramer, Token};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 8192 {
        return;
    }

    let split = data[0] as usize % data.len();
    let mut framer = LineFramer::new();
    let mut assembler = Assembler::new(Token::from_number(1));

    framer.feed(&data[..split]);
    let _ = assembler.advance(&framer);
    framer.feed(&data[split..]);
    let _ = assembler.advance(&framer);

    assert!(assembler.consumed() <= framer.len());
    framer.consume(assembler.consumed());
});
