//! Benchmarks for reply framing and assembly.

use std::task::Poll;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use srvx_qserver::{Assembler, LineFramer, Outcome, ReplyLine, Token, TokenGenerator};

/// Short AuthServ acknowledgement
const AUTH_REPLY: &str = "GS00001 S\nAuthServ PRIVMSG admin :I recognize you.\nGS00001 E\n";

/// Framing line with payload
const FRAMED_LINE: &str = "ChanServ GS00001 S :#srvx Information:";

/// Content line without token
const CONTENT_LINE: &str = "ChanServ NOTICE admin :Registered:     Jan 01 12:00:00 2010";

fn info_reply(lines: usize) -> String {
    let mut out = String::from("GS00001 S\n");
    for i in 0..lines {
        out.push_str(&format!("ChanServ NOTICE admin :Field {}: value number {}\n", i, i));
    }
    out.push_str("GS00001 E\n");
    out
}

fn assemble(input: &[u8], chunk: usize) -> usize {
    let mut framer = LineFramer::new();
    let mut assembler = Assembler::new(Token::from_number(1));
    for piece in input.chunks(chunk) {
        framer.feed(piece);
        if let Poll::Ready(Outcome::Complete(response)) = assembler.advance(&framer) {
            return response.data.len();
        }
    }
    0
}

fn benchmark_line_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reply Line Parsing");

    group.bench_function("framed_line", |b| {
        b.iter(|| black_box(ReplyLine::parse(black_box(FRAMED_LINE))))
    });

    group.bench_function("content_line", |b| {
        b.iter(|| black_box(ReplyLine::parse(black_box(CONTENT_LINE))))
    });

    group.finish();
}

fn benchmark_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reply Assembly");

    group.bench_function("auth_reply", |b| {
        b.iter(|| black_box(assemble(black_box(AUTH_REPLY.as_bytes()), usize::MAX)))
    });

    for lines in [10, 100, 1000] {
        let reply = info_reply(lines);
        group.bench_with_input(BenchmarkId::new("single_read", lines), &reply, |b, r| {
            b.iter(|| black_box(assemble(r.as_bytes(), usize::MAX)))
        });
        group.bench_with_input(BenchmarkId::new("chunked_64", lines), &reply, |b, r| {
            b.iter(|| black_box(assemble(r.as_bytes(), 64)))
        });
    }

    group.finish();
}

fn benchmark_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("Token Generation");
    let mut gen = TokenGenerator::new();

    group.bench_function("next", |b| b.iter(|| black_box(gen.next())));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_assembly,
    benchmark_tokens,
);

criterion_main!(benches);
