use fltnum::{Context, Float, Formatter, Reader, RoundingMode};
use num_bigint::BigUint;
use num_traits::Pow;

use RoundingMode::HalfEven as rme;

fn test_read_long_literal() {
    // A hundred decimal digits into a 237-bit binary float.
    let ctx = Context::binary(237, -262143, 262143);
    let coeff = BigUint::parse_bytes(
        b"314159265358979323846264338327950288419716939937510\
          58209749445923078164062862089986280348253421170679",
        10,
    )
    .unwrap();
    let mut reader = Reader::new();
    black_box(reader.read(&ctx, rme, false, &coeff, -100, 10));
}

fn test_format_binary64() {
    let ctx = Context::binary64();
    let fmt = Formatter::new(2, ctx.etiny(), 10);
    for val in [0.1f64, 1995.1995, 6.02214076e23, 5e-324, 1e300] {
        let v = Float::from_f64(val).align(&ctx);
        black_box(fmt.format(&v, Some(rme), 53));
    }
}

fn test_format_high_precision() {
    // Format a 237-bit value; the digit loop dominates.
    let ctx = Context::binary(237, -262143, 262143);
    let fmt = Formatter::new(2, ctx.etiny(), 10);
    let coeff = BigUint::from(3u32).pow(149u32) + 7u32;
    let v = Float::new(2, false, coeff, -200);
    black_box(fmt.format(&v, Some(rme), 237));
}

fn test_parse_print_round_trip() {
    let mut ctx = Context::binary64();
    let v = Float::from_str_ctx("1995.19950521e-7", &mut ctx).unwrap();
    black_box(v.to_text(&ctx));
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("read_long_literal", |b| b.iter(test_read_long_literal));
    c.bench_function("format_binary64", |b| b.iter(test_format_binary64));
    c.bench_function("format_high_precision", |b| {
        b.iter(test_format_high_precision)
    });
    c.bench_function("parse_print_round_trip", |b| {
        b.iter(test_parse_print_round_trip)
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
