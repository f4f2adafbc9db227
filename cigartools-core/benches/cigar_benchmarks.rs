use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_rational::Ratio;

use cigartools_core::{connect_nonoverlapping, Cigar, CigarHit};

fn generate_cigar_text(runs: usize) -> String {
    let pattern = ["9M", "1D", "4M", "2I"];
    let mut text = String::with_capacity(runs * 2);

    for index in 0..runs {
        text.push_str(pattern[index % pattern.len()]);
    }

    text
}

fn bench_parse(c: &mut Criterion) {
    let text = generate_cigar_text(1000);

    c.bench_function("parse_1000_runs", |b| {
        b.iter(|| Cigar::parse(black_box(&text)).unwrap())
    });
}

fn bench_coordinate_mapping(c: &mut Criterion) {
    let text = generate_cigar_text(1000);

    c.bench_function("coordinate_mapping_1000_runs", |b| {
        b.iter(|| {
            // Parse inside the loop so the memoized mapping is built fresh.
            let cigar = Cigar::parse(black_box(&text)).unwrap();
            cigar.coordinate_mapping().ref_to_query().len()
        })
    });
}

fn bench_cut_reference(c: &mut Criterion) {
    let text = generate_cigar_text(1000);
    let cigar = Cigar::parse(&text).unwrap();
    let hit = CigarHit::new(
        cigar.clone(),
        1,
        cigar.ref_length() as i64,
        1,
        cigar.query_length() as i64,
    )
    .unwrap();
    let cut_point = Ratio::new(cigar.ref_length() as i64, 2) + Ratio::new(1, 2);

    c.bench_function("cut_reference_1000_runs", |b| {
        b.iter(|| black_box(&hit).cut_reference(black_box(cut_point)).unwrap())
    });
}

fn bench_connect_nonoverlapping(c: &mut Criterion) {
    let hits: Vec<CigarHit> = (0..200)
        .map(|index| {
            let offset = index * 20;
            CigarHit::new(Cigar::parse("9M").unwrap(), offset, offset + 8, offset, offset + 8)
                .unwrap()
        })
        .collect();

    c.bench_function("connect_200_hits", |b| {
        b.iter(|| connect_nonoverlapping(black_box(&hits)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_coordinate_mapping,
    bench_cut_reference,
    bench_connect_nonoverlapping
);
criterion_main!(benches);
