use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use geocomp::{
    components::{MemRaster, RasterTransform},
    Geometry, RasterConnection,
};
use ndarray::Array3;

const SIZE: (usize, usize, usize) = (3, 512, 512);

fn ring_wkt(vertices: usize) -> String {
    let coords: Vec<String> = (0..=vertices)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i % vertices) as f64 / vertices as f64;
            format!("{} {}", 10. * angle.cos(), 10. * angle.sin())
        })
        .collect();
    format!("POLYGON (({}))", coords.join(", "))
}

fn bench_parse_wkt(c: &mut Criterion) {
    let wkt = ring_wkt(1000);
    c.bench_function("parse_wkt", |b| b.iter(|| Geometry::from_wkt(black_box(&wkt))));
}

fn bench_buffer(c: &mut Criterion) {
    let polygon = Geometry::from_wkt(&ring_wkt(200)).unwrap();
    c.bench_function("buffer", |b| b.iter(|| black_box(&polygon).buffer(1.)));
}

fn bench_read_bands(c: &mut Criterion) {
    let data = Array3::from_shape_fn(SIZE, |(band, row, col)| (band + row + col) as f64);
    let raster = RasterConnection::new(MemRaster::new(
        data,
        RasterTransform::from_origin(0., 512., 1., -1.),
    ));
    c.bench_function("read_bands", |b| b.iter(|| raster.read_bands::<f32>([3usize, 2, 1])));
}

criterion_group!(benches, bench_parse_wkt, bench_buffer, bench_read_bands);
criterion_main!(benches);
