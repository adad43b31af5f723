use std::fs;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use readbench::config;
use readbench::pipeline;

fn build_tree(root: &Path, dirs: usize, files_per_dir: usize, file_size: usize) {
    let payload = vec![0xA5u8; file_size];
    for d in 0..dirs {
        let dir = root.join(format!("dir{d:03}"));
        fs::create_dir_all(&dir).expect("mkdir");
        for f in 0..files_per_dir {
            fs::write(dir.join(format!("file{f:04}.bin")), &payload).expect("write");
        }
    }
}

fn bench_traversal(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    build_tree(temp_dir.path(), 16, 64, 16 * 1024);

    let mut group = c.benchmark_group("traversal");
    for workers in [1usize, 2, 4, 8] {
        let mut cfg = config::load_config(None).expect("config");
        cfg.workers = workers;
        group.bench_with_input(BenchmarkId::new("workers", workers), &cfg, |b, cfg| {
            b.iter(|| pipeline::run_traversal(cfg, temp_dir.path()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
