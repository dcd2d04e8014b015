use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use modircd::config::Config;
use modircd::modules::load_core_modules;
use modircd::proto::{ModeChange, Responder, parse_mode_changes};
use modircd::state::{Credentials, Matrix};
use std::collections::HashSet;
use std::hint::black_box;

fn setup() -> Matrix {
    let matrix = Matrix::new(&Config::for_tests()).expect("matrix");
    load_core_modules(&matrix).expect("modules");
    for (uid, nick) in [("001AAAAAA", "alice"), ("001AAAAAB", "bob")] {
        let creds = Credentials {
            nick: nick.into(),
            user: nick.into(),
            realname: nick.into(),
            host: "bench.host".into(),
        };
        let mut out = Responder::new(matrix.server_name(), nick);
        matrix
            .register_user(uid, &creds, &HashSet::new(), &mut out)
            .expect("register");
        matrix
            .join_channel(uid, "#bench", None, &mut out)
            .expect("join");
    }
    matrix
}

fn changes(line: &str) -> Vec<ModeChange> {
    let args: Vec<String> = line.split(' ').map(String::from).collect();
    parse_mode_changes(&args, |letter, _| matches!(letter, 'o' | 'v' | 'b' | 'k'))
}

fn channel_mode_benchmark(c: &mut Criterion) {
    let matrix = setup();
    let mut group = c.benchmark_group("channel_modes");
    group.throughput(Throughput::Elements(1));

    // cancels out, exercises the diff without touching state
    let noop = changes("+o-o bob bob");
    group.bench_function("cancelled_batch", |b| {
        let mut out = Responder::new(matrix.server_name(), "alice");
        b.iter(|| {
            let applied = matrix
                .apply_channel_modes("001AAAAAA", "#bench", black_box(&noop), &mut out)
                .expect("modes");
            out.drain();
            applied
        })
    });

    let set = changes("+vk-t bob secret");
    let unset = changes("-vk+t bob secret");
    group.bench_function("set_and_revert", |b| {
        let mut out = Responder::new(matrix.server_name(), "alice");
        b.iter(|| {
            matrix
                .apply_channel_modes("001AAAAAA", "#bench", black_box(&set), &mut out)
                .expect("set");
            matrix
                .apply_channel_modes("001AAAAAA", "#bench", black_box(&unset), &mut out)
                .expect("unset");
            out.drain();
        })
    });

    group.finish();
}

fn mode_parsing_benchmark(c: &mut Criterion) {
    let args: Vec<String> = "+ovb-k+l alice bob *!*@spam.example key 20"
        .split(' ')
        .map(String::from)
        .collect();
    c.bench_function("parse_mode_changes", |b| {
        b.iter(|| parse_mode_changes(black_box(&args), |letter, _| letter != 'n'))
    });
}

criterion_group!(benches, channel_mode_benchmark, mode_parsing_benchmark);
criterion_main!(benches);
