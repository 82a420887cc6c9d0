//! Performance benchmarks for recast-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recast_engine::{
    marshal, resolve, DeclaredRenames, MarshalConfig, Marshaller, Reflect, ReflectRecord,
    RenameCollision, Value,
};

#[derive(Debug, Clone, Default, Reflect)]
struct User {
    id: u64,
    #[recast(rename(UserRow = "display_name"))]
    name: String,
    email: Option<String>,
    age: u32,
    address: Address,
}

#[derive(Debug, Clone, Default, Reflect)]
struct Address {
    street: String,
    city: String,
}

#[derive(Debug, Clone, Default, Reflect)]
struct UserRow {
    id: u64,
    display_name: String,
    email: String,
    age: u32,
    address: AddressRow,
}

#[derive(Debug, Clone, Default, Reflect)]
struct AddressRow {
    city: String,
    street: String,
}

fn user(i: u64) -> User {
    User {
        id: i,
        name: format!("User {}", i),
        email: Some(format!("user{}@example.com", i)),
        age: 30,
        address: Address {
            street: "Main St".to_string(),
            city: "Springfield".to_string(),
        },
    }
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("records");

    // Same type, field by field
    group.bench_function("identical", |b| {
        let source = user(1);
        b.iter(|| {
            let mut target = User::default();
            marshal(black_box(&source), &mut target)
        })
    });

    // Renamed field, nested record and optional source
    group.bench_function("converted", |b| {
        let source = user(1);
        b.iter(|| {
            let mut target = UserRow::default();
            marshal(black_box(&source), &mut target)
        })
    });

    group.bench_function("converted_strict", |b| {
        let marshaller = Marshaller::new(MarshalConfig::strict());
        let source = user(1);
        b.iter(|| {
            let mut target = UserRow::default();
            let _ = marshaller.marshal(black_box(&source), &mut target);
        })
    });

    group.finish();
}

fn bench_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequences");

    for size in [10u64, 100, 1000].iter() {
        let users: Vec<User> = (0..*size).map(user).collect();

        group.bench_with_input(BenchmarkId::new("append", size), &users, |b, users| {
            b.iter(|| {
                let mut target: Vec<User> = Vec::new();
                marshal(black_box(users), &mut target)
            })
        });

        group.bench_with_input(BenchmarkId::new("elementwise", size), &users, |b, users| {
            b.iter(|| {
                let mut target: Vec<UserRow> = Vec::new();
                marshal(black_box(users), &mut target)
            })
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    group.bench_function("resolve", |b| {
        let Value::Record(record) = user(1).to_value() else {
            unreachable!("derived records lower to record values");
        };
        let other = UserRow::record_type().identity().clone();
        b.iter(|| {
            resolve(
                black_box(&record),
                black_box(&other),
                &DeclaredRenames,
                RenameCollision::LastWins,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_records, bench_sequences, bench_resolution);
criterion_main!(benches);
