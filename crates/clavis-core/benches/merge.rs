use clavis_core::merge_projects;
use clavis_core::model::{Entity, Feature, FeatureState, Project, Traits};
use clavis_core::sanitize::sanitize;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SIZES: [(usize, usize); 3] = [(20, 8), (200, 40), (1000, 60)];

const GENERA: [&str; 8] = [
    "Inga", "Acacia", "Ficus", "Cedrela", "Mimosa", "Eugenia", "Miconia", "Ocotea",
];

/// Deterministic synthetic key with `entities` taxa and `features` characters.
fn synthetic_project(prefix: &str, entities: usize, features: usize) -> Project {
    let features: Vec<Feature> = (0..features)
        .map(|f| Feature {
            id: format!("{prefix}f{f}"),
            name: format!("Character {f} shape"),
            image_url: None,
            states: (0..4)
                .map(|s| FeatureState {
                    id: format!("{prefix}f{f}s{s}"),
                    label: format!("State {s}"),
                    image_url: None,
                })
                .collect(),
        })
        .collect();

    let entities = (0..entities)
        .map(|e| {
            let traits: Traits = features
                .iter()
                .enumerate()
                .filter(|(f, _)| (e + f) % 3 != 0)
                .map(|(f, feature)| {
                    let state = &feature.states[(e * 7 + f) % feature.states.len()];
                    (feature.id.clone(), vec![state.id.clone()])
                })
                .collect();
            Entity {
                id: format!("{prefix}e{e}"),
                name: format!("{} species{e}", GENERA[e % GENERA.len()]),
                description: Some(format!("Synthetic taxon number {e} used for benchmarking.")),
                traits,
                ..Entity::default()
            }
        })
        .collect();

    Project {
        id: format!("{prefix}project"),
        name: "Synthetic key".into(),
        description: String::new(),
        features,
        entities,
    }
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge.synthetic");

    for (entities, features) in SIZES {
        let existing = synthetic_project("", entities, features);
        // Candidate ids never collide, so every match goes through names.
        let candidate = synthetic_project("ai-", entities / 2, features);
        let label = format!("{entities}x{features}");
        group.throughput(Throughput::Elements(entities as u64));

        group.bench_with_input(
            BenchmarkId::new("merge", &label),
            &(&candidate, &existing),
            |b, (candidate, existing)| b.iter(|| black_box(merge_projects(candidate, existing))),
        );

        group.bench_with_input(BenchmarkId::new("sanitize", &label), &existing, |b, existing| {
            b.iter(|| black_box(sanitize(existing)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
