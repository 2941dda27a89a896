use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use doorplay_core::{DoorStage, DoorState, DoorView, Screen};
use doorplay_render::SkiaRenderer;
use doorplay_timing::HighPrecisionTimer;
use std::path::PathBuf;

fn door(stage: DoorStage, scale: f32) -> Screen {
    Screen::Door(DoorView {
        image: PathBuf::from("img/Doors/p3r5.jpg"),
        caption: "Reward: 5, Punishment: 3".to_string(),
        scale,
        location: 0.4,
        distance: 64,
        total_coins: 12,
        stage,
        progress: Some((4, 9)),
        practice: false,
    })
}

fn harness() -> (SkiaRenderer, Vec<u8>, HighPrecisionTimer) {
    let (width, height) = (1280u32, 720u32);
    let mut r = SkiaRenderer::new(width, height, None).unwrap();
    // Populate the image cache
    r.render_screen(&door(DoorStage::Approach, 1.0));
    let fb = vec![0u8; (width * height * 4) as usize];
    (r, fb, HighPrecisionTimer::new())
}

pub fn bench_door_screens(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_screen");
    g.sample_size(60);

    g.bench_function("approach", |b| {
        let screen = door(DoorStage::Approach, 1.4);
        b.iter_batched(
            harness,
            |(mut r, mut fb, t)| {
                black_box(r.render_frame(&screen, &mut fb, &t).ok());
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("revealed", |b| {
        let screen = door(
            DoorStage::Revealed {
                state: DoorState::Rewarded,
                coin_delta: 5,
            },
            1.8,
        );
        b.iter_batched(
            harness,
            |(mut r, mut fb, t)| {
                black_box(r.render_frame(&screen, &mut fb, &t).ok());
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("iti", |b| {
        let screen = door(DoorStage::Iti { fraction: 0.3 }, 1.0);
        b.iter_batched(
            harness,
            |(mut r, mut fb, t)| {
                black_box(r.render_frame(&screen, &mut fb, &t).ok());
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_door_screens);
criterion_main!(benches);
