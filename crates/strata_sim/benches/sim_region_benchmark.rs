//! # Sim Region Benchmark
//!
//! Cost of one frame over a dense field of entities:
//! 1. begin + end with no motion (pull-in and commit only)
//! 2. begin + move every updatable entity + end
//! 3. full `GameSession::update`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::FrameArena;
use strata_shared::{Rect3, V3};
use strata_sim::{
    move_entity, EntityType, GameSession, HeroInput, MoveSpec, SimConfig, SimEntity, SimRegion,
    WorldPosition, WorldState,
};

const GRID_SIDE: i32 = 40;
const SPACING: f32 = 1.5;
const DT: f32 = 1.0 / 60.0;

fn populated_state() -> WorldState {
    let mut state = WorldState::new(SimConfig::default());
    for y in 0..GRID_SIDE {
        for x in 0..GRID_SIDE {
            let entity_type = if (x + y) % 5 == 0 {
                EntityType::Wall
            } else {
                EntityType::Familiar
            };
            #[allow(clippy::cast_precision_loss)]
            let offset = V3::new(
                (x - GRID_SIDE / 2) as f32 * SPACING,
                (y - GRID_SIDE / 2) as f32 * SPACING,
                0.0,
            );
            let p = state.position_near_camera(offset);
            state
                .add_stored_entity(SimEntity::new(entity_type, V3::new(1.0, 1.0, 1.0)), Some(p))
                .expect("storage sized for the grid");
        }
    }
    state
}

fn bounds() -> Rect3 {
    Rect3::center_dim(V3::ZERO, V3::new(40.0, 40.0, 3.0))
}

fn bench_begin_end(c: &mut Criterion) {
    let mut state = populated_state();
    let mut arena = FrameArena::new(state.config.region.arena_bytes);

    c.bench_function("region_begin_end_1600", |b| {
        b.iter(|| {
            let region =
                SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), DT).unwrap();
            black_box(region.entity_count());
            black_box(region.end(&mut state).unwrap());
            arena.reset();
        });
    });
}

fn bench_move_all(c: &mut Criterion) {
    let mut state = populated_state();
    let mut arena = FrameArena::new(state.config.region.arena_bytes);
    let spec = MoveSpec {
        normalize_acceleration: true,
        speed: 50.0,
        drag: 8.0,
    };

    c.bench_function("region_move_all_1600", |b| {
        b.iter(|| {
            let mut region =
                SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), DT).unwrap();
            let handles: Vec<_> = region.updatable_handles().collect();
            for handle in handles {
                if region.entity(handle).unwrap().entity_type == EntityType::Familiar {
                    black_box(
                        move_entity(
                            &mut region,
                            &mut state.collision_rules,
                            handle,
                            DT,
                            &spec,
                            V3::new(1.0, 0.5, 0.0),
                        )
                        .unwrap(),
                    );
                }
            }
            black_box(region.end(&mut state).unwrap());
            arena.reset();
        });
    });
}

fn bench_session_update(c: &mut Criterion) {
    let mut session = GameSession::new(SimConfig::default()).unwrap();
    for i in 0..200u8 {
        let offset = V3::new(f32::from(i % 20) * 2.0 - 20.0, f32::from(i / 20) * 2.0 - 10.0, 0.0);
        session.add_monster(session.position(offset)).unwrap();
    }
    let hero = session.add_hero(session.position(V3::new(0.0, 12.0, 0.0))).unwrap();
    let input = HeroInput {
        hero,
        acceleration: V3::X,
        throw: None,
    };

    c.bench_function("session_update_200_monsters", |b| {
        b.iter(|| black_box(session.update(DT, &[input]).unwrap()));
    });
}

criterion_group!(benches, bench_begin_end, bench_move_all, bench_session_update);
criterion_main!(benches);
