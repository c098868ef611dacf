//! # Sim Soak
//!
//! Headless run of a walled room with a hero, a familiar, monsters and a
//! stairwell. The hero circles the room and throws its sword every second.
//! Prints frame timing and commit counters at the end.
//!
//! Usage: `sim_soak [config.toml] [frames]`

use std::time::{Duration, Instant};

use strata_shared::V3;
use strata_sim::{GameSession, HeroInput, SimConfig, SimResult};

const ROOM_TILES_X: i32 = 17;
const ROOM_TILES_Y: i32 = 9;
const DEFAULT_FRAMES: u32 = 3_600;
const DT: f32 = 1.0 / 60.0;

fn build_room(session: &mut GameSession) -> SimResult<strata_core::StorageIndex> {
    let tile = session.state().config.world.tile_side_in_meters;
    let half_x = ROOM_TILES_X / 2;
    let half_y = ROOM_TILES_Y / 2;

    for tile_y in -half_y..=half_y {
        for tile_x in -half_x..=half_x {
            let on_edge = tile_x.abs() == half_x || tile_y.abs() == half_y;
            let doorway = tile_x == 0 || tile_y == 0;
            if on_edge && !doorway {
                #[allow(clippy::cast_precision_loss)]
                let offset = V3::new(tile_x as f32 * tile, tile_y as f32 * tile, 0.0);
                session.add_wall(session.position(offset))?;
            }
        }
    }

    session.add_stairwell(session.position(V3::new(4.0 * tile, -2.0 * tile, 0.0)))?;
    for i in 0..3u8 {
        let x = -4.0 + 2.0 * f32::from(i);
        session.add_monster(session.position(V3::new(x * tile, 2.0 * tile, 0.0)))?;
    }
    session.add_familiar(session.position(V3::new(-2.0 * tile, -1.0 * tile, 0.0)))?;
    session.add_hero(session.position(V3::ZERO))
}

fn main() -> SimResult<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut session = GameSession::new(config)?;
    let hero = build_room(&mut session)?;

    println!("STRATA sim soak");
    println!("  stored entities: {}", session.state().entities.len());
    println!("  frames:          {frames}");

    let mut total = Duration::ZERO;
    let mut worst = Duration::ZERO;
    let mut collisions = 0u64;
    let mut moved = 0u64;
    let mut swords_returned = 0u64;
    let mut relocated = 0u64;

    for frame in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let angle = frame as f32 * DT;
        let input = HeroInput {
            hero,
            acceleration: V3::new(angle.cos(), angle.sin(), 0.0),
            throw: (frame % 60 == 0).then(|| V3::new(-angle.sin(), angle.cos(), 0.0)),
        };

        let start = Instant::now();
        let report = session.update(DT, &[input])?;
        let elapsed = start.elapsed();

        total += elapsed;
        worst = worst.max(elapsed);
        collisions += u64::from(report.collisions);
        moved += report.moved as u64;
        swords_returned += report.swords_returned as u64;
        relocated += report.end.relocated as u64;
    }

    let average = total / frames.max(1);
    println!();
    println!("  avg frame:       {} us", average.as_micros());
    println!("  worst frame:     {} us", worst.as_micros());
    println!("  arena peak:      {} bytes", session.arena().high_water());
    println!("  moves:           {moved}");
    println!("  contacts:        {collisions}");
    println!("  swords returned: {swords_returned}");
    println!("  relocations:     {relocated}");
    println!("  collision rules: {}", session.state().collision_rules.len());
    Ok(())
}
