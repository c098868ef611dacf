//! Integration tests for the frame driver.

use strata_shared::V3;
use strata_sim::{EntityFlags, EntityReference, GameSession, HeroInput, SimConfig, SimError};

const DT: f32 = 1.0 / 60.0;

fn session() -> GameSession {
    GameSession::new(SimConfig::default()).unwrap()
}

#[test]
fn test_session_loads_shipped_config() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/sim.toml");
    let session = GameSession::from_config_file(path).unwrap();
    assert_eq!(session.state().config, SimConfig::default());
    assert!(matches!(
        GameSession::from_config_file("does/not/exist.toml"),
        Err(SimError::Config(_))
    ));
}

#[test]
fn test_thrown_sword_flies_and_returns() {
    let mut session = session();
    let hero = session.add_hero(session.position(V3::ZERO)).unwrap();
    let EntityReference::Unresolved(sword) = session.state().entities.get(hero).unwrap().sim.sword
    else {
        panic!("stored references are unresolved");
    };

    let throw = HeroInput {
        hero,
        acceleration: V3::ZERO,
        throw: Some(V3::X),
    };
    session.update(DT, &[throw]).unwrap();

    let stored_sword = session.state().entities.get(sword).unwrap();
    assert!(stored_sword.sim.is_spatial());
    assert!(stored_sword.p.is_valid());
    assert_eq!(session.state().collision_rules.lookup(sword, hero), Some(false));

    let idle = HeroInput {
        hero,
        ..HeroInput::default()
    };
    let mut returned = false;
    for _ in 0..200 {
        let report = session.update(DT, &[idle]).unwrap();
        if report.swords_returned > 0 {
            returned = true;
            break;
        }
    }
    assert!(returned);

    let stored_sword = session.state().entities.get(sword).unwrap();
    assert!(!stored_sword.sim.is_spatial());
    assert!(!stored_sword.p.is_valid());
    assert!(session.state().collision_rules.is_empty());
    assert_eq!(
        session.state().entities.get(hero).unwrap().sim.sword,
        EntityReference::Unresolved(sword)
    );
}

#[test]
fn test_thrown_sword_strikes_monster_once() {
    let mut session = session();
    let hero = session.add_hero(session.position(V3::ZERO)).unwrap();
    let monster = session.add_monster(session.position(V3::new(2.0, 0.0, 0.0))).unwrap();

    let throw = HeroInput {
        hero,
        acceleration: V3::ZERO,
        throw: Some(V3::X),
    };
    session.update(DT, &[throw]).unwrap();
    for _ in 0..120 {
        session.update(DT, &[]).unwrap();
    }

    assert_eq!(session.state().entities.get(monster).unwrap().sim.hit_point_max, 2);
}

#[test]
fn test_familiar_follows_hero() {
    let mut session = session();
    session.add_hero(session.position(V3::ZERO)).unwrap();
    let familiar = session.add_familiar(session.position(V3::new(6.0, 0.0, 0.0))).unwrap();

    for _ in 0..30 {
        session.update(DT, &[]).unwrap();
    }

    let distance = session
        .state()
        .world
        .subtract(
            &session.state().entities.get(familiar).unwrap().p,
            &session.state().camera.position,
        )
        .x;
    assert!(distance < 6.0);
    assert!(distance > 1.0);
}

#[test]
fn test_camera_tracks_moving_hero() {
    let mut session = session();
    let hero = session.add_hero(session.position(V3::ZERO)).unwrap();
    let walk = HeroInput {
        hero,
        acceleration: V3::X,
        throw: None,
    };

    for _ in 0..60 {
        session.update(DT, &[walk]).unwrap();
    }

    let hero_p = session.state().entities.get(hero).unwrap().p;
    let camera = session.state().camera.position;
    assert_eq!(camera.chunk(), hero_p.chunk());
    assert_eq!(camera.offset.x, hero_p.offset.x);
    assert!(hero_p.offset.x > 1.0);
}

#[test]
fn test_walls_stop_hero() {
    let mut session = session();
    let hero = session.add_hero(session.position(V3::ZERO)).unwrap();
    for y in -2..=2i8 {
        let tile = session.state().config.world.tile_side_in_meters;
        session
            .add_wall(session.position(V3::new(3.0, f32::from(y) * tile, 0.0)))
            .unwrap();
    }
    let walk = HeroInput {
        hero,
        acceleration: V3::X,
        throw: None,
    };

    let mut collisions = 0;
    for _ in 0..180 {
        collisions += session.update(DT, &[walk]).unwrap().collisions;
    }

    let hero_p = session.state().entities.get(hero).unwrap().p;
    // Wall face at 3 - 0.7, hero half width 0.5
    assert!(hero_p.offset.x < 1.8 + 1e-3);
    assert!(collisions > 0);
}

#[test]
fn test_failed_frame_releases_everything() {
    let mut session = session();
    let hero = session.add_hero(session.position(V3::ZERO)).unwrap();
    let wall = session.add_wall(session.position(V3::new(3.0, 0.0, 0.0))).unwrap();

    session
        .state_mut()
        .entities
        .get_mut(wall)
        .unwrap()
        .sim
        .flags
        .insert(EntityFlags::SIMMING);

    let err = session.update(DT, &[]).unwrap_err();
    assert_eq!(err, SimError::AlreadySimming(wall));
    assert_eq!(session.arena().used(), 0);
    assert!(!session
        .state()
        .entities
        .get(hero)
        .unwrap()
        .sim
        .is_set(EntityFlags::SIMMING));
}
