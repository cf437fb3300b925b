use serpents_core::{
    CellIndex, Command, CreationError, Direction, Event, SerpentColor, SerpentName,
};
use serpents_system_roster::{Config, Roster};
use serpents_world::{self as world, query, World};

fn settle(world: &mut World, roster: &mut Roster, mut commands: Vec<Command>) -> Vec<Event> {
    let dimensions = query::dimensions(world);
    let mut log = Vec::new();
    while !commands.is_empty() {
        let mut events = Vec::new();
        for command in commands.drain(..) {
            world::apply(world, command, &mut events).expect("grid invariants hold");
        }
        roster.handle(&events, dimensions, &mut commands);
        log.extend(events);
    }
    log
}

#[test]
fn added_players_are_placed_facing_right() {
    let mut world = World::new(world::Config::new(50, 40, 3)).expect("valid dimensions");
    let mut roster = Roster::new(Config::new(0x1234_5678).with_start_length(3));
    let dimensions = query::dimensions(&world);

    let mut commands = Vec::new();
    for _ in 0..4 {
        let _ = roster.add_player(dimensions, &mut commands);
    }
    let _ = settle(&mut world, &mut roster, commands);

    assert!(!roster.has_pending());
    let mut placed = query::active_roster(&world);
    placed.sort();
    assert_eq!(placed, roster.members().to_vec());
    for (index, name) in roster.members().iter().enumerate() {
        assert_eq!(name.as_str(), format!("Jormungandr_{index}"));
        let serpent = query::serpent(&world, name).expect("serpent placed");
        assert_eq!(serpent.direction(), Direction::Right);
        assert_eq!(serpent.segments().len(), 3);
        assert!(serpent.head().get() < 50 * 40 / 2);
    }
}

#[test]
fn rejected_placement_is_retried_elsewhere() {
    let mut roster = Roster::new(Config::new(9));
    let dimensions = serpents_core::GridDimensions::new(10, 10);

    let mut commands = Vec::new();
    let name = roster.add_player(dimensions, &mut commands);
    let first_color = match &commands[0] {
        Command::CreateSerpent { color, .. } => *color,
        other => panic!("unexpected command emitted: {other:?}"),
    };

    let mut retries = Vec::new();
    roster.handle(
        &[Event::SerpentCreationRejected {
            serpent: name.clone(),
            reason: CreationError::Occupied,
        }],
        dimensions,
        &mut retries,
    );

    match retries.as_slice() {
        [Command::CreateSerpent {
            name: retried,
            color,
            direction,
            ..
        }] => {
            assert_eq!(*retried, name);
            assert_eq!(*color, first_color);
            assert_eq!(*direction, Direction::Right);
        }
        other => panic!("expected a single retry, got {other:?}"),
    }
    assert!(roster.has_pending());
}

#[test]
fn player_is_dropped_after_bounded_attempts() {
    let mut roster = Roster::new(Config::new(9).with_max_attempts(2));
    let dimensions = serpents_core::GridDimensions::new(10, 10);
    let mut commands = Vec::new();
    let name = roster.add_player(dimensions, &mut commands);

    let rejection = [Event::SerpentCreationRejected {
        serpent: name,
        reason: CreationError::Occupied,
    }];
    let mut retries = Vec::new();
    roster.handle(&rejection, dimensions, &mut retries);
    assert_eq!(retries.len(), 1);

    retries.clear();
    roster.handle(&rejection, dimensions, &mut retries);
    assert!(retries.is_empty());
    assert!(roster.is_empty());
    assert!(!roster.has_pending());
}

#[test]
fn duplicate_name_is_not_retried() {
    let mut world = World::new(world::Config::new(10, 10, 3)).expect("valid dimensions");
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::CreateSerpent {
            name: SerpentName::new("Jormungandr_0"),
            start: CellIndex::new(95),
            direction: Direction::Up,
            length: 1,
            color: SerpentColor::from_rgb(0x2f, 0x95, 0x32),
        },
        &mut events,
    )
    .expect("grid invariants hold");

    let mut roster = Roster::new(Config::new(4));
    let mut commands = Vec::new();
    let _ = roster.add_player(query::dimensions(&world), &mut commands);
    let log = settle(&mut world, &mut roster, commands);

    assert!(log.iter().any(|event| matches!(
        event,
        Event::SerpentCreationRejected {
            reason: CreationError::DuplicateName,
            ..
        }
    )));
    assert!(roster.is_empty());
}

#[test]
fn remove_last_removes_most_recent_player() {
    let mut world = World::new(world::Config::new(50, 40, 3)).expect("valid dimensions");
    let mut roster = Roster::new(Config::new(21));
    let dimensions = query::dimensions(&world);

    let mut commands = Vec::new();
    let first = roster.add_player(dimensions, &mut commands);
    let _ = roster.add_player(dimensions, &mut commands);
    let _ = settle(&mut world, &mut roster, commands);

    let mut commands = Vec::new();
    let removed = roster.remove_last(&mut commands).expect("roster not empty");
    assert_eq!(removed.as_str(), "Jormungandr_1");
    let log = settle(&mut world, &mut roster, commands);

    assert_eq!(log, vec![Event::SerpentRemoved { serpent: removed }]);
    assert_eq!(roster.members(), &[first.clone()]);
    assert_eq!(query::active_roster(&world), vec![first]);

    let mut commands = Vec::new();
    let _ = roster.remove_last(&mut commands);
    assert!(roster.remove_last(&mut commands).is_none());
}
