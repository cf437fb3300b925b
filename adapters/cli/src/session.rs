//! Headless session loop driving the world at a fixed tick rate.

use std::{cell::RefCell, fmt, rc::Rc, thread};

use anyhow::{bail, Context, Result};
use serpents_core::{
    Command, Event, GameOverReason, MoveResult, SerpentName, SessionPhase, SessionSnapshot,
};
use serpents_system_input::Input;
use serpents_system_roster::{self as roster, Roster};
use serpents_world::{self as world, query, World};

use crate::config::Settings;

/// Outcome of a finished session.
#[derive(Debug)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) phase: SessionPhase,
    pub(crate) apples: u32,
    pub(crate) deaths: Vec<(SerpentName, MoveResult)>,
    pub(crate) snapshot: SessionSnapshot,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.phase {
            SessionPhase::Over(GameOverReason::NoSerpentsRemaining) => "no serpents remaining",
            SessionPhase::Over(GameOverReason::GridFull) => "grid full",
            SessionPhase::Running => "tick limit reached",
            SessionPhase::Setup => "never started",
        };
        writeln!(f, "session ended after {} ticks: {outcome}", self.ticks)?;
        writeln!(f, "apples eaten: {}", self.apples)?;
        for (serpent, cause) in &self.deaths {
            writeln!(f, "  {serpent} died: {cause:?}")?;
        }
        for serpent in self.snapshot.serpents.iter() {
            let state = if serpent.alive { "alive" } else { "dead" };
            writeln!(
                f,
                "  {} length {} ({state})",
                serpent.name,
                serpent.segments.len()
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Tally {
    apples: u32,
    deaths: Vec<(SerpentName, MoveResult)>,
}

/// Runs a full session: players join, the game starts, and the world ticks
/// until it is over or the tick limit is reached.
pub(crate) fn run(settings: &Settings) -> Result<Summary> {
    let config = world::Config::new(settings.width, settings.height, settings.seed)
        .with_field_size(settings.field_size);
    let mut world = World::new(config).context("failed to build the play grid")?;

    let tally = Rc::new(RefCell::new(Tally::default()));
    let sink = Rc::clone(&tally);
    let _ = world.subscribe(move |event: &Event| match event {
        Event::AppleConsumed { .. } => sink.borrow_mut().apples += 1,
        Event::SerpentDied { serpent, cause } => {
            sink.borrow_mut().deaths.push((serpent.clone(), *cause));
        }
        _ => {}
    });

    let mut roster = Roster::new(
        roster::Config::new(settings.seed.rotate_left(29)).with_start_length(settings.start_length),
    );
    let mut input = Input::new();
    join_players(&mut world, &mut roster, settings.players)?;
    for (index, name) in roster.members().iter().enumerate() {
        input.bind(name.clone(), settings.keymap_for(index));
    }
    tracing::info!(
        players = roster.len(),
        width = settings.width,
        height = settings.height,
        "players joined"
    );

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartGame, &mut events)?;
    if let Some(Event::GameStartRejected { reason }) = events
        .iter()
        .find(|event| matches!(event, Event::GameStartRejected { .. }))
    {
        bail!("game could not start: {reason:?}");
    }

    let interval = settings.tick_interval();
    let mut commands = Vec::new();
    while query::is_running(&world) && query::tick_index(&world) < settings.max_ticks {
        let pressed = settings.keys_at(query::tick_index(&world));
        input.handle(&events, &pressed, &mut commands);
        roster.handle(&events, query::dimensions(&world), &mut commands);
        events.clear();

        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events)?;
        }
        world::apply(&mut world, Command::Tick, &mut events)?;

        if settings.realtime {
            thread::sleep(interval);
        }
    }

    let tally = tally.take();
    Ok(Summary {
        ticks: query::tick_index(&world),
        phase: query::phase(&world),
        apples: tally.apples,
        deaths: tally.deaths,
        snapshot: query::session_snapshot(&world),
    })
}

/// Adds players and feeds rejected placements back to the roster until every
/// creation has been answered.
fn join_players(world: &mut World, roster: &mut Roster, players: u32) -> Result<()> {
    let dimensions = query::dimensions(world);
    let mut commands = Vec::new();
    for _ in 0..players {
        let _ = roster.add_player(dimensions, &mut commands);
    }

    while !commands.is_empty() {
        let mut events = Vec::new();
        for command in commands.drain(..) {
            world::apply(world, command, &mut events)?;
        }
        roster.handle(&events, dimensions, &mut commands);
    }

    if roster.is_empty() {
        bail!("no player could be placed on a {dimensions:?} grid");
    }
    Ok(())
}
