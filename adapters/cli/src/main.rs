#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Adventure session.

mod autopilot;
mod logging;
mod physics;

use std::{fs, path::PathBuf, time::Duration};

use adventure_core::{Command, ControllerId, Event, HeroClass, PlayerSlot, Tuning};
use adventure_system_bootstrap::{load_in_background, load_tuning, DEMO_LAYOUT};
use adventure_system_director::{Director, InputMode};
use adventure_system_input::{Arbiter, ControllerNotice};
use adventure_world::{self as world, query, World};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use crate::{autopilot::Autopilot, physics::CirclePhysics};

/// Wall-clock length of one simulated frame.
const FRAME: Duration = Duration::from_micros(16_667);

/// Runs a scripted Adventure session without a window.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Partial tuning overrides in TOML.
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Level layout in TOML; the bundled demo level is used when absent.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Seed for every random choice in the session.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Class of the heroes.
    #[arg(long, value_enum, default_value_t = HeroChoice::Warrior)]
    hero: HeroChoice,
    /// Number of gamepads connected at start.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=4))]
    pads: u8,
    /// Steer the default player with taps instead of a gamepad.
    #[arg(long)]
    handheld: bool,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeroChoice {
    Warrior,
    Archer,
}

impl From<HeroChoice> for HeroClass {
    fn from(choice: HeroChoice) -> Self {
        match choice {
            HeroChoice::Warrior => HeroClass::Warrior,
            HeroChoice::Archer => HeroClass::Archer,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    frames: u64,
    goblins_released: u32,
    projectiles: u32,
    heroes_lost: u32,
    enemies_killed: u32,
    game_over: bool,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GoblinGenerated { .. } => self.goblins_released += 1,
                Event::ProjectileFired { .. } => self.projectiles += 1,
                Event::HeroKilled { .. } => self.heroes_lost += 1,
                Event::CharacterDied { .. } => self.enemies_killed += 1,
                Event::LivesExhausted { .. } => self.game_over = true,
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let tuning = match &args.tuning {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read tuning file {}", path.display()))?;
            load_tuning(&source)
                .with_context(|| format!("failed to load tuning from {}", path.display()))?
        }
        None => Tuning::default(),
    };
    let layout = match &args.layout {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read layout file {}", path.display()))?,
        None => DEMO_LAYOUT.to_owned(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);

    let world = load_in_background(layout, tuning, seed)
        .wait()
        .context("failed to load the level")?;

    let (world, tally) = play(world, &args);
    report(&world, &tally, seed);
    Ok(())
}

fn play(mut world: World, args: &Args) -> (World, Tally) {
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::StartLevel {
            class: args.hero.into(),
        },
        &mut events,
    );

    let notices: Vec<_> = (0..args.pads)
        .map(|index| ControllerNotice::Connected {
            controller: ControllerId::new(u32::from(index)),
            preset: None,
        })
        .collect();
    let mut arbiter = Arbiter::new();
    let mut commands = Vec::new();
    arbiter.handle(&notices, &query::roster(&world), &mut commands);
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    if !arbiter.unassigned().is_empty() {
        warn!(
            "{} controllers are waiting for a free slot",
            arbiter.unassigned().len()
        );
    }

    let mode = if args.handheld {
        InputMode::Handheld
    } else {
        InputMode::Desktop
    };
    let mut autopilot = Autopilot::new(&world, args.handheld);
    info!("session started with {} scripted players", autopilot.len());

    let mut physics = CirclePhysics::default();
    let mut bodies = Vec::new();
    query::bodies(&world, &mut bodies);
    physics.observe_walls(&bodies);

    let mut director = Director::new(mode);
    let mut tally = Tally::default();
    let mut now = Duration::ZERO;
    for frame in 0..args.frames {
        autopilot.drive(&world, frame);
        events.clear();
        let _ = director.update(&mut world, now, &mut physics, &mut events);
        tally.record(&events);
        tally.frames += 1;
        if tally.game_over {
            info!("every life spent after {frame} frames");
            break;
        }
        now += FRAME;
    }

    (world, tally)
}

fn report(world: &World, tally: &Tally, seed: u64) {
    println!(
        "seed {seed:#x}, {} frames, {:.1}s simulated",
        tally.frames,
        query::clock(world).as_secs_f32()
    );
    println!(
        "goblins released {}, projectiles fired {}, enemies killed {}, heroes lost {}",
        tally.goblins_released, tally.projectiles, tally.enemies_killed, tally.heroes_lost
    );
    for player in PlayerSlot::all() {
        if let Some(snapshot) = query::player(world, player) {
            println!(
                "player {}: score {}, lives left {}",
                player.index() + 1,
                snapshot.score,
                snapshot.lives_left
            );
        }
    }
    let allocation = query::goblin_allocation(world);
    println!("goblins active {}/{}", allocation.active, allocation.capacity);
    if tally.game_over {
        println!("game over");
    }
}
