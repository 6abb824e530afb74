//! Mesh Swap
//!
//! This example drives a body that is either a pulsing blue sphere or a
//! spinning red cube, swapping between the two whenever the swap key is down.
//!
//! Key concepts:
//! - Root states (Sphere, Cube) and a sub-state (RedCube) attached on entry
//! - Per-frame `update` and per-step `fixed_update` driven by the host loop
//! - Transient state data reset when the pool hands an instance out again
//! - Shared accessors kept in a helper instead of an intermediate state type
//!
//! Run with: cargo run --example mesh_swap
//! More detail: RUST_LOG=statepool=debug cargo run --example mesh_swap

use statepool::{MachineBuilder, Pooled, State, StateContext};
use tracing_subscriber::{fmt, EnvFilter};

const FIXED_DELTA: f32 = 0.02;
const FRAMES: u32 = 120;
const SWAP_EVERY: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mesh {
    Sphere,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    Blue,
    Red,
}

#[derive(Debug)]
struct Transform {
    scale: f32,
    yaw: f32,
}

/// The host object the states act on.
#[derive(Debug)]
struct Tester {
    transform: Transform,
    mesh: Option<Mesh>,
    color: Option<Color>,
    spin_speed: f32,
    scale_speed: f32,
    time: f32,
}

impl Default for Tester {
    fn default() -> Self {
        Self {
            transform: Transform { scale: 1.0, yaw: 0.0 },
            mesh: None,
            color: None,
            spin_speed: 90.0,
            scale_speed: 2.0,
            time: 0.0,
        }
    }
}

#[derive(Default)]
struct TesterInput {
    swap_state: bool,
}

type Cx<'a> = StateContext<'a, Tester, TesterInput>;

/// Accessors every tester state shares.
struct Rig;

impl Rig {
    fn transform<'c>(cx: &'c mut Cx<'_>) -> &'c mut Transform {
        &mut cx.context_mut().transform
    }

    fn dress(cx: &mut Cx<'_>, mesh: Option<Mesh>, color: Option<Color>) {
        let tester = cx.context_mut();
        if mesh.is_some() {
            tester.mesh = mesh;
        }
        if color.is_some() {
            tester.color = color;
        }
    }

    fn swap_pressed(cx: &Cx<'_>) -> bool {
        cx.input().swap_state
    }
}

/// Pulses the body's scale between 0 and 3.
#[derive(Default)]
struct Sphere {
    ping_pong: f32,
}

impl Pooled for Sphere {
    fn on_dequeued(&mut self) {
        self.ping_pong = 0.0;
    }
}

impl State<Tester, TesterInput> for Sphere {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        Rig::dress(cx, Some(Mesh::Sphere), Some(Color::Blue));
    }

    fn exit(&mut self, cx: &mut Cx<'_>) {
        Rig::transform(cx).scale = 1.0;
    }

    fn update(&mut self, cx: &mut Cx<'_>) {
        let tester = cx.context();
        self.ping_pong = ping_pong(tester.time * tester.scale_speed, 3.0);
    }

    fn fixed_update(&mut self, cx: &mut Cx<'_>) {
        Rig::transform(cx).scale = self.ping_pong;
    }

    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if Rig::swap_pressed(cx) {
            cx.switch_state::<Cube>();
        }
    }
}

/// Spins the body around its vertical axis.
#[derive(Default)]
struct Cube;

impl Pooled for Cube {}

impl State<Tester, TesterInput> for Cube {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        Rig::dress(cx, Some(Mesh::Cube), None);
    }

    fn exit(&mut self, cx: &mut Cx<'_>) {
        Rig::transform(cx).yaw = 0.0;
    }

    fn fixed_update(&mut self, cx: &mut Cx<'_>) {
        let speed = cx.context().spin_speed;
        let transform = Rig::transform(cx);
        transform.yaw = (transform.yaw + speed * FIXED_DELTA) % 360.0;
    }

    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if Rig::swap_pressed(cx) {
            cx.switch_state::<Sphere>();
        }
    }

    fn init_sub_state(&mut self, cx: &mut Cx<'_>) {
        cx.set_sub_state::<RedCube>();
    }
}

/// Colors the cube red.
#[derive(Default)]
struct RedCube;

impl Pooled for RedCube {}

impl State<Tester, TesterInput> for RedCube {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        Rig::dress(cx, None, Some(Color::Red));
    }
}

fn ping_pong(t: f32, length: f32) -> f32 {
    let t = t % (length * 2.0);
    length - (t - length).abs()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let mut machine = MachineBuilder::<Tester, TesterInput>::new()
        .state::<Sphere>(1)
        .state::<Cube>(1)
        .state::<RedCube>(1)
        .fixed_update_checks(false)
        .build()?;

    let mut tester = Tester::default();
    let mut input = TesterInput::default();

    machine.start::<Sphere>(&mut tester, &input)?;
    tracing::info!(hierarchy = %machine, "started");

    for frame in 1..=FRAMES {
        tester.time += FIXED_DELTA;
        input.swap_state = frame % SWAP_EVERY == 0;

        machine.update(&mut tester, &input);
        machine.fixed_update(&mut tester, &input);

        if input.swap_state {
            tracing::info!(
                frame,
                hierarchy = %machine,
                mesh = ?tester.mesh,
                color = ?tester.color,
                "swapped"
            );
        }
    }

    tracing::info!(
        scale = tester.transform.scale,
        yaw = tester.transform.yaw,
        "final transform"
    );

    machine.stop(&mut tester, &input);

    let pool = machine.pool().borrow();
    for key in ["Sphere", "Cube", "RedCube"] {
        if let Some(stats) = pool.stats(key) {
            tracing::info!(key, stats = %serde_json::to_string(&stats)?, "pool stats");
        }
    }
    println!("{}", serde_json::to_string_pretty(machine.history())?);

    Ok(())
}
