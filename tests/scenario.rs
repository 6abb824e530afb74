//! The Sphere / Cube / RedCube mesh swap, driven tick by tick.

use statepool::{MachineBuilder, Pooled, State, StateContext, StateMachine, TransitionKind};

#[derive(Debug, Default, PartialEq)]
enum Mesh {
    #[default]
    None,
    Sphere,
    Cube,
}

#[derive(Debug, Default, PartialEq)]
enum Color {
    #[default]
    White,
    Blue,
    Red,
}

#[derive(Default)]
struct Body {
    mesh: Mesh,
    color: Color,
    scale: f32,
    spin: f32,
}

#[derive(Default)]
struct Keys {
    swap: bool,
}

type Cx<'a> = StateContext<'a, Body, Keys>;

#[derive(Default)]
struct Sphere {
    pulse: f32,
}

impl Pooled for Sphere {
    fn on_dequeued(&mut self) {
        self.pulse = 0.0;
    }
}

impl State<Body, Keys> for Sphere {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        let body = cx.context_mut();
        body.mesh = Mesh::Sphere;
        body.color = Color::Blue;
    }

    fn exit(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().scale = 1.0;
    }

    fn update(&mut self, _cx: &mut Cx<'_>) {
        self.pulse += 0.5;
    }

    fn fixed_update(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().scale = self.pulse;
    }

    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if cx.input().swap {
            cx.switch_state::<Cube>();
        }
    }
}

#[derive(Default)]
struct Cube;

impl Pooled for Cube {}

impl State<Body, Keys> for Cube {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().mesh = Mesh::Cube;
    }

    fn exit(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().spin = 0.0;
    }

    fn fixed_update(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().spin += 90.0;
    }

    fn check_switch_states(&mut self, cx: &mut Cx<'_>) {
        if cx.input().swap {
            cx.switch_state::<Sphere>();
        }
    }

    fn init_sub_state(&mut self, cx: &mut Cx<'_>) {
        cx.set_sub_state::<RedCube>();
    }
}

#[derive(Default)]
struct RedCube;

impl Pooled for RedCube {}

impl State<Body, Keys> for RedCube {
    fn enter(&mut self, cx: &mut Cx<'_>) {
        cx.context_mut().color = Color::Red;
    }
}

fn mesh_swap() -> StateMachine<Body, Keys> {
    MachineBuilder::new()
        .state::<Sphere>(1)
        .state::<Cube>(1)
        .state::<RedCube>(1)
        .fixed_update_checks(false)
        .build()
        .unwrap()
}

fn free(machine: &StateMachine<Body, Keys>, key: &str) -> Option<usize> {
    machine.pool().borrow().free_count(key)
}

#[test]
fn swap_cycles_between_sphere_and_red_cube() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    let idle = Keys { swap: false };
    let swap = Keys { swap: true };

    machine.start::<Sphere>(&mut body, &idle).unwrap();
    assert_eq!(machine.describe_hierarchy(), "Sphere");
    assert_eq!((&body.mesh, &body.color), (&Mesh::Sphere, &Color::Blue));

    machine.update(&mut body, &swap);
    assert_eq!(machine.describe_hierarchy(), "Cube/RedCube");
    assert!(machine.is_in_state::<RedCube>());
    assert_eq!((&body.mesh, &body.color), (&Mesh::Cube, &Color::Red));
    assert_eq!(free(&machine, "Sphere"), Some(1));

    machine.update(&mut body, &swap);
    assert_eq!(machine.describe_hierarchy(), "Sphere");
    assert_eq!(free(&machine, "Cube"), Some(1));
    assert_eq!(free(&machine, "RedCube"), Some(1));
    assert_eq!(free(&machine, "Sphere"), Some(0));
}

#[test]
fn idle_ticks_keep_the_chain() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    let idle = Keys::default();
    machine.start::<Sphere>(&mut body, &idle).unwrap();

    for _ in 0..3 {
        machine.update(&mut body, &idle);
        machine.fixed_update(&mut body, &idle);
    }

    assert_eq!(machine.describe_hierarchy(), "Sphere");
    assert_eq!(body.scale, 1.5);
}

#[test]
fn fixed_update_does_not_switch_when_checks_disabled() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    machine.start::<Sphere>(&mut body, &Keys::default()).unwrap();

    machine.fixed_update(&mut body, &Keys { swap: true });

    assert_eq!(machine.describe_hierarchy(), "Sphere");
}

#[test]
fn reused_sphere_starts_from_fresh_transient_data() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    let idle = Keys::default();
    let swap = Keys { swap: true };
    machine.start::<Sphere>(&mut body, &idle).unwrap();
    machine.update(&mut body, &idle);
    machine.update(&mut body, &idle);
    assert_eq!(machine.current::<Sphere>().unwrap().pulse, 1.0);

    machine.update(&mut body, &swap);
    machine.update(&mut body, &swap);

    assert_eq!(machine.current::<Sphere>().unwrap().pulse, 0.0);
    assert_eq!(machine.pool().borrow().stats("Sphere").unwrap().created, 1);
}

#[test]
fn cube_exit_resets_spin() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    let swap = Keys { swap: true };
    machine.start::<Sphere>(&mut body, &Keys::default()).unwrap();
    machine.update(&mut body, &swap);

    machine.fixed_update(&mut body, &Keys::default());
    assert_eq!(body.spin, 90.0);

    machine.update(&mut body, &swap);
    assert_eq!(body.spin, 0.0);
}

#[test]
fn history_follows_the_swaps() {
    let mut machine = mesh_swap();
    let mut body = Body::default();
    let swap = Keys { swap: true };
    machine.start::<Sphere>(&mut body, &Keys::default()).unwrap();
    machine.update(&mut body, &swap);
    machine.update(&mut body, &swap);

    assert_eq!(machine.history().path(), ["Sphere", "Cube", "RedCube", "Sphere"]);
    let kinds: Vec<_> = machine.history().iter().map(|record| record.kind).collect();
    assert_eq!(
        kinds,
        [
            TransitionKind::Start,
            TransitionKind::Switch,
            TransitionKind::SubState,
            TransitionKind::Switch,
        ]
    );
}
