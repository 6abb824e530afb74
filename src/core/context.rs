//! What a state sees while one of its hooks runs.

use super::state::{type_key, State};
use crate::machine::MachineId;
use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;

/// Which way a requested transition re-links the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Replace the requesting state and everything below it.
    Switch,
    /// Replace the requesting state's sub-chain, keeping the state itself.
    SubState,
}

/// The state type a transition should acquire, and the key to acquire it from.
#[derive(Clone, Debug)]
pub(crate) struct Target {
    pub(crate) key: Cow<'static, str>,
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) type_name: &'static str,
}

impl Target {
    pub(crate) fn of<T: 'static>(key: Cow<'static, str>) -> Self {
        Self {
            key,
            type_id: TypeId::of::<T>(),
            name: type_key::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// A transition a state asked for during one of its hooks.
///
/// The machine carries it out synchronously as soon as the hook returns.
#[derive(Clone, Debug)]
pub struct TransitionRequest {
    kind: RequestKind,
    target: Target,
}

impl TransitionRequest {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Pool key the target state is acquired from.
    pub fn key(&self) -> &str {
        &self.target.key
    }

    /// Short type name of the target state.
    pub fn target_name(&self) -> &'static str {
        self.target.name
    }

    pub(crate) fn target(&self) -> &Target {
        &self.target
    }
}

/// Borrowed view handed to every [`State`] hook.
///
/// Gives access to the host context and input, tells the state where it sits
/// in the chain, and records at most one transition request per hook call.
pub struct StateContext<'a, C, I> {
    context: &'a mut C,
    input: &'a I,
    depth: usize,
    machine: MachineId,
    request: Option<TransitionRequest>,
}

impl<'a, C, I> StateContext<'a, C, I> {
    pub(crate) fn new(context: &'a mut C, input: &'a I, depth: usize, machine: MachineId) -> Self {
        Self {
            context,
            input,
            depth,
            machine,
            request: None,
        }
    }

    /// A root-level context that belongs to no machine.
    ///
    /// Useful for exercising a state's hooks in isolation; any transition
    /// request stays pending and can be inspected with
    /// [`pending_transition`](Self::pending_transition).
    pub fn detached(context: &'a mut C, input: &'a I) -> Self {
        Self::new(context, input, 0, MachineId::nil())
    }

    pub fn context(&self) -> &C {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut *self.context
    }

    pub fn input(&self) -> &I {
        self.input
    }

    /// Position in the active chain; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine
    }

    /// Replace this state (and its sub-chain) with a `T` from `T`'s pool.
    ///
    /// At the root this restarts the machine with `T`; below it, `T` takes
    /// this state's place under the same super-state.
    pub fn switch_state<T: State<C, I>>(&mut self) {
        self.switch_state_keyed::<T>(type_key::<T>());
    }

    /// Like [`switch_state`](Self::switch_state), acquiring from `key`.
    pub fn switch_state_keyed<T: State<C, I>>(&mut self, key: impl Into<Cow<'static, str>>) {
        self.push_request(RequestKind::Switch, Target::of::<T>(key.into()));
    }

    /// Attach a `T` as this state's sub-state, exiting any current one.
    pub fn set_sub_state<T: State<C, I>>(&mut self) {
        self.set_sub_state_keyed::<T>(type_key::<T>());
    }

    /// Like [`set_sub_state`](Self::set_sub_state), acquiring from `key`.
    pub fn set_sub_state_keyed<T: State<C, I>>(&mut self, key: impl Into<Cow<'static, str>>) {
        self.push_request(RequestKind::SubState, Target::of::<T>(key.into()));
    }

    pub fn has_pending_transition(&self) -> bool {
        self.request.is_some()
    }

    pub fn pending_transition(&self) -> Option<&TransitionRequest> {
        self.request.as_ref()
    }

    pub(crate) fn take_request(&mut self) -> Option<TransitionRequest> {
        self.request.take()
    }

    fn push_request(&mut self, kind: RequestKind, target: Target) {
        if let Some(pending) = &self.request {
            tracing::warn!(
                machine = %self.machine,
                depth = self.depth,
                pending = pending.target_name(),
                ignored = target.name,
                "state already requested a transition; ignoring the later request"
            );
            return;
        }
        self.request = Some(TransitionRequest { kind, target });
    }
}

impl<C, I> fmt::Debug for StateContext<'_, C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContext")
            .field("depth", &self.depth)
            .field("machine", &self.machine)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pooled;

    #[derive(Default)]
    struct Counter {
        ticks: u32,
    }

    struct Walk;
    impl Pooled for Walk {}
    impl State<Counter, bool> for Walk {}

    struct Run;
    impl Pooled for Run {}
    impl State<Counter, bool> for Run {}

    #[test]
    fn context_and_input_are_reachable() {
        let mut counter = Counter::default();
        let mut cx = StateContext::detached(&mut counter, &true);

        cx.context_mut().ticks += 1;

        assert_eq!(cx.context().ticks, 1);
        assert!(*cx.input());
        assert!(cx.is_root());
        assert_eq!(cx.depth(), 0);
        assert!(cx.machine_id().is_nil());
    }

    #[test]
    fn switch_request_targets_type_key() {
        let mut counter = Counter::default();
        let mut cx = StateContext::detached(&mut counter, &false);

        cx.switch_state::<Run>();

        let request = cx.pending_transition().unwrap();
        assert_eq!(request.kind(), RequestKind::Switch);
        assert_eq!(request.key(), "Run");
        assert_eq!(request.target_name(), "Run");
    }

    #[test]
    fn keyed_request_keeps_explicit_key() {
        let mut counter = Counter::default();
        let mut cx = StateContext::detached(&mut counter, &false);

        cx.set_sub_state_keyed::<Walk>("slow-walk");

        let request = cx.take_request().unwrap();
        assert_eq!(request.kind(), RequestKind::SubState);
        assert_eq!(request.key(), "slow-walk");
        assert_eq!(request.target_name(), "Walk");
        assert!(!cx.has_pending_transition());
    }

    #[test]
    fn first_request_wins() {
        let mut counter = Counter::default();
        let mut cx = StateContext::detached(&mut counter, &false);

        cx.switch_state::<Walk>();
        cx.switch_state::<Run>();

        assert_eq!(cx.pending_transition().unwrap().target_name(), "Walk");
    }

    #[test]
    fn nested_context_is_not_root() {
        let mut counter = Counter::default();
        let cx = StateContext::new(&mut counter, &false, 2, MachineId::new());

        assert!(!cx.is_root());
        assert_eq!(cx.depth(), 2);
    }
}
