//! Hierarchical state machine over pooled states.

use super::id::MachineId;
use crate::config::MachineSettings;
use crate::core::{
    type_key, RequestKind, State, StateContext, Target, TransitionHistory, TransitionKind,
    TransitionRecord, TransitionRequest,
};
use crate::pool::{KeyedPool, PoolDescriptor, PoolError};
use chrono::Utc;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Pool of states for machines over context `C` and input `I`.
pub type StatePool<C, I> = KeyedPool<dyn State<C, I>>;

/// A state pool several machines on one thread can draw from.
pub type SharedStatePool<C, I> = Rc<RefCell<StatePool<C, I>>>;

/// Separator used by [`StateMachine::describe_hierarchy`].
pub const HIERARCHY_SEPARATOR: &str = "/";

/// Lifecycle of a machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MachineStatus {
    /// No active chain.
    Uninitialized,
    /// A root state is active.
    Running,
}

struct ActiveNode<C, I> {
    state: Box<dyn State<C, I>>,
    key: Cow<'static, str>,
    name: &'static str,
    type_id: TypeId,
}

#[derive(Clone, Copy, Debug)]
enum Hook {
    Enter,
    Exit,
    Update,
    FixedUpdate,
    CheckSwitchStates,
    InitSubState,
}

/// What applying a request did to the requesting node.
enum Applied {
    Rejected,
    SelfReplaced,
    SubReplaced,
}

/// A hierarchical state machine whose states come from a [`KeyedPool`].
///
/// The active chain is a path: a root state and its nested sub-states. The
/// host drives the machine with [`update`](Self::update) and
/// [`fixed_update`](Self::fixed_update), lending it the context and input for
/// the duration of each call. States request transitions through their
/// [`StateContext`]; the machine performs each request as soon as the
/// requesting hook returns:
///
/// - `switch_state::<T>()` exits the requesting state and its sub-chain, then
///   attaches and enters a `T` in the vacated slot. Ancestors are untouched.
/// - `set_sub_state::<T>()` exits the requesting state's sub-chain, if any,
///   then attaches and enters a `T` below it.
///
/// Exited states go back to the pool, so a warm machine switches without
/// allocating.
///
/// # Panics
///
/// Driving the machine while the shared pool is borrowed elsewhere panics.
///
/// # Example
///
/// ```rust
/// use statepool::{PoolDescriptor, Pooled, State, StateContext, StateMachine};
///
/// #[derive(Default)]
/// struct Idle;
/// impl Pooled for Idle {}
/// impl State<u32, bool> for Idle {
///     fn check_switch_states(&mut self, cx: &mut StateContext<'_, u32, bool>) {
///         if *cx.input() {
///             cx.switch_state::<Busy>();
///         }
///     }
/// }
///
/// #[derive(Default)]
/// struct Busy;
/// impl Pooled for Busy {}
/// impl State<u32, bool> for Busy {
///     fn update(&mut self, cx: &mut StateContext<'_, u32, bool>) {
///         *cx.context_mut() += 1;
///     }
/// }
///
/// type Descriptor = PoolDescriptor<dyn State<u32, bool>>;
///
/// let mut machine = StateMachine::with_pools(vec![
///     Descriptor::state::<Idle>(1),
///     Descriptor::state::<Busy>(1),
/// ])
/// .unwrap();
///
/// let mut work = 0;
/// machine.start::<Idle>(&mut work, &false).unwrap();
/// machine.update(&mut work, &true);
/// assert!(machine.is_in_state::<Busy>());
///
/// machine.update(&mut work, &false);
/// assert_eq!(work, 1);
/// ```
pub struct StateMachine<C: 'static, I: 'static> {
    id: MachineId,
    pool: SharedStatePool<C, I>,
    chain: Vec<ActiveNode<C, I>>,
    history: TransitionHistory,
    settings: MachineSettings,
}

impl<C: 'static, I: 'static> StateMachine<C, I> {
    /// Create an uninitialized machine drawing from a shared pool.
    pub fn new(pool: SharedStatePool<C, I>) -> Self {
        Self::with_settings(pool, MachineSettings::default())
    }

    pub fn with_settings(pool: SharedStatePool<C, I>, settings: MachineSettings) -> Self {
        Self {
            id: MachineId::new(),
            pool,
            chain: Vec::new(),
            history: TransitionHistory::new(settings.history_capacity),
            settings,
        }
    }

    /// Create an uninitialized machine with its own pool, built from
    /// `descriptors`.
    pub fn with_pools<D>(descriptors: D) -> Result<Self, PoolError>
    where
        D: IntoIterator<Item = PoolDescriptor<dyn State<C, I>>>,
    {
        let pool = StatePool::from_descriptors(descriptors)?;
        Ok(Self::new(Rc::new(RefCell::new(pool))))
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn pool(&self) -> &SharedStatePool<C, I> {
        &self.pool
    }

    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn status(&self) -> MachineStatus {
        if self.chain.is_empty() {
            MachineStatus::Uninitialized
        } else {
            MachineStatus::Running
        }
    }

    pub fn is_running(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Number of states in the active chain.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Install a `T` from `T`'s pool as the root and enter it.
    ///
    /// A running machine first exits its current chain. An unregistered key
    /// is rejected before anything is exited.
    pub fn start<T: State<C, I>>(
        &mut self,
        context: &mut C,
        input: &I,
    ) -> Result<(), PoolError> {
        self.start_keyed::<T>(type_key::<T>(), context, input)
    }

    /// Like [`start`](Self::start), acquiring the root from `key`.
    pub fn start_keyed<T: State<C, I>>(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        context: &mut C,
        input: &I,
    ) -> Result<(), PoolError> {
        let target = Target::of::<T>(key.into());
        if !self.is_registered(&target) {
            return Err(PoolError::UnknownKey {
                key: target.key.into_owned(),
            });
        }

        let from = self.chain.first().map(|root| root.name);
        self.exit_chain(0, context, input);
        self.attach(0, &target, TransitionKind::Start, from, context, input)
    }

    /// Exit the whole chain, leaf first, returning every state to the pool.
    pub fn stop(&mut self, context: &mut C, input: &I) {
        let Some(root) = self.chain.first().map(|root| root.name) else {
            return;
        };
        self.exit_chain(0, context, input);
        self.record(TransitionKind::Stop, 0, Some(root), None);
        tracing::debug!(machine = %self.id, root, "machine stopped");
    }

    /// Run one frame: `update` root to leaf, then `check_switch_states`
    /// leaf to root.
    pub fn update(&mut self, context: &mut C, input: &I) {
        self.tick_from(0, Hook::Update, true, context, input);
    }

    /// Run one physics step: `fixed_update` root to leaf, then, unless
    /// disabled in [`MachineSettings`], `check_switch_states` leaf to root.
    pub fn fixed_update(&mut self, context: &mut C, input: &I) {
        let checks = self.settings.fixed_update_checks;
        self.tick_from(0, Hook::FixedUpdate, checks, context, input);
    }

    /// Whether the deepest active state is exactly a `T`.
    pub fn is_in_state<T: State<C, I>>(&self) -> bool {
        self.chain
            .last()
            .is_some_and(|leaf| leaf.type_id == TypeId::of::<T>())
    }

    /// State names from root to leaf.
    pub fn hierarchy(&self) -> impl ExactSizeIterator<Item = &'static str> + '_ {
        self.chain.iter().map(|node| node.name)
    }

    /// State names from root to leaf joined by [`HIERARCHY_SEPARATOR`].
    ///
    /// Meant for diagnostics; empty when the machine is uninitialized.
    pub fn describe_hierarchy(&self) -> String {
        self.hierarchy().collect::<Vec<_>>().join(HIERARCHY_SEPARATOR)
    }

    /// The shallowest active state of type `T`.
    pub fn current<T: State<C, I>>(&self) -> Option<&T> {
        self.chain.iter().find_map(|node| {
            let state: &dyn State<C, I> = &*node.state;
            state.as_any().downcast_ref::<T>()
        })
    }

    pub fn current_mut<T: State<C, I>>(&mut self) -> Option<&mut T> {
        self.chain.iter_mut().find_map(|node| {
            let state: &mut dyn State<C, I> = &mut *node.state;
            state.as_any_mut().downcast_mut::<T>()
        })
    }

    fn run_hook(
        &mut self,
        depth: usize,
        hook: Hook,
        context: &mut C,
        input: &I,
    ) -> Option<TransitionRequest> {
        let machine = self.id;
        let node = self.chain.get_mut(depth)?;
        let state = &mut *node.state;
        let mut cx = StateContext::new(context, input, depth, machine);
        match hook {
            Hook::Enter => state.enter(&mut cx),
            Hook::Exit => state.exit(&mut cx),
            Hook::Update => state.update(&mut cx),
            Hook::FixedUpdate => state.fixed_update(&mut cx),
            Hook::CheckSwitchStates => state.check_switch_states(&mut cx),
            Hook::InitSubState => state.init_sub_state(&mut cx),
        }
        cx.take_request()
    }

    /// Traverse `chain[depth..]` for one tick.
    ///
    /// Operations at `depth` only touch `chain[depth..]`, so `chain[depth]`
    /// survives the recursion into its sub-chain. A node that replaces its
    /// sub-state from the hook still ticks the new sub-chain and runs its own
    /// check; a node that switches itself out ends its traversal there.
    fn tick_from(&mut self, depth: usize, hook: Hook, checks: bool, context: &mut C, input: &I) {
        if depth >= self.chain.len() {
            return;
        }

        if let Some(request) = self.run_hook(depth, hook, context, input) {
            if let Applied::SelfReplaced = self.apply(depth, &request, context, input) {
                return;
            }
        }

        self.tick_from(depth + 1, hook, checks, context, input);

        if checks {
            if let Some(request) = self.run_hook(depth, Hook::CheckSwitchStates, context, input) {
                self.apply(depth, &request, context, input);
            }
        }
    }

    /// Initialize the sub-chain of `chain[depth]`, then enter it.
    fn enter_chain(&mut self, depth: usize, context: &mut C, input: &I) {
        if let Some(request) = self.run_hook(depth, Hook::InitSubState, context, input) {
            if let Applied::SelfReplaced = self.apply(depth, &request, context, input) {
                return;
            }
        }

        if let Some(request) = self.run_hook(depth, Hook::Enter, context, input) {
            self.apply(depth, &request, context, input);
        }
    }

    /// Exit and release `chain[depth..]`, leaf first.
    fn exit_chain(&mut self, depth: usize, context: &mut C, input: &I) {
        while self.chain.len() > depth {
            let leaf = self.chain.len() - 1;
            if let Some(request) = self.run_hook(leaf, Hook::Exit, context, input) {
                tracing::warn!(
                    machine = %self.id,
                    state = self.chain[leaf].name,
                    target = request.target_name(),
                    "transition requested while exiting; ignored"
                );
            }
            if let Some(node) = self.chain.pop() {
                self.release_node(node);
            }
        }
    }

    fn apply(
        &mut self,
        depth: usize,
        request: &TransitionRequest,
        context: &mut C,
        input: &I,
    ) -> Applied {
        let target = request.target();
        if !self.is_registered(target) {
            return Applied::Rejected;
        }

        let (slot, kind, outcome) = match request.kind() {
            RequestKind::Switch => (depth, TransitionKind::Switch, Applied::SelfReplaced),
            RequestKind::SubState => (depth + 1, TransitionKind::SubState, Applied::SubReplaced),
        };

        let from = self.chain.get(slot).map(|node| node.name);
        self.exit_chain(slot, context, input);
        if let Err(error) = self.attach(slot, target, kind, from, context, input) {
            tracing::warn!(
                machine = %self.id,
                depth = slot,
                %error,
                hierarchy = %self.describe_hierarchy(),
                "transition failed after teardown; chain shortened"
            );
        }
        outcome
    }

    /// Acquire `target` into the vacant slot `depth` and enter it.
    fn attach(
        &mut self,
        depth: usize,
        target: &Target,
        kind: TransitionKind,
        from: Option<&'static str>,
        context: &mut C,
        input: &I,
    ) -> Result<(), PoolError> {
        debug_assert_eq!(self.chain.len(), depth);

        let state = self
            .pool
            .borrow_mut()
            .acquire_matching(&target.key, target.type_id, target.type_name)?;
        let type_id = Any::type_id((*state).as_any());
        self.chain.push(ActiveNode {
            state,
            key: target.key.clone(),
            name: target.name,
            type_id,
        });

        self.record(kind, depth, from, Some(target.name));
        tracing::debug!(
            machine = %self.id,
            ?kind,
            depth,
            from = from.unwrap_or("-"),
            to = target.name,
            "state attached"
        );

        self.enter_chain(depth, context, input);
        Ok(())
    }

    fn is_registered(&self, target: &Target) -> bool {
        let registered = self.pool.borrow().contains(&target.key);
        if !registered {
            tracing::warn!(
                machine = %self.id,
                key = %target.key,
                target = target.name,
                "transition to unregistered pool key rejected"
            );
        }
        registered
    }

    fn release_node(&self, node: ActiveNode<C, I>) {
        if let Err(error) = self.pool.borrow_mut().release(node.state, &node.key) {
            tracing::warn!(
                machine = %self.id,
                state = node.name,
                %error,
                "could not return state to pool"
            );
        }
    }

    fn record(
        &mut self,
        kind: TransitionKind,
        depth: usize,
        from: Option<&'static str>,
        to: Option<&'static str>,
    ) {
        self.history.record(TransitionRecord {
            kind,
            depth,
            from,
            to,
            timestamp: Utc::now(),
        });
    }
}

impl<C: 'static, I: 'static> fmt::Display for StateMachine<C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, name) in self.hierarchy().enumerate() {
            if index > 0 {
                f.write_str(HIERARCHY_SEPARATOR)?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl<C: 'static, I: 'static> fmt::Debug for StateMachine<C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("hierarchy", &self.describe_hierarchy())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<C: 'static, I: 'static> Drop for StateMachine<C, I> {
    fn drop(&mut self) {
        if self.chain.is_empty() {
            return;
        }

        tracing::warn!(
            machine = %self.id,
            hierarchy = %self.describe_hierarchy(),
            "machine dropped while running; returning states without exit hooks"
        );
        let Ok(mut pool) = self.pool.try_borrow_mut() else {
            tracing::warn!(machine = %self.id, "pool is borrowed; active states are dropped");
            return;
        };
        while let Some(node) = self.chain.pop() {
            if let Err(error) = pool.release(node.state, &node.key) {
                tracing::warn!(
                    machine = %self.id,
                    state = node.name,
                    %error,
                    "could not return state to pool"
                );
            }
        }
    }
}
