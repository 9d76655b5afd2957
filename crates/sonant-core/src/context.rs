//! Engine context and the shared constant-source provider.
//!
//! Every [`Signal`](crate::Signal) is "unity source × its own gain", and the
//! unity source is one node shared by every signal on an engine. That node is
//! the constant-source provider. It is installed exactly once, when an engine
//! becomes available, and is read-only afterwards.
//!
//! ## Lifecycle
//!
//! ```text
//! PendingContext ──attach(engine)──▶ Context
//!  Uninitialized     Initializing      Ready
//! ```
//!
//! A [`PendingContext`] exists before there is an engine. It cannot build
//! signals; it can only collect [`on_ready`](PendingContext::on_ready) hooks.
//! [`attach()`](PendingContext::attach) is the readiness event: it installs
//! the provider, then runs the hooks in registration order against the new
//! [`Context`]. Signal constructors take a `&mut Context`, so building a
//! signal before the provider exists does not compile.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use sonant_core::{Engine, PendingContext, Signal};
//!
//! let built = Rc::new(RefCell::new(Vec::new()));
//! let mut pending = PendingContext::new();
//! let sink = Rc::clone(&built);
//! pending.on_ready(move |ctx| {
//!     sink.borrow_mut().push(Signal::new(ctx, 0.5).unwrap());
//! });
//!
//! let mut ctx = pending.attach(Engine::new(48000.0));
//! let late = Signal::new(&mut ctx, 2.0).unwrap();
//! assert_eq!(built.borrow().len(), 1);
//! assert_eq!(late.value(&ctx), 2.0);
//! ```

use crate::error::{Result, ensure_time};
use crate::graph::{Engine, GraphError, NodeId, NodeKind};
use crate::time::{Clock, Time, TimeBase};

/// Provider lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderState {
    /// No engine yet; hooks are queued.
    Uninitialized,
    /// The provider is being installed.
    Initializing,
    /// The provider exists; signals may be built.
    Ready,
}

/// Capability handle for the shared unity source.
///
/// Only a [`Context`] can create one, and only after installing the provider,
/// so holding a `ConstantSource` proves the provider is ready. The node is
/// pinned: the engine refuses to remove or bulk-disconnect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantSource {
    node: NodeId,
}

impl ConstantSource {
    /// The engine node producing the constant 1.0.
    #[inline]
    pub fn node(self) -> NodeId {
        self.node
    }
}

type ReadyHook = Box<dyn FnOnce(&mut Context)>;

/// A context waiting for its engine.
///
/// Collects readiness hooks; see the [module docs](self).
pub struct PendingContext {
    time_base: TimeBase,
    hooks: Vec<ReadyHook>,
}

impl PendingContext {
    /// Creates a pending context with the default time base.
    pub fn new() -> Self {
        Self::with_time_base(TimeBase::default())
    }

    /// Creates a pending context with the given tempo and meter.
    pub fn with_time_base(time_base: TimeBase) -> Self {
        Self {
            time_base,
            hooks: Vec::new(),
        }
    }

    /// Always [`ProviderState::Uninitialized`].
    pub fn state(&self) -> ProviderState {
        ProviderState::Uninitialized
    }

    /// Number of hooks waiting for readiness.
    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Queues `hook` to run once the engine is attached.
    pub fn on_ready(&mut self, hook: impl FnOnce(&mut Context) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Attaches the engine: installs the provider once, then runs every
    /// queued hook in registration order.
    pub fn attach(self, mut engine: Engine) -> Context {
        #[cfg(feature = "tracing")]
        tracing::debug!("provider_state: {:?}", ProviderState::Initializing);

        let source = ConstantSource {
            node: engine.add_pinned(NodeKind::Constant),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "provider_state: {:?}, unity source {}, {} hooks",
            ProviderState::Ready,
            source.node,
            self.hooks.len()
        );

        let mut ctx = Context {
            engine,
            time_base: self.time_base,
            source,
            state: ProviderState::Ready,
        };
        for hook in self.hooks {
            hook(&mut ctx);
        }
        ctx
    }
}

impl Default for PendingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PendingContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingContext")
            .field("time_base", &self.time_base)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// A ready engine with its constant-source provider installed.
#[derive(Debug)]
pub struct Context {
    engine: Engine,
    time_base: TimeBase,
    source: ConstantSource,
    state: ProviderState,
}

impl Context {
    /// Creates a ready context around a fresh engine.
    pub fn new(sample_rate: f64) -> Self {
        PendingContext::new().attach(Engine::new(sample_rate))
    }

    /// Creates a ready context with the given tempo and meter.
    pub fn with_time_base(sample_rate: f64, time_base: TimeBase) -> Self {
        PendingContext::with_time_base(time_base).attach(Engine::new(sample_rate))
    }

    /// Always [`ProviderState::Ready`].
    #[inline]
    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// The shared unity source.
    #[inline]
    pub fn constant_source(&self) -> ConstantSource {
        self.source
    }

    /// Runs `hook` now: the context is already ready.
    pub fn on_ready(&mut self, hook: impl FnOnce(&mut Context)) {
        hook(self);
    }

    /// Snapshot of tempo, meter, sample rate and current time.
    pub fn clock(&self) -> Clock {
        Clock {
            time_base: self.time_base,
            now: self.engine.now(),
            sample_rate: self.engine.sample_rate(),
        }
    }

    /// Current engine time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.engine.now()
    }

    /// Engine sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.engine.sample_rate()
    }

    /// Tempo and meter used to resolve musical time.
    #[inline]
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Replaces tempo and meter. Already scheduled events are not moved.
    pub fn set_time_base(&mut self, time_base: TimeBase) {
        self.time_base = time_base;
    }

    /// Sets the tempo in beats per minute.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.time_base.bpm = bpm;
    }

    /// Resolves a time to absolute seconds, rejecting times before zero.
    pub fn resolve(&self, time: impl Into<Time>) -> Result<f64> {
        ensure_time(self.clock().resolve(&time.into())?)
    }

    /// The engine.
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The engine, for wiring nodes directly.
    #[inline]
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Renders `frames` samples and returns `tap`'s output for each.
    pub fn render(&mut self, frames: usize, tap: NodeId) -> core::result::Result<Vec<f64>, GraphError> {
        self.engine.render(frames, tap)
    }

    /// Renders `frames` samples, discarding output.
    pub fn advance(&mut self, frames: usize) -> core::result::Result<(), GraphError> {
        self.engine.advance(frames)
    }

    /// Number of unity sources in the engine. One for any live context.
    pub fn provider_count(&self) -> usize {
        self.engine.count_nodes(NodeKind::Constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn pending_hooks_run_in_order_after_install() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pending = PendingContext::new();
        assert_eq!(pending.state(), ProviderState::Uninitialized);

        for i in 0..3 {
            let log = Rc::clone(&log);
            pending.on_ready(move |ctx| {
                assert_eq!(ctx.state(), ProviderState::Ready);
                assert_eq!(ctx.provider_count(), 1);
                log.borrow_mut().push(i);
            });
        }
        assert_eq!(pending.pending_hooks(), 3);

        let ctx = pending.attach(Engine::new(1000.0));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(ctx.provider_count(), 1);
    }

    #[test]
    fn on_ready_runs_immediately_when_ready() {
        let mut ctx = Context::new(1000.0);
        let mut ran = false;
        ctx.on_ready(|_| ran = true);
        assert!(ran);
        assert_eq!(ctx.provider_count(), 1);
    }

    #[test]
    fn provider_outputs_unity() {
        let mut ctx = Context::new(1000.0);
        let source = ctx.constant_source().node();
        assert_eq!(ctx.render(4, source).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn provider_survives_direct_engine_access() {
        let mut ctx = Context::new(1000.0);
        let source = ctx.constant_source().node();
        assert_eq!(
            ctx.engine_mut().remove_node(source),
            Err(GraphError::Pinned(source))
        );
        assert_eq!(
            ctx.engine_mut().disconnect_all(source),
            Err(GraphError::Pinned(source))
        );
        assert_eq!(ctx.provider_count(), 1);

        let signal = crate::Signal::new(&mut ctx, 0.5).unwrap();
        assert_eq!(ctx.render(2, signal.output()).unwrap(), vec![0.5; 2]);
    }

    #[test]
    fn resolve_relative_to_engine_clock() {
        let mut ctx = Context::new(1000.0);
        ctx.advance(500).unwrap();
        assert!((ctx.now() - 0.5).abs() < 1e-12);
        assert!((ctx.resolve("+0.25").unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(ctx.resolve(2.0).unwrap(), 2.0);
        assert!(ctx.resolve(-1.0).is_err());
    }

    #[test]
    fn tempo_changes_musical_time() {
        let mut ctx = Context::new(1000.0);
        assert_eq!(ctx.resolve("4n").unwrap(), 0.5);
        ctx.set_bpm(60.0);
        assert_eq!(ctx.resolve("4n").unwrap(), 1.0);
    }
}
